//! Concurrency gate bounding blocking filesystem and hash work.
//!
//! The gate is a counting semaphore sized to the machine's parallelism.
//! Every walker holds exactly one permit while it stats, reads, or hashes,
//! and must give the permit back before waiting on child walkers; a walker
//! that waited on children while holding a permit would deadlock any tree
//! deeper than the gate width.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Process-wide bound on concurrent blocking operations.
#[derive(Clone)]
pub struct Gate {
    sem: Arc<Semaphore>,
}

impl Gate {
    /// Gate with an explicit permit count.
    pub fn new(permits: usize) -> Gate {
        Gate {
            sem: Arc::new(Semaphore::new(permits.max(1))),
        }
    }

    /// Gate sized to the number of available CPUs.
    pub fn with_cpu_permits() -> Gate {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Gate::new(cpus)
    }

    /// Wait for a permit and return a pass holding it.
    pub async fn acquire(&self) -> GatePass {
        let permit = Arc::clone(&self.sem)
            .acquire_owned()
            .await
            .expect("gate semaphore is never closed");
        GatePass {
            sem: Arc::clone(&self.sem),
            permit: Some(permit),
        }
    }
}

/// A held (or deliberately released) gate permit.
///
/// `release` and `reacquire` let a walker give up its permit around the
/// child-await phase. Dropping the pass releases a held permit exactly
/// once; releasing twice is a no-op rather than a double release.
pub struct GatePass {
    sem: Arc<Semaphore>,
    permit: Option<OwnedSemaphorePermit>,
}

impl GatePass {
    /// Give the permit back early.
    pub fn release(&mut self) {
        self.permit = None;
    }

    /// Take a permit again after `release`. No-op while one is held.
    pub async fn reacquire(&mut self) {
        if self.permit.is_none() {
            let permit = Arc::clone(&self.sem)
                .acquire_owned()
                .await
                .expect("gate semaphore is never closed");
            self.permit = Some(permit);
        }
    }

    /// Whether a permit is currently held.
    pub fn is_held(&self) -> bool {
        self.permit.is_some()
    }
}
