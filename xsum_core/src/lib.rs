//! # xsum core
//!
//! Tree hashing engine behind the `xsum` checksum tool.
//!
//! For a regular file the checksum covers its content; for a symlink met
//! as a directory entry, the link target bytes; for a directory, a
//! Merkle-style fold over its entries that mixes in each entry's name,
//! digest, selected metadata, and optionally extended attributes.
//! Traversal is concurrent but bounded: a process-wide gate keeps the
//! number of in-flight blocking operations at the CPU count, and an
//! ordered queue hands results back in the order the paths were given.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use xsum_core::{hash, Mask, Sum};
//!
//! # #[tokio::main]
//! # async fn main() -> xsum_core::Result<()> {
//! let hasher = hash::parse("sha256")?;
//! let sum = Arc::new(Sum::new(hasher, Mask::default()));
//!
//! let queue = sum.sum(vec!["src".into(), "Cargo.toml".into()]);
//! while let Some(result) = queue.next().await {
//!     let node = result?;
//!     println!("{}  {}", hex::encode(&node.digest), node.path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod gate;
pub mod hash;
mod mask;
mod merkle;
mod node;
mod queue;
mod sys;
mod walk;

pub use error::{Error, Op, Result};
pub use gate::{Gate, GatePass};
pub use hash::Hasher;
pub use mask::{Attrs, Mask};
pub use node::{mode, Node};
pub use queue::OrderedQueue;
pub use sys::{SysProps, Timespec};
pub use walk::Sum;
