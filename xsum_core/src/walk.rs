//! Recursive tree hashing with bounded-parallel traversal.
//!
//! One walker task exists per walk invocation. A walker holds a gate
//! permit across every blocking phase (stat, open and stream, readlink,
//! readdir, the Merkle fold) and releases it before awaiting children;
//! the release-before-await rule is what keeps trees deeper than the gate
//! width from deadlocking.

use crate::error::{Error, Op, Result};
use crate::gate::Gate;
use crate::hash::Hasher;
use crate::mask::Mask;
use crate::merkle;
use crate::node::Node;
use crate::queue::OrderedQueue;
use crate::sys;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

/// Tree hasher: a hash provider, a mask, and the concurrency gate.
///
/// Shared read-only by every walker task it spawns.
pub struct Sum {
    hasher: Arc<dyn Hasher>,
    mask: Mask,
    gate: Gate,
}

impl Sum {
    /// Hasher with the gate sized to the available CPUs.
    pub fn new(hasher: Arc<dyn Hasher>, mask: Mask) -> Sum {
        Sum::with_gate(hasher, mask, Gate::with_cpu_permits())
    }

    /// Hasher with an explicit gate, for callers bounding work themselves.
    pub fn with_gate(hasher: Arc<dyn Hasher>, mask: Mask, gate: Gate) -> Sum {
        Sum { hasher, mask, gate }
    }

    /// Spawn one walker per path, each owning the queue slot of its
    /// ordinal, and return the queue to drain. Completion order never
    /// leaks into the output order.
    ///
    /// Must be called from within a tokio runtime.
    pub fn sum(self: Arc<Self>, paths: Vec<PathBuf>) -> Arc<OrderedQueue<Result<Node>>> {
        let queue = Arc::new(OrderedQueue::new(paths.len()));
        for (index, path) in paths.into_iter().enumerate() {
            let sum = Arc::clone(&self);
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let result = sum.walk(clean_path(&path), false).await;
                queue.add(index, result);
            });
        }
        queue
    }

    /// Hash one path. `subdir` is true for walkers spawned on directory
    /// entries; it selects symlink treatment and error annotation.
    fn walk(self: Arc<Self>, path: PathBuf, subdir: bool) -> BoxFuture<'static, Result<Node>> {
        Box::pin(async move {
            let mut pass = self.gate.acquire().await;

            let meta = fs::symlink_metadata(&path).map_err(|e| Error::stat(&path, e))?;
            let file_type = meta.file_type();
            let mode = sys::mode_bits(&meta);
            let props = sys::sys_props(&meta);

            let digest = if file_type.is_dir() {
                debug!(path = %path.display(), "hashing directory");
                let names =
                    read_dir_unordered(&path).map_err(|e| Error::op(Op::ReadDir, &path, e))?;
                pass.release();
                let children = match Arc::clone(&self).walk_children(path.clone(), names).await {
                    Ok(children) => children,
                    Err(err) if subdir => return Err(err),
                    Err(err) => return Err(Error::tree(&path, err)),
                };
                pass.reacquire().await;
                merkle::fold(self.hasher.as_ref(), self.mask, &children)
                    .map_err(|e| Error::hash(&path, e))?
            } else if file_type.is_file() || (!subdir && file_type.is_symlink()) {
                // A top-level symlink is followed and hashed as its
                // target's content; as a directory entry it is hashed as
                // its link text below.
                debug!(path = %path.display(), "hashing file content");
                let mut file = File::open(&path).map_err(|e| Error::op(Op::Open, &path, e))?;
                self.hasher
                    .data(&mut file)
                    .map_err(|e| Error::hash(&path, e))?
            } else if file_type.is_symlink() {
                let target =
                    fs::read_link(&path).map_err(|e| Error::op(Op::ReadLink, &path, e))?;
                self.hasher
                    .metadata(sys::os_bytes(target.as_os_str()))
                    .map_err(|e| Error::hash(&path, e))?
            } else {
                return Err(Error::special(&path));
            };

            Ok(Node {
                path,
                digest,
                mode,
                sys: props,
            })
        })
    }

    /// Hash every entry of a directory concurrently. The first child
    /// error wins; remaining siblings are detached to finish on their
    /// own, their results discarded.
    async fn walk_children(
        self: Arc<Self>,
        dir: PathBuf,
        names: Vec<OsString>,
    ) -> Result<Vec<Node>> {
        let mut set = JoinSet::new();
        for name in names {
            set.spawn(Arc::clone(&self).walk(dir.join(name), true));
        }

        let mut children = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(node)) => children.push(node),
                // Walk errors already carry their own path context.
                Ok(Err(err)) => {
                    set.detach_all();
                    return Err(err);
                }
                Err(err) => {
                    set.detach_all();
                    return Err(Error::from(err));
                }
            }
        }
        Ok(children)
    }
}

/// Directory entry names in whatever order the filesystem returns them.
/// The Merkle fold's block sort makes the order irrelevant.
fn read_dir_unordered(path: &Path) -> std::io::Result<Vec<OsString>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        names.push(entry?.file_name());
    }
    Ok(names)
}

/// Lexical path normalization: drops `.` components and trailing
/// separators, folds each `..` into the component before it (a `..` at
/// the root vanishes, a leading `..` in a relative path stays). An empty
/// result means the current directory.
fn clean_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    let cleaned: PathBuf = parts.into_iter().collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
