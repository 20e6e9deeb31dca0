//! Directory digest construction.
//!
//! A directory's digest folds in, for every child: the entry name, the
//! child's own digest, a fixed-width encoding of its selected metadata,
//! and (when selected) its extended attributes. Blocks are sorted by raw
//! byte comparison before hashing so the digest is independent of readdir
//! order; the name digest leads each block, so it dominates the sort.

use crate::hash::Hasher;
use crate::mask::{Attrs, Mask};
use crate::node::{mode, Node};
use crate::sys;
use std::io;

/// Width of the encoded metadata region. Fixed: selecting more attributes
/// changes byte values, never the layout.
const SYS_ENCODED_LEN: usize = 52;

/// Encode a child's metadata into the fixed little-endian layout.
///
/// Unselected fields stay zero rather than being omitted, so masks that
/// select more attributes strictly refine the digest.
fn encode_sys(mask: Mask, node: &Node) -> [u8; SYS_ENCODED_LEN] {
    let mut out = [0u8; SYS_ENCODED_LEN];

    let selected = mode::TYPE_MASK | (mask.mode & (mode::PERM_MASK | mode::SPECIAL_MASK));
    out[0..4].copy_from_slice(&(node.mode & selected).to_le_bytes());

    if mask.attrs.contains(Attrs::UID) {
        out[4..8].copy_from_slice(&node.sys.uid.to_le_bytes());
    }
    if mask.attrs.contains(Attrs::GID) {
        out[8..12].copy_from_slice(&node.sys.gid.to_le_bytes());
    }
    if mask.attrs.contains(Attrs::SPECIAL) && node.is_device() {
        out[12..20].copy_from_slice(&node.sys.device.to_le_bytes());
    }
    if mask.attrs.contains(Attrs::MTIME) {
        out[20..28].copy_from_slice(&(node.sys.mtime.sec as u64).to_le_bytes());
        out[28..36].copy_from_slice(&(node.sys.mtime.nsec as u64).to_le_bytes());
    }
    if mask.attrs.contains(Attrs::CTIME) {
        out[36..44].copy_from_slice(&(node.sys.ctime.sec as u64).to_le_bytes());
        out[44..52].copy_from_slice(&(node.sys.ctime.nsec as u64).to_le_bytes());
    }

    out
}

/// Compute a directory's digest from its children.
pub fn fold(hasher: &dyn Hasher, mask: Mask, children: &[Node]) -> io::Result<Vec<u8>> {
    let mut blocks = Vec::with_capacity(children.len());
    for child in children {
        let name_digest = hasher.metadata(sys::os_bytes(child.base_name()))?;
        let meta_digest = hasher.metadata(&encode_sys(mask, child))?;
        // When xattrs are unselected the block simply has no xattr
        // segment; that is distinct from appending a digest of empty
        // input.
        let xattr_digest = if mask.attrs.contains(Attrs::XATTR) {
            let raw = sys::xattr_bytes(&child.path).map_err(|e| {
                io::Error::other(format!("xattr `{}': {}", child.path.display(), e))
            })?;
            hasher.metadata(&raw)?
        } else {
            Vec::new()
        };

        let mut block = Vec::with_capacity(
            name_digest.len() + child.digest.len() + meta_digest.len() + xattr_digest.len(),
        );
        block.extend_from_slice(&name_digest);
        block.extend_from_slice(&child.digest);
        block.extend_from_slice(&meta_digest);
        block.extend_from_slice(&xattr_digest);
        blocks.push(block);
    }

    blocks.sort();
    hasher.tree(&blocks)
}
