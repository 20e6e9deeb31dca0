//! Platform metadata extraction.
//!
//! Pulls uid/gid/device/timestamps out of a `stat` result and reads
//! extended attributes as a canonical byte sequence. On non-unix platforms
//! everything degrades to zeros and an empty attribute list; digests that
//! select platform attributes are not expected to agree across platforms.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::io;
use std::path::Path;

/// Seconds and nanoseconds of a file timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

/// Platform metadata record for one path. Absent fields are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SysProps {
    pub uid: u32,
    pub gid: u32,
    /// Device id (rdev) of device and character-device nodes.
    pub device: u64,
    pub mtime: Timespec,
    pub ctime: Timespec,
}

/// Extract platform metadata from a stat result.
#[cfg(unix)]
pub fn sys_props(meta: &Metadata) -> SysProps {
    use std::os::unix::fs::MetadataExt;

    SysProps {
        uid: meta.uid(),
        gid: meta.gid(),
        device: meta.rdev(),
        mtime: Timespec {
            sec: meta.mtime(),
            nsec: meta.mtime_nsec(),
        },
        ctime: Timespec {
            sec: meta.ctime(),
            nsec: meta.ctime_nsec(),
        },
    }
}

/// Extract platform metadata from a stat result (non-unix fallback).
#[cfg(not(unix))]
pub fn sys_props(_meta: &Metadata) -> SysProps {
    SysProps::default()
}

/// Raw `st_mode` bits: file type, setuid/setgid/sticky, permissions.
#[cfg(unix)]
pub fn mode_bits(meta: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.mode()
}

/// Synthesized mode bits for platforms without `st_mode`.
#[cfg(not(unix))]
pub fn mode_bits(meta: &Metadata) -> u32 {
    use crate::node::mode;

    if meta.is_dir() {
        mode::DIR | 0o755
    } else if meta.is_symlink() {
        mode::SYMLINK | 0o777
    } else {
        mode::REGULAR | 0o644
    }
}

/// Canonical byte encoding of a path's extended attributes.
///
/// Layout: `count: u32 LE`, then for each attribute in ascending name
/// order: `name_len: u32 LE`, name bytes, `value_len: u32 LE`, value
/// bytes. A path with no attributes encodes as the 4-byte zero count.
#[cfg(unix)]
pub fn xattr_bytes(path: &Path) -> io::Result<Vec<u8>> {
    let mut names: Vec<_> = xattr::list(path)?.collect();
    names.sort();

    let mut buf = Vec::new();
    buf.extend_from_slice(&(names.len() as u32).to_le_bytes());
    for name in names {
        let value = xattr::get(path, &name)?.unwrap_or_default();
        let name = os_bytes(&name);
        buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
        buf.extend_from_slice(name);
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(&value);
    }
    Ok(buf)
}

/// Canonical xattr encoding (non-unix fallback): always the empty list.
#[cfg(not(unix))]
pub fn xattr_bytes(_path: &Path) -> io::Result<Vec<u8>> {
    Ok(0u32.to_le_bytes().to_vec())
}

/// Raw bytes of an OS string, as the filesystem sees them.
#[cfg(unix)]
pub fn os_bytes(s: &OsStr) -> &[u8] {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes()
}

/// Raw bytes of an OS string (non-unix fallback via UTF-8).
#[cfg(not(unix))]
pub fn os_bytes(s: &OsStr) -> &[u8] {
    s.to_str().map(str::as_bytes).unwrap_or_default()
}
