//! Checksum line formatting and parsing.
//!
//! Sum mode emits one line per top-level path; check mode reads the same
//! lines back. Directory lines carry the mask after the digest, since the
//! digest depends on it.

use std::path::{Path, PathBuf};
use xsum_core::{Mask, Node};

/// Format one output line for a hashed node.
pub fn format_node(node: &Node, mask: &Mask) -> String {
    let digest = hex::encode(&node.digest);
    let path = slash_path(&node.path);
    if node.is_dir() {
        format!("{digest}:{mask}  {path}")
    } else {
        format!("{digest}  {path}")
    }
}

/// Path with platform separators normalized to forward slashes.
pub fn slash_path(path: &Path) -> String {
    #[cfg(windows)]
    {
        path.display().to_string().replace('\\', "/")
    }
    #[cfg(not(windows))]
    {
        path.display().to_string()
    }
}

/// One parsed checksum line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumLine {
    /// Expected digest, lowercase hex.
    pub digest: String,
    /// Mask suffix of a directory line, verbatim.
    pub mask: Option<String>,
    pub path: PathBuf,
}

/// Parse a `<hex>[:<mask>]  <path>` line. Returns `None` for lines that
/// do not have that shape.
pub fn parse_line(line: &str) -> Option<ChecksumLine> {
    let (sum, path) = line.split_once("  ")?;
    if sum.is_empty() || path.is_empty() {
        return None;
    }

    let (digest, mask) = match sum.split_once(':') {
        Some((digest, mask)) => (digest, Some(mask.to_string())),
        None => (sum, None),
    };
    if digest.is_empty()
        || digest.len() % 2 != 0
        || !digest.chars().all(|c| c.is_ascii_hexdigit())
    {
        return None;
    }

    Some(ChecksumLine {
        digest: digest.to_ascii_lowercase(),
        mask,
        path: PathBuf::from(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use xsum_core::{mode, SysProps};

    fn node(path: &str, mode: u32) -> Node {
        Node {
            path: PathBuf::from(path),
            digest: vec![0xab; 4],
            mode,
            sys: SysProps::default(),
        }
    }

    #[test]
    fn file_line_has_no_mask() {
        let line = format_node(&node("a.txt", mode::REGULAR | 0o644), &Mask::default());
        assert_eq!(line, "abababab  a.txt");
    }

    #[test]
    fn directory_line_echoes_the_mask() {
        let mask = Mask::parse("7777ug").unwrap();
        let line = format_node(&node("d", mode::DIR | 0o755), &mask);
        assert_eq!(line, "abababab:7777ug  d");
    }

    #[test]
    fn parse_file_line() {
        let parsed = parse_line("abababab  a.txt").unwrap();
        assert_eq!(parsed.digest, "abababab");
        assert_eq!(parsed.mask, None);
        assert_eq!(parsed.path, PathBuf::from("a.txt"));
    }

    #[test]
    fn parse_directory_line() {
        let parsed = parse_line("ABAB:0755x  some dir").unwrap();
        assert_eq!(parsed.digest, "abab");
        assert_eq!(parsed.mask.as_deref(), Some("0755x"));
        assert_eq!(parsed.path, PathBuf::from("some dir"));
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        assert!(parse_line("").is_none());
        assert!(parse_line("deadbeef").is_none());
        assert!(parse_line("deadbeef a.txt").is_none()); // single space
        assert!(parse_line("nothex!!  a.txt").is_none());
        assert!(parse_line("abc  odd-length").is_none());
        assert!(parse_line("abab  ").is_none());
    }

    #[test]
    fn format_then_parse_roundtrips() {
        let mask = Mask::parse("0640m").unwrap();
        let dir = node("d", mode::DIR | 0o755);
        let parsed = parse_line(&format_node(&dir, &mask)).unwrap();
        assert_eq!(parsed.digest, "abababab");
        assert_eq!(parsed.mask.as_deref(), Some("0640m"));
        assert_eq!(parsed.path, dir.path);
    }
}
