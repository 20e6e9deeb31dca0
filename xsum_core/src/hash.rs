//! Hash providers: native digest algorithms and external plugins.
//!
//! The walker consumes a [`Hasher`] through three operations: `metadata`
//! over raw bytes, `data` over a stream, and `tree` over a block list.
//! All three run the same digest function, so identical byte streams give
//! identical digests regardless of how they arrive.

use crate::error::{Error, Result};
use digest::DynDigest;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

const READ_BUF: usize = 64 * 1024;

/// A digest algorithm usable from any walker concurrently.
pub trait Hasher: Send + Sync {
    /// Algorithm name as given on the command line.
    fn name(&self) -> &str;

    /// Fixed digest width in bytes; `None` for plugins, where the width
    /// is only known after the first invocation.
    fn output_size(&self) -> Option<usize>;

    /// Digest of a byte slice.
    fn metadata(&self, bytes: &[u8]) -> io::Result<Vec<u8>>;

    /// Digest of a stream; the input is never buffered whole.
    fn data(&self, reader: &mut dyn Read) -> io::Result<Vec<u8>>;

    /// Digest of the concatenation of `blocks`, in the order given.
    fn tree(&self, blocks: &[Vec<u8>]) -> io::Result<Vec<u8>>;
}

/// Resolve an algorithm name to a provider.
///
/// Bare names come from the native registry; a name containing a path
/// separator is taken as the path of a plugin executable.
pub fn parse(name: &str) -> Result<Arc<dyn Hasher>> {
    if let Some(native) = NativeHasher::lookup(name) {
        return Ok(Arc::new(native));
    }
    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        return Ok(Arc::new(PluginHasher::new(name)));
    }
    Err(Error::unsupported_algorithm(name))
}

type DigestFactory = fn() -> Box<dyn DynDigest + Send>;

fn new_md5() -> Box<dyn DynDigest + Send> {
    Box::new(md5::Md5::default())
}

fn new_sha1() -> Box<dyn DynDigest + Send> {
    Box::new(sha1::Sha1::default())
}

fn new_sha224() -> Box<dyn DynDigest + Send> {
    Box::new(sha2::Sha224::default())
}

fn new_sha256() -> Box<dyn DynDigest + Send> {
    Box::new(sha2::Sha256::default())
}

fn new_sha384() -> Box<dyn DynDigest + Send> {
    Box::new(sha2::Sha384::default())
}

fn new_sha512() -> Box<dyn DynDigest + Send> {
    Box::new(sha2::Sha512::default())
}

fn new_blake3() -> Box<dyn DynDigest + Send> {
    Box::new(blake3::Hasher::new())
}

const REGISTRY: [(&str, usize, DigestFactory); 7] = [
    ("md5", 16, new_md5),
    ("sha1", 20, new_sha1),
    ("sha224", 28, new_sha224),
    ("sha256", 32, new_sha256),
    ("sha384", 48, new_sha384),
    ("sha512", 64, new_sha512),
    ("blake3", 32, new_blake3),
];

/// In-process provider backed by a RustCrypto digest.
pub struct NativeHasher {
    name: &'static str,
    size: usize,
    new_digest: DigestFactory,
}

impl NativeHasher {
    /// Look up a native algorithm by name.
    pub fn lookup(name: &str) -> Option<NativeHasher> {
        REGISTRY
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|&(name, size, new_digest)| NativeHasher {
                name,
                size,
                new_digest,
            })
    }
}

impl Hasher for NativeHasher {
    fn name(&self) -> &str {
        self.name
    }

    fn output_size(&self) -> Option<usize> {
        Some(self.size)
    }

    fn metadata(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut digest = (self.new_digest)();
        digest.update(bytes);
        Ok(digest.finalize().into_vec())
    }

    fn data(&self, reader: &mut dyn Read) -> io::Result<Vec<u8>> {
        let mut digest = (self.new_digest)();
        let mut buf = [0u8; READ_BUF];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            digest.update(&buf[..n]);
        }
        Ok(digest.finalize().into_vec())
    }

    fn tree(&self, blocks: &[Vec<u8>]) -> io::Result<Vec<u8>> {
        let mut digest = (self.new_digest)();
        for block in blocks {
            digest.update(block);
        }
        Ok(digest.finalize().into_vec())
    }
}

/// Out-of-process provider: one subprocess per digest call.
///
/// The subprocess sees a single environment variable, `XSUM_PLUGIN_TYPE`,
/// naming the operation; input arrives on stdin and the raw digest is read
/// from stdout.
pub struct PluginHasher {
    name: String,
    path: PathBuf,
}

impl PluginHasher {
    pub fn new(path: impl Into<String>) -> PluginHasher {
        let name = path.into();
        PluginHasher {
            path: PathBuf::from(&name),
            name,
        }
    }

    fn command(&self, input: &mut dyn Read, kind: &str) -> io::Result<Vec<u8>> {
        let mut child = Command::new(&self.path)
            .env_clear()
            .env("XSUM_PLUGIN_TYPE", kind)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stdin is piped, so take() always yields it. A plugin may exit
        // without draining its input; the exit status decides then.
        if let Some(mut stdin) = child.stdin.take() {
            match io::copy(input, &mut stdin) {
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
                Err(err) => return Err(err),
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(io::Error::other(format!(
                "plugin error: {}",
                stderr.trim_end()
            )));
        }
        Ok(output.stdout)
    }
}

impl Hasher for PluginHasher {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_size(&self) -> Option<usize> {
        None
    }

    fn metadata(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        self.command(&mut io::Cursor::new(bytes), "metadata")
    }

    fn data(&self, reader: &mut dyn Read) -> io::Result<Vec<u8>> {
        self.command(reader, "data")
    }

    fn tree(&self, blocks: &[Vec<u8>]) -> io::Result<Vec<u8>> {
        let joined: Vec<u8> = blocks.iter().flatten().copied().collect();
        self.command(&mut io::Cursor::new(joined), "tree")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256() -> NativeHasher {
        NativeHasher::lookup("sha256").unwrap()
    }

    #[test]
    fn sha256_known_vector() {
        let digest = sha256().metadata(b"hello\n").unwrap();
        assert_eq!(
            hex::encode(digest),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn sha256_empty_input() {
        let digest = sha256().tree(&[]).unwrap();
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn blake3_known_vector() {
        let hasher = NativeHasher::lookup("blake3").unwrap();
        let digest = hasher.metadata(b"hello world").unwrap();
        assert_eq!(
            hex::encode(digest),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn registry_sizes_match_digests() {
        for (name, size, _) in REGISTRY {
            let hasher = NativeHasher::lookup(name).unwrap();
            assert_eq!(hasher.output_size(), Some(size));
            assert_eq!(hasher.metadata(b"x").unwrap().len(), size, "{name}");
        }
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert!(parse("sha256").is_ok());
        assert!(parse("sha257").is_err());
    }

    #[test]
    fn parse_accepts_plugin_paths() {
        let hasher = parse("/usr/local/bin/xsum-k12").unwrap();
        assert_eq!(hasher.output_size(), None);
    }

    #[test]
    fn operations_agree_on_identical_bytes() {
        let hasher = sha256();
        let bytes = b"same bytes either way".to_vec();
        let from_metadata = hasher.metadata(&bytes).unwrap();
        let from_data = hasher.data(&mut io::Cursor::new(&bytes)).unwrap();
        let from_tree = hasher.tree(&[bytes]).unwrap();
        assert_eq!(from_metadata, from_data);
        assert_eq!(from_metadata, from_tree);
    }

    #[cfg(unix)]
    #[test]
    fn plugin_identity() {
        // `cat` echoes stdin, acting as an identity "digest".
        let plugin = PluginHasher::new("/bin/cat");
        assert_eq!(plugin.metadata(b"abc").unwrap(), b"abc");
        assert_eq!(
            plugin.data(&mut io::Cursor::new(b"stream".to_vec())).unwrap(),
            b"stream"
        );
        assert_eq!(
            plugin.tree(&[b"ab".to_vec(), b"cd".to_vec()]).unwrap(),
            b"abcd"
        );
    }

    #[cfg(unix)]
    #[test]
    fn plugin_failure_carries_stderr() {
        let plugin = PluginHasher::new("/bin/false");
        let err = plugin.metadata(b"abc").unwrap_err();
        assert!(err.to_string().contains("plugin error"));
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        /// The same bytes digest identically through every operation.
        #[test]
        fn prop_operations_consistent(data: Vec<u8>) {
            let hasher = sha256();
            let m = hasher.metadata(&data).unwrap();
            let d = hasher.data(&mut io::Cursor::new(&data)).unwrap();
            let t = hasher.tree(&[data.clone()]).unwrap();
            prop_assert_eq!(&m, &d);
            prop_assert_eq!(&m, &t);
        }

        /// Tree digests depend only on the concatenated bytes.
        #[test]
        fn prop_tree_is_concatenation(a: Vec<u8>, b: Vec<u8>) {
            let hasher = sha256();
            let split = hasher.tree(&[a.clone(), b.clone()]).unwrap();
            let mut joined = a;
            joined.extend_from_slice(&b);
            let whole = hasher.metadata(&joined).unwrap();
            prop_assert_eq!(split, whole);
        }
    }
}
