//! Content digests for duplicate detection.
//!
//! Files are streamed through MD5 in fixed-size chunks, so memory use does not
//! depend on file size. MD5 is plenty for spotting byte-identical files; it is
//! not used for anything security related.
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size used when streaming file content.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// A 128-bit content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 16]);

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Computes content digests by streaming readers in bounded chunks.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    chunk_size: usize,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::with_chunk_size(CHUNK_SIZE)
    }

    /// A zero chunk size is bumped to one byte.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Digests the file at `path`.
    ///
    /// Read failures are returned to the caller, which decides whether the
    /// file can still be processed without a digest.
    pub fn digest(&self, path: &Path) -> io::Result<ContentDigest> {
        let file = File::open(path)?;
        self.digest_reader(file)
    }

    /// Digests everything readable from `reader`.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentDigest> {
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => context.consume(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(ContentDigest(context.compute().0))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
