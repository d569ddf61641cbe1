//! Content hashing
//!
//! Files are hashed with MD5 in a streaming fashion, so memory use stays
//! bounded no matter how large a video or document is. Only the first
//! [`DIGEST_PREFIX_LEN`](crate::naming::DIGEST_PREFIX_LEN) hex characters end up
//! in a name, git short-hash style.

use crate::error::{AutorenameError, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUFFER_SIZE: usize = 8192;

/// Produces a stable hex digest of a file's full content
pub trait ContentHasher {
    /// Hash the file at `path`
    ///
    /// Read failures are returned, never swallowed.
    fn hash_file(&self, path: &Path) -> Result<String>;
}

/// Default hasher: MD5, 32 lowercase hex characters
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl ContentHasher for Md5Hasher {
    fn hash_file(&self, path: &Path) -> Result<String> {
        hash_file_content(path)
    }
}

/// Hash a file's content using MD5
///
/// # Errors
///
/// [`AutorenameError::FileRead`] if the file cannot be opened or read
pub fn hash_file_content(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| AutorenameError::file_read(path, e))?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| AutorenameError::file_read(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash in-memory data using MD5
pub fn hash_data(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}
