use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hex SHA-256 of the full file content, streamed in fixed-size chunks.
pub fn fingerprint(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buf)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Digests of originals already claimed during this run.
#[derive(Debug, Default)]
pub struct FingerprintSet {
    seen: HashSet<String>,
}

impl FingerprintSet {
    /// Insert `digest`, returning `false` when it was already present.
    pub fn register_if_new(&mut self, digest: String) -> bool {
        self.seen.insert(digest)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}
