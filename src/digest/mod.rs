//! Content digests used by the watcher to detect file changes.
//!
//! A [`ContentDigest`] is a SHA-256 fingerprint of a file's bytes.  Equality
//! of digests is the watcher's only notion of "unchanged"; cryptographic
//! strength is incidental, collision avoidance at file-edit rates is what
//! matters.

use std::fmt;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// ContentDigest
// ---------------------------------------------------------------------------

/// Fixed-size fingerprint of file content.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ContentDigest([u8; 32]);

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl ContentDigest {
    /// Lowercase hex rendering, mainly for logs.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

// ---------------------------------------------------------------------------
// Digest functions
// ---------------------------------------------------------------------------

/// Digest an in-memory byte slice.
pub fn digest_bytes(bytes: &[u8]) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    ContentDigest(hasher.finalize().into())
}

/// Digest the file at `path`.
///
/// Returns `Ok(None)` when the file does not exist — the watcher treats a
/// missing file as "skip this tick", not as an error.  An actual read failure
/// is returned as `Err` so the caller can abandon the tick.
pub fn digest_file(path: &Path) -> io::Result<Option<ContentDigest>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    Ok(Some(digest_bytes(&bytes)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
