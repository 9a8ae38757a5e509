//! Streaming SHA-256 content hashing.

use crate::error::{IoResultExt, SnapshotResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Bytes read per chunk when hashing a file.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the SHA-256 hash of arbitrary bytes, returned as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hash everything a reader yields, one chunk at a time.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash a file on disk without loading it into memory.
pub fn hash_file(path: &Path) -> SnapshotResult<String> {
    let file = File::open(path).at(path)?;
    hash_reader(file).at(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_file_matches_reference_hasher() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        // Spans several chunks and ends mid-chunk
        let data = vec![0x5au8; CHUNK_SIZE * 2 + 17];
        std::fs::write(&path, &data).unwrap();

        let expected = hex::encode(Sha256::digest(&data));
        assert_eq!(hash_file(&path).unwrap(), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_single_byte_change_changes_hash() {
        let mut data = vec![7u8; 4096];
        let original = hash_bytes(&data);
        data[2048] ^= 0x01;
        assert_ne!(hash_bytes(&data), original);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = hash_file(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, crate::SnapshotError::Io { .. }));
    }
}
