//! Canonical hashing of snapshots and files.
//!
//! Snapshots are serialized as compact JSON in struct field order. Every map in
//! the model is a `BTreeMap` and every list is sorted by its producer, so the
//! same logical snapshot always yields the same bytes.

use crate::types::HexDigest;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Digest and encoded length of one canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDigest {
    pub hash: HexDigest,
    pub bytes: usize,
}

/// Canonical byte encoding of a snapshot value.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Hash the canonical encoding of `value`.
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<CanonicalDigest, serde_json::Error> {
    let data = canonical_bytes(value)?;
    Ok(CanonicalDigest {
        hash: sha256_hex(&data),
        bytes: data.len(),
    })
}

/// `sha256(prefix ":" delta ":")`, the artifact identity.
pub fn combined_hash(prefix_hash: &str, delta_hash: &str) -> HexDigest {
    hash_parts(&[prefix_hash, delta_hash])
}

/// SHA-256 over each part followed by a `:` terminator.
pub fn hash_parts(parts: &[&str]) -> HexDigest {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b":");
    }
    hex::encode(hasher.finalize())
}

pub fn sha256_hex(data: &[u8]) -> HexDigest {
    hex::encode(Sha256::digest(data))
}

/// Stream a file through SHA-256.
pub fn file_sha256(path: &Path) -> io::Result<HexDigest> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
