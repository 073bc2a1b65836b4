//! Response cache keys.
//!
//! A key is a SHA-256 digest over a length-prefixed encoding of the effective query:
//! table, each predicate fragment in order, each bound value in order, limit, offset
//! and an optional discriminator.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::application::query::CompiledQuery;

pub const KEY_PREFIX: &str = "crudgate";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for `query`.
///
/// `extra` separates lookups that share a query shape, such as single-object reads
/// keyed by the raw primary key.
pub fn fingerprint(query: &CompiledQuery, extra: Option<&str>) -> CacheKey {
    let mut canonical = Vec::with_capacity(256);

    write_field(&mut canonical, query.table().as_bytes());

    write_len(&mut canonical, query.predicates().len());
    for predicate in query.predicates() {
        write_field(&mut canonical, predicate.fragment().as_bytes());
    }

    write_len(&mut canonical, query.bound_values().count());
    for value in query.bound_values() {
        value.write_canonical(&mut canonical);
    }

    canonical.extend_from_slice(&query.limit().to_le_bytes());
    canonical.extend_from_slice(&query.offset().to_le_bytes());

    match extra {
        Some(extra) => {
            canonical.push(1);
            write_field(&mut canonical, extra.as_bytes());
        }
        None => canonical.push(0),
    }

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    CacheKey(format!(
        "{KEY_PREFIX}:{}:{}",
        query.table(),
        hex::encode(hasher.finalize())
    ))
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u64).to_le_bytes());
}

fn write_field(out: &mut Vec<u8>, bytes: &[u8]) {
    write_len(out, bytes.len());
    out.extend_from_slice(bytes);
}
