//! Deterministic content hashing for pack ids.

use serde::Serialize;

use adsopt_core::AdsOptResult;

/// blake3 hex digest of the value's JSON serialization.
///
/// Only hash structs and `serde_json::Value`s (sorted maps); a `HashMap` in the
/// input would make the digest order-dependent.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> AdsOptResult<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Short, prefixed id derived from a digest, e.g. `fp_3f9a0c1d2e4b5a67`.
pub fn short_id(prefix: &str, digest: &str) -> String {
    let end = digest.len().min(16);
    format!("{}_{}", prefix, &digest[..end])
}
