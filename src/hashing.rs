//! Run Fingerprints - SHA-256 over canonical JSON
//!
//! Two runs over an unchanged tree must produce the same fingerprint.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 hex of the compact JSON form of `value`. Object keys serialize in
/// sorted order, so field order never changes the result.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_string(&serde_json::to_value(value)?)?;
    Ok(Sha256::digest(canonical.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}
