//! Scene fingerprints.
//!
//! Values are routed through `serde_json::Value` first; its map is ordered by
//! key, so the digest does not depend on field declaration order.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the value's key-ordered JSON.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let ordered = serde_json::to_value(value)?;
    let digest = Sha256::digest(serde_json::to_vec(&ordered)?);
    Ok(format!("{:x}", digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let hash = fingerprint(&json!({"rotation": 15.0})).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a = json!({"scale": 0.5, "opacity": 0.85, "nested": {"y": 1, "x": 2}});
        let b = json!({"nested": {"x": 2, "y": 1}, "opacity": 0.85, "scale": 0.5});
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_detects_change() {
        let a = json!({"rotation": 15.0});
        let b = json!({"rotation": 30.0});
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }
}
