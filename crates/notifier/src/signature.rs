//! Request signing for Feishu custom bots.
//!
//! `sign = base64(HMAC-SHA256(key = "{timestamp}\n{secret}", data = ""))`.
//! The string-to-sign is the HMAC *key* and the signed message is empty; this
//! is what the platform verifies, so it must not be "corrected".

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signature fields merged into a signed request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Unix time in seconds.
    pub timestamp: i64,
    /// Base64 HMAC-SHA256 digest.
    pub sign: String,
}

impl Signature {
    pub fn compute(timestamp: i64, secret: &str) -> Result<Self, hmac::digest::InvalidLength> {
        let string_to_sign = format!("{timestamp}\n{secret}");
        let mac = HmacSha256::new_from_slice(string_to_sign.as_bytes())?;
        let sign = STANDARD.encode(mac.finalize().into_bytes());
        Ok(Self { timestamp, sign })
    }

    /// Merge `timestamp` and `sign` (both as strings) into the top level of a JSON object.
    pub fn apply_to(&self, body: &mut Value) {
        if let Value::Object(map) = body {
            map.insert(
                "timestamp".to_string(),
                Value::String(self.timestamp.to_string()),
            );
            map.insert("sign".to_string(), Value::String(self.sign.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_known_vector() {
        let sig = Signature::compute(1_700_000_000, "test-secret").unwrap();
        assert_eq!(sig.sign, "mbm4Y4oluIPQ00qlBIhX8vAZ0EKv3nw0LuTb91jPL84=");
    }

    #[test]
    fn test_deterministic() {
        let a = Signature::compute(1_700_000_000, "test-secret").unwrap();
        let b = Signature::compute(1_700_000_000, "test-secret").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_changes_with_timestamp_or_secret() {
        let base = Signature::compute(1_700_000_000, "test-secret").unwrap();

        let later = Signature::compute(1_700_000_001, "test-secret").unwrap();
        assert_eq!(later.sign, "wlkWJ5yHBgxkfCL58e+uYjHfCsGBZymTcoZgyih2z6M=");
        assert_ne!(base.sign, later.sign);

        let other_secret = Signature::compute(1_700_000_000, "test-secreT").unwrap();
        assert_eq!(
            other_secret.sign,
            "FrqIZ87BIvcnWwYNHsh17NdLWfcnf+bsDxkzNmNEPTQ="
        );
        assert_ne!(base.sign, other_secret.sign);
    }

    #[test]
    fn test_apply_to_adds_string_fields() {
        let sig = Signature::compute(1_700_000_000, "test-secret").unwrap();
        let mut body = json!({"msg_type": "text", "content": {"text": "hi"}});
        sig.apply_to(&mut body);

        assert_eq!(body["timestamp"], "1700000000");
        assert_eq!(body["sign"], "mbm4Y4oluIPQ00qlBIhX8vAZ0EKv3nw0LuTb91jPL84=");
        assert_eq!(body["msg_type"], "text");
    }
}
