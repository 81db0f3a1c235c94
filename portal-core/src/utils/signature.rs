use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Generate an HMAC-SHA256 signature over an opaque payload
pub fn sign_payload(secret: &str, payload: &str) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;

    mac.update(payload.as_bytes());
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Verify an HMAC-SHA256 payload signature using constant-time comparison
pub fn verify_payload(secret: &str, payload: &str, signature: &str) -> Result<bool, anyhow::Error> {
    let expected_signature = sign_payload(secret, payload)?;

    // Constant time comparison
    let expected_bytes = expected_signature.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(signature_bytes).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_generation_and_verification() {
        let secret = "my_secret_key";
        let payload = r#"{"email":"member@example.com"}"#;

        let signature = sign_payload(secret, payload).unwrap();
        assert!(!signature.is_empty());

        let is_valid = verify_payload(secret, payload, &signature).unwrap();
        assert!(is_valid);
    }

    #[test]
    fn test_invalid_signature() {
        let secret = "my_secret_key";
        let payload = r#"{"email":"member@example.com"}"#;

        let signature = sign_payload(secret, payload).unwrap();
        let invalid_signature = format!("a{}", &signature[1..]);

        let is_valid = verify_payload(secret, payload, &invalid_signature).unwrap();
        assert!(!is_valid);
    }

    #[test]
    fn test_tampered_payload() {
        let secret = "my_secret_key";
        let payload = r#"{"email":"member@example.com"}"#;

        let signature = sign_payload(secret, payload).unwrap();

        let modified_payload = r#"{"email":"intruder@example.com"}"#;
        let is_valid = verify_payload(secret, modified_payload, &signature).unwrap();
        assert!(!is_valid);
    }

    #[test]
    fn test_wrong_secret() {
        let payload = r#"{"email":"member@example.com"}"#;

        let signature = sign_payload("secret_a", payload).unwrap();
        let is_valid = verify_payload("secret_b", payload, &signature).unwrap();
        assert!(!is_valid);
    }
}
