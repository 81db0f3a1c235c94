use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

/// Codes live for ten minutes, matching the email copy.
pub const CODE_TTL_MINUTES: i64 = 10;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

#[derive(Debug, Clone)]
pub struct VerificationRecord {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("No verification code found. Please request a new code.")]
    NotFound,

    #[error("Verification code has expired. Please request a new code.")]
    Expired,

    #[error("Invalid verification code. Please try again.")]
    Mismatch,
}

/// Process-wide store of pending one-time codes, keyed by lowercased email.
///
/// At most one live record per email; a new issuance overwrites any prior
/// record so only the latest code ever verifies. State is process-local and
/// lost on restart.
#[derive(Clone, Default)]
pub struct VerificationStore {
    records: Arc<DashMap<String, VerificationRecord>>,
}

impl VerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh code for the email, replacing any existing record.
    pub fn issue(&self, email: &str, code: String, now: DateTime<Utc>) {
        self.records.insert(
            email.to_lowercase(),
            VerificationRecord {
                code,
                expires_at: now + Duration::minutes(CODE_TTL_MINUTES),
            },
        );
    }

    /// Insert a record as-is; lets tests control expiry directly.
    pub fn insert(&self, email: &str, record: VerificationRecord) {
        self.records.insert(email.to_lowercase(), record);
    }

    pub fn get(&self, email: &str) -> Option<VerificationRecord> {
        self.records
            .get(&email.to_lowercase())
            .map(|r| r.value().clone())
    }

    /// Check a submitted code.
    ///
    /// Expired records are removed on detection; a mismatch leaves the record
    /// in place so the user can retry; a match consumes it (single use).
    pub fn verify(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<(), CodeError> {
        let key = email.to_lowercase();

        let record = match self.records.get(&key) {
            Some(r) => r.value().clone(),
            None => return Err(CodeError::NotFound),
        };

        if now > record.expires_at {
            self.records.remove(&key);
            return Err(CodeError::Expired);
        }

        if record.code != code {
            return Err(CodeError::Mismatch);
        }

        self.records.remove(&key);
        Ok(())
    }
}

/// Uniform random 6-digit code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(CODE_MIN..=CODE_MAX).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, expires_at: DateTime<Utc>) -> VerificationRecord {
        VerificationRecord {
            code: code.to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((CODE_MIN..=CODE_MAX).contains(&value));
        }
    }

    #[test]
    fn test_verify_consumes_record() {
        let store = VerificationStore::new();
        let now = Utc::now();

        store.issue("alice@example.com", "123456".to_string(), now);
        assert!(store.verify("alice@example.com", "123456", now).is_ok());

        // Single use: the same code no longer exists
        assert_eq!(
            store.verify("alice@example.com", "123456", now),
            Err(CodeError::NotFound)
        );
    }

    #[test]
    fn test_mismatch_preserves_record() {
        let store = VerificationStore::new();
        let now = Utc::now();

        store.issue("alice@example.com", "123456".to_string(), now);
        assert_eq!(
            store.verify("alice@example.com", "000000", now),
            Err(CodeError::Mismatch)
        );

        // Retry with the right code still succeeds
        assert!(store.verify("alice@example.com", "123456", now).is_ok());
    }

    #[test]
    fn test_expired_record_is_removed() {
        let store = VerificationStore::new();
        let now = Utc::now();

        store.insert(
            "alice@example.com",
            record("123456", now - Duration::seconds(1)),
        );
        assert_eq!(
            store.verify("alice@example.com", "123456", now),
            Err(CodeError::Expired)
        );
        assert_eq!(
            store.verify("alice@example.com", "123456", now),
            Err(CodeError::NotFound)
        );
    }

    #[test]
    fn test_reissue_overwrites_previous_code() {
        let store = VerificationStore::new();
        let now = Utc::now();

        store.issue("alice@example.com", "111111".to_string(), now);
        store.issue("alice@example.com", "222222".to_string(), now);

        assert_eq!(
            store.verify("alice@example.com", "111111", now),
            Err(CodeError::Mismatch)
        );
        assert!(store.verify("alice@example.com", "222222", now).is_ok());
    }

    #[test]
    fn test_email_keys_are_case_insensitive() {
        let store = VerificationStore::new();
        let now = Utc::now();

        store.issue("Alice@Example.com", "123456".to_string(), now);
        assert!(store.verify("alice@example.com", "123456", now).is_ok());
    }

    #[test]
    fn test_expiry_window_is_ten_minutes() {
        let store = VerificationStore::new();
        let now = Utc::now();

        store.issue("alice@example.com", "123456".to_string(), now);

        let just_inside = now + Duration::minutes(CODE_TTL_MINUTES) - Duration::seconds(1);
        let record = store.get("alice@example.com").unwrap();
        assert!(just_inside < record.expires_at);

        let just_outside = now + Duration::minutes(CODE_TTL_MINUTES) + Duration::seconds(1);
        assert_eq!(
            store.verify("alice@example.com", "123456", just_outside),
            Err(CodeError::Expired)
        );
    }
}
