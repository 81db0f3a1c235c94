use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use portal_core::utils::signature::{sign_payload, verify_payload};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SESSION_COOKIE: &str = "committee_auth";

/// Identity carried by a verified session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,

    #[error("session signature mismatch")]
    BadSignature,
}

/// Issues and validates tamper-evident session cookies.
///
/// Token format: `base64url(JSON payload) "." hex(HMAC-SHA256 of the encoded
/// payload)`. The signature makes tampering detectable independent of the
/// gate's allow-list check.
#[derive(Clone)]
pub struct SessionService {
    secret: Secret<String>,
    max_age: time::Duration,
}

impl SessionService {
    pub fn new(config: &crate::config::SessionConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            max_age: time::Duration::days(config.max_age_days),
        }
    }

    pub fn encode(&self, user: &SessionUser) -> Result<String, anyhow::Error> {
        let payload = serde_json::to_string(user)?;
        let encoded = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        let signature = sign_payload(self.secret.expose_secret(), &encoded)?;
        Ok(format!("{}.{}", encoded, signature))
    }

    pub fn decode(&self, token: &str) -> Result<SessionUser, SessionError> {
        let (encoded, signature) = token.split_once('.').ok_or(SessionError::Malformed)?;

        let valid = verify_payload(self.secret.expose_secret(), encoded, signature)
            .map_err(|_| SessionError::Malformed)?;
        if !valid {
            return Err(SessionError::BadSignature);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| SessionError::Malformed)?;
        serde_json::from_slice(&payload).map_err(|_| SessionError::Malformed)
    }

    /// Build the session cookie for a verified member.
    pub fn issue(&self, user: &SessionUser) -> Result<Cookie<'static>, anyhow::Error> {
        let token = self.encode(user)?;

        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Lax)
            .max_age(self.max_age)
            .build())
    }

    /// Cookie matching the session cookie's name and path, for removal.
    pub fn removal() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn service() -> SessionService {
        SessionService::new(&SessionConfig {
            secret: Secret::new("test-session-secret".to_string()),
            max_age_days: 30,
        })
    }

    #[test]
    fn test_round_trip() {
        let sessions = service();
        let user = SessionUser {
            email: "alice@example.com".to_string(),
        };

        let token = sessions.encode(&user).unwrap();
        let decoded = sessions.decode(&token).unwrap();
        assert_eq!(decoded.email, "alice@example.com");
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sessions = service();
        let token = sessions
            .encode(&SessionUser {
                email: "alice@example.com".to_string(),
            })
            .unwrap();

        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload =
            URL_SAFE_NO_PAD.encode(br#"{"email":"intruder@example.com"}"#);
        let forged = format!("{}.{}", forged_payload, signature);

        assert!(matches!(
            sessions.decode(&forged),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let sessions = service();
        assert!(sessions.decode("not-a-session-token").is_err());
        assert!(sessions.decode("").is_err());
        assert!(sessions.decode("a.b.c").is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let sessions = service();
        let other = SessionService::new(&SessionConfig {
            secret: Secret::new("a-different-secret".to_string()),
            max_age_days: 30,
        });

        let token = other
            .encode(&SessionUser {
                email: "alice@example.com".to_string(),
            })
            .unwrap();

        assert!(matches!(
            sessions.decode(&token),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn test_cookie_attributes() {
        let sessions = service();
        let cookie = sessions
            .issue(&SessionUser {
                email: "alice@example.com".to_string(),
            })
            .unwrap();

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(30)));
    }
}
