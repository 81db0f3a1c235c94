use chrono::Utc;
use portal_core::error::AppError;
use std::sync::Arc;

use crate::services::content::ContentRepository;
use crate::services::email::EmailProvider;
use crate::services::session::SessionUser;
use crate::services::verification::{generate_code, VerificationStore};

/// One-time-code issuance and verification.
#[derive(Clone)]
pub struct AuthService {
    content: Arc<dyn ContentRepository>,
    email: Arc<dyn EmailProvider>,
    codes: VerificationStore,
}

impl AuthService {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        email: Arc<dyn EmailProvider>,
        codes: VerificationStore,
    ) -> Self {
        Self {
            content,
            email,
            codes,
        }
    }

    /// Check the member registry, store a fresh code, and dispatch it.
    #[tracing::instrument(skip(self))]
    pub async fn issue_code(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("Email is required")));
        }

        // Authorization goes straight to the members collection, not the
        // allow-list cache: a brand-new member can log in immediately.
        let member = self.content.find_member_by_email(email).await.map_err(|e| {
            tracing::error!(error = %e, "Member lookup failed");
            AppError::InternalError(anyhow::anyhow!("Failed to check member registry"))
        })?;

        if member.is_none() {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "This email is not authorized to access the committee portal."
            )));
        }

        let code = generate_code();

        // Store before dispatch; an undelivered code simply expires unused
        self.codes.issue(email, code.clone(), Utc::now());

        self.email.send_verification_code(email, &code).await?;

        tracing::info!(email = %email.to_lowercase(), "Verification code issued");
        Ok(())
    }

    /// Check a submitted code and, on success, hand back the session identity.
    /// The caller is responsible for writing the session cookie.
    #[tracing::instrument(skip(self, code))]
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<SessionUser, AppError> {
        let email = email.trim();
        if email.is_empty() || code.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Email and code are required"
            )));
        }

        self.codes
            .verify(email, code, Utc::now())
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.to_string())))?;

        let email = email.to_lowercase();
        tracing::info!(email = %email, "Verification code accepted");

        Ok(SessionUser { email })
    }
}
