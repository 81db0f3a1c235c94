use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::services::content::ContentRepository;

/// Authorized emails are cached so the gate does not hit the content
/// repository on every request.
pub const ALLOWLIST_TTL_MINUTES: i64 = 5;

#[derive(Default)]
struct CacheSlot {
    emails: Arc<HashSet<String>>,
    expires_at: Option<DateTime<Utc>>,
}

/// Process-wide, time-bounded cache of emails permitted to authenticate.
///
/// The set is replaced wholesale on refresh; a failed refresh keeps serving
/// the previous (possibly stale or empty) set. An empty set means "no one
/// authorized", never an error.
#[derive(Clone)]
pub struct AllowlistCache {
    inner: Arc<Inner>,
}

struct Inner {
    content: Arc<dyn ContentRepository>,
    slot: RwLock<CacheSlot>,
}

impl AllowlistCache {
    pub fn new(content: Arc<dyn ContentRepository>) -> Self {
        Self {
            inner: Arc::new(Inner {
                content,
                slot: RwLock::new(CacheSlot::default()),
            }),
        }
    }

    pub async fn authorized_emails(&self) -> Arc<HashSet<String>> {
        self.authorized_emails_at(Utc::now()).await
    }

    /// Expiry decisions take an explicit `now` so tests control the clock.
    pub async fn authorized_emails_at(&self, now: DateTime<Utc>) -> Arc<HashSet<String>> {
        {
            let slot = self.inner.slot.read().await;
            if !slot.emails.is_empty() && slot.expires_at.is_some_and(|at| now < at) {
                return slot.emails.clone();
            }
        }

        match self.inner.content.active_members().await {
            Ok(members) => {
                let emails: HashSet<String> = members
                    .into_iter()
                    .filter_map(|m| m.email)
                    .map(|e| e.to_lowercase())
                    .collect();
                let emails = Arc::new(emails);

                // Full replace; concurrent refreshes race benignly (last write wins)
                let mut slot = self.inner.slot.write().await;
                slot.emails = emails.clone();
                slot.expires_at = Some(now + Duration::minutes(ALLOWLIST_TTL_MINUTES));
                emails
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to fetch authorized emails from content repository"
                );
                self.inner.slot.read().await.emails.clone()
            }
        }
    }
}
