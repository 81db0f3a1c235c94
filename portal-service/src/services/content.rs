use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{Agenda, Contact, Event, Member, RosterMember, SiteGlobals};

/// Read-only access to the headless CMS backing the portal.
///
/// Failures surface as errors at this boundary; callers decide whether to
/// degrade (allow-list cache) or translate to a response (handlers).
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Exact case-insensitive lookup against the members collection.
    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, anyhow::Error>;

    /// Members with `status == "active"`; feeds the allow-list cache.
    async fn active_members(&self) -> Result<Vec<Member>, anyhow::Error>;

    async fn list_events(&self) -> Result<Vec<Event>, anyhow::Error>;
    async fn list_agendas(&self) -> Result<Vec<Agenda>, anyhow::Error>;
    async fn list_contacts(&self) -> Result<Vec<Contact>, anyhow::Error>;
    async fn member_roster(&self) -> Result<Vec<RosterMember>, anyhow::Error>;
    async fn site_globals(&self) -> Result<SiteGlobals, anyhow::Error>;

    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Deserialize)]
struct ItemsResponse<T> {
    data: Vec<T>,
}

/// Directus REST client with a static access token.
#[derive(Clone)]
pub struct DirectusClient {
    http: reqwest::Client,
    base_url: String,
    token: Secret<String>,
}

impl DirectusClient {
    pub fn new(config: &crate::config::ContentRepositoryConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    async fn read_items<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, anyhow::Error> {
        let url = format!("{}/items/{}", self.base_url, collection);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        let items: ItemsResponse<T> = response.json().await?;
        Ok(items.data)
    }
}

#[async_trait]
impl ContentRepository for DirectusClient {
    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, anyhow::Error> {
        let lowered = email.to_lowercase();
        let mut members: Vec<Member> = self
            .read_items(
                "members",
                &[("fields", "email"), ("filter[email][_eq]", lowered.as_str())],
            )
            .await?;

        Ok(if members.is_empty() {
            None
        } else {
            Some(members.remove(0))
        })
    }

    async fn active_members(&self) -> Result<Vec<Member>, anyhow::Error> {
        self.read_items(
            "members",
            &[("fields", "email"), ("filter[status][_eq]", "active")],
        )
        .await
    }

    async fn list_events(&self) -> Result<Vec<Event>, anyhow::Error> {
        self.read_items("events", &[("fields", "id,title,date,location,description")])
            .await
    }

    async fn list_agendas(&self) -> Result<Vec<Agenda>, anyhow::Error> {
        // Most recent meeting first
        self.read_items(
            "agendas",
            &[
                (
                    "fields",
                    "id,meeting_date,agenda_id,category,agenda_items.id,agenda_items.order,\
                     agenda_items.topic,agenda_items.description",
                ),
                ("sort", "-meeting_date"),
            ],
        )
        .await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, anyhow::Error> {
        self.read_items(
            "contacts",
            &[(
                "fields",
                "id,first_name,last_name,email_address,role,organisation_id.organisation_name",
            )],
        )
        .await
    }

    async fn member_roster(&self) -> Result<Vec<RosterMember>, anyhow::Error> {
        self.read_items(
            "members",
            &[
                ("fields", "id,first_name,last_name,committee_role_id.committee_role"),
                ("sort", "committee_role_id.committee_role,last_name"),
            ],
        )
        .await
    }

    async fn site_globals(&self) -> Result<SiteGlobals, anyhow::Error> {
        let mut globals: Vec<SiteGlobals> = self
            .read_items("site_globals", &[("fields", "site_title,site_description")])
            .await?;

        Ok(if globals.is_empty() {
            SiteGlobals::default()
        } else {
            globals.remove(0)
        })
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let url = format!("{}/server/ping", self.base_url);
        self.http.get(&url).send().await?.error_for_status()?;
        Ok(())
    }
}

/// In-memory content repository used by tests.
#[derive(Default)]
pub struct MockContentRepository {
    pub members: Mutex<Vec<Member>>,
    pub events: Mutex<Vec<Event>>,
    pub agendas: Mutex<Vec<Agenda>>,
    pub contacts: Mutex<Vec<Contact>>,
    pub roster: Mutex<Vec<RosterMember>>,
    pub globals: Mutex<SiteGlobals>,
    pub fail: AtomicBool,
    member_fetches: AtomicUsize,
}

impl MockContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with active members for the given emails.
    pub fn with_member_emails(emails: &[&str]) -> Self {
        let repo = Self::default();
        repo.set_member_emails(emails);
        repo
    }

    pub fn set_member_emails(&self, emails: &[&str]) {
        *self.members.lock().unwrap() = emails
            .iter()
            .map(|e| Member {
                email: Some((*e).to_string()),
                status: Some("active".to_string()),
            })
            .collect();
    }

    pub fn set_members(&self, members: Vec<Member>) {
        *self.members.lock().unwrap() = members;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of allow-list fetches served so far.
    pub fn member_fetch_count(&self) -> usize {
        self.member_fetches.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), anyhow::Error> {
        if self.fail.load(Ordering::SeqCst) {
            Err(anyhow::anyhow!("content repository unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentRepository for MockContentRepository {
    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, anyhow::Error> {
        self.check_failure()?;
        let lowered = email.to_lowercase();
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|m| {
                m.email
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase() == lowered)
            })
            .cloned())
    }

    async fn active_members(&self) -> Result<Vec<Member>, anyhow::Error> {
        self.member_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.status.as_deref() == Some("active"))
            .cloned()
            .collect())
    }

    async fn list_events(&self) -> Result<Vec<Event>, anyhow::Error> {
        self.check_failure()?;
        Ok(self.events.lock().unwrap().clone())
    }

    async fn list_agendas(&self) -> Result<Vec<Agenda>, anyhow::Error> {
        self.check_failure()?;
        Ok(self.agendas.lock().unwrap().clone())
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, anyhow::Error> {
        self.check_failure()?;
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn member_roster(&self) -> Result<Vec<RosterMember>, anyhow::Error> {
        self.check_failure()?;
        Ok(self.roster.lock().unwrap().clone())
    }

    async fn site_globals(&self) -> Result<SiteGlobals, anyhow::Error> {
        self.check_failure()?;
        Ok(self.globals.lock().unwrap().clone())
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.check_failure()
    }
}
