//! Typed records returned by the content repository.
//!
//! Field selections mirror what the portal actually requests from the CMS;
//! anything the CMS may omit is optional.

use serde::{Deserialize, Serialize};

/// Member record as fetched for authorization checks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Member {
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Event {
    pub id: i64,
    pub title: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Agenda {
    pub id: i64,
    pub meeting_date: Option<String>,
    pub agenda_id: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub agenda_items: Vec<AgendaItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgendaItem {
    pub id: i64,
    pub order: Option<i64>,
    pub topic: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Contact {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
    pub role: Option<String>,
    pub organisation_id: Option<Organisation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Organisation {
    pub organisation_name: Option<String>,
}

/// Roster entry shown on the members page; distinct from the auth-side
/// [`Member`] because the portal never exposes member emails.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RosterMember {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub committee_role_id: Option<CommitteeRole>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommitteeRole {
    pub committee_role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SiteGlobals {
    pub site_title: Option<String>,
    pub site_description: Option<String>,
}
