//! Records exchanged with the job queue service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::JobId;

/// Per-account provider credentials carried inside a job.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub access_token_secret: String,
    /// Account (screen) name whose timeline is archived.
    pub account: String,
}

impl Credentials {
    pub fn new(
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
            account: account.into(),
        }
    }
}

// Secrets stay out of logs.
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

/// Service binding of a job: which provider, and with which credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub credentials: Option<Credentials>,
}

/// A unit of archival work handed out by the queue service.
///
/// The agent never mutates a job; it hands the same record back to `finish_job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedJob {
    pub id: JobId,
    /// Feed the archived entries belong to.
    pub target_id: String,
    pub service: Option<ServiceInfo>,
    pub created_at: Option<DateTime<Utc>>,
}

impl FeedJob {
    pub fn new(id: impl Into<JobId>, target_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target_id: target_id.into(),
            service: None,
            created_at: None,
        }
    }

    pub fn with_service(mut self, service: ServiceInfo) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_credentials(mut self, service: impl Into<String>, credentials: Credentials) -> Self {
        self.service = Some(ServiceInfo {
            name: service.into(),
            credentials: Some(credentials),
        });
        self
    }

    /// Credentials needed to call the provider, if the job carries any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.service.as_ref().and_then(|s| s.credentials.as_ref())
    }
}

/// One archived feed entry. Opaque to the agent beyond counting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub date: String,
    pub raw_body: String,
    pub source: String,
}

/// An archived feed as returned by the inspection call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    pub entries: Vec<Entry>,
}

/// Page selector for feed inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRequest {
    pub id: String,
    pub start: u32,
    pub page_size: u32,
}

impl FeedRequest {
    pub fn first_page(id: impl Into<String>, page_size: u32) -> Self {
        Self {
            id: id.into(),
            start: 0,
            page_size,
        }
    }
}

/// Final acknowledgment of an archive upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArchiveAck {
    /// Entries the queue service accepted.
    pub received: u64,
}
