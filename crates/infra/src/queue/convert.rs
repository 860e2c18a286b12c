//! Mapping between wire messages and `lastff-core` records.

use chrono::{DateTime, Utc};

use lastff_core::{
    ArchiveAck, Credentials, Entry, Feed, FeedJob, FeedRequest, JobId, QueueError, QueueOperation,
    ServiceInfo, WorkerId,
};

use crate::proto as pb;

impl From<&WorkerId> for pb::Worker {
    fn from(worker: &WorkerId) -> Self {
        pb::Worker {
            id: worker.as_str().to_string(),
        }
    }
}

fn credentials(oauth: pb::OAuthInfo) -> Option<Credentials> {
    // A token-less record cannot sign a provider request.
    if oauth.access_token.is_empty() {
        return None;
    }
    Some(Credentials {
        access_token: oauth.access_token,
        access_token_secret: oauth.access_token_secret,
        account: oauth.name,
    })
}

impl From<pb::FeedJob> for FeedJob {
    fn from(job: pb::FeedJob) -> Self {
        let service = job.service.map(|s| ServiceInfo {
            name: s.name,
            credentials: s.oauth.and_then(credentials),
        });
        FeedJob {
            id: JobId::new(job.id),
            target_id: job.target_id,
            service,
            created_at: created_at(job.created),
        }
    }
}

impl From<&FeedJob> for pb::FeedJob {
    fn from(job: &FeedJob) -> Self {
        pb::FeedJob {
            id: job.id.as_str().to_string(),
            target_id: job.target_id.clone(),
            service: job.service.as_ref().map(|s| pb::Service {
                name: s.name.clone(),
                oauth: s.credentials.as_ref().map(|c| pb::OAuthInfo {
                    access_token: c.access_token.clone(),
                    access_token_secret: c.access_token_secret.clone(),
                    name: c.account.clone(),
                }),
            }),
            created: job.created_at.map(|t| t.timestamp()).unwrap_or_default(),
        }
    }
}

fn created_at(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

impl From<Entry> for pb::Entry {
    fn from(entry: Entry) -> Self {
        pb::Entry {
            id: entry.id,
            date: entry.date,
            raw_body: entry.raw_body,
            source: entry.source,
        }
    }
}

impl From<pb::Entry> for Entry {
    fn from(entry: pb::Entry) -> Self {
        Entry {
            id: entry.id,
            date: entry.date,
            raw_body: entry.raw_body,
            source: entry.source,
        }
    }
}

impl From<pb::Feed> for Feed {
    fn from(feed: pb::Feed) -> Self {
        Feed {
            id: feed.id,
            entries: feed.entries.into_iter().map(Entry::from).collect(),
        }
    }
}

impl From<&FeedRequest> for pb::FeedRequest {
    fn from(req: &FeedRequest) -> Self {
        pb::FeedRequest {
            id: req.id.clone(),
            start: i32::try_from(req.start).unwrap_or(i32::MAX),
            page_size: i32::try_from(req.page_size).unwrap_or(i32::MAX),
        }
    }
}

impl From<pb::ArchiveReply> for ArchiveAck {
    fn from(reply: pb::ArchiveReply) -> Self {
        ArchiveAck {
            received: u64::try_from(reply.received).unwrap_or(0),
        }
    }
}

/// Collapse a gRPC status into the single queue failure condition.
pub(crate) fn request_failed(operation: QueueOperation, status: tonic::Status) -> QueueError {
    QueueError::new(operation, code_name(status.code()), status.message())
}

fn code_name(code: tonic::Code) -> &'static str {
    use tonic::Code;

    match code {
        Code::Ok => "ok",
        Code::Cancelled => "cancelled",
        Code::Unknown => "unknown",
        Code::InvalidArgument => "invalid_argument",
        Code::DeadlineExceeded => "deadline_exceeded",
        Code::NotFound => "not_found",
        Code::AlreadyExists => "already_exists",
        Code::PermissionDenied => "permission_denied",
        Code::ResourceExhausted => "resource_exhausted",
        Code::FailedPrecondition => "failed_precondition",
        Code::Aborted => "aborted",
        Code::OutOfRange => "out_of_range",
        Code::Unimplemented => "unimplemented",
        Code::Internal => "internal",
        Code::Unavailable => "unavailable",
        Code::DataLoss => "data_loss",
        Code::Unauthenticated => "unauthenticated",
    }
}
