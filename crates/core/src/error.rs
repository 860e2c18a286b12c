//! Error model shared by the queue and provider ports.

use thiserror::Error;

/// Remote operation exposed by the job queue service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueueOperation {
    GetJob,
    FinishJob,
    Command,
    ArchiveFeed,
    FetchFeed,
}

impl QueueOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueOperation::GetJob => "get_feed_job",
            QueueOperation::FinishJob => "finish_job",
            QueueOperation::Command => "command",
            QueueOperation::ArchiveFeed => "archive_feed",
            QueueOperation::FetchFeed => "fetch_feed",
        }
    }
}

impl core::fmt::Display for QueueOperation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queue request failed.
///
/// Transport loss, server-side rejection, timeouts and "no job available" all
/// collapse into this one condition. Retrying is the caller's decision.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} request failed ({code}): {message}")]
pub struct QueueError {
    pub operation: QueueOperation,
    /// Transport/status code name, e.g. `unavailable`.
    pub code: String,
    pub message: String,
}

impl QueueError {
    pub fn new(
        operation: QueueOperation,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(operation: QueueOperation, message: impl Into<String>) -> Self {
        Self::new(operation, "unavailable", message)
    }
}

/// Feed provider failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("provider API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("signing error: {0}")]
    Signing(String),
}
