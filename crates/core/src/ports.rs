//! Ports implemented by infrastructure adapters.
//!
//! The job loop only ever talks to these traits; the gRPC queue client and the
//! provider HTTP client live in `lastff-infra`, in-memory fakes live in tests.

use async_trait::async_trait;

use crate::error::{ProviderError, QueueError};
use crate::feed::{ArchiveAck, Credentials, Entry, Feed, FeedJob, FeedRequest};
use crate::id::WorkerId;

/// Remote job queue service.
///
/// Every call is a single request over a shared long-lived channel. No retries
/// happen at this layer.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Request the next job for this worker. "No job available" is an error.
    async fn get_job(&self, worker: &WorkerId) -> Result<FeedJob, QueueError>;

    /// Report successful completion of a job.
    async fn finish_job(&self, job: &FeedJob) -> Result<FeedJob, QueueError>;

    /// Send an administrative command; returns the server's reply text.
    async fn command(&self, text: &str) -> Result<String, QueueError>;

    /// Open an archive upload stream.
    async fn open_archive_stream(&self) -> Result<Box<dyn ArchiveSink>, QueueError>;

    /// Read back an archived feed page (inspection only).
    async fn fetch_feed(&self, request: &FeedRequest) -> Result<Feed, QueueError>;
}

/// Send side of an archive upload.
///
/// Dropping a sink without calling [`ArchiveSink::close`] must still release the
/// underlying channel; the final acknowledgment is then lost.
#[async_trait]
pub trait ArchiveSink: Send {
    /// Push one entry into the upload.
    async fn send(&mut self, entry: Entry) -> Result<(), QueueError>;

    /// Close the send side and wait for the server's acknowledgment.
    ///
    /// Called at most once.
    async fn close(&mut self) -> Result<ArchiveAck, QueueError>;
}

/// External social-feed provider.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Most recent page of the account's timeline.
    async fn recent_entries(&self, credentials: &Credentials) -> Result<Vec<Entry>, ProviderError>;
}
