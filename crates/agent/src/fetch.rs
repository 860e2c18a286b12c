//! Archive fetch: provider page → ingest stream.

use lastff_core::{FeedJob, FeedProvider, JobId, ProviderError, QueueError};

use crate::stream::ArchiveStream;

/// Why a job could not be archived.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The job carries no credentials. Expected for stale or malformed jobs.
    #[error("skip job {job_id}: no auth info")]
    NotEligible { job_id: JobId },

    #[error("provider fetch failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("archive stream failed: {0}")]
    Stream(#[from] QueueError),
}

impl FetchError {
    pub fn is_not_eligible(&self) -> bool {
        matches!(self, FetchError::NotEligible { .. })
    }
}

/// Forwards the newest provider page of a job's account into an archive stream.
///
/// One page per job; entries forwarded before a failure are not rolled back.
#[derive(Debug, Clone)]
pub struct ArchiveFetcher<P> {
    provider: P,
}

impl<P: FeedProvider> ArchiveFetcher<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns the number of entries forwarded.
    pub async fn fetch(&self, job: &FeedJob, stream: &mut ArchiveStream) -> Result<u64, FetchError> {
        let credentials = job.credentials().ok_or_else(|| FetchError::NotEligible {
            job_id: job.id.clone(),
        })?;

        let entries = self.provider.recent_entries(credentials).await?;

        let mut forwarded = 0u64;
        for entry in entries {
            stream.send(entry).await?;
            forwarded += 1;
        }

        tracing::debug!(job_id = %job.id, account = %credentials.account, forwarded, "forwarded provider page");
        Ok(forwarded)
    }
}
