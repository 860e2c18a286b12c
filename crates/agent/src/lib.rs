//! `lastff-agent`: the crawl worker.
//!
//! Pulls feed jobs from the queue, archives the newest provider page of each
//! job's account through an ingest stream, and reports completion. Failures back
//! off and retry; the loop never exits on its own.

pub mod backoff;
pub mod config;
pub mod fetch;
pub mod job_loop;
pub mod oneshot;
pub mod stream;

pub use backoff::{BackoffPolicy, FailureStage};
pub use config::{AgentConfig, Args, Mode};
pub use fetch::{ArchiveFetcher, FetchError};
pub use job_loop::{
    CycleOutcome, JobLoop, JobLoopHandle, LoopConfig, LoopState, LoopStats, Shutdown,
    ShutdownTrigger,
};
pub use oneshot::{DEBUG_PAGE_SIZE, debug_feed, run_command};
pub use stream::ArchiveStream;
