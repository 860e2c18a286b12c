//! `lastff-core`: crawl agent building blocks.
//!
//! This crate contains the records exchanged with the job queue, the worker
//! identity, and the ports (traits) that infrastructure adapters implement.
//! No transport or provider specifics live here.

pub mod error;
pub mod feed;
pub mod id;
pub mod ports;

pub use error::{ProviderError, QueueError, QueueOperation};
pub use feed::{ArchiveAck, Credentials, Entry, Feed, FeedJob, FeedRequest, ServiceInfo};
pub use id::{JobId, WorkerId};
pub use ports::{ArchiveSink, FeedProvider, JobQueue};
