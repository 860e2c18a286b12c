//! gRPC adapter for the job queue service.

mod archive;
mod convert;

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};

use lastff_core::{
    ArchiveSink, Feed, FeedJob, FeedRequest, JobQueue, QueueError, QueueOperation, WorkerId,
};

use crate::proto as pb;
use crate::proto::api_client::ApiClient;

pub use archive::GrpcArchiveSink;
use convert::request_failed;

/// Buffered entries between the fetcher and the upload stream.
const ARCHIVE_BUFFER: usize = 64;

/// Connection settings for the queue service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEndpoint {
    /// `host:port`, or a full `http(s)://` URI.
    pub address: String,
    /// Per-request deadline. `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
}

impl QueueEndpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Address as a URI; bare `host:port` gets an `http://` scheme.
    pub fn uri(&self) -> String {
        if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("http://{}", self.address)
        }
    }
}

/// Errors establishing the queue channel. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid queue address `{address}`")]
    InvalidAddress {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("failed to connect to queue at `{address}`")]
    Connection {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },
}

/// Job queue client over a single long-lived gRPC channel.
///
/// Cloning is cheap and shares the underlying connection.
#[derive(Debug, Clone)]
pub struct GrpcJobQueue {
    client: ApiClient<Channel>,
}

impl GrpcJobQueue {
    /// Open the channel. Fails if the queue cannot be reached.
    pub async fn connect(endpoint: &QueueEndpoint) -> Result<Self, ClientError> {
        let address = endpoint.uri();
        let mut ep =
            Endpoint::from_shared(address.clone()).map_err(|source| ClientError::InvalidAddress {
                address: address.clone(),
                source,
            })?;
        if let Some(timeout) = endpoint.request_timeout {
            ep = ep.timeout(timeout);
        }

        let channel = ep
            .connect()
            .await
            .map_err(|source| ClientError::Connection { address, source })?;

        Ok(Self::from_channel(channel))
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self {
            client: ApiClient::new(channel),
        }
    }

    fn client(&self) -> ApiClient<Channel> {
        self.client.clone()
    }
}

#[async_trait]
impl JobQueue for GrpcJobQueue {
    async fn get_job(&self, worker: &WorkerId) -> Result<FeedJob, QueueError> {
        let reply = self
            .client()
            .get_feed_job(pb::Worker::from(worker))
            .await
            .map_err(|status| request_failed(QueueOperation::GetJob, status))?;
        Ok(reply.into_inner().into())
    }

    async fn finish_job(&self, job: &FeedJob) -> Result<FeedJob, QueueError> {
        let reply = self
            .client()
            .finish_job(pb::FeedJob::from(job))
            .await
            .map_err(|status| request_failed(QueueOperation::FinishJob, status))?;
        Ok(reply.into_inner().into())
    }

    async fn command(&self, text: &str) -> Result<String, QueueError> {
        let request = pb::CommandRequest {
            text: text.to_string(),
        };
        let reply = self
            .client()
            .command(request)
            .await
            .map_err(|status| request_failed(QueueOperation::Command, status))?;
        Ok(reply.into_inner().message)
    }

    async fn open_archive_stream(&self) -> Result<Box<dyn ArchiveSink>, QueueError> {
        Ok(Box::new(GrpcArchiveSink::open(self.client(), ARCHIVE_BUFFER)))
    }

    async fn fetch_feed(&self, request: &FeedRequest) -> Result<Feed, QueueError> {
        let reply = self
            .client()
            .fetch_feed(pb::FeedRequest::from(request))
            .await
            .map_err(|status| request_failed(QueueOperation::FetchFeed, status))?;
        Ok(reply.into_inner().into())
    }
}
