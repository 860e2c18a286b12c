//! Client-streaming archive upload over gRPC.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;

use lastff_core::{ArchiveAck, ArchiveSink, Entry, QueueError, QueueOperation};

use super::convert::request_failed;
use crate::proto as pb;
use crate::proto::api_client::ApiClient;

type ArchiveCall = JoinHandle<Result<tonic::Response<pb::ArchiveReply>, tonic::Status>>;

/// Send side of an `ArchiveFeed` call.
///
/// Entries go through a bounded channel into the request stream of a spawned RPC.
/// Dropping the sink drops the sender, which ends the request stream; the spawned
/// call then completes on its own and its reply is discarded.
#[derive(Debug)]
pub struct GrpcArchiveSink {
    tx: Option<mpsc::Sender<pb::Entry>>,
    call: Option<ArchiveCall>,
}

impl GrpcArchiveSink {
    pub(crate) fn open(mut client: ApiClient<Channel>, buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let call = tokio::spawn(async move { client.archive_feed(ReceiverStream::new(rx)).await });

        Self {
            tx: Some(tx),
            call: Some(call),
        }
    }

    async fn finish(&mut self) -> Result<ArchiveAck, QueueError> {
        self.tx.take();

        let Some(call) = self.call.take() else {
            return Err(QueueError::new(
                QueueOperation::ArchiveFeed,
                "failed_precondition",
                "archive stream already closed",
            ));
        };

        match call.await {
            Ok(Ok(reply)) => Ok(reply.into_inner().into()),
            Ok(Err(status)) => Err(request_failed(QueueOperation::ArchiveFeed, status)),
            Err(join) => Err(QueueError::new(
                QueueOperation::ArchiveFeed,
                "internal",
                format!("archive call task failed: {join}"),
            )),
        }
    }
}

#[async_trait]
impl ArchiveSink for GrpcArchiveSink {
    async fn send(&mut self, entry: Entry) -> Result<(), QueueError> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(QueueError::new(
                QueueOperation::ArchiveFeed,
                "failed_precondition",
                "archive stream already closed",
            ));
        };

        if tx.send(entry.into()).await.is_ok() {
            return Ok(());
        }

        // Receiver gone: the call ended early. Report its status.
        match self.finish().await {
            Err(err) => Err(err),
            Ok(_) => Err(QueueError::new(
                QueueOperation::ArchiveFeed,
                "aborted",
                "archive stream closed by server",
            )),
        }
    }

    async fn close(&mut self) -> Result<ArchiveAck, QueueError> {
        self.finish().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::codegen::*;
    use tonic::transport::{Endpoint, Server};

    use super::*;

    /// Minimal `ArchiveFeed` endpoint. Accepts every entry, or rejects the stream
    /// once `reject_after` entries were read.
    #[derive(Clone, Default)]
    struct IngestService {
        reject_after: Option<usize>,
        stored: Arc<Mutex<Vec<String>>>,
        /// Uploads whose request stream ended normally.
        finished: Arc<AtomicUsize>,
    }

    struct ArchiveFeedSvc(IngestService);

    impl tonic::server::ClientStreamingService<pb::Entry> for ArchiveFeedSvc {
        type Response = pb::ArchiveReply;
        type Future = BoxFuture<tonic::Response<pb::ArchiveReply>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<tonic::Streaming<pb::Entry>>) -> Self::Future {
            let service = self.0.clone();
            Box::pin(async move {
                let mut entries = request.into_inner();
                let mut received = 0usize;
                while let Some(entry) = entries.message().await? {
                    if service.reject_after == Some(received) {
                        return Err(tonic::Status::resource_exhausted("ingest quota reached"));
                    }
                    service.stored.lock().unwrap().push(entry.id);
                    received += 1;
                }
                service.finished.fetch_add(1, Ordering::SeqCst);
                Ok(tonic::Response::new(pb::ArchiveReply {
                    received: received as i64,
                }))
            })
        }
    }

    impl<B> Service<http::Request<B>> for IngestService
    where
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let method = ArchiveFeedSvc(self.clone());
            Box::pin(async move {
                let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                Ok(grpc.client_streaming(method, req).await)
            })
        }
    }

    impl tonic::server::NamedService for IngestService {
        const NAME: &'static str = "lastff.v1.Api";
    }

    async fn serve(service: IngestService) -> ApiClient<Channel> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            Server::builder()
                .add_service(service)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });

        let channel = Endpoint::from_shared(format!("http://{addr}"))
            .unwrap()
            .connect()
            .await
            .unwrap();
        ApiClient::new(channel)
    }

    fn entry(id: &str) -> Entry {
        Entry {
            id: id.to_string(),
            date: "Wed Aug 29 17:12:58 +0000 2012".to_string(),
            raw_body: "{}".to_string(),
            source: "twitter".to_string(),
        }
    }

    #[tokio::test]
    async fn close_returns_server_ack() {
        let service = IngestService::default();
        let client = serve(service.clone()).await;
        let mut sink = GrpcArchiveSink::open(client, 4);

        for id in ["1", "2", "3"] {
            sink.send(entry(id)).await.unwrap();
        }
        let ack = sink.close().await.unwrap();

        assert_eq!(ack.received, 3);
        assert_eq!(*service.stored.lock().unwrap(), vec!["1", "2", "3"]);
        assert_eq!(service.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_close_is_a_precondition_failure() {
        let client = serve(IngestService::default()).await;
        let mut sink = GrpcArchiveSink::open(client, 4);

        sink.close().await.unwrap();
        let err = sink.close().await.unwrap_err();
        assert_eq!(err.operation, QueueOperation::ArchiveFeed);
        assert_eq!(err.code, "failed_precondition");

        let err = sink.send(entry("late")).await.unwrap_err();
        assert_eq!(err.code, "failed_precondition");
    }

    #[tokio::test]
    async fn server_rejection_mid_stream_reports_status() {
        let service = IngestService {
            reject_after: Some(1),
            ..IngestService::default()
        };
        let client = serve(service.clone()).await;
        let mut sink = GrpcArchiveSink::open(client, 1);

        // The rejection surfaces on a later send once the server hangs up, or at
        // the latest on close.
        let outcome = tokio::time::timeout(Duration::from_secs(10), async {
            for i in 0..500 {
                if let Err(err) = sink.send(entry(&i.to_string())).await {
                    return err;
                }
            }
            sink.close().await.unwrap_err()
        })
        .await
        .expect("rejection was never reported");

        assert_eq!(outcome.operation, QueueOperation::ArchiveFeed);
        assert_eq!(outcome.code, "resource_exhausted");
        assert_eq!(outcome.message, "ingest quota reached");
        assert_eq!(*service.stored.lock().unwrap(), vec!["0"]);
    }

    #[tokio::test]
    async fn dropping_the_sink_ends_the_upload() {
        let service = IngestService::default();
        let client = serve(service.clone()).await;

        let mut sink = GrpcArchiveSink::open(client, 4);
        sink.send(entry("1")).await.unwrap();
        sink.send(entry("2")).await.unwrap();
        drop(sink);

        // The server sees the request stream end and keeps what it got.
        for _ in 0..100 {
            if service.finished.load(Ordering::SeqCst) == 1 {
                assert_eq!(*service.stored.lock().unwrap(), vec!["1", "2"]);
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("upload was not released after drop");
    }
}
