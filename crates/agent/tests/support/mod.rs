//! In-memory queue and provider fakes shared by the scenario tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use lastff_core::{
    ArchiveAck, ArchiveSink, Credentials, Entry, Feed, FeedJob, FeedProvider, FeedRequest,
    JobQueue, ProviderError, QueueError, QueueOperation, WorkerId,
};

/// Every call the agent made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetJob(String),
    OpenStream,
    Push(String),
    CloseStream,
    FinishJob(String),
    Command(String),
    FetchFeed(FeedRequest),
    ProviderFetch(String),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    pub get_job_at: Vec<Instant>,
    pub pushed: Vec<Entry>,
    pub closes: usize,
    pub released_unclosed: usize,
}

pub type Log = Arc<Mutex<Recorder>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Recorder::default()))
}

pub fn calls(log: &Log) -> Vec<Call> {
    log.lock().unwrap().calls.clone()
}

pub fn count(log: &Log, pred: impl Fn(&Call) -> bool) -> usize {
    log.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
}

fn record(log: &Log, call: Call) {
    log.lock().unwrap().calls.push(call);
}

pub fn unavailable(op: QueueOperation) -> QueueError {
    QueueError::unavailable(op, "queue down")
}

pub fn job_with_auth(id: &str, account: &str) -> FeedJob {
    FeedJob::new(id, account).with_credentials("twitter", Credentials::new("t", "s", account))
}

pub fn job_without_auth(id: &str) -> FeedJob {
    FeedJob::new(id, "nobody")
}

pub fn entry(id: &str, body: &str) -> Entry {
    Entry {
        id: id.to_string(),
        date: "Mon Jan 01 00:00:00 +0000 2024".to_string(),
        raw_body: body.to_string(),
        source: "twitter".to_string(),
    }
}

/// Scripted job queue. `get_job` pops from the script and reports the queue as
/// unavailable once it runs dry; `finish_job` succeeds unless a failure is scripted.
pub struct FakeQueue {
    jobs: Mutex<VecDeque<Result<FeedJob, QueueError>>>,
    finish_failures: Mutex<VecDeque<QueueError>>,
    feed: Option<Feed>,
    fail_push_after: Option<u64>,
    fail_close: bool,
    log: Log,
}

impl FakeQueue {
    pub fn new(log: &Log) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            finish_failures: Mutex::new(VecDeque::new()),
            feed: None,
            fail_push_after: None,
            fail_close: false,
            log: log.clone(),
        }
    }

    pub fn with_job(self, job: FeedJob) -> Self {
        self.jobs.lock().unwrap().push_back(Ok(job));
        self
    }

    pub fn with_no_job(self) -> Self {
        self.jobs
            .lock()
            .unwrap()
            .push_back(Err(unavailable(QueueOperation::GetJob)));
        self
    }

    pub fn failing_next_finish(self) -> Self {
        self.finish_failures
            .lock()
            .unwrap()
            .push_back(unavailable(QueueOperation::FinishJob));
        self
    }

    /// Sinks accept `accepted` entries, then reject every further push.
    pub fn failing_push_after(mut self, accepted: u64) -> Self {
        self.fail_push_after = Some(accepted);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn with_feed(mut self, feed: Feed) -> Self {
        self.feed = Some(feed);
        self
    }
}

#[async_trait]
impl JobQueue for FakeQueue {
    async fn get_job(&self, worker: &WorkerId) -> Result<FeedJob, QueueError> {
        {
            let mut log = self.log.lock().unwrap();
            log.calls.push(Call::GetJob(worker.to_string()));
            log.get_job_at.push(Instant::now());
        }
        self.jobs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable(QueueOperation::GetJob)))
    }

    async fn finish_job(&self, job: &FeedJob) -> Result<FeedJob, QueueError> {
        record(&self.log, Call::FinishJob(job.id.to_string()));
        match self.finish_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(job.clone()),
        }
    }

    async fn command(&self, text: &str) -> Result<String, QueueError> {
        record(&self.log, Call::Command(text.to_string()));
        Ok(format!("ok: {text}"))
    }

    async fn open_archive_stream(&self) -> Result<Box<dyn ArchiveSink>, QueueError> {
        record(&self.log, Call::OpenStream);
        Ok(Box::new(FakeSink {
            log: self.log.clone(),
            received: 0,
            closed: false,
            fail_push_after: self.fail_push_after,
            fail_close: self.fail_close,
        }))
    }

    async fn fetch_feed(&self, request: &FeedRequest) -> Result<Feed, QueueError> {
        record(&self.log, Call::FetchFeed(request.clone()));
        self.feed
            .clone()
            .ok_or_else(|| QueueError::new(QueueOperation::FetchFeed, "not_found", "no such feed"))
    }
}

pub struct FakeSink {
    log: Log,
    received: u64,
    closed: bool,
    fail_push_after: Option<u64>,
    fail_close: bool,
}

#[async_trait]
impl ArchiveSink for FakeSink {
    async fn send(&mut self, entry: Entry) -> Result<(), QueueError> {
        if self.fail_push_after == Some(self.received) {
            return Err(QueueError::new(
                QueueOperation::ArchiveFeed,
                "resource_exhausted",
                "ingest quota reached",
            ));
        }
        let mut log = self.log.lock().unwrap();
        log.calls.push(Call::Push(entry.id.clone()));
        log.pushed.push(entry);
        self.received += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<ArchiveAck, QueueError> {
        self.closed = true;
        {
            let mut log = self.log.lock().unwrap();
            log.calls.push(Call::CloseStream);
            log.closes += 1;
        }
        if self.fail_close {
            return Err(QueueError::new(
                QueueOperation::ArchiveFeed,
                "internal",
                "ingest rejected",
            ));
        }
        Ok(ArchiveAck {
            received: self.received,
        })
    }
}

impl Drop for FakeSink {
    fn drop(&mut self) {
        if !self.closed {
            if let Ok(mut log) = self.log.lock() {
                log.released_unclosed += 1;
            }
        }
    }
}

/// Provider returning a fixed page (or a fixed error) for every account.
pub struct FakeProvider {
    page: Result<Vec<Entry>, ProviderError>,
    panics: bool,
    log: Log,
}

impl FakeProvider {
    pub fn returning(log: &Log, entries: Vec<Entry>) -> Self {
        Self {
            page: Ok(entries),
            panics: false,
            log: log.clone(),
        }
    }

    pub fn failing(log: &Log, err: ProviderError) -> Self {
        Self {
            page: Err(err),
            panics: false,
            log: log.clone(),
        }
    }

    /// Panics inside the fetch, taking the loop task down with it.
    pub fn panicking(log: &Log) -> Self {
        Self {
            page: Ok(Vec::new()),
            panics: true,
            log: log.clone(),
        }
    }
}

#[async_trait]
impl FeedProvider for FakeProvider {
    async fn recent_entries(&self, credentials: &Credentials) -> Result<Vec<Entry>, ProviderError> {
        record(&self.log, Call::ProviderFetch(credentials.account.clone()));
        if self.panics {
            panic!("provider blew up for {}", credentials.account);
        }
        self.page.clone()
    }
}
