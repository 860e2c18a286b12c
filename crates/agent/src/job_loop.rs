//! The crawl job loop.
//!
//! ## States
//!
//! ```text
//! Idle -> AcquiringJob -> Fetching -> Finalizing -> Idle
//!              |              |            |
//!              +--------------+------------+--> Backoff -> Idle
//! ```
//!
//! - `AcquiringJob` failures back off with the queue delay.
//! - `Fetching`/`Finalizing` failures abandon the job (the queue re-offers it) and
//!   back off with the job delay.
//! - There is no terminal state. [`JobLoop::run`] only returns when its shutdown
//!   signal fires, which is checked between cycles and while backing off.
//!
//! Exactly one job is in flight at a time; every step is a sequential `.await`.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use lastff_core::{FeedJob, FeedProvider, JobId, JobQueue, WorkerId};

use crate::backoff::{BackoffPolicy, FailureStage};
use crate::fetch::{ArchiveFetcher, FetchError};
use crate::stream::ArchiveStream;

/// Job loop configuration.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Name for logging.
    pub name: String,
    pub backoff: BackoffPolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            name: "feed-agent".to_string(),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl LoopConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Position of the loop in the job lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    AcquiringJob,
    Fetching { job: FeedJob },
    Finalizing { job: FeedJob, entries: u64 },
    Backoff { stage: FailureStage, delay: Duration },
}

/// How a single cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The job was archived and finalized.
    Completed { job_id: JobId, entries: u64 },
    /// The cycle failed; the loop pauses for `delay` before the next `GetJob`.
    BackedOff { stage: FailureStage, delay: Duration },
}

/// Informational loop counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub jobs_completed: u64,
    pub jobs_abandoned: u64,
    pub jobs_not_eligible: u64,
    pub entries_archived: u64,
    pub queue_unavailable: u64,
}

/// Receiving side of a shutdown request.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A connected trigger/receiver pair.
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested. A dropped trigger never fires.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Sending side of a shutdown request.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Handle to a spawned loop.
#[derive(Debug)]
pub struct JobLoopHandle {
    trigger: ShutdownTrigger,
    join: JoinHandle<LoopStats>,
}

impl JobLoopHandle {
    /// Request shutdown and wait for the loop to stop.
    ///
    /// A job already in flight runs to the end of its cycle first. Fails if the
    /// loop task panicked or was cancelled.
    pub async fn shutdown(self) -> Result<LoopStats, JoinError> {
        self.trigger.trigger();
        self.join.await
    }
}

/// Acquire → fetch → stream → finalize, forever.
#[derive(Debug)]
pub struct JobLoop<Q, P> {
    worker: WorkerId,
    queue: Q,
    fetcher: ArchiveFetcher<P>,
    config: LoopConfig,
    stats: LoopStats,
}

impl<Q, P> JobLoop<Q, P>
where
    Q: JobQueue,
    P: FeedProvider,
{
    pub fn new(worker: WorkerId, queue: Q, fetcher: ArchiveFetcher<P>, config: LoopConfig) -> Self {
        Self {
            worker,
            queue,
            fetcher,
            config,
            stats: LoopStats::default(),
        }
    }

    pub fn worker(&self) -> &WorkerId {
        &self.worker
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Perform one state transition. `Backoff` is left without sleeping; pausing
    /// is the driver's job.
    pub async fn advance(&mut self, state: LoopState) -> LoopState {
        match state {
            LoopState::Idle => LoopState::AcquiringJob,
            LoopState::AcquiringJob => self.acquire().await,
            LoopState::Fetching { job } => self.fetch(job).await,
            LoopState::Finalizing { job, entries } => self.finalize(job, entries).await,
            LoopState::Backoff { .. } => LoopState::Idle,
        }
    }

    /// Run one cycle from `Idle` to either completion or a backoff decision.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let mut state = LoopState::Idle;
        loop {
            let completing = match &state {
                LoopState::Finalizing { job, entries } => Some((job.id.clone(), *entries)),
                _ => None,
            };

            state = self.advance(state).await;

            match (&state, completing) {
                (LoopState::Backoff { stage, delay }, _) => {
                    return CycleOutcome::BackedOff {
                        stage: *stage,
                        delay: *delay,
                    };
                }
                (LoopState::Idle, Some((job_id, entries))) => {
                    return CycleOutcome::Completed { job_id, entries };
                }
                _ => {}
            }
        }
    }

    /// Drive the loop until `shutdown` fires. Returns the final counters.
    pub async fn run(mut self, mut shutdown: Shutdown) -> LoopStats {
        info!(loop_name = %self.config.name, worker = %self.worker, "start processing");

        let mut state = LoopState::Idle;
        loop {
            if state == LoopState::Idle && shutdown.is_triggered() {
                break;
            }

            state = match state {
                LoopState::Backoff { delay, .. } => {
                    tokio::select! {
                        _ = shutdown.wait() => break,
                        _ = tokio::time::sleep(delay) => LoopState::Idle,
                    }
                }
                other => self.advance(other).await,
            };
        }

        info!(loop_name = %self.config.name, worker = %self.worker, stats = ?self.stats, "job loop stopped");
        self.stats
    }

    /// Spawn the loop on the current runtime.
    ///
    /// Dropping the handle detaches the loop; it then runs until the runtime stops.
    pub fn spawn(self) -> JobLoopHandle
    where
        Q: 'static,
        P: 'static,
    {
        let (trigger, shutdown) = Shutdown::channel();
        let join = tokio::spawn(self.run(shutdown));
        JobLoopHandle { trigger, join }
    }

    async fn acquire(&mut self) -> LoopState {
        match self.queue.get_job(&self.worker).await {
            Ok(job) => {
                debug!(worker = %self.worker, job_id = %job.id, "acquired job");
                LoopState::Fetching { job }
            }
            Err(err) => {
                self.stats.queue_unavailable += 1;
                warn!(worker = %self.worker, error = %err, "get job failed");
                self.backoff(FailureStage::Queue)
            }
        }
    }

    async fn fetch(&mut self, job: FeedJob) -> LoopState {
        info!(job_id = %job.id, target = %job.target_id, "start fetching entries");

        match self.archive(&job).await {
            Ok(entries) => LoopState::Finalizing { job, entries },
            Err(err) => {
                self.stats.jobs_abandoned += 1;
                if err.is_not_eligible() {
                    self.stats.jobs_not_eligible += 1;
                }
                warn!(job_id = %job.id, error = %err, "archive failed");
                self.backoff(FailureStage::Job)
            }
        }
    }

    /// Open the stream, fetch into it, close it. The stream is closed whatever the
    /// fetch outcome.
    async fn archive(&self, job: &FeedJob) -> Result<u64, FetchError> {
        let sink = self.queue.open_archive_stream().await?;
        let mut stream = ArchiveStream::new(sink);

        let fetched = self.fetcher.fetch(job, &mut stream).await;
        let closed = stream.close().await;

        let entries = fetched?;
        let ack = closed?;
        if ack.received != entries {
            debug!(job_id = %job.id, sent = entries, received = ack.received, "archive acknowledgment differs from sent count");
        }
        Ok(entries)
    }

    async fn finalize(&mut self, job: FeedJob, entries: u64) -> LoopState {
        match self.queue.finish_job(&job).await {
            Ok(done) => {
                self.stats.jobs_completed += 1;
                self.stats.entries_archived += entries;
                info!(
                    worker = %self.worker,
                    job_id = %done.id,
                    entries,
                    jobs_completed = self.stats.jobs_completed,
                    entries_archived = self.stats.entries_archived,
                    "job done"
                );
                LoopState::Idle
            }
            Err(err) => {
                self.stats.jobs_abandoned += 1;
                warn!(job_id = %job.id, error = %err, "finish job failed");
                self.backoff(FailureStage::Job)
            }
        }
    }

    fn backoff(&self, stage: FailureStage) -> LoopState {
        let delay = self.config.backoff.delay_for(stage);
        debug!(stage = ?stage, backoff = ?delay, "backing off");
        LoopState::Backoff { stage, delay }
    }
}
