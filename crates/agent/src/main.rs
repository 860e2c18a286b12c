use anyhow::Context;
use tracing::{error, info, warn};

use lastff_agent::{AgentConfig, ArchiveFetcher, JobLoop, LoopConfig, Mode, debug_feed, run_command};
use lastff_core::WorkerId;
use lastff_infra::{GrpcJobQueue, TwitterProvider, load_consumer_keys};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AgentConfig::from_args();
    lastff_observability::init(config.log_format);

    if let Err(err) = run(config).await {
        error!("agent failed: {err:#}");
        return Err(err);
    }
    Ok(())
}

async fn run(config: AgentConfig) -> anyhow::Result<()> {
    // Credentials are only needed by the job loop.
    let consumer = match config.mode {
        Mode::Run => Some(
            load_consumer_keys(&config.credentials_file)
                .context("failed to load provider credentials")?,
        ),
        _ => None,
    };

    let queue = GrpcJobQueue::connect(&config.queue)
        .await
        .context("failed to open queue channel")?;

    match config.mode {
        Mode::Command(text) => {
            run_command(&queue, &text).await.context("command failed")?;
        }
        Mode::Debug { account } => {
            debug_feed(&queue, &account)
                .await
                .with_context(|| format!("failed to fetch archived feed of {account}"))?;
        }
        Mode::Run => {
            let consumer = consumer.context("provider credentials not loaded")?;
            let provider = TwitterProvider::new(consumer).with_page_size(config.page_size);
            let worker = WorkerId::generate();
            info!(worker = %worker, queue = %config.queue.uri(), "worker registered");

            let handle = JobLoop::new(
                worker,
                queue,
                ArchiveFetcher::new(provider),
                LoopConfig::default().with_backoff(config.backoff),
            )
            .spawn();

            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for shutdown signal")?;
            info!("shutdown requested, finishing current cycle");

            tokio::select! {
                stopped = handle.shutdown() => {
                    let stats = stopped.context("job loop crashed")?;
                    info!(
                        jobs_completed = stats.jobs_completed,
                        jobs_abandoned = stats.jobs_abandoned,
                        entries_archived = stats.entries_archived,
                        "agent stopped"
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    warn!("second interrupt, abandoning in-flight job");
                }
            }
        }
    }

    Ok(())
}
