//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use lastff_infra::QueueEndpoint;
use lastff_observability::LogFormat;

use crate::backoff::BackoffPolicy;

#[derive(Parser, Debug, Clone)]
#[command(name = "lastff-agent")]
#[command(version)]
#[command(about = "Feed archival worker for the lastff job queue", long_about = None)]
pub struct Args {
    /// Queue service address (`http://` is assumed when no scheme is given)
    ///
    /// Can also be set via LASTFF_ADDR environment variable
    #[arg(long, env = "LASTFF_ADDR", default_value = "localhost:8901")]
    pub addr: String,

    /// Provider credentials file
    ///
    /// JSON object with `twitter_api_key` and `twitter_api_secret`.
    /// Can also be set via LASTFF_CONFIG environment variable
    #[arg(short = 'c', long = "config", env = "LASTFF_CONFIG", default_value = "/srv/ff/config.json")]
    pub config: PathBuf,

    /// Send a single administrative command and exit
    #[arg(long, env = "LASTFF_CMD", default_value = "")]
    pub cmd: String,

    /// Account whose archived feed is printed in debug mode
    #[arg(short = 'u', long, env = "LASTFF_USER", default_value = "")]
    pub user: String,

    /// Print the archived feed of `--user` and exit
    #[arg(short = 'd', long, env = "LASTFF_DEBUG")]
    pub debug: bool,

    /// Pause after the queue had no job for us, in seconds
    #[arg(long, env = "LASTFF_QUEUE_BACKOFF_SECS", default_value_t = 5)]
    pub queue_backoff_secs: u64,

    /// Pause after an abandoned job, in seconds
    #[arg(long, env = "LASTFF_JOB_BACKOFF_SECS", default_value_t = 1)]
    pub job_backoff_secs: u64,

    /// Entries requested from the provider per job (valid range: 1-200)
    #[arg(long, env = "LASTFF_PAGE_SIZE", default_value_t = 200, value_parser = clap::value_parser!(u32).range(1..=200))]
    pub page_size: u32,

    /// Per-request timeout on the queue channel, in seconds
    #[arg(long, env = "LASTFF_RPC_TIMEOUT_SECS")]
    pub rpc_timeout_secs: Option<u64>,

    /// Log output format: json or pretty
    #[arg(long, env = "LASTFF_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

/// What the process does after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Run the job loop until stopped.
    Run,
    /// Send one command.
    Command(String),
    /// Print one archived feed.
    Debug { account: String },
}

/// Resolved, immutable process configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub queue: QueueEndpoint,
    pub credentials_file: PathBuf,
    pub backoff: BackoffPolicy,
    pub page_size: u32,
    pub log_format: LogFormat,
    pub mode: Mode,
}

impl From<Args> for AgentConfig {
    fn from(args: Args) -> Self {
        let mode = if !args.cmd.is_empty() {
            Mode::Command(args.cmd)
        } else if args.debug && !args.user.is_empty() {
            Mode::Debug { account: args.user }
        } else {
            Mode::Run
        };

        let mut queue = QueueEndpoint::new(args.addr);
        if let Some(secs) = args.rpc_timeout_secs {
            queue = queue.with_request_timeout(Duration::from_secs(secs));
        }

        Self {
            queue,
            credentials_file: args.config,
            backoff: BackoffPolicy::fixed(
                Duration::from_secs(args.queue_backoff_secs),
                Duration::from_secs(args.job_backoff_secs),
            ),
            page_size: args.page_size,
            log_format: args.log_format,
            mode,
        }
    }
}

impl AgentConfig {
    pub fn from_args() -> Self {
        Args::parse().into()
    }
}
