//! Infrastructure layer: queue transport, feed provider clients, config files.

pub mod config;
pub mod proto;
pub mod provider;
pub mod queue;

pub use config::{ConfigError, load_consumer_keys};
pub use provider::{ConsumerKeys, TwitterProvider};
pub use queue::{ClientError, GrpcJobQueue, QueueEndpoint};
