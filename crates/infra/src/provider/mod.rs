//! Feed provider adapters.

pub mod oauth;
pub mod twitter;

pub use oauth::ConsumerKeys;
pub use twitter::TwitterProvider;
