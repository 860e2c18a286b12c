//! Twitter REST v1.1 timeline client.

use async_trait::async_trait;
use serde_json::Value;

use lastff_core::{Credentials, Entry, FeedProvider, ProviderError};

use super::oauth::{self, ConsumerKeys};

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const USER_TIMELINE_PATH: &str = "/1.1/statuses/user_timeline.json";
const SOURCE: &str = "twitter";

/// Upper bound accepted by the timeline endpoint for `count`.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Fetches the most recent timeline page of an account.
///
/// Only the first page is requested; older entries are not paged through.
#[derive(Debug, Clone)]
pub struct TwitterProvider {
    http: reqwest::Client,
    consumer: ConsumerKeys,
    api_base: String,
    page_size: u32,
}

impl TwitterProvider {
    pub fn new(consumer: ConsumerKeys) -> Self {
        Self {
            http: reqwest::Client::new(),
            consumer,
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[async_trait]
impl FeedProvider for TwitterProvider {
    async fn recent_entries(&self, credentials: &Credentials) -> Result<Vec<Entry>, ProviderError> {
        let url = format!("{}{}", self.api_base, USER_TIMELINE_PATH);
        let count = self.page_size.to_string();
        let params = [
            ("screen_name", credentials.account.as_str()),
            ("count", count.as_str()),
        ];
        let authorization = oauth::sign_for("GET", &url, &params, &self.consumer, credentials)?;

        tracing::debug!(account = %credentials.account, count = self.page_size, "requesting user timeline");

        let resp = self
            .http
            .get(&url)
            .query(&params)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        timeline_entries(&body)
    }
}

/// Turn a timeline response body into archive entries, newest first as returned.
pub fn timeline_entries(body: &str) -> Result<Vec<Entry>, ProviderError> {
    let tweets: Vec<Value> =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    tweets.into_iter().map(tweet_entry).collect()
}

fn tweet_entry(tweet: Value) -> Result<Entry, ProviderError> {
    let id = match (tweet.get("id_str"), tweet.get("id")) {
        (Some(Value::String(id)), _) => id.clone(),
        (_, Some(Value::Number(id))) => id.to_string(),
        _ => return Err(ProviderError::Decode("tweet without id".to_string())),
    };
    let date = tweet
        .get("created_at")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let raw_body =
        serde_json::to_string(&tweet).map_err(|e| ProviderError::Decode(e.to_string()))?;

    Ok(Entry {
        id,
        date,
        raw_body,
        source: SOURCE.to_string(),
    })
}
