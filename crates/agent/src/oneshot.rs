//! Single-shot inspection and administration paths.

use tracing::info;

use lastff_core::{Feed, FeedRequest, JobQueue, QueueError};

/// Page size used when reading back an archived feed.
pub const DEBUG_PAGE_SIZE: u32 = 50;

/// Read back the first archived page of `account` and log every entry.
pub async fn debug_feed<Q>(queue: &Q, account: &str) -> Result<Feed, QueueError>
where
    Q: JobQueue + ?Sized,
{
    let request = FeedRequest::first_page(account, DEBUG_PAGE_SIZE);
    let feed = queue.fetch_feed(&request).await?;

    info!(feed_id = %feed.id, entries = feed.entries.len(), "archived feed");
    for entry in &feed.entries {
        info!(entry_id = %entry.id, date = %entry.date, raw_body = %entry.raw_body, "entry");
    }

    Ok(feed)
}

/// Send one administrative command. Only transport success is meaningful.
pub async fn run_command<Q>(queue: &Q, text: &str) -> Result<String, QueueError>
where
    Q: JobQueue + ?Sized,
{
    let reply = queue.command(text).await?;
    info!(command = text, reply = %reply, "command sent");
    Ok(reply)
}
