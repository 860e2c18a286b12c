//! Scoped ownership of an archive upload.

use lastff_core::{ArchiveAck, ArchiveSink, Entry, QueueError, QueueOperation};

/// An open archive upload.
///
/// `close` hands back the server acknowledgment. On any path that skips it (early
/// return, panic, cancelled future) dropping the guard drops the sink, which releases
/// the underlying channel.
pub struct ArchiveStream {
    sink: Option<Box<dyn ArchiveSink>>,
    sent: u64,
}

impl ArchiveStream {
    pub fn new(sink: Box<dyn ArchiveSink>) -> Self {
        Self {
            sink: Some(sink),
            sent: 0,
        }
    }

    /// Push one entry into the upload.
    pub async fn send(&mut self, entry: Entry) -> Result<(), QueueError> {
        let sink = self.sink.as_mut().ok_or_else(closed)?;
        sink.send(entry).await?;
        self.sent += 1;
        Ok(())
    }

    /// Entries pushed so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Close the send side and wait for the acknowledgment.
    pub async fn close(mut self) -> Result<ArchiveAck, QueueError> {
        let mut sink = self.sink.take().ok_or_else(closed)?;
        sink.close().await
    }
}

impl Drop for ArchiveStream {
    fn drop(&mut self) {
        if self.sink.take().is_some() {
            tracing::debug!(sent = self.sent, "archive stream released without acknowledgment");
        }
    }
}

impl core::fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArchiveStream")
            .field("open", &self.sink.is_some())
            .field("sent", &self.sent)
            .finish()
    }
}

fn closed() -> QueueError {
    QueueError::new(
        QueueOperation::ArchiveFeed,
        "failed_precondition",
        "archive stream already closed",
    )
}
