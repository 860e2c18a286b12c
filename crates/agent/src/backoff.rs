//! Fixed, stage-dependent retry delays.

use std::time::Duration;

/// Where a cycle failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// No job could be obtained (queue unreachable or empty).
    Queue,
    /// A job was obtained but fetching or finalizing it failed.
    Job,
}

/// Delay inserted before the next `GetJob` after a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Pause after the queue had nothing for us.
    pub queue_delay: Duration,
    /// Pause after a job was abandoned mid-cycle.
    pub job_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            queue_delay: Duration::from_secs(5),
            job_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    pub fn fixed(queue_delay: Duration, job_delay: Duration) -> Self {
        Self {
            queue_delay,
            job_delay,
        }
    }

    pub fn delay_for(&self, stage: FailureStage) -> Duration {
        match stage {
            FailureStage::Queue => self.queue_delay,
            FailureStage::Job => self.job_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pauses_longer_when_queue_is_unavailable() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(FailureStage::Queue), Duration::from_secs(5));
        assert_eq!(policy.delay_for(FailureStage::Job), Duration::from_secs(1));
        assert!(policy.delay_for(FailureStage::Queue) > policy.delay_for(FailureStage::Job));
    }
}
