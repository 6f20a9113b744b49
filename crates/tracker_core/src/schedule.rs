use std::time::Duration;

pub const STATUS_INTERVAL: Duration = Duration::from_millis(2_000);
pub const RETRY_INTERVAL: Duration = Duration::from_millis(3_000);
pub const LIST_INTERVAL: Duration = Duration::from_millis(5_000);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("retry interval {retry:?} must not be shorter than status interval {status:?}")]
    RetryShorterThanStatus { status: Duration, retry: Duration },
    #[error("poll intervals must be non-zero")]
    Zero,
}

/// Delays between ticks of the two pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Status check cadence while a job is not terminal.
    pub status: Duration,
    /// Status check delay after a transient failure.
    pub retry: Duration,
    /// Document list and metrics refresh cadence.
    pub list: Duration,
}

impl PollIntervals {
    pub fn new(status: Duration, retry: Duration, list: Duration) -> Result<Self, IntervalError> {
        if status.is_zero() || retry.is_zero() || list.is_zero() {
            return Err(IntervalError::Zero);
        }
        if retry < status {
            return Err(IntervalError::RetryShorterThanStatus { status, retry });
        }
        Ok(Self {
            status,
            retry,
            list,
        })
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            status: STATUS_INTERVAL,
            retry: RETRY_INTERVAL,
            list: LIST_INTERVAL,
        }
    }
}
