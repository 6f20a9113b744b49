//! Scheduled Fetch Loop: one read per tick, the outcome decides the next tick.
//!
//! Ticks of one loop never overlap: the next fetch is only started after the
//! previous outcome was handed to the [`Tick`] and its delay has elapsed.
//! Cancellation is observed both while waiting and while a fetch is in flight;
//! a response that resolves after [`LoopHandle::cancel`] is discarded.
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_trace};

use crate::ApiError;

/// A well-formed response from one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    /// The backend answered, and the answer is a non-retryable condition.
    ApplicationError(String),
}

/// What the loop should do after an outcome was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    After(Duration),
    /// Use the loop's retry delay.
    Retry,
    Stop,
}

#[async_trait::async_trait]
pub trait Tick: Send + 'static {
    type Payload: Send;

    async fn fetch(&mut self) -> Result<Outcome<Self::Payload>, ApiError>;

    fn on_outcome(&mut self, outcome: Outcome<Self::Payload>) -> Next;

    /// Transport failures are transient unless the tick says otherwise.
    fn on_transport_error(&mut self, error: ApiError) -> Next {
        tracker_trace!("transport error, retrying: {}", error);
        Next::Retry
    }

    /// Runs once when the loop ends through cancellation, never after `Next::Stop`.
    fn on_cancel(&mut self) {}
}

/// Owner of a running loop. Dropping it cancels the loop.
pub struct LoopHandle {
    token: CancellationToken,
    gate: Arc<Mutex<()>>,
    task: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Stops the loop. Once this returns no further fetch starts and no
    /// outcome is delivered to the tick. Safe to call repeatedly.
    ///
    /// Must not be called from inside a [`Tick`] callback of the same loop.
    pub fn cancel(&self) {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits until the loop stops on its own or is cancelled elsewhere.
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts a loop on the current tokio runtime. The first fetch runs immediately.
pub fn spawn_loop<T: Tick>(
    label: impl Into<String>,
    tick: T,
    retry_delay: Duration,
) -> LoopHandle {
    let token = CancellationToken::new();
    let gate = Arc::new(Mutex::new(()));
    let task = tokio::spawn(run_loop(
        label.into(),
        tick,
        retry_delay,
        token.clone(),
        gate.clone(),
    ));
    LoopHandle {
        token,
        gate,
        task: Some(task),
    }
}

async fn run_loop<T: Tick>(
    label: String,
    mut tick: T,
    retry_delay: Duration,
    token: CancellationToken,
    gate: Arc<Mutex<()>>,
) {
    let mut tick_no: u64 = 0;
    loop {
        tick_no += 1;
        tracker_trace!("{}: tick {}", label, tick_no);

        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            fetched = tick.fetch() => fetched,
        };

        let next = {
            let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);
            if token.is_cancelled() {
                tracker_debug!("{}: discarding response that arrived after cancel", label);
                break;
            }
            match fetched {
                Ok(outcome) => tick.on_outcome(outcome),
                Err(error) => tick.on_transport_error(error),
            }
        };

        let delay = match next {
            Next::After(delay) => delay,
            Next::Retry => retry_delay,
            Next::Stop => {
                tracker_debug!("{}: stopped after {} ticks", label, tick_no);
                return;
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    tick.on_cancel();
    tracker_debug!("{}: cancelled", label);
}
