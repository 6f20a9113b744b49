//! Job-Status poller state machine.
//!
//! `Pending -> (InProgress)* -> Finalized | Failed`. The session is only ever
//! mutated through [`update_job`]; the engine turns the returned effects into
//! network reads and timer delays.
use std::time::Duration;

use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::{JobHandle, JobResult, JobState, PollError, PollIntervals};

#[derive(Debug, Clone, PartialEq)]
pub enum JobMsg {
    /// The status endpoint answered with a well-formed label.
    StatusReceived(JobState),
    /// Transport error, timeout, malformed body or "not found" on a status check.
    StatusUnavailable { reason: String },
    ResultReceived(Box<JobResult>),
    ResultUnavailable { reason: String },
    /// The owning view went away.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEffect {
    CheckStatusAfter(Duration),
    FetchResult,
    Notify(JobNotice),
    Stop,
}

/// What the presentation layer should hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobNotice {
    StateChanged,
    Finalized,
    Failed,
    ResultUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobSession {
    handle: JobHandle,
    observed: Option<JobState>,
    awaiting_result: bool,
    attempts: u32,
    last_error: Option<PollError>,
    active: bool,
    result: Option<Box<JobResult>>,
    intervals: PollIntervals,
}

impl JobSession {
    pub fn new(handle: JobHandle, intervals: PollIntervals) -> Self {
        Self {
            handle,
            observed: None,
            awaiting_result: false,
            attempts: 0,
            last_error: None,
            active: true,
            result: None,
            intervals,
        }
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    /// Latest reported state; `None` while pending.
    pub fn observed(&self) -> Option<&JobState> {
        self.observed.as_ref()
    }

    pub fn is_awaiting_result(&self) -> bool {
        self.awaiting_result
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_error(&self) -> Option<&PollError> {
        self.last_error.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn result(&self) -> Option<&JobResult> {
        self.result.as_deref()
    }

    pub fn intervals(&self) -> PollIntervals {
        self.intervals
    }

    fn stop(&mut self) {
        self.active = false;
        self.awaiting_result = false;
    }
}

/// Pure update function: applies a message to a session and returns the next effects.
pub fn update_job(mut session: JobSession, msg: JobMsg) -> (JobSession, Vec<JobEffect>) {
    if !session.active {
        return (session, Vec::new());
    }

    let effects = match msg {
        JobMsg::StatusReceived(_) if session.awaiting_result => {
            tracker_debug!(
                "job {}: status ignored while result fetch is pending",
                session.handle
            );
            Vec::new()
        }
        JobMsg::StatusReceived(JobState::Finalized) => {
            session.attempts += 1;
            session.last_error = None;
            session.awaiting_result = true;
            tracker_info!("job {}: finalized, fetching result", session.handle);
            vec![JobEffect::FetchResult]
        }
        JobMsg::StatusReceived(JobState::Failed) => {
            session.attempts += 1;
            session.observed = Some(JobState::Failed);
            session.last_error = Some(PollError::ApplicationFailure {
                doc_id: session.handle.clone(),
            });
            session.stop();
            tracker_warn!("job {}: backend reported failure", session.handle);
            vec![JobEffect::Notify(JobNotice::Failed), JobEffect::Stop]
        }
        JobMsg::StatusReceived(state) => {
            session.attempts += 1;
            session.last_error = None;
            let changed = session.observed.as_ref() != Some(&state);
            let mut effects = Vec::with_capacity(2);
            if changed {
                tracker_debug!("job {}: now {}", session.handle, state);
                session.observed = Some(state);
                effects.push(JobEffect::Notify(JobNotice::StateChanged));
            }
            effects.push(JobEffect::CheckStatusAfter(session.intervals.status));
            effects
        }
        JobMsg::StatusUnavailable { reason } => {
            session.attempts += 1;
            tracker_debug!(
                "job {}: status unavailable ({}), retrying",
                session.handle,
                reason
            );
            session.last_error = Some(PollError::Transient { reason });
            vec![JobEffect::CheckStatusAfter(session.intervals.retry)]
        }
        JobMsg::ResultReceived(result) if session.awaiting_result => {
            session.attempts += 1;
            session.observed = Some(JobState::Finalized);
            session.last_error = None;
            session.result = Some(result);
            session.stop();
            vec![JobEffect::Notify(JobNotice::Finalized), JobEffect::Stop]
        }
        JobMsg::ResultUnavailable { reason } if session.awaiting_result => {
            session.attempts += 1;
            tracker_warn!(
                "job {}: result could not be retrieved: {}",
                session.handle,
                reason
            );
            session.last_error = Some(PollError::ResultFetch {
                doc_id: session.handle.clone(),
                reason,
            });
            session.stop();
            vec![JobEffect::Notify(JobNotice::ResultUnavailable), JobEffect::Stop]
        }
        JobMsg::ResultReceived(_) | JobMsg::ResultUnavailable { .. } => Vec::new(),
        JobMsg::Cancelled => {
            session.stop();
            vec![JobEffect::Stop]
        }
    };

    (session, effects)
}
