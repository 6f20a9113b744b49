use std::sync::Arc;
use std::time::Duration;

use tracker_core::{
    update_job, JobEffect, JobHandle, JobMsg, JobNotice, JobResult, JobSession, JobState,
    PollIntervals,
};
use tracker_logging::{tracker_debug, tracker_info};

use crate::fetch_loop::{spawn_loop, LoopHandle, Next, Outcome, Tick};
use crate::{ApiError, EngineEvent, EventSink, PipelineApi, ViewId};

/// Starts tracking one submitted document until it is finalized or failed.
pub fn spawn_job_poller(
    view: ViewId,
    api: Arc<dyn PipelineApi>,
    handle: JobHandle,
    intervals: PollIntervals,
    sink: Arc<dyn EventSink>,
) -> LoopHandle {
    tracker_info!("view {}: tracking job {}", view, handle);
    let label = format!("job {handle}");
    let tick = JobTick {
        view,
        api,
        session: JobSession::new(handle, intervals),
        sink,
    };
    spawn_loop(label, tick, intervals.retry)
}

enum JobPayload {
    Status(JobState),
    Result(Box<JobResult>),
}

struct JobTick {
    view: ViewId,
    api: Arc<dyn PipelineApi>,
    session: JobSession,
    sink: Arc<dyn EventSink>,
}

impl JobTick {
    fn apply(&mut self, msg: JobMsg) -> Next {
        let (session, effects) = update_job(self.session.clone(), msg);
        self.session = session;

        let mut next = None;
        for effect in effects {
            match effect {
                JobEffect::CheckStatusAfter(delay) => next = Some(Next::After(delay)),
                JobEffect::FetchResult => next = Some(Next::After(Duration::ZERO)),
                JobEffect::Notify(notice) => self.notify(notice),
                JobEffect::Stop => next = Some(Next::Stop),
            }
        }
        next.unwrap_or(if self.session.is_active() {
            Next::Retry
        } else {
            Next::Stop
        })
    }

    fn notify(&self, notice: JobNotice) {
        let view = self.view;
        let job = self.session.view();
        let event = match notice {
            JobNotice::StateChanged => Some(EngineEvent::JobUpdated { view, job }),
            JobNotice::Finalized => self.session.result().map(|result| EngineEvent::JobFinalized {
                view,
                job,
                result: Box::new(result.clone()),
            }),
            JobNotice::Failed | JobNotice::ResultUnavailable => {
                self.session
                    .last_error()
                    .cloned()
                    .map(|error| EngineEvent::JobFailed { view, job, error })
            }
        };
        if let Some(event) = event {
            self.sink.emit(event);
        }
    }
}

#[async_trait::async_trait]
impl Tick for JobTick {
    type Payload = JobPayload;

    async fn fetch(&mut self) -> Result<Outcome<JobPayload>, ApiError> {
        let handle = self.session.handle().clone();
        if self.session.is_awaiting_result() {
            let result = self.api.result(&handle).await?;
            return Ok(Outcome::Success(JobPayload::Result(Box::new(result))));
        }

        let report = self.api.status(&handle).await?;
        match JobState::from_label(&report.status) {
            JobState::Failed => Ok(Outcome::ApplicationError(report.status)),
            state => Ok(Outcome::Success(JobPayload::Status(state))),
        }
    }

    fn on_outcome(&mut self, outcome: Outcome<JobPayload>) -> Next {
        let msg = match outcome {
            Outcome::Success(JobPayload::Status(state)) => JobMsg::StatusReceived(state),
            Outcome::Success(JobPayload::Result(result)) => JobMsg::ResultReceived(result),
            Outcome::ApplicationError(_) => JobMsg::StatusReceived(JobState::Failed),
        };
        self.apply(msg)
    }

    fn on_transport_error(&mut self, error: ApiError) -> Next {
        if error.is_not_found() {
            tracker_debug!("job {}: not visible to the backend yet", self.session.handle());
        }
        let reason = error.to_string();
        let msg = if self.session.is_awaiting_result() {
            JobMsg::ResultUnavailable { reason }
        } else {
            JobMsg::StatusUnavailable { reason }
        };
        self.apply(msg)
    }

    fn on_cancel(&mut self) {
        self.apply(JobMsg::Cancelled);
    }
}
