use std::sync::Arc;
use std::time::Duration;

use futures_util::future;
use tracker_core::{
    update_list, DocumentSummary, ListEffect, ListMsg, ListNotice, ListSession, MetricsSummary,
};
use tracker_logging::tracker_info;

use crate::fetch_loop::{spawn_loop, LoopHandle, Next, Outcome, Tick};
use crate::{ApiError, EngineEvent, EventSink, PipelineApi, ViewId};

/// Starts refreshing the document list and metrics on a fixed cadence.
pub fn spawn_list_poller(
    view: ViewId,
    api: Arc<dyn PipelineApi>,
    interval: Duration,
    sink: Arc<dyn EventSink>,
) -> LoopHandle {
    tracker_info!("view {}: live list every {:?}", view, interval);
    let tick = ListTick {
        view,
        api,
        session: ListSession::new(interval),
        interval,
        sink,
    };
    spawn_loop(format!("live list {view}"), tick, interval)
}

struct ListReads {
    documents: Result<Vec<DocumentSummary>, ApiError>,
    metrics: Result<MetricsSummary, ApiError>,
}

struct ListTick {
    view: ViewId,
    api: Arc<dyn PipelineApi>,
    session: ListSession,
    interval: Duration,
    sink: Arc<dyn EventSink>,
}

impl ListTick {
    fn apply(&mut self, msg: ListMsg) -> Next {
        let (session, effects) = update_list(self.session.clone(), msg);
        self.session = session;

        let mut next = Next::After(self.interval);
        for effect in effects {
            match effect {
                ListEffect::RefreshAfter(delay) => next = Next::After(delay),
                ListEffect::Notify(notice) => self.notify(notice),
                ListEffect::Stop => next = Next::Stop,
            }
        }
        next
    }

    fn notify(&self, notice: ListNotice) {
        let view = self.view;
        let event = match notice {
            ListNotice::SnapshotReplaced => self
                .session
                .snapshot()
                .cloned()
                .map(|snapshot| EngineEvent::ListRefreshed { view, snapshot }),
            ListNotice::RefreshSkipped => Some(EngineEvent::ListRefreshSkipped {
                view,
                list: self.session.view(),
                reason: self.session.last_error().unwrap_or_default().to_string(),
            }),
        };
        if let Some(event) = event {
            self.sink.emit(event);
        }
    }
}

#[async_trait::async_trait]
impl Tick for ListTick {
    type Payload = ListReads;

    async fn fetch(&mut self) -> Result<Outcome<ListReads>, ApiError> {
        let (session, _) = update_list(self.session.clone(), ListMsg::RefreshStarted);
        self.session = session;

        let (documents, metrics) = future::join(self.api.documents(), self.api.metrics()).await;
        Ok(Outcome::Success(ListReads { documents, metrics }))
    }

    fn on_outcome(&mut self, outcome: Outcome<ListReads>) -> Next {
        match outcome {
            Outcome::Success(reads) => self.apply(ListMsg::RefreshFinished {
                documents: reads.documents.map_err(|err| format!("documents: {err}")),
                metrics: reads.metrics.map_err(|err| format!("metrics: {err}")),
            }),
            Outcome::ApplicationError(reason) => self.apply(ListMsg::RefreshFinished {
                documents: Err(reason.clone()),
                metrics: Err(reason),
            }),
        }
    }

    fn on_cancel(&mut self) {
        self.apply(ListMsg::Cancelled);
    }
}
