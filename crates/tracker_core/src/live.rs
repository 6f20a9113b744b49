//! Live-List poller state machine: `Idle -> Refreshing -> Idle`, forever.
use std::time::Duration;

use tracker_logging::tracker_debug;

use crate::{DocumentSummary, MetricsSummary};

/// Document list and metrics taken from one refresh. Never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSnapshot {
    pub sequence: u64,
    pub documents: Vec<DocumentSummary>,
    pub metrics: MetricsSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListPhase {
    #[default]
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListMsg {
    RefreshStarted,
    RefreshFinished {
        documents: Result<Vec<DocumentSummary>, String>,
        metrics: Result<MetricsSummary, String>,
    },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEffect {
    RefreshAfter(Duration),
    Notify(ListNotice),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListNotice {
    SnapshotReplaced,
    RefreshSkipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListSession {
    snapshot: Option<AggregateSnapshot>,
    phase: ListPhase,
    refreshes: u64,
    failed_refreshes: u64,
    last_error: Option<String>,
    active: bool,
    interval: Duration,
}

impl ListSession {
    pub fn new(interval: Duration) -> Self {
        Self {
            snapshot: None,
            phase: ListPhase::Idle,
            refreshes: 0,
            failed_refreshes: 0,
            last_error: None,
            active: true,
            interval,
        }
    }

    pub fn snapshot(&self) -> Option<&AggregateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn phase(&self) -> ListPhase {
        self.phase
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    pub fn failed_refreshes(&self) -> u64 {
        self.failed_refreshes
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Pure update function for the live list.
pub fn update_list(mut session: ListSession, msg: ListMsg) -> (ListSession, Vec<ListEffect>) {
    if !session.active {
        return (session, Vec::new());
    }

    let effects = match msg {
        ListMsg::RefreshStarted => {
            session.phase = ListPhase::Refreshing;
            Vec::new()
        }
        ListMsg::RefreshFinished { documents, metrics } => {
            session.phase = ListPhase::Idle;
            session.refreshes += 1;
            let notice = match (documents, metrics) {
                (Ok(documents), Ok(metrics)) => {
                    let sequence = session.snapshot.as_ref().map_or(1, |s| s.sequence + 1);
                    session.snapshot = Some(AggregateSnapshot {
                        sequence,
                        documents,
                        metrics,
                    });
                    session.last_error = None;
                    ListNotice::SnapshotReplaced
                }
                (documents, metrics) => {
                    // Documents and metrics in a snapshot always come from the same refresh.
                    let reason = [documents.err(), metrics.err()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join("; ");
                    tracker_debug!("live list refresh dropped: {}", reason);
                    session.failed_refreshes += 1;
                    session.last_error = Some(reason);
                    ListNotice::RefreshSkipped
                }
            };
            vec![
                ListEffect::Notify(notice),
                ListEffect::RefreshAfter(session.interval),
            ]
        }
        ListMsg::Cancelled => {
            session.active = false;
            session.phase = ListPhase::Idle;
            vec![ListEffect::Stop]
        }
    };

    (session, effects)
}
