use std::fmt;

use tracker_core::{AggregateSnapshot, JobHandle, JobResult, JobView, ListView, PollError};

/// Identifies one mounted view (and the poller session it owns).
pub type ViewId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Submitted {
        doc_id: JobHandle,
        file_name: String,
    },
    SubmitFailed {
        file_name: String,
        error: ApiError,
    },
    JobUpdated {
        view: ViewId,
        job: JobView,
    },
    JobFinalized {
        view: ViewId,
        job: JobView,
        result: Box<JobResult>,
    },
    JobFailed {
        view: ViewId,
        job: JobView,
        error: PollError,
    },
    ListRefreshed {
        view: ViewId,
        snapshot: AggregateSnapshot,
    },
    /// The previous snapshot is kept; `list` is marked stale.
    ListRefreshSkipped {
        view: ViewId,
        list: ListView,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FailureKind::NotFound
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidRequest,
    HttpStatus(u16),
    NotFound,
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
