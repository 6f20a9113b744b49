use crate::JobHandle;

/// Failure conditions a poller can record.
///
/// Only `ApplicationFailure` and `ResultFetch` are ever surfaced to a consumer;
/// `Transient` is absorbed by the retry schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("status temporarily unavailable: {reason}")]
    Transient { reason: String },
    #[error("processing failed for document {doc_id}")]
    ApplicationFailure { doc_id: JobHandle },
    #[error("document {doc_id} was finalized but its result could not be retrieved: {reason}")]
    ResultFetch { doc_id: JobHandle, reason: String },
}

impl PollError {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollError::Transient { .. })
    }
}
