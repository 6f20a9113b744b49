use crate::{
    AggregateSnapshot, JobHandle, JobSession, JobState, ListPhase, ListSession, MetricsSummary,
    PipelineStage, PollError, ValidationWarning,
};

/// Coarse phase of a tracked job, as a view would show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    Submitted,
    InProgress(PipelineStage),
    AwaitingResult,
    Finalized,
    Failed,
    ResultUnavailable,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub doc_id: JobHandle,
    pub phase: JobPhase,
    pub attempts: u32,
    /// The last status check failed transiently; the view keeps showing "processing".
    pub retrying: bool,
    pub error: Option<PollError>,
    pub warnings: Vec<ValidationWarning>,
    pub active: bool,
}

impl JobSession {
    pub fn view(&self) -> JobView {
        let error = self.last_error().filter(|e| e.is_terminal()).cloned();
        let phase = if self.result().is_some() {
            JobPhase::Finalized
        } else if let Some(err) = &error {
            match err {
                PollError::ResultFetch { .. } => JobPhase::ResultUnavailable,
                _ => JobPhase::Failed,
            }
        } else if self.is_awaiting_result() {
            JobPhase::AwaitingResult
        } else if !self.is_active() {
            JobPhase::Stopped
        } else {
            match self.observed() {
                None => JobPhase::Pending,
                Some(JobState::Submitted) => JobPhase::Submitted,
                Some(JobState::InProgress(stage)) => JobPhase::InProgress(stage.clone()),
                Some(JobState::Finalized) => JobPhase::Finalized,
                Some(JobState::Failed) => JobPhase::Failed,
            }
        };

        JobView {
            doc_id: self.handle().clone(),
            phase,
            attempts: self.attempts(),
            retrying: matches!(self.last_error(), Some(PollError::Transient { .. })),
            error,
            warnings: self.result().map(|r| r.warnings()).unwrap_or_default(),
            active: self.is_active(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRowView {
    pub doc_id: JobHandle,
    pub file_name: String,
    pub status_label: String,
    pub state: JobState,
    pub uploaded: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListView {
    pub sequence: u64,
    pub documents: Vec<DocumentRowView>,
    pub metrics: Option<MetricsSummary>,
    pub refreshing: bool,
    /// The latest refresh failed and the rows are from an older snapshot.
    pub stale: bool,
}

impl ListView {
    /// Rows and metrics of one replaced snapshot, in backend order.
    pub fn from_snapshot(snapshot: &AggregateSnapshot) -> Self {
        let documents = snapshot
            .documents
            .iter()
            .map(|doc| DocumentRowView {
                doc_id: doc.doc_id.clone(),
                file_name: doc
                    .file_name
                    .clone()
                    .unwrap_or_else(|| "untitled".to_string()),
                status_label: doc.status.clone(),
                state: JobState::from_label(&doc.status),
                uploaded: doc.upload_ts.clone().unwrap_or_default(),
            })
            .collect();

        ListView {
            sequence: snapshot.sequence,
            documents,
            metrics: Some(snapshot.metrics.clone()),
            refreshing: false,
            stale: false,
        }
    }
}

impl ListSession {
    pub fn view(&self) -> ListView {
        let base = self
            .snapshot()
            .map(ListView::from_snapshot)
            .unwrap_or_default();
        ListView {
            refreshing: self.phase() == ListPhase::Refreshing,
            stale: self.last_error().is_some(),
            ..base
        }
    }
}
