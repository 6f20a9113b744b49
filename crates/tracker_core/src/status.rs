use std::fmt;

/// Intermediate backend stage. Every variant is "still working" to the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStage {
    OcrProcessing,
    OcrComplete,
    Mapped,
    Audited,
    Other(String),
}

/// Lifecycle stage of a job as reported by `GET /status/{doc_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    InProgress(PipelineStage),
    Finalized,
    Failed,
}

impl JobState {
    /// Classifies a raw backend status label. Unknown labels are treated as in progress.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "uploaded" | "submitted" => JobState::Submitted,
            "finalized" => JobState::Finalized,
            "failed" => JobState::Failed,
            "ocr_processing" => JobState::InProgress(PipelineStage::OcrProcessing),
            "ocr_complete" => JobState::InProgress(PipelineStage::OcrComplete),
            "mapped" => JobState::InProgress(PipelineStage::Mapped),
            "audited" => JobState::InProgress(PipelineStage::Audited),
            _ => JobState::InProgress(PipelineStage::Other(normalized)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finalized | JobState::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::OcrProcessing => write!(f, "ocr processing"),
            PipelineStage::OcrComplete => write!(f, "ocr complete"),
            PipelineStage::Mapped => write!(f, "mapped"),
            PipelineStage::Audited => write!(f, "audited"),
            PipelineStage::Other(label) => write!(f, "{label}"),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Submitted => write!(f, "submitted"),
            JobState::InProgress(stage) => write!(f, "in progress ({stage})"),
            JobState::Finalized => write!(f, "finalized"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}
