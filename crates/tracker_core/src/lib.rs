//! Tracker core: pure poll state machines, wire records and view-model helpers.
mod error;
mod job;
mod live;
mod model;
mod schedule;
mod status;
mod view_model;

pub use error::PollError;
pub use job::{update_job, JobEffect, JobMsg, JobNotice, JobSession};
pub use live::{
    update_list, AggregateSnapshot, ListEffect, ListMsg, ListNotice, ListPhase, ListSession,
};
pub use model::{
    AuditResult, CarbonResult, DocumentSummary, ExtractionResult, JobHandle, JobResult, LineItem,
    MappingResult, MetricsSummary, ShippingDetails, StatusReport, UploadReceipt,
    ValidationWarning, NON_STANDARD_INVOICE_FLAG,
};
pub use schedule::{IntervalError, PollIntervals};
pub use status::{JobState, PipelineStage};
pub use view_model::{DocumentRowView, JobPhase, JobView, ListView};
