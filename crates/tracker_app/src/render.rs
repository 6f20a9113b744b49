//! Plain-text rendering of the view models.
//!
//! Every function here is pure so the output can be asserted in tests.

use chrono::{DateTime, Local};
use tracker_core::{JobPhase, JobResult, JobState, JobView, ListView, PollError, ValidationWarning};

pub fn job_line(job: &JobView) -> String {
    let phase = match &job.phase {
        JobPhase::Pending => "waiting for first status".to_string(),
        JobPhase::Submitted => "submitted".to_string(),
        JobPhase::InProgress(stage) => format!("processing ({stage})"),
        JobPhase::AwaitingResult => "finalized, fetching result".to_string(),
        JobPhase::Finalized => "finalized".to_string(),
        JobPhase::Failed => "failed".to_string(),
        JobPhase::ResultUnavailable => "finalized, result unavailable".to_string(),
        JobPhase::Stopped => "stopped".to_string(),
    };
    let mut line = format!("[{}] {} (check {})", job.doc_id, phase, job.attempts);
    if job.retrying {
        line.push_str(", backend unreachable, retrying");
    }
    line
}

pub fn failure(error: &PollError) -> String {
    match error {
        PollError::ApplicationFailure { doc_id } => {
            format!("Processing of {doc_id} failed in the pipeline")
        }
        PollError::ResultFetch { doc_id, reason } => {
            format!("{doc_id} finished processing but its result could not be read: {reason}")
        }
        PollError::Transient { reason } => format!("Backend unreachable: {reason}"),
    }
}

pub fn result_summary(result: &JobResult) -> String {
    let extraction = &result.extraction;
    let carbon = &result.carbon;
    let audit = &result.audit;

    let mut lines = vec![
        format!("Document {}", result.doc_id),
        format!(
            "  Vendor:   {} ({})",
            extraction.vendor_name, result.mapping.vendor_canonical
        ),
        format!(
            "  Invoice:  {} dated {}",
            extraction.invoice_number, extraction.invoice_date
        ),
        format!(
            "  Total:    {:.2} {} ({} line items)",
            extraction.grand_total,
            extraction.currency,
            extraction.line_items.len()
        ),
        format!(
            "  Carbon:   {:.2} kg CO2e, scope {} / {}",
            carbon.total_kg_co2e, carbon.scope, carbon.category
        ),
        format!(
            "  Audit:    {} (confidence {:.0}%)",
            if audit.is_valid { "valid" } else { "needs review" },
            audit.confidence_score * 100.0
        ),
        format!("  Finalized {}", result.finalized_ts),
    ];
    if let Some(code) = &result.mapping.naics_code {
        lines.insert(5, format!("  NAICS:    {code}"));
    }
    lines.join("\n")
}

pub fn warnings(warnings: &[ValidationWarning]) -> Vec<String> {
    warnings
        .iter()
        .map(|warning| format!("Warning: {warning}"))
        .collect()
}

pub fn list(view: &ListView, at: DateTime<Local>) -> String {
    let mut out = format!("Snapshot #{} at {}", view.sequence, at.format("%H:%M:%S"));
    if view.stale {
        out.push_str(" (stale)");
    }
    if view.refreshing {
        out.push_str(" (refreshing)");
    }
    out.push('\n');
    if let Some(metrics) = &view.metrics {
        out.push_str(&format!(
            "Processed: {}  Avg carbon: {:.2} kg  Failure rate: {:.1}%\n",
            metrics.total_processed,
            metrics.average_carbon,
            metrics.failure_rate * 100.0
        ));
        if !metrics.top_categories.is_empty() {
            out.push_str(&format!(
                "Top categories: {}\n",
                metrics.top_categories.join(", ")
            ));
        }
    }
    if view.documents.is_empty() {
        out.push_str("No documents yet\n");
        return out;
    }
    for row in &view.documents {
        out.push_str(&format!(
            "{:<12} {:<28} {:<15} {}\n",
            coarse_status(&row.state),
            row.file_name,
            row.status_label,
            row.uploaded
        ));
    }
    out
}

pub fn refresh_skipped(view: &ListView, reason: &str) -> String {
    if view.sequence == 0 {
        return format!("Refresh failed ({reason}); no data yet");
    }
    let mut line = format!(
        "Refresh failed ({reason}); still showing snapshot #{}",
        view.sequence
    );
    if view.stale {
        line.push_str(" (stale)");
    }
    line
}

fn coarse_status(state: &JobState) -> &'static str {
    match state {
        JobState::Submitted => "queued",
        JobState::InProgress(_) => "processing",
        JobState::Finalized => "done",
        JobState::Failed => "failed",
    }
}
