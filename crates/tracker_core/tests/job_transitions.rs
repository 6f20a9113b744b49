use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tracker_core::{
    update_job, AuditResult, CarbonResult, ExtractionResult, JobEffect, JobHandle, JobMsg,
    JobNotice, JobPhase, JobResult, JobSession, JobState, MappingResult, PipelineStage, PollError,
    PollIntervals,
};

const STATUS: Duration = Duration::from_millis(2_000);
const RETRY: Duration = Duration::from_millis(3_000);

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn new_session(id: &str) -> JobSession {
    JobSession::new(JobHandle::new(id), PollIntervals::default())
}

fn in_progress(stage: PipelineStage) -> JobMsg {
    JobMsg::StatusReceived(JobState::InProgress(stage))
}

fn sample_result(id: &str) -> Box<JobResult> {
    Box::new(JobResult {
        doc_id: JobHandle::new(id),
        extraction: ExtractionResult {
            vendor_name: "Acme Freight".to_string(),
            vendor_address: None,
            receiver_name: None,
            receiver_address: None,
            invoice_number: "INV-1".to_string(),
            invoice_date: "2024-01-31".to_string(),
            currency: "USD".to_string(),
            line_items: Vec::new(),
            shipping_details: None,
            subtotal: 100.0,
            tax: 5.0,
            grand_total: 105.0,
            extraction_confidence: 0.9,
            is_standard_invoice: true,
        },
        mapping: MappingResult {
            vendor_canonical: "ACME".to_string(),
            standardized_line_items: Vec::new(),
            scope_category: "Scope 3".to_string(),
            naics_code: Some("484110".to_string()),
            mapping_confidence: 0.8,
            rule_version: "v1".to_string(),
        },
        carbon: CarbonResult {
            total_kg_co2e: 42.0,
            spend_based_kg_co2e: 40.0,
            logistics_kg_co2e: 2.0,
            distance_km: None,
            scope: "3".to_string(),
            category: "Transportation".to_string(),
            naics_code: Some("484110".to_string()),
            is_verified_match: true,
            line_level_breakdown: Vec::new(),
        },
        audit: AuditResult {
            is_valid: true,
            audit_flags: Vec::new(),
            confidence_score: 0.95,
        },
        finalized_ts: "2024-01-31T12:00:00".to_string(),
    })
}

fn apply_all(session: JobSession, msgs: Vec<JobMsg>) -> (JobSession, Vec<JobEffect>) {
    let mut session = session;
    let mut all = Vec::new();
    for msg in msgs {
        let (next, effects) = update_job(session, msg);
        session = next;
        all.extend(effects);
    }
    (session, all)
}

#[test]
fn new_session_is_pending() {
    init_logging();
    let session = new_session("a");
    let view = session.view();
    assert_eq!(view.phase, JobPhase::Pending);
    assert_eq!(view.attempts, 0);
    assert!(view.active);
    assert_eq!(view.error, None);
}

#[test]
fn finalized_after_progress_fetches_result_once_and_stops() {
    init_logging();
    let session = new_session("X");

    let (session, effects) = update_job(session, in_progress(PipelineStage::OcrProcessing));
    assert_eq!(
        effects,
        vec![
            JobEffect::Notify(JobNotice::StateChanged),
            JobEffect::CheckStatusAfter(STATUS),
        ]
    );

    let (session, effects) = update_job(session, in_progress(PipelineStage::OcrProcessing));
    assert_eq!(effects, vec![JobEffect::CheckStatusAfter(STATUS)]);

    let (session, effects) = update_job(session, JobMsg::StatusReceived(JobState::Finalized));
    assert_eq!(effects, vec![JobEffect::FetchResult]);
    assert_eq!(session.view().phase, JobPhase::AwaitingResult);
    // Observed state only becomes finalized once the result is in hand.
    assert_eq!(
        session.observed(),
        Some(&JobState::InProgress(PipelineStage::OcrProcessing))
    );

    let (session, effects) = update_job(session, JobMsg::ResultReceived(sample_result("X")));
    assert_eq!(
        effects,
        vec![JobEffect::Notify(JobNotice::Finalized), JobEffect::Stop]
    );
    assert!(!session.is_active());
    assert_eq!(session.observed(), Some(&JobState::Finalized));
    assert_eq!(session.result().map(|r| r.doc_id.as_str()), Some("X"));
    assert_eq!(session.view().phase, JobPhase::Finalized);
    assert_eq!(session.attempts(), 4);
}

#[test]
fn failed_status_is_terminal_and_reported_once() {
    init_logging();
    let (session, effects) = update_job(new_session("c"), JobMsg::StatusReceived(JobState::Failed));
    assert_eq!(
        effects,
        vec![JobEffect::Notify(JobNotice::Failed), JobEffect::Stop]
    );
    assert!(!session.is_active());
    assert_eq!(
        session.view().error,
        Some(PollError::ApplicationFailure {
            doc_id: JobHandle::new("c")
        })
    );

    // Nothing else is issued once terminal.
    let (session, effects) = apply_all(
        session,
        vec![
            in_progress(PipelineStage::Mapped),
            JobMsg::StatusReceived(JobState::Finalized),
            JobMsg::StatusUnavailable {
                reason: "late".to_string(),
            },
            JobMsg::ResultReceived(sample_result("c")),
        ],
    );
    assert!(effects.is_empty());
    assert_eq!(session.view().phase, JobPhase::Failed);
    assert!(session.result().is_none());
}

#[test]
fn transport_error_backs_off_then_cadence_recovers() {
    init_logging();
    let (session, effects) = update_job(
        new_session("b"),
        JobMsg::StatusUnavailable {
            reason: "connection refused".to_string(),
        },
    );
    assert_eq!(effects, vec![JobEffect::CheckStatusAfter(RETRY)]);
    assert_eq!(session.observed(), None);
    assert!(session.view().retrying);
    assert_eq!(session.view().phase, JobPhase::Pending);
    assert_eq!(session.view().error, None);

    let (session, effects) = update_job(session, in_progress(PipelineStage::Mapped));
    assert_eq!(
        effects,
        vec![
            JobEffect::Notify(JobNotice::StateChanged),
            JobEffect::CheckStatusAfter(STATUS),
        ]
    );
    assert!(!session.view().retrying);
}

#[test]
fn interleaved_transport_errors_never_fail_the_job() {
    init_logging();
    let mut session = new_session("flaky");
    for i in 0..50 {
        let msg = if i % 3 == 0 {
            in_progress(PipelineStage::OcrComplete)
        } else {
            JobMsg::StatusUnavailable {
                reason: format!("timeout #{i}"),
            }
        };
        let (next, effects) = update_job(session, msg);
        session = next;
        assert!(session.is_active());
        assert!(!effects.contains(&JobEffect::Stop));
        assert!(!effects.contains(&JobEffect::FetchResult));
        assert!(!effects.contains(&JobEffect::Notify(JobNotice::Failed)));
        assert_eq!(session.view().error, None);
    }
}

#[test]
fn not_found_is_handled_like_a_transient_error() {
    init_logging();
    let (session, effects) = update_job(
        new_session("fresh"),
        JobMsg::StatusUnavailable {
            reason: "not found".to_string(),
        },
    );
    assert_eq!(effects, vec![JobEffect::CheckStatusAfter(RETRY)]);
    assert!(session.is_active());
    assert_ne!(session.view().phase, JobPhase::Failed);
}

#[test]
fn repeated_progress_is_idempotent() {
    init_logging();
    let (session, _) = update_job(new_session("i"), in_progress(PipelineStage::Audited));
    let before = session.observed().cloned();
    let (session, effects) = apply_all(
        session,
        (0..10).map(|_| in_progress(PipelineStage::Audited)).collect(),
    );
    assert_eq!(session.observed().cloned(), before);
    assert!(effects
        .iter()
        .all(|effect| *effect == JobEffect::CheckStatusAfter(STATUS)));
}

#[test]
fn submitted_is_a_non_terminal_stage() {
    init_logging();
    let (session, effects) = update_job(
        new_session("s"),
        JobMsg::StatusReceived(JobState::Submitted),
    );
    assert_eq!(
        effects,
        vec![
            JobEffect::Notify(JobNotice::StateChanged),
            JobEffect::CheckStatusAfter(STATUS),
        ]
    );
    assert_eq!(session.view().phase, JobPhase::Submitted);
}

#[test]
fn result_fetch_failure_is_distinct_and_does_not_resume_polling() {
    init_logging();
    let (session, _) = update_job(new_session("r"), JobMsg::StatusReceived(JobState::Finalized));
    let (session, effects) = update_job(
        session,
        JobMsg::ResultUnavailable {
            reason: "http status 500".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![
            JobEffect::Notify(JobNotice::ResultUnavailable),
            JobEffect::Stop,
        ]
    );
    let view = session.view();
    assert_eq!(view.phase, JobPhase::ResultUnavailable);
    assert_eq!(
        view.error,
        Some(PollError::ResultFetch {
            doc_id: JobHandle::new("r"),
            reason: "http status 500".to_string(),
        })
    );
    assert!(!view.active);
}

#[test]
fn status_during_result_fetch_is_ignored() {
    init_logging();
    let (session, _) = update_job(new_session("q"), JobMsg::StatusReceived(JobState::Finalized));
    let (session, effects) = update_job(session, JobMsg::StatusReceived(JobState::Finalized));
    assert!(effects.is_empty());
    assert!(session.is_awaiting_result());
}

#[test]
fn unsolicited_result_is_ignored() {
    init_logging();
    let (session, effects) = update_job(
        new_session("u"),
        JobMsg::ResultReceived(sample_result("u")),
    );
    assert!(effects.is_empty());
    assert!(session.result().is_none());
    assert!(session.is_active());
}

#[test]
fn cancelled_session_goes_quiet() {
    init_logging();
    let (session, _) = update_job(new_session("k"), in_progress(PipelineStage::Mapped));
    let (session, effects) = update_job(session, JobMsg::Cancelled);
    assert_eq!(effects, vec![JobEffect::Stop]);
    assert_eq!(session.view().phase, JobPhase::Stopped);

    let (_, effects) = update_job(session, JobMsg::StatusReceived(JobState::Finalized));
    assert!(effects.is_empty());
}

#[test]
fn warnings_travel_with_the_finalized_result() {
    init_logging();
    let mut result = sample_result("w");
    result.extraction.is_standard_invoice = false;
    let (session, _) = apply_all(
        new_session("w"),
        vec![
            JobMsg::StatusReceived(JobState::Finalized),
            JobMsg::ResultReceived(result),
        ],
    );
    let view = session.view();
    assert_eq!(view.phase, JobPhase::Finalized);
    assert_eq!(view.error, None);
    assert_eq!(view.warnings.len(), 1);
}
