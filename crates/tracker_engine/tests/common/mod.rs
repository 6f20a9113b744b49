#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tracker_core::{
    AuditResult, CarbonResult, DocumentSummary, ExtractionResult, JobHandle, JobResult,
    MappingResult, MetricsSummary, StatusReport, UploadReceipt,
};
use tracker_engine::{ApiError, EngineEvent, EventSink, FailureKind, PipelineApi, UploadRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Upload,
    Status,
    Result,
    Documents,
    Metrics,
}

/// Scripted backend. Each endpoint pops its next answer; exhausted scripts
/// fall back to a neutral answer.
#[derive(Default)]
pub struct FakeApi {
    statuses: Mutex<VecDeque<Result<String, ApiError>>>,
    results: Mutex<VecDeque<Result<JobResult, ApiError>>>,
    metrics: Mutex<VecDeque<Result<MetricsSummary, ApiError>>>,
    documents: Mutex<VecDeque<Result<Vec<DocumentSummary>, ApiError>>>,
    calls: Mutex<Vec<(Call, Instant)>>,
    read_delay: Option<Duration>,
    block_status_at: Option<(usize, Arc<Notify>, mpsc::UnboundedSender<usize>)>,
}

impl FakeApi {
    pub fn with_statuses(labels: Vec<Result<&str, ApiError>>) -> Self {
        let api = Self::default();
        *api.statuses.lock().unwrap() = labels
            .into_iter()
            .map(|label| label.map(str::to_string))
            .collect();
        api
    }

    pub fn push_result(self, result: Result<JobResult, ApiError>) -> Self {
        self.results.lock().unwrap().push_back(result);
        self
    }

    pub fn push_metrics(self, metrics: Result<MetricsSummary, ApiError>) -> Self {
        self.metrics.lock().unwrap().push_back(metrics);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Status call number `index` (0-based) reports on `started` and then
    /// waits for `release` before answering.
    pub fn block_status_at(
        mut self,
        index: usize,
        release: Arc<Notify>,
        started: mpsc::UnboundedSender<usize>,
    ) -> Self {
        self.block_status_at = Some((index, release, started));
        self
    }

    pub fn calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().iter().filter(|(c, _)| *c == call).count()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push((call, Instant::now()));
        calls.iter().filter(|(c, _)| *c == call).count() - 1
    }

    async fn delay(&self) {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl PipelineApi for FakeApi {
    async fn upload(&self, upload: UploadRequest) -> Result<UploadReceipt, ApiError> {
        self.record(Call::Upload);
        Ok(UploadReceipt {
            doc_id: JobHandle::new(format!("doc-{}", upload.file_name)),
            status: "uploaded".to_string(),
            message: "Invoice received and processing started.".to_string(),
        })
    }

    async fn status(&self, handle: &JobHandle) -> Result<StatusReport, ApiError> {
        let index = self.record(Call::Status);
        if let Some((block_at, release, started)) = &self.block_status_at {
            if index == *block_at {
                let released = release.notified();
                let _ = started.send(index);
                released.await;
            }
        }
        let next = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ocr_processing".to_string()));
        next.map(|status| StatusReport {
            doc_id: Some(handle.clone()),
            status,
            processed_at: None,
        })
    }

    async fn result(&self, handle: &JobHandle) -> Result<JobResult, ApiError> {
        self.record(Call::Result);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_result(handle.as_str())))
    }

    async fn documents(&self) -> Result<Vec<DocumentSummary>, ApiError> {
        self.record(Call::Documents);
        self.delay().await;
        let next = self.documents.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(vec![document("a", "mapped"), document("b", "finalized")]))
    }

    async fn metrics(&self) -> Result<MetricsSummary, ApiError> {
        self.record(Call::Metrics);
        self.delay().await;
        let next = self.metrics.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(metrics(2)))
    }
}

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn network_error() -> ApiError {
    ApiError::new(FailureKind::Network, "connection refused")
}

pub fn not_found() -> ApiError {
    ApiError::new(FailureKind::NotFound, "/status/x not found")
}

pub fn document(id: &str, status: &str) -> DocumentSummary {
    DocumentSummary {
        doc_id: JobHandle::new(id),
        file_name: Some(format!("{id}.pdf")),
        status: status.to_string(),
        upload_ts: Some("2024-02-01T09:00:00".to_string()),
    }
}

pub fn metrics(total: u64) -> MetricsSummary {
    MetricsSummary {
        total_processed: total,
        average_carbon: 21.0,
        failure_rate: 0.0,
        top_categories: vec!["Transportation".to_string()],
        top_naics: vec!["484110".to_string()],
    }
}

pub fn sample_result(id: &str) -> JobResult {
    JobResult {
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
            naics_code: None,
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
            naics_code: None,
            is_verified_match: false,
            line_level_breakdown: Vec::new(),
        },
        audit: AuditResult {
            is_valid: true,
            audit_flags: Vec::new(),
            confidence_score: 0.95,
        },
        finalized_ts: "2024-01-31T12:00:00".to_string(),
    }
}
