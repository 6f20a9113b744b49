use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Audit flag the backend raises when the uploaded file is not an invoice.
pub const NON_STANDARD_INVOICE_FLAG: &str = "Not an industry standard Invoice";

/// Server-assigned identifier of one submitted document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobHandle {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub doc_id: JobHandle,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub doc_id: Option<JobHandle>,
    pub status: String,
    #[serde(default)]
    pub processed_at: Option<String>,
}

/// One row of `GET /invoices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub doc_id: JobHandle,
    #[serde(default)]
    pub file_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub upload_ts: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_processed: u64,
    pub average_carbon: f64,
    pub failure_rate: f64,
    #[serde(default)]
    pub top_categories: Vec<String>,
    #[serde(default)]
    pub top_naics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShippingDetails {
    #[serde(default)]
    pub origin_address: Option<String>,
    #[serde(default)]
    pub destination_address: Option<String>,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub vendor_name: String,
    #[serde(default)]
    pub vendor_address: Option<String>,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub receiver_address: Option<String>,
    pub invoice_number: String,
    pub invoice_date: String,
    pub currency: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_details: Option<ShippingDetails>,
    pub subtotal: f64,
    pub tax: f64,
    pub grand_total: f64,
    pub extraction_confidence: f64,
    #[serde(default = "default_true")]
    pub is_standard_invoice: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub vendor_canonical: String,
    #[serde(default)]
    pub standardized_line_items: Vec<Value>,
    pub scope_category: String,
    #[serde(default)]
    pub naics_code: Option<String>,
    pub mapping_confidence: f64,
    pub rule_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonResult {
    pub total_kg_co2e: f64,
    pub spend_based_kg_co2e: f64,
    #[serde(default)]
    pub logistics_kg_co2e: f64,
    #[serde(default)]
    pub distance_km: Option<f64>,
    pub scope: String,
    pub category: String,
    #[serde(default)]
    pub naics_code: Option<String>,
    #[serde(default)]
    pub is_verified_match: bool,
    #[serde(default)]
    pub line_level_breakdown: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub is_valid: bool,
    #[serde(default)]
    pub audit_flags: Vec<String>,
    pub confidence_score: f64,
}

/// Finalized record of `GET /invoice/{doc_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub doc_id: JobHandle,
    pub extraction: ExtractionResult,
    pub mapping: MappingResult,
    pub carbon: CarbonResult,
    pub audit: AuditResult,
    pub finalized_ts: String,
}

/// Non-fatal caveat delivered alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    NonStandardDocument,
    AuditFlag(String),
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::NonStandardDocument => {
                write!(f, "document does not look like a standard invoice")
            }
            ValidationWarning::AuditFlag(flag) => write!(f, "audit flag: {flag}"),
        }
    }
}

impl JobResult {
    pub fn warnings(&self) -> Vec<ValidationWarning> {
        let flagged_non_standard = self
            .audit
            .audit_flags
            .iter()
            .any(|flag| flag == NON_STANDARD_INVOICE_FLAG);

        let mut warnings = Vec::new();
        if !self.extraction.is_standard_invoice || flagged_non_standard {
            warnings.push(ValidationWarning::NonStandardDocument);
        }
        warnings.extend(
            self.audit
                .audit_flags
                .iter()
                .filter(|flag| flag.as_str() != NON_STANDARD_INVOICE_FLAG)
                .map(|flag| ValidationWarning::AuditFlag(flag.clone())),
        );
        warnings
    }
}

fn default_true() -> bool {
    true
}
