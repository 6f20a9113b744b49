use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracker_core::{
    DocumentSummary, JobHandle, JobResult, MetricsSummary, StatusReport, UploadReceipt,
};
use tracker_logging::tracker_trace;
use url::Url;

use crate::{ApiError, FailureKind};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Upper bound for a whole request, so a hung read cannot stall the poll schedule.
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            max_response_bytes: 5 * 1024 * 1024,
        }
    }
}

/// A document to submit: opaque bytes plus the name the backend should record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub payload: Vec<u8>,
}

/// The REST surface of the processing backend.
#[async_trait::async_trait]
pub trait PipelineApi: Send + Sync {
    async fn upload(&self, upload: UploadRequest) -> Result<UploadReceipt, ApiError>;

    async fn status(&self, handle: &JobHandle) -> Result<StatusReport, ApiError>;

    /// Only meaningful once the status endpoint reported `finalized`.
    async fn result(&self, handle: &JobHandle) -> Result<JobResult, ApiError>;

    async fn documents(&self) -> Result<Vec<DocumentSummary>, ApiError>;

    async fn metrics(&self) -> Result<MetricsSummary, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base} cannot be used as a base url"),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracker_trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::new(
                FailureKind::NotFound,
                format!("{} not found", response.url().path()),
            ));
        }
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_response_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl PipelineApi for ReqwestApi {
    async fn upload(&self, upload: UploadRequest) -> Result<UploadReceipt, ApiError> {
        let url = self.endpoint(&["upload"])?;
        let content_type = upload
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        tracker_trace!(
            "POST {} file={} bytes={}",
            url,
            upload.file_name,
            upload.payload.len()
        );

        let part = Part::bytes(upload.payload)
            .file_name(upload.file_name)
            .mime_str(&content_type)
            .map_err(|err| ApiError::new(FailureKind::InvalidRequest, err.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read_json(response).await
    }

    async fn status(&self, handle: &JobHandle) -> Result<StatusReport, ApiError> {
        let url = self.endpoint(&["status", handle.as_str()])?;
        self.get_json(url).await
    }

    async fn result(&self, handle: &JobHandle) -> Result<JobResult, ApiError> {
        let url = self.endpoint(&["invoice", handle.as_str()])?;
        self.get_json(url).await
    }

    async fn documents(&self) -> Result<Vec<DocumentSummary>, ApiError> {
        let url = self.endpoint(&["invoices"])?;
        self.get_json(url).await
    }

    async fn metrics(&self) -> Result<MetricsSummary, ApiError> {
        let url = self.endpoint(&["metrics"])?;
        self.get_json(url).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
