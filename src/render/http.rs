//! Avatar video renderer over HTTP.
//!
//! ```text
//! POST {endpoint}/videos        → {"id": "..."}
//! GET  {endpoint}/videos/{id}   → {"status": "...", "video_url"?, "error"?}
//! GET  {video_url}              → bytes
//! ```
//!
//! Every call carries `Authorization: Bearer <api key>`, except the final
//! download which goes to the provider's CDN.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::generation::{RenderProvider, RenderProviderError};
use crate::models::{ArtifactMetadata, DownloadedFile, RenderParams, RenderStatus, StatusReport};

/// Per-request timeout for provider calls. The poll budget is enforced
/// separately by the render driver.
const REQUEST_TIMEOUT_SECS: u64 = 60;

pub struct HttpRenderProvider {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRenderProvider {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, RenderProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RenderProviderError::HttpClient(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> RenderProviderError {
        if e.is_connect() {
            RenderProviderError::Connection(self.endpoint.clone())
        } else if e.is_timeout() {
            RenderProviderError::Timeout(e.to_string())
        } else {
            RenderProviderError::HttpClient(e.to_string())
        }
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RenderProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RenderProviderError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    script: &'a str,
    avatar_id: &'a str,
    voice_id: &'a str,
    ratio: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    background: Option<&'a str>,
    captions: bool,
    metadata: &'a ArtifactMetadata,
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl From<StatusResponse> for StatusReport {
    fn from(r: StatusResponse) -> Self {
        StatusReport {
            status: RenderStatus::from_provider(&r.status),
            asset_url: r.video_url.filter(|u| !u.trim().is_empty()),
            error: r.error,
        }
    }
}

#[async_trait]
impl RenderProvider for HttpRenderProvider {
    async fn submit(
        &self,
        script: &str,
        params: &RenderParams,
        metadata: &ArtifactMetadata,
    ) -> Result<String, RenderProviderError> {
        let body = SubmitRequest {
            script,
            avatar_id: &params.avatar_id,
            voice_id: &params.voice_id,
            ratio: params.ratio.as_str(),
            background: params.background.as_deref(),
            captions: params.captions,
            metadata,
        };
        let response = self
            .client
            .post(format!("{}/videos", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let job: SubmitResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RenderProviderError::MalformedResponse(e.to_string()))?;
        if job.id.trim().is_empty() {
            return Err(RenderProviderError::MalformedResponse("empty job id".into()));
        }
        Ok(job.id)
    }

    async fn poll(&self, job_id: &str) -> Result<StatusReport, RenderProviderError> {
        let response = self
            .client
            .get(format!("{}/videos/{}", self.endpoint, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status: StatusResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RenderProviderError::MalformedResponse(e.to_string()))?;
        Ok(status.into())
    }

    async fn download(&self, asset_url: &str) -> Result<DownloadedFile, RenderProviderError> {
        let response = self
            .client
            .get(asset_url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Ok(DownloadedFile {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
