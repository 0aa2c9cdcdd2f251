use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Render parameters
// ═══════════════════════════════════════════════════════════

/// Output frame shape requested from the avatar renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "16:9" => Some(AspectRatio::Landscape),
            "9:16" => Some(AspectRatio::Portrait),
            "1:1" => Some(AspectRatio::Square),
            _ => None,
        }
    }
}

/// Fully resolved settings sent with a render submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderParams {
    pub avatar_id: String,
    pub voice_id: String,
    pub ratio: AspectRatio,
    pub background: Option<String>,
    pub captions: bool,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            avatar_id: "default".into(),
            voice_id: "default".into(),
            ratio: AspectRatio::Landscape,
            background: None,
            captions: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Render job lifecycle
// ═══════════════════════════════════════════════════════════

/// Status of a job on the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Submitted,
    Processing,
    Completed,
    Failed,
}

impl RenderStatus {
    /// `Completed` and `Failed` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, RenderStatus::Completed | RenderStatus::Failed)
    }

    /// Map a provider status string. Unknown strings count as still running.
    pub fn from_provider(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" | "submitted" => RenderStatus::Submitted,
            "completed" | "complete" | "succeeded" | "done" => RenderStatus::Completed,
            "failed" | "error" => RenderStatus::Failed,
            _ => RenderStatus::Processing,
        }
    }
}

/// One status answer from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: RenderStatus,
    pub asset_url: Option<String>,
    pub error: Option<String>,
}

impl StatusReport {
    pub fn processing() -> Self {
        Self {
            status: RenderStatus::Processing,
            asset_url: None,
            error: None,
        }
    }

    pub fn completed(url: &str) -> Self {
        Self {
            status: RenderStatus::Completed,
            asset_url: Some(url.to_string()),
            error: None,
        }
    }

    pub fn failed(detail: &str) -> Self {
        Self {
            status: RenderStatus::Failed,
            asset_url: None,
            error: Some(detail.to_string()),
        }
    }
}

/// A submitted render job, mutated only by poll results.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub job_id: String,
    pub script: String,
    pub params: RenderParams,
    pub status: RenderStatus,
    /// Set only once the job completed.
    pub asset_url: Option<String>,
    /// Set only once the job failed.
    pub error: Option<String>,
    pub polls: u32,
}

impl RenderJob {
    pub fn submitted(job_id: String, script: &str, params: &RenderParams) -> Self {
        Self {
            job_id,
            script: script.to_string(),
            params: params.clone(),
            status: RenderStatus::Submitted,
            asset_url: None,
            error: None,
            polls: 0,
        }
    }

    /// Record a poll answer. Terminal jobs ignore further reports.
    pub fn apply(&mut self, report: StatusReport) {
        self.polls += 1;
        if self.status.is_terminal() {
            return;
        }
        self.status = report.status;
        match report.status {
            RenderStatus::Completed => self.asset_url = report.asset_url,
            RenderStatus::Failed => self.error = report.error,
            RenderStatus::Submitted | RenderStatus::Processing => {}
        }
    }

    /// Count a poll that produced no answer (transient provider error).
    pub fn record_missed_poll(&mut self) {
        self.polls += 1;
    }
}

/// Raw download of a finished video.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Bytes fetched from a completed render job.
#[derive(Debug, Clone)]
pub struct RenderedAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub source_url: String,
    pub job_id: String,
}
