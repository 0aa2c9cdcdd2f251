//! Scripted collaborator doubles for generation tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::error::{ContextError, RenderProviderError, StorageError, SynthesisError};
use super::traits::{ArtifactStore, ContextProvider, RenderProvider, ScriptSynthesizer};
use crate::models::{
    Artifact, ArtifactMetadata, CaseKey, ClinicalContext, ContextQuery, DoctorRecord,
    DownloadedFile, PatientRecord, RenderParams, RenderedAsset, StatusReport,
};

pub fn sample_metadata() -> ArtifactMetadata {
    ArtifactMetadata {
        doctor_id: "dr.grey@clinic.org".into(),
        patient_id: "alex@example.com".into(),
        diagnosis_code: "I10".into(),
        procedure_code: "99213".into(),
        recovery_day: None,
        recovery_milestone: None,
    }
}

pub fn sample_asset() -> RenderedAsset {
    RenderedAsset {
        bytes: b"\x00\x00\x00\x18ftypmp42".to_vec(),
        content_type: "video/mp4".into(),
        source_url: "https://cdn.test/out.mp4".into(),
        job_id: "job-0".into(),
    }
}

// ═══════════════════════════════════════════════════════════
// Context provider
// ═══════════════════════════════════════════════════════════

/// Knows a fixed set of doctors (with specialty) and patients.
pub struct StaticContextProvider {
    doctors: HashMap<String, Option<String>>,
    patients: Vec<String>,
    fetches: AtomicUsize,
}

impl StaticContextProvider {
    pub fn new() -> Self {
        let mut doctors = HashMap::new();
        doctors.insert("dr.grey@clinic.org".to_string(), Some("Cardiology".to_string()));
        doctors.insert("dr.shepherd@clinic.org".to_string(), Some("Neurology".to_string()));
        Self {
            doctors,
            patients: vec!["alex@example.com".into(), "sam@example.com".into()],
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextProvider for StaticContextProvider {
    async fn doctor_specialty(&self, doctor_id: &str) -> Result<Option<String>, ContextError> {
        self.doctors
            .get(doctor_id)
            .cloned()
            .ok_or_else(|| ContextError::NotFound {
                entity: "doctor",
                id: doctor_id.to_string(),
            })
    }

    async fn fetch_context(&self, query: &ContextQuery) -> Result<ClinicalContext, ContextError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let specialty = self.doctor_specialty(&query.doctor_id).await?;
        if !self.patients.contains(&query.patient_id) {
            return Err(ContextError::NotFound {
                entity: "patient",
                id: query.patient_id.clone(),
            });
        }
        Ok(ClinicalContext {
            patient: PatientRecord {
                email: query.patient_id.clone(),
                first_name: "Alex".into(),
                last_name: "Rivera".into(),
            },
            doctor: DoctorRecord {
                email: query.doctor_id.clone(),
                first_name: "Meredith".into(),
                last_name: "Grey".into(),
                specialty,
            },
            diagnosis_code: query.diagnosis_code.clone(),
            procedure_code: query.procedure_code.clone(),
            diagnoses: vec!["Essential hypertension".into()],
            medications: vec!["Lisinopril 10mg".into()],
            notes: None,
            recovery: None,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Synthesizer
// ═══════════════════════════════════════════════════════════

pub struct FixedSynthesizer {
    script: String,
    calls: AtomicUsize,
}

impl FixedSynthesizer {
    pub fn new(script: &str) -> Self {
        Self {
            script: script.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptSynthesizer for FixedSynthesizer {
    async fn synthesize(&self, _context: &ClinicalContext) -> Result<String, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.script.trim().is_empty() {
            return Err(SynthesisError::EmptyScript);
        }
        Ok(self.script.clone())
    }
}

// ═══════════════════════════════════════════════════════════
// Render provider
// ═══════════════════════════════════════════════════════════

/// What one poll answers.
#[derive(Debug, Clone)]
pub enum PollStep {
    Report(StatusReport),
    TransientError,
}

/// Render provider that answers polls from a script.
///
/// When the script runs out, `fallback` is repeated. Every new submission
/// restarts the script, so each attempt sees the same sequence.
pub struct ScriptedRenderProvider {
    script: Vec<PollStep>,
    fallback: PollStep,
    pending: Mutex<VecDeque<PollStep>>,
    reject_submissions: bool,
    /// Downloads left to fail; `usize::MAX` fails every download.
    download_failures: AtomicUsize,
    /// When set, every poll waits for a permit first.
    gate: Option<Arc<Semaphore>>,
    submissions: AtomicUsize,
    polls: AtomicUsize,
    downloads: AtomicUsize,
}

impl ScriptedRenderProvider {
    pub fn new(script: Vec<PollStep>) -> Self {
        Self {
            script,
            fallback: PollStep::Report(StatusReport::completed("https://cdn.test/out.mp4")),
            pending: Mutex::new(VecDeque::new()),
            reject_submissions: false,
            download_failures: AtomicUsize::new(0),
            gate: None,
            submissions: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    /// Answer every poll with `step`.
    pub fn always(step: PollStep) -> Self {
        let mut provider = Self::new(vec![]);
        provider.fallback = step;
        provider
    }

    pub fn rejecting_submissions(mut self) -> Self {
        self.reject_submissions = true;
        self
    }

    pub fn failing_downloads(self) -> Self {
        self.download_failures.store(usize::MAX, Ordering::SeqCst);
        self
    }

    /// Fail the first `n` downloads, then succeed.
    pub fn failing_first_downloads(self, n: usize) -> Self {
        self.download_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_fallback(&mut self, step: PollStep) {
        self.fallback = step;
    }

    pub fn set_failing_downloads(&self, fail: bool) {
        let failures = if fail { usize::MAX } else { 0 };
        self.download_failures.store(failures, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderProvider for ScriptedRenderProvider {
    async fn submit(
        &self,
        _script: &str,
        _params: &RenderParams,
        _metadata: &ArtifactMetadata,
    ) -> Result<String, RenderProviderError> {
        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject_submissions {
            return Err(RenderProviderError::Rejected {
                status: 401,
                body: "invalid api key".into(),
            });
        }
        if let Ok(mut pending) = self.pending.lock() {
            *pending = self.script.iter().cloned().collect();
        }
        Ok(format!("job-{n}"))
    }

    async fn poll(&self, _job_id: &str) -> Result<StatusReport, RenderProviderError> {
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| RenderProviderError::HttpClient(e.to_string()))?;
        }
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.pop_front())
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            PollStep::Report(report) => Ok(report),
            PollStep::TransientError => {
                Err(RenderProviderError::Connection("http://render.test".into()))
            }
        }
    }

    async fn download(&self, asset_url: &str) -> Result<DownloadedFile, RenderProviderError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .download_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if fail {
            return Err(RenderProviderError::Rejected {
                status: 404,
                body: format!("{asset_url} expired"),
            });
        }
        Ok(DownloadedFile {
            bytes: sample_asset().bytes,
            content_type: Some("video/mp4".into()),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Artifact store
// ═══════════════════════════════════════════════════════════

/// Artifact store kept in memory; newest artifact per key wins.
pub struct InMemoryArtifactStore {
    artifacts: Mutex<HashMap<CaseKey, Vec<Artifact>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            artifacts: Mutex::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of artifacts stored under `key` (all versions).
    pub fn versions(&self, key: &CaseKey) -> usize {
        self.artifacts
            .lock()
            .map(|a| a.get(key).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn get(&self, key: &CaseKey) -> Result<Option<Artifact>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Database("disk I/O error".into()));
        }
        let artifacts = self
            .artifacts
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(artifacts.get(key).and_then(|v| v.last().cloned()))
    }

    async fn put(
        &self,
        key: &CaseKey,
        asset: RenderedAsset,
        metadata: ArtifactMetadata,
    ) -> Result<Artifact, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "no space left on device",
            )));
        }
        let id = Uuid::new_v4();
        let artifact = Artifact {
            id,
            case_key: key.clone(),
            video_url: format!("/storage/videos/{key}-{id}.mp4"),
            storage_path: format!("/tmp/videos/{key}-{id}.mp4"),
            content_type: asset.content_type,
            created_at: Utc::now(),
            metadata,
        };
        let mut artifacts = self
            .artifacts
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        artifacts.entry(key.clone()).or_default().push(artifact.clone());
        Ok(artifact)
    }
}
