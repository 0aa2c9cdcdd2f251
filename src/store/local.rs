use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use uuid::Uuid;

use crate::db::{self, Database};
use crate::generation::{ArtifactStore, StorageError};
use crate::models::{Artifact, ArtifactMetadata, CaseKey, RenderedAsset};

/// URL path the videos directory is served under.
pub const VIDEOS_ROUTE: &str = "/storage/videos";

/// Video bytes on local disk, metadata in `patient_files`.
pub struct LocalArtifactStore {
    videos_dir: PathBuf,
    public_base_url: String,
    db: Database,
}

impl LocalArtifactStore {
    pub fn new(videos_dir: &Path, public_base_url: &str, db: Database) -> Self {
        Self {
            videos_dir: videos_dir.to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            db,
        }
    }

    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    fn public_url(&self, file_name: &str) -> String {
        format!("{}{VIDEOS_ROUTE}/{file_name}", self.public_base_url)
    }
}

/// File extension for a video content type.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type.to_ascii_lowercase().as_str() {
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "mp4",
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn get(&self, key: &CaseKey) -> Result<Option<Artifact>, StorageError> {
        let key = key.clone();
        self.db
            .call(move |conn| db::latest_video(conn, &key))
            .await
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    async fn put(
        &self,
        key: &CaseKey,
        asset: RenderedAsset,
        metadata: ArtifactMetadata,
    ) -> Result<Artifact, StorageError> {
        tokio::fs::create_dir_all(&self.videos_dir).await?;

        let id = Uuid::new_v4();
        let ext = extension_for(&asset.content_type);
        let file_name = format!("{key}-{}.{ext}", id.simple());
        let path = self.videos_dir.join(&file_name);
        tokio::fs::write(&path, &asset.bytes).await?;

        let artifact = Artifact {
            id,
            case_key: key.clone(),
            video_url: self.public_url(&file_name),
            storage_path: path.to_string_lossy().into_owned(),
            content_type: asset.content_type,
            created_at: Utc::now().trunc_subsecs(6),
            metadata,
        };

        let record = artifact.clone();
        let display_name = format!("{key}.{ext}");
        let inserted = self
            .db
            .call(move |conn| db::insert_video(conn, &record, &display_name))
            .await;

        if let Err(e) = inserted {
            tracing::error!(case_key = %key, error = %e, "Video metadata insert failed, removing file");
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %rm, "Could not remove orphaned video");
            }
            return Err(StorageError::Database(e.to_string()));
        }

        tracing::info!(
            case_key = %key,
            artifact_id = %artifact.id,
            bytes = asset.bytes.len(),
            "Video stored"
        );
        Ok(artifact)
    }
}
