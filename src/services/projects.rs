//! Project orchestration: ingestion, asset storage and persistence.

use serde_json::Value as JsonValue;
use tracing::info;

use crate::db::ProjectStore;
use crate::error::{AppError, AppResult};
use crate::models::Project;
use crate::services::ingest::{IngestChain, RawRequest};
use crate::services::storage::VideoAssetStore;

/// Entry point used by the HTTP handlers.
#[derive(Clone)]
pub struct ProjectService {
    store: ProjectStore,
    assets: VideoAssetStore,
    chain: IngestChain,
}

impl ProjectService {
    pub fn new(store: ProjectStore, assets: VideoAssetStore) -> Self {
        Self::with_chain(store, assets, IngestChain::default())
    }

    pub fn with_chain(store: ProjectStore, assets: VideoAssetStore, chain: IngestChain) -> Self {
        Self {
            store,
            assets,
            chain,
        }
    }

    /// Create a project from a raw creation request.
    ///
    /// The title is validated before anything is written. The video is
    /// written before the row, and there is no rollback of the file if the
    /// insert fails.
    pub async fn create(&self, raw: &RawRequest) -> AppResult<Project> {
        let request = self.chain.ingest(raw).await?;
        let video_path = self.assets.save(request.file.as_ref()).await?;
        let project = self
            .store
            .create(&request.title, video_path.as_deref(), None, None)?;

        info!(
            "Project {} created (title {:?}, video {:?})",
            project.id, project.title, project.video_path
        );
        Ok(project)
    }

    pub fn list(&self) -> AppResult<Vec<Project>> {
        self.store.list()
    }

    pub fn get(&self, id: &str) -> AppResult<Project> {
        self.store
            .get(id)?
            .ok_or_else(|| AppError::NotFound("Project".to_string()))
    }

    pub fn update(
        &self,
        id: &str,
        words: Option<&JsonValue>,
        config: Option<&JsonValue>,
    ) -> AppResult<Project> {
        self.store
            .update(id, words, config)?
            .ok_or_else(|| AppError::NotFound("Project".to_string()))
    }

    /// Stored video bytes and their content type.
    pub async fn video(&self, id: &str) -> AppResult<(Vec<u8>, &'static str)> {
        let reference = self
            .store
            .get(id)?
            .and_then(|project| project.video_path)
            .ok_or_else(|| AppError::NotFound("Video".to_string()))?;

        let data = self.assets.read(&reference).await?;
        Ok((data, VideoAssetStore::content_type_for(&reference)))
    }

    pub fn ping(&self) -> AppResult<()> {
        self.store.ping()
    }
}
