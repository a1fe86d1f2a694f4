use crate::core::backend::HttpBackend;
use crate::core::entities::EntityCollection;
use crate::core::{ConfigProvider, Integrations, Storage};
use crate::domain::model::{EntityName, ExtractionResult, UploadedFile};
use crate::utils::error::Result;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Entry point: one shared backend, handles per collection.
#[derive(Debug, Clone)]
pub struct EntityClient {
    backend: Arc<HttpBackend>,
}

impl EntityClient {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self::from_backend(HttpBackend::new(config)?))
    }

    pub fn from_backend(backend: HttpBackend) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn backend(&self) -> &HttpBackend {
        &self.backend
    }

    pub fn entity(&self, name: &str) -> Result<EntityCollection<HttpBackend>> {
        Ok(EntityCollection::new(
            EntityName::new(name)?,
            Arc::clone(&self.backend),
        ))
    }

    pub async fn upload_file(&self, file_name: &str, data: Vec<u8>) -> Result<UploadedFile> {
        let uploaded = self.backend.upload_file(file_name, data).await?;
        tracing::info!("Uploaded {} to {}", file_name, uploaded.file_url);
        Ok(uploaded)
    }

    /// Reads `path` through `storage` and uploads it under its file name.
    pub async fn upload_path<S: Storage>(&self, storage: &S, path: &str) -> Result<UploadedFile> {
        let data = storage.read_file(path).await?;
        let file_name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string();
        self.upload_file(&file_name, data).await
    }

    pub async fn extract_data(&self, file_url: &str, json_schema: &Value) -> Result<ExtractionResult> {
        let result = self.backend.extract_data(file_url, json_schema).await?;
        if result.is_success() {
            tracing::info!("Extraction from {} succeeded", file_url);
        } else {
            tracing::warn!(
                "Extraction from {} returned status '{}': {}",
                file_url,
                result.status,
                result.details.as_deref().unwrap_or("no details")
            );
        }
        Ok(result)
    }
}
