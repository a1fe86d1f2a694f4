use crate::domain::model::{EntityName, ExtractionResult, ListQuery, Record, UploadedFile};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn app_id(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn access_token(&self) -> Option<&str>;
    fn timeout(&self) -> Duration;
}

/// CRUD surface of the remote entity storage. Bodies are passed through untouched.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn list(&self, entity: &EntityName, query: &ListQuery) -> Result<Vec<Record>>;
    async fn filter(
        &self,
        entity: &EntityName,
        conditions: &Value,
        query: &ListQuery,
    ) -> Result<Vec<Record>>;
    async fn get(&self, entity: &EntityName, id: &str) -> Result<Record>;
    async fn create(&self, entity: &EntityName, record: &Value) -> Result<Record>;
    async fn update(&self, entity: &EntityName, id: &str, patch: &Value) -> Result<Record>;
    async fn delete(&self, entity: &EntityName, id: &str) -> Result<Value>;
}

#[async_trait]
pub trait Integrations: Send + Sync {
    async fn upload_file(&self, file_name: &str, data: Vec<u8>) -> Result<UploadedFile>;
    async fn extract_data(&self, file_url: &str, json_schema: &Value) -> Result<ExtractionResult>;
}
