use crate::core::{ConfigProvider, EntityStore, Integrations};
use crate::domain::model::{EntityName, ExtractionResult, ListQuery, Record, UploadedFile};
use crate::utils::error::{EntityError, Result};
use crate::utils::validation::{validate_path_segment, validate_url};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};

pub const APP_ID_HEADER: HeaderName = HeaderName::from_static("x-app-id");
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("api_key");

const UPLOAD_FILE_ENDPOINT: &str = "UploadFile";
const EXTRACT_DATA_ENDPOINT: &str = "ExtractDataFromUploadedFile";

/// reqwest-backed access to the remote service. Holds one connection pool;
/// cloning is cheap.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    app_id: String,
}

impl HttpBackend {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        validate_url("base_url", config.base_url())?;
        validate_path_segment("app_id", config.app_id())?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(APP_ID_HEADER, header_value("app_id", config.app_id(), false)?);

        if let Some(key) = config.api_key() {
            headers.insert(API_KEY_HEADER, header_value("api_key", key, true)?);
        }
        if let Some(token) = config.access_token() {
            headers.insert(
                AUTHORIZATION,
                header_value("access_token", &format!("Bearer {}", token), true)?,
            );
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        tracing::debug!(
            "HTTP backend ready for app {} at {}",
            config.app_id(),
            config.base_url()
        );

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            app_id: config.app_id().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    fn app_url(&self) -> String {
        format!("{}/api/apps/{}", self.base_url, self.app_id)
    }

    pub fn entity_url(&self, entity: &EntityName, id: Option<&str>) -> Result<String> {
        let collection = format!("{}/entities/{}", self.app_url(), entity);
        match id {
            Some(id) => {
                validate_path_segment("id", id)?;
                Ok(format!("{}/{}", collection, id))
            }
            None => Ok(collection),
        }
    }

    pub fn integration_url(&self, endpoint: &str) -> String {
        format!("{}/integration-endpoints/Core/{}", self.app_url(), endpoint)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!("{} {}", method, url);

        let response = self.client.execute(request).await?;
        tracing::debug!("{} {} -> {}", method, url, response.status());

        parse_response(response).await
    }
}

fn header_value(field: &str, value: &str, sensitive: bool) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value).map_err(|e| {
        EntityError::InvalidConfigValueError {
            field: field.to_string(),
            value: if sensitive {
                "<redacted>".to_string()
            } else {
                value.to_string()
            },
            reason: format!("Not a valid header value: {}", e),
        }
    })?;
    header.set_sensitive(sensitive);
    Ok(header)
}

/// Non-2xx statuses become `EntityError::Api`; an empty 2xx body is `Null`.
async fn parse_response(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!("Remote service returned {}", status);
        return Err(EntityError::api(status.as_u16(), body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl EntityStore for HttpBackend {
    async fn list(&self, entity: &EntityName, query: &ListQuery) -> Result<Vec<Record>> {
        let url = self.entity_url(entity, None)?;
        let body = self
            .send(self.client.get(url).query(&query.to_query_pairs()))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn filter(
        &self,
        entity: &EntityName,
        conditions: &Value,
        query: &ListQuery,
    ) -> Result<Vec<Record>> {
        let url = self.entity_url(entity, None)?;
        let mut pairs = vec![("q", conditions.to_string())];
        pairs.extend(query.to_query_pairs());

        let body = self.send(self.client.get(url).query(&pairs)).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get(&self, entity: &EntityName, id: &str) -> Result<Record> {
        let url = self.entity_url(entity, Some(id))?;
        let body = self.send(self.client.get(url)).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn create(&self, entity: &EntityName, record: &Value) -> Result<Record> {
        let url = self.entity_url(entity, None)?;
        let body = self.send(self.client.post(url).json(record)).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn update(&self, entity: &EntityName, id: &str, patch: &Value) -> Result<Record> {
        let url = self.entity_url(entity, Some(id))?;
        let body = self.send(self.client.put(url).json(patch)).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn delete(&self, entity: &EntityName, id: &str) -> Result<Value> {
        let url = self.entity_url(entity, Some(id))?;
        self.send(self.client.delete(url)).await
    }
}

#[async_trait]
impl Integrations for HttpBackend {
    async fn upload_file(&self, file_name: &str, data: Vec<u8>) -> Result<UploadedFile> {
        tracing::debug!("Uploading {} ({} bytes)", file_name, data.len());
        let form = Form::new().part("file", Part::bytes(data).file_name(file_name.to_string()));

        let url = self.integration_url(UPLOAD_FILE_ENDPOINT);
        let body = self.send(self.client.post(url).multipart(form)).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn extract_data(&self, file_url: &str, json_schema: &Value) -> Result<ExtractionResult> {
        let url = self.integration_url(EXTRACT_DATA_ENDPOINT);
        let payload = json!({
            "file_url": file_url,
            "json_schema": json_schema,
        });
        let body = self.send(self.client.post(url).json(&payload)).await?;
        Ok(serde_json::from_value(body)?)
    }
}
