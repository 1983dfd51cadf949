use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::{Error, Result};

pub mod account_repo;
pub mod document_repo;
#[cfg(test)]
pub mod memory;
pub mod query;
pub mod storage_repo;

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct AppwriteConfig {
    pub url: String,
    pub project_id: String,
    pub database_id: String,
    pub storage_id: String,
    pub user_collection_id: String,
    pub post_collection_id: String,
    pub saves_collection_id: String,
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct AppwriteRepo {
    client: Client,
    config: AppwriteConfig,
}

#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

impl AppwriteRepo {
    pub fn new(config: AppwriteConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AppwriteConfig {
        &self.config
    }

    fn base_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.config.url, path))
            .header("X-Appwrite-Project", &self.config.project_id)
            .header("X-Appwrite-Response-Format", "1.5.0")
    }

    /// Server-scoped call, authenticated with the API key when one is set.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.base_request(method, path);

        match &self.config.api_key {
            Some(key) => builder.header("X-Appwrite-Key", key),
            None => builder,
        }
    }

    /// Call made on behalf of a signed-in user. The backend refuses a request
    /// carrying both a session and an API key, so the key is never sent here.
    fn session_request(&self, method: Method, path: &str, session: &str) -> RequestBuilder {
        self.base_request(method, path)
            .header("X-Appwrite-Session", session)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .json::<BackendErrorBody>()
            .await
            .unwrap_or_default();
        warn!(
            status = status.as_u16(),
            kind = %body.kind,
            "Backend rejected request: {}",
            body.message
        );

        Err(Error::from_backend(status.as_u16(), body.message))
    }
}

/// Fresh document/file id. The backend accepts up to 36 chars of `[a-zA-Z0-9._-]`.
pub fn unique_id() -> String {
    Uuid::now_v7().simple().to_string()
}

#[cfg(test)]
pub(crate) fn test_config(url: &str, api_key: Option<&str>) -> AppwriteConfig {
    AppwriteConfig {
        url: url.trim_end_matches('/').to_string(),
        project_id: "snap".to_string(),
        database_id: "db".to_string(),
        storage_id: "media".to_string(),
        user_collection_id: "users".to_string(),
        post_collection_id: "posts".to_string(),
        saves_collection_id: "saves".to_string(),
        api_key: api_key.map(str::to_string),
    }
}
