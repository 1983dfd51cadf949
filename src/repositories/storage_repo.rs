use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Method,
};
use tracing::instrument;

use crate::{
    models::documents::{FileUpload, StoredFile},
    Error, Result,
};

use super::AppwriteRepo;

pub const PREVIEW_WIDTH: u32 = 2000;
pub const PREVIEW_HEIGHT: u32 = 2000;
pub const PREVIEW_GRAVITY: &str = "top";
pub const PREVIEW_QUALITY: u32 = 100;

#[async_trait]
pub trait StorageRepository: Send + Sync {
    async fn create_file(&self, file_id: &str, file: FileUpload) -> Result<StoredFile>;
    fn file_preview_url(&self, file_id: &str) -> Result<String>;
    async fn delete_file(&self, file_id: &str) -> Result<()>;
}

impl AppwriteRepo {
    fn files_path(&self) -> String {
        format!("/storage/buckets/{}/files", self.config.storage_id)
    }
}

#[async_trait]
impl StorageRepository for AppwriteRepo {
    #[instrument(skip(self, file), fields(name = %file.name, size = file.bytes.len()))]
    async fn create_file(&self, file_id: &str, file: FileUpload) -> Result<StoredFile> {
        let part = Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&file.mime_type)?;
        let form = Form::new().text("fileId", file_id.to_string()).part("file", part);

        let builder = self
            .request(Method::POST, &self.files_path())
            .multipart(form);

        let stored = self.send(builder).await?.json::<StoredFile>().await?;
        tracing::info!(file_id = %stored.id, "File uploaded");

        Ok(stored)
    }

    fn file_preview_url(&self, file_id: &str) -> Result<String> {
        if file_id.is_empty() {
            return Err(Error::BadRequest("File id is required".to_string()));
        }

        Ok(format!(
            "{}{}/{}/preview?width={}&height={}&gravity={}&quality={}&project={}",
            self.config.url,
            self.files_path(),
            urlencoding::encode(file_id),
            PREVIEW_WIDTH,
            PREVIEW_HEIGHT,
            PREVIEW_GRAVITY,
            PREVIEW_QUALITY,
            urlencoding::encode(&self.config.project_id)
        ))
    }

    #[instrument(skip(self))]
    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let path = format!("{}/{}", self.files_path(), urlencoding::encode(file_id));
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}
