use std::sync::Arc;

use serde_json::to_value;
use tracing::{info, warn};

use crate::{
    models::{
        documents::{from_document, FileUpload, StoredFile},
        posts::{parse_tags, NewPost, Post, PostChanges, PostDocument, UpdatePost},
    },
    repositories::{
        document_repo::{Collection, DocumentRepository},
        storage_repo::StorageRepository,
        unique_id,
    },
    services::saga::{Compensation, Saga},
    Error, Result,
};

#[derive(Clone)]
pub struct PostService {
    documents: Arc<dyn DocumentRepository>,
    storage: Arc<dyn StorageRepository>,
}

impl PostService {
    pub fn new(documents: Arc<dyn DocumentRepository>, storage: Arc<dyn StorageRepository>) -> Self {
        Self { documents, storage }
    }

    pub async fn upload_file(&self, file: FileUpload) -> Result<StoredFile> {
        self.storage.create_file(&unique_id(), file).await
    }

    pub fn get_file_preview(&self, file_id: &str) -> Result<String> {
        self.storage.file_preview_url(file_id)
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.storage.delete_file(file_id).await
    }

    /// Uploads the first file, then writes the post. The upload is removed
    /// again if any later step fails.
    pub async fn create_post(&self, post: NewPost) -> Result<Post> {
        let NewPost {
            user_id,
            caption,
            files,
            location,
            tags,
        } = post;

        let file = files
            .into_iter()
            .next()
            .ok_or_else(|| Error::BadRequest("An image is required".to_string()))?;

        let uploaded = self.upload_file(file).await?;

        let mut saga = Saga::new("create_post", self.storage.clone());
        saga.push(Compensation::DeleteFile(uploaded.id.clone()));

        let tags = parse_tags(tags.as_deref().unwrap_or_default());

        let document = saga
            .run(async {
                let image_url = self.get_file_preview(&uploaded.id)?;
                let data = to_value(PostDocument {
                    creator: &user_id,
                    caption: &caption,
                    image_url: &image_url,
                    image_id: &uploaded.id,
                    location: location.as_deref(),
                    tags: &tags,
                })?;

                self.documents
                    .create_document(Collection::Posts, &unique_id(), data)
                    .await
            })
            .await?;

        let post: Post = from_document(document)?;
        info!(post_id = %post.id, image_id = %post.image_id, "Post created");
        Ok(post)
    }

    /// Rewrites the post's fields. A new image replaces the old reference
    /// only when a file is supplied; the old blob is left in storage.
    pub async fn update_post(&self, post: UpdatePost) -> Result<Post> {
        let UpdatePost {
            post_id,
            caption,
            image_id: previous_image_id,
            image_url: previous_image_url,
            files,
            location,
            tags,
        } = post;

        let uploaded = match files.into_iter().next() {
            Some(file) => Some(self.upload_file(file).await?),
            None => None,
        };

        let mut saga = Saga::new("update_post", self.storage.clone());
        if let Some(file) = &uploaded {
            saga.push(Compensation::DeleteFile(file.id.clone()));
        }

        let tags = parse_tags(tags.as_deref().unwrap_or_default());

        let document = saga
            .run(async {
                let (image_url, image_id) = match &uploaded {
                    Some(file) => (self.get_file_preview(&file.id)?, file.id.clone()),
                    None => (previous_image_url.clone(), previous_image_id.clone()),
                };

                let data = to_value(PostChanges {
                    caption: &caption,
                    image_url: &image_url,
                    image_id: &image_id,
                    location: location.as_deref(),
                    tags: &tags,
                })?;

                self.documents
                    .update_document(Collection::Posts, &post_id, data)
                    .await
            })
            .await?;

        if uploaded.is_some() && !previous_image_id.is_empty() {
            warn!(
                %post_id,
                old_image_id = %previous_image_id,
                "Previous image left in storage"
            );
        }

        from_document(document)
    }

    /// Removes the post document. The image blob is kept.
    pub async fn delete_post(&self, post_id: &str, image_id: &str) -> Result<()> {
        if post_id.is_empty() || image_id.is_empty() {
            return Err(Error::BadRequest(
                "Post id and image id are required".to_string(),
            ));
        }

        self.documents
            .delete_document(Collection::Posts, post_id)
            .await?;

        info!(%post_id, "Post deleted");
        Ok(())
    }

    pub async fn get_post_by_id(&self, post_id: &str) -> Result<Post> {
        let document = self
            .documents
            .get_document(Collection::Posts, post_id)
            .await?;

        from_document(document)
    }
}
