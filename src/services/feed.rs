use std::sync::Arc;

use serde_json::{json, to_value};
use tracing::debug;

use crate::{
    models::{
        documents::{from_document, DocumentList},
        posts::{Post, Save, SaveDocument},
    },
    repositories::{
        document_repo::{Collection, DocumentRepository},
        query::Query,
        unique_id,
    },
    Error, Result,
};

pub const RECENT_POSTS_LIMIT: u32 = 20;
pub const INFINITE_PAGE_SIZE: u32 = 10;

#[derive(Clone)]
pub struct FeedService {
    documents: Arc<dyn DocumentRepository>,
}

impl FeedService {
    pub fn new(documents: Arc<dyn DocumentRepository>) -> Self {
        Self { documents }
    }

    async fn list_posts(&self, queries: &[Query]) -> Result<DocumentList<Post>> {
        self.documents
            .list_documents(Collection::Posts, queries)
            .await?
            .decode()
    }

    pub async fn get_recent_posts(&self) -> Result<DocumentList<Post>> {
        self.list_posts(&[
            Query::order_desc("$createdAt"),
            Query::limit(RECENT_POSTS_LIMIT),
        ])
        .await
    }

    /// One page of the feed, newest update first, continuing after `cursor`.
    pub async fn get_infinite_posts(&self, cursor: Option<&str>) -> Result<DocumentList<Post>> {
        let mut queries = vec![
            Query::order_desc("$updatedAt"),
            Query::limit(INFINITE_PAGE_SIZE),
        ];

        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            debug!(%cursor, "Continuing feed");
            queries.push(Query::cursor_after(cursor));
        }

        self.list_posts(&queries).await
    }

    pub async fn search_posts(&self, term: &str) -> Result<DocumentList<Post>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::BadRequest("Search term is required".to_string()));
        }

        self.list_posts(&[Query::search("caption", term)]).await
    }

    /// Replaces the post's whole like list with `likes`. Concurrent callers
    /// race: the last write wins.
    pub async fn like_post(&self, post_id: &str, likes: &[String]) -> Result<Post> {
        let mut members: Vec<&str> = Vec::with_capacity(likes.len());
        for user_id in likes {
            if !members.contains(&user_id.as_str()) {
                members.push(user_id);
            }
        }

        let document = self
            .documents
            .update_document(Collection::Posts, post_id, json!({ "likes": members }))
            .await?;

        from_document(document)
    }

    pub async fn save_post(&self, post_id: &str, user_id: &str) -> Result<Save> {
        let data = to_value(SaveDocument {
            user: user_id,
            post: post_id,
        })?;

        let document = self
            .documents
            .create_document(Collection::Saves, &unique_id(), data)
            .await?;

        from_document(document)
    }

    pub async fn delete_saved_post(&self, saved_record_id: &str) -> Result<()> {
        self.documents
            .delete_document(Collection::Saves, saved_record_id)
            .await
    }
}
