use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::{models::documents::DocumentList, Result};

use super::{
    query::{query_params, Query},
    AppwriteRepo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Posts,
    Saves,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Posts => "posts",
            Self::Saves => "saves",
        }
    }
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value>;
    async fn get_document(&self, collection: Collection, document_id: &str) -> Result<Value>;
    async fn list_documents(
        &self,
        collection: Collection,
        queries: &[Query],
    ) -> Result<DocumentList<Value>>;
    async fn update_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value>;
    async fn delete_document(&self, collection: Collection, document_id: &str) -> Result<()>;
}

impl AppwriteRepo {
    fn collection_path(&self, collection: Collection) -> String {
        let collection_id = match collection {
            Collection::Users => &self.config.user_collection_id,
            Collection::Posts => &self.config.post_collection_id,
            Collection::Saves => &self.config.saves_collection_id,
        };

        format!(
            "/databases/{}/collections/{}/documents",
            self.config.database_id, collection_id
        )
    }

    fn document_path(&self, collection: Collection, document_id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_path(collection),
            urlencoding::encode(document_id)
        )
    }
}

#[async_trait]
impl DocumentRepository for AppwriteRepo {
    #[instrument(skip(self, collection, data), fields(collection = collection.as_str()))]
    async fn create_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let builder = self
            .request(Method::POST, &self.collection_path(collection))
            .json(&json!({ "documentId": document_id, "data": data }));

        Ok(self.send(builder).await?.json::<Value>().await?)
    }

    #[instrument(skip(self, collection), fields(collection = collection.as_str()))]
    async fn get_document(&self, collection: Collection, document_id: &str) -> Result<Value> {
        let builder = self.request(Method::GET, &self.document_path(collection, document_id));
        Ok(self.send(builder).await?.json::<Value>().await?)
    }

    #[instrument(skip(self, collection, queries), fields(collection = collection.as_str()))]
    async fn list_documents(
        &self,
        collection: Collection,
        queries: &[Query],
    ) -> Result<DocumentList<Value>> {
        let params = query_params(queries);
        debug!(?params, "Listing documents");

        let builder = self
            .request(Method::GET, &self.collection_path(collection))
            .query(&params);

        let list = self
            .send(builder)
            .await?
            .json::<DocumentList<Value>>()
            .await?;

        tracing::info!(total = list.total, returned = list.documents.len(), "List completed");
        Ok(list)
    }

    #[instrument(skip(self, collection, data), fields(collection = collection.as_str()))]
    async fn update_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let builder = self
            .request(Method::PATCH, &self.document_path(collection, document_id))
            .json(&json!({ "data": data }));

        Ok(self.send(builder).await?.json::<Value>().await?)
    }

    #[instrument(skip(self, collection), fields(collection = collection.as_str()))]
    async fn delete_document(&self, collection: Collection, document_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &self.document_path(collection, document_id));
        self.send(builder).await?;
        Ok(())
    }
}
