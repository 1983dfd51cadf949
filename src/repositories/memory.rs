//! In-memory stand-in for the hosted backend, used by service tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::{
    models::{
        documents::{DocumentList, FileUpload, StoredFile},
        users::{Account, Session},
    },
    Error, Result,
};

use super::{
    account_repo::AccountRepository,
    document_repo::{Collection, DocumentRepository},
    query::Query,
    storage_repo::StorageRepository,
    unique_id,
};

const DEFAULT_LIST_LIMIT: usize = 25;

#[derive(Default)]
struct State {
    accounts: HashMap<String, (Account, String)>,
    sessions: HashMap<String, Session>,
    documents: HashMap<Collection, Vec<Value>>,
    files: HashMap<String, StoredFile>,
    ticks: i64,
    fail_create_document: bool,
    fail_update_document: bool,
    fail_preview: bool,
    fail_delete_file: bool,
    calls: Vec<String>,
}

impl State {
    fn now(&mut self) -> String {
        self.ticks += 1;
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        (base + Duration::seconds(self.ticks)).to_rfc3339_opts(SecondsFormat::Millis, false)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn fail_create_document(&self, fail: bool) {
        self.state().fail_create_document = fail;
    }

    pub fn fail_update_document(&self, fail: bool) {
        self.state().fail_update_document = fail;
    }

    pub fn fail_preview(&self, fail: bool) {
        self.state().fail_preview = fail;
    }

    pub fn fail_delete_file(&self, fail: bool) {
        self.state().fail_delete_file = fail;
    }

    pub fn has_file(&self, file_id: &str) -> bool {
        self.state().files.contains_key(file_id)
    }

    pub fn file_count(&self) -> usize {
        self.state().files.len()
    }

    pub fn document_count(&self, collection: Collection) -> usize {
        self.state()
            .documents
            .get(&collection)
            .map_or(0, Vec::len)
    }

    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }

    /// Backend calls made so far, e.g. `"delete_document:posts:p1"`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Inserts a document as-is, stamping system attributes.
    pub fn seed(&self, collection: Collection, document_id: &str, data: Value) -> Value {
        let mut state = self.state();
        let now = state.now();
        let document = stamp(document_id, data, &now, &now);
        state
            .documents
            .entry(collection)
            .or_default()
            .push(document.clone());
        document
    }
}

fn stamp(document_id: &str, data: Value, created_at: &str, updated_at: &str) -> Value {
    let mut fields = match data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    fields.insert("$id".into(), Value::from(document_id));
    fields.insert("$createdAt".into(), Value::from(created_at));
    fields.insert("$updatedAt".into(), Value::from(updated_at));
    Value::Object(fields)
}

fn field<'a>(document: &'a Value, attribute: &str) -> &'a Value {
    document.get(attribute).unwrap_or(&Value::Null)
}

fn matches(document: &Value, query: &Query) -> bool {
    let attribute = query.attribute().unwrap_or_default();
    match query.method() {
        "equal" => {
            let value = field(document, attribute);
            query.values().iter().any(|expected| match value {
                Value::Array(items) => items.contains(expected),
                other => other == expected,
            })
        }
        "search" => {
            let haystack = field(document, attribute)
                .as_str()
                .unwrap_or_default()
                .to_lowercase();
            query.values().iter().filter_map(Value::as_str).any(|term| {
                term.split_whitespace()
                    .any(|word| haystack.contains(&word.to_lowercase()))
            })
        }
        // Applied by `list_documents` after filtering.
        "orderDesc" | "limit" | "cursorAfter" => true,
        other => panic!("in-memory backend does not support query method `{other}`"),
    }
}

#[async_trait]
impl AccountRepository for InMemoryBackend {
    async fn create_account(
        &self,
        account_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account> {
        let mut state = self.state();
        state.calls.push(format!("create_account:{email}"));

        if state.accounts.values().any(|(a, _)| a.email == email) {
            return Err(Error::from_backend(409, "user_already_exists".into()));
        }

        let account = Account {
            id: account_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        };
        state
            .accounts
            .insert(account_id.to_string(), (account.clone(), password.to_string()));
        Ok(account)
    }

    async fn create_email_session(&self, email: &str, password: &str) -> Result<Session> {
        let mut state = self.state();
        state.calls.push(format!("create_session:{email}"));

        let account_id = state
            .accounts
            .values()
            .find(|(a, p)| a.email == email && p == password)
            .map(|(a, _)| a.id.clone())
            .ok_or(Error::Unauthorized)?;

        let session = Session {
            id: unique_id(),
            user_id: account_id,
            secret: unique_id(),
            expire: None,
        };
        state
            .sessions
            .insert(session.secret.clone(), session.clone());
        Ok(session)
    }

    async fn get_current_session(&self, session: &str) -> Result<Session> {
        self.state()
            .sessions
            .get(session)
            .cloned()
            .ok_or(Error::Unauthorized)
    }

    async fn delete_current_session(&self, session: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push("delete_session".to_string());
        state
            .sessions
            .remove(session)
            .map(|_| ())
            .ok_or(Error::Unauthorized)
    }

    async fn get_account(&self, session: &str) -> Result<Account> {
        let state = self.state();
        let session = state.sessions.get(session).ok_or(Error::Unauthorized)?;
        state
            .accounts
            .get(&session.user_id)
            .map(|(a, _)| a.clone())
            .ok_or(Error::NotFound)
    }

    fn initials_avatar_url(&self, name: &str) -> String {
        format!(
            "memory://avatars/initials?name={}",
            urlencoding::encode(name)
        )
    }
}

#[async_trait]
impl DocumentRepository for InMemoryBackend {
    async fn create_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let mut state = self.state();
        state
            .calls
            .push(format!("create_document:{}", collection.as_str()));

        if state.fail_create_document {
            return Err(Error::from_backend(500, "create failed".into()));
        }

        let now = state.now();
        let document = stamp(document_id, data, &now, &now);
        state
            .documents
            .entry(collection)
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn get_document(&self, collection: Collection, document_id: &str) -> Result<Value> {
        self.state()
            .documents
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| field(d, "$id") == document_id))
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn list_documents(
        &self,
        collection: Collection,
        queries: &[Query],
    ) -> Result<DocumentList<Value>> {
        let state = self.state();
        let mut documents: Vec<Value> = state
            .documents
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| queries.iter().all(|q| matches(doc, q)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let total = documents.len() as u64;

        for query in queries.iter().filter(|q| q.method() == "orderDesc") {
            let attribute = query.attribute().unwrap_or_default();
            documents.sort_by(|a, b| {
                let a = field(a, attribute).as_str().unwrap_or_default();
                let b = field(b, attribute).as_str().unwrap_or_default();
                b.cmp(a)
            });
        }

        if let Some(cursor) = queries
            .iter()
            .find(|q| q.method() == "cursorAfter")
            .and_then(|q| q.values().first())
        {
            let position = documents
                .iter()
                .position(|doc| field(doc, "$id") == cursor)
                .ok_or_else(|| Error::from_backend(400, "document not found for cursor".into()))?;
            documents.drain(..=position);
        }

        let limit = queries
            .iter()
            .find(|q| q.method() == "limit")
            .and_then(|q| q.values().first())
            .and_then(Value::as_u64)
            .map_or(DEFAULT_LIST_LIMIT, |limit| limit as usize);
        documents.truncate(limit);

        Ok(DocumentList { total, documents })
    }

    async fn update_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let mut state = self.state();
        state.calls.push(format!(
            "update_document:{}:{document_id}",
            collection.as_str()
        ));

        if state.fail_update_document {
            return Err(Error::from_backend(500, "update failed".into()));
        }

        let now = state.now();
        let document = state
            .documents
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| field(d, "$id") == document_id))
            .ok_or(Error::NotFound)?;

        if let (Value::Object(target), Value::Object(changes)) = (&mut *document, data) {
            for (key, value) in changes {
                target.insert(key, value);
            }
            target.insert("$updatedAt".into(), Value::from(now));
        }

        Ok(document.clone())
    }

    async fn delete_document(&self, collection: Collection, document_id: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!(
            "delete_document:{}:{document_id}",
            collection.as_str()
        ));

        let docs = state.documents.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|d| field(d, "$id") != document_id);

        if docs.len() == before {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageRepository for InMemoryBackend {
    async fn create_file(&self, file_id: &str, file: FileUpload) -> Result<StoredFile> {
        let mut state = self.state();
        state.calls.push(format!("create_file:{file_id}"));

        let stored = StoredFile {
            id: file_id.to_string(),
            bucket_id: "memory".to_string(),
            name: file.name,
            mime_type: file.mime_type,
            size_original: file.bytes.len() as u64,
        };
        state.files.insert(file_id.to_string(), stored.clone());
        Ok(stored)
    }

    fn file_preview_url(&self, file_id: &str) -> Result<String> {
        if self.state().fail_preview || file_id.is_empty() {
            return Err(Error::BadRequest("preview unavailable".into()));
        }
        Ok(format!("memory://files/{file_id}/preview"))
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("delete_file:{file_id}"));

        if state.fail_delete_file {
            return Err(Error::from_backend(500, "storage unavailable".into()));
        }

        state
            .files
            .remove(file_id)
            .map(|_| ())
            .ok_or(Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn list_applies_filters_order_cursor_and_limit() {
        let backend = InMemoryBackend::new();
        for (id, tag) in [("p1", "sea"), ("p2", "city"), ("p3", "sea"), ("p4", "sea")] {
            backend.seed(Collection::Posts, id, json!({ "tags": [tag] }));
        }

        let page = backend
            .list_documents(
                Collection::Posts,
                &[
                    Query::equal("tags", "sea"),
                    Query::order_desc("$id"),
                    Query::cursor_after("p4"),
                    Query::limit(1),
                ],
            )
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.documents[0]["$id"], "p3");
    }

    #[tokio::test]
    #[should_panic(expected = "does not support query method `orderAsc`")]
    async fn unknown_query_method_fails_loudly() {
        let backend = InMemoryBackend::new();
        backend.seed(Collection::Posts, "p1", json!({ "caption": "x" }));

        let _ = backend
            .list_documents(
                Collection::Posts,
                &[Query::new("orderAsc", Some("$createdAt"), Vec::new())],
            )
            .await;
    }
}
