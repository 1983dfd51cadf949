//! Compensating actions for multi-step writes.
//!
//! The backend has no multi-document transactions, so a flow that uploads a
//! blob and then writes a document records how to undo the upload. On failure
//! the recorded compensations run once, newest first. Their own failures are
//! logged and swallowed, so an orphaned blob remains a possible end state.

use std::{future::Future, sync::Arc};

use tracing::{info, warn};

use crate::{repositories::storage_repo::StorageRepository, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    DeleteFile(String),
}

pub struct Saga {
    name: &'static str,
    storage: Arc<dyn StorageRepository>,
    pending: Vec<Compensation>,
}

impl Saga {
    pub fn new(name: &'static str, storage: Arc<dyn StorageRepository>) -> Self {
        Self {
            name,
            storage,
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, compensation: Compensation) {
        self.pending.push(compensation);
    }

    /// Awaits `step`; on error every recorded compensation is run before the
    /// original error is returned.
    pub async fn run<T, F>(mut self, step: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match step.await {
            Ok(value) => {
                self.pending.clear();
                Ok(value)
            }
            Err(err) => {
                warn!(saga = self.name, error = %err, "Step failed, compensating");
                self.abort().await;
                Err(err)
            }
        }
    }

    pub async fn abort(&mut self) {
        while let Some(compensation) = self.pending.pop() {
            self.compensate(compensation).await;
        }
    }

    async fn compensate(&self, compensation: Compensation) {
        match &compensation {
            Compensation::DeleteFile(file_id) => match self.storage.delete_file(file_id).await {
                Ok(()) => info!(saga = self.name, %file_id, "Removed uploaded file"),
                Err(Error::NotFound) => info!(saga = self.name, %file_id, "File already gone"),
                Err(err) => warn!(
                    saga = self.name,
                    %file_id,
                    error = %err,
                    "Could not remove uploaded file, it is now orphaned"
                ),
            },
        }
    }
}

impl Drop for Saga {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!(
                saga = self.name,
                pending = ?self.pending,
                "Saga dropped with compensations outstanding"
            );
        }
    }
}
