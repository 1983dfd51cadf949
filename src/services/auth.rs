use std::sync::Arc;

use serde_json::to_value;
use tracing::info;

use crate::{
    models::{
        documents::from_document,
        users::{Account, NewUser, NewUserDocument, Session, User},
    },
    repositories::{
        account_repo::AccountRepository,
        document_repo::{Collection, DocumentRepository},
        query::Query,
        unique_id,
    },
    Result,
};

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    documents: Arc<dyn DocumentRepository>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        documents: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            accounts,
            documents,
        }
    }

    /// Creates the identity, then its profile document. A failure in the
    /// second step leaves the identity without a profile.
    pub async fn create_user_account(&self, user: NewUser) -> Result<User> {
        let account = self
            .accounts
            .create_account(&unique_id(), &user.email, &user.password, &user.name)
            .await?;

        let image_url = self.accounts.initials_avatar_url(&user.name);

        self.save_user_to_db(NewUserDocument {
            account_id: account.id,
            name: account.name,
            email: account.email,
            username: Some(user.username),
            image_url,
        })
        .await
    }

    pub async fn save_user_to_db(&self, user: NewUserDocument) -> Result<User> {
        let document = self
            .documents
            .create_document(Collection::Users, &unique_id(), to_value(&user)?)
            .await?;

        from_document(document)
    }

    /// Signs in, ending the caller's current session first if it is still live.
    pub async fn sign_in_account(
        &self,
        existing_session: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        if let Some(secret) = existing_session {
            if self.accounts.get_current_session(secret).await.is_ok() {
                info!("Existing session found, signing out first");
                self.accounts.delete_current_session(secret).await?;
            }
        }

        self.accounts.create_email_session(email, password).await
    }

    pub async fn sign_out_account(&self, session: &str) -> Result<()> {
        self.accounts.delete_current_session(session).await
    }

    pub async fn get_account(&self, session: &str) -> Result<Account> {
        self.accounts.get_account(session).await
    }

    pub async fn get_current_user(&self, session: &str) -> Result<Option<User>> {
        let account = self.get_account(session).await?;

        let list = self
            .documents
            .list_documents(
                Collection::Users,
                &[Query::equal("accountId", account.id.as_str())],
            )
            .await?
            .decode::<User>()?;

        Ok(list.documents.into_iter().next())
    }
}
