use async_trait::async_trait;
use reqwest::{header::SET_COOKIE, Method};
use serde_json::json;
use tower_cookies::Cookie;
use tracing::{debug, instrument};

use crate::{
    models::users::{Account, Session},
    Result,
};

use super::AppwriteRepo;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_account(
        &self,
        account_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account>;
    async fn create_email_session(&self, email: &str, password: &str) -> Result<Session>;
    async fn get_current_session(&self, session: &str) -> Result<Session>;
    async fn delete_current_session(&self, session: &str) -> Result<()>;
    async fn get_account(&self, session: &str) -> Result<Account>;
    fn initials_avatar_url(&self, name: &str) -> String;
}

#[async_trait]
impl AccountRepository for AppwriteRepo {
    #[instrument(skip(self, password))]
    async fn create_account(
        &self,
        account_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account> {
        let builder = self.request(Method::POST, "/account").json(&json!({
            "userId": account_id,
            "email": email,
            "password": password,
            "name": name,
        }));

        let account = self.send(builder).await?.json::<Account>().await?;
        tracing::info!(account_id = %account.id, "Account created");

        Ok(account)
    }

    #[instrument(skip(self, password))]
    async fn create_email_session(&self, email: &str, password: &str) -> Result<Session> {
        let builder = self
            .request(Method::POST, "/account/sessions/email")
            .json(&json!({ "email": email, "password": password }));

        let response = self.send(builder).await?;

        // Without a server key the secret is only delivered as a cookie.
        let cookie_name = format!("a_session_{}", self.config.project_id);
        let cookie_secret = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|raw| Cookie::parse(raw.to_string()).ok())
            .find(|cookie| cookie.name() == cookie_name)
            .map(|cookie| cookie.value().to_string());

        let mut session = response.json::<Session>().await?;
        if session.secret.is_empty() {
            if let Some(secret) = cookie_secret {
                session.secret = secret;
            }
        }

        debug!(session_id = %session.id, "Session created");
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn get_current_session(&self, session: &str) -> Result<Session> {
        let builder = self.session_request(Method::GET, "/account/sessions/current", session);
        Ok(self.send(builder).await?.json::<Session>().await?)
    }

    #[instrument(skip_all)]
    async fn delete_current_session(&self, session: &str) -> Result<()> {
        let builder = self.session_request(Method::DELETE, "/account/sessions/current", session);
        self.send(builder).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn get_account(&self, session: &str) -> Result<Account> {
        let builder = self.session_request(Method::GET, "/account", session);
        Ok(self.send(builder).await?.json::<Account>().await?)
    }

    fn initials_avatar_url(&self, name: &str) -> String {
        format!(
            "{}/avatars/initials?name={}&project={}",
            self.config.url,
            urlencoding::encode(name),
            urlencoding::encode(&self.config.project_id)
        )
    }
}
