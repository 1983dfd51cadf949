use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::repositories::AppwriteConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub appwrite: AppwriteConfig,
    pub timeout_secs: u64,
    pub session_maxage: i64,
    pub max_upload_bytes: usize,
    pub port: u16,
}

impl Config {
    pub fn init() -> Config {
        dotenv::dotenv().ok();

        let appwrite = AppwriteConfig {
            url: required("APPWRITE_URL").trim_end_matches('/').to_string(),
            project_id: required("APPWRITE_PROJECT_ID"),
            database_id: required("APPWRITE_DATABASE_ID"),
            storage_id: required("APPWRITE_STORAGE_ID"),
            user_collection_id: required("APPWRITE_USER_COLLECTION_ID"),
            post_collection_id: required("APPWRITE_POST_COLLECTION_ID"),
            saves_collection_id: required("APPWRITE_SAVES_COLLECTION_ID"),
            api_key: env::var("APPWRITE_API_KEY").ok().filter(|k| !k.is_empty()),
        };

        Config {
            appwrite,
            timeout_secs: try_load("APPWRITE_TIMEOUT_SECS", "30"),
            session_maxage: try_load("SESSION_MAXAGE_HOURS", "8760"),
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", "10485760"),
            port: try_load("PORT", "8080"),
        }
    }
}

fn required(key: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => panic!("{key} must be set and non-empty"),
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value: {e}");
        panic!("{key} is misconfigured")
    })
}
