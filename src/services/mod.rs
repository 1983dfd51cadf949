pub mod auth;
pub mod feed;
pub mod posts;
pub mod saga;
