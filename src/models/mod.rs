pub mod documents;
pub mod posts;
pub mod query;
pub mod response;
pub mod users;
