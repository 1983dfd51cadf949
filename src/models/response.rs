use serde::Serialize;

/// Plain acknowledgement body for writes that return nothing else.
#[derive(Debug, Serialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}
