use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InfinitePostsQueryDto {
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchPostsQueryDto {
    pub q: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeletePostQueryDto {
    #[serde(rename = "imageId")]
    pub image_id: Option<String>,
}
