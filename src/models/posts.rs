use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    documents::{FileUpload, HasId, Relation},
    users::User,
};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Post {
    #[serde(rename = "$id")]
    pub id: String,
    pub creator: Relation<User>,
    pub caption: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imageId")]
    pub image_id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes: Vec<Relation<User>>,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl HasId for Post {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Post {
    pub fn like_ids(&self) -> Vec<&str> {
        self.likes.iter().map(Relation::id).collect()
    }
}

/// Join document linking a user to a post they saved.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Save {
    #[serde(rename = "$id")]
    pub id: String,
    pub user: Relation<User>,
    pub post: Relation<Post>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: String,
    pub caption: String,
    pub files: Vec<FileUpload>,
    pub location: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePost {
    pub post_id: String,
    pub caption: String,
    pub image_id: String,
    pub image_url: String,
    pub files: Vec<FileUpload>,
    pub location: Option<String>,
    pub tags: Option<String>,
}

/// Attributes written to the posts collection on create.
#[derive(Debug, Serialize)]
pub struct PostDocument<'a> {
    pub creator: &'a str,
    pub caption: &'a str,
    #[serde(rename = "imageUrl")]
    pub image_url: &'a str,
    #[serde(rename = "imageId")]
    pub image_id: &'a str,
    pub location: Option<&'a str>,
    pub tags: &'a [String],
}

/// Attributes replaced on update. The creator is never rewritten.
#[derive(Debug, Serialize)]
pub struct PostChanges<'a> {
    pub caption: &'a str,
    #[serde(rename = "imageUrl")]
    pub image_url: &'a str,
    #[serde(rename = "imageId")]
    pub image_id: &'a str,
    pub location: Option<&'a str>,
    pub tags: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct SaveDocument<'a> {
    pub user: &'a str,
    pub post: &'a str,
}

/// Turns the free-text tag field into a list: all whitespace is removed and
/// the remainder is split on commas. Empty segments are dropped.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    compact
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Text fields of the create/update post form.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct PostFormDto {
    #[validate(length(
        min = 5,
        max = 2200,
        message = "Caption must be between 5 and 2200 characters"
    ))]
    pub caption: String,
    #[validate(length(
        min = 2,
        max = 100,
        message = "Location must be between 2 and 100 characters"
    ))]
    pub location: Option<String>,
    #[validate(length(max = 500, message = "Tags must be at most 500 characters"))]
    pub tags: Option<String>,
    #[serde(rename = "imageId")]
    pub image_id: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikePostDto {
    pub likes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponseDto {
    pub status: String,
    pub total: u64,
    pub posts: Vec<Post>,
    /// Cursor for the next page, absent when this page was the last one.
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_lose_whitespace_and_split_on_commas() {
        assert_eq!(
            parse_tags("Art, Expression ,Learn"),
            vec!["Art", "Expression", "Learn"]
        );
    }

    #[test]
    fn blank_tag_input_yields_no_tags() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags("  ,  ").is_empty());
        assert_eq!(parse_tags("a,,b"), vec!["a", "b"]);
    }

    #[test]
    fn inner_spaces_are_removed() {
        assert_eq!(parse_tags("street art, ny"), vec!["streetart", "ny"]);
    }

    #[test]
    fn post_form_rejects_short_caption() {
        let form = PostFormDto {
            caption: "hey".to_string(),
            location: Some("Lagos".to_string()),
            ..Default::default()
        };

        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("caption"));
    }

    #[test]
    fn post_reads_expanded_creator_and_bare_likes() {
        let post: Post = serde_json::from_value(serde_json::json!({
            "$id": "p1",
            "creator": {
                "$id": "u1",
                "accountId": "acc1",
                "name": "Jane",
                "email": "jane@example.com",
                "imageUrl": "https://cloud.example/a.png",
                "$createdAt": "2024-05-01T10:00:00.000+00:00",
                "$updatedAt": "2024-05-01T10:00:00.000+00:00"
            },
            "caption": "sunset over the bay",
            "imageUrl": "https://cloud.example/preview",
            "imageId": "f1",
            "location": "Accra",
            "tags": ["sun"],
            "likes": ["u2", "u3"],
            "$createdAt": "2024-05-02T10:00:00.000+00:00",
            "$updatedAt": "2024-05-02T10:00:00.000+00:00"
        }))
        .unwrap();

        assert_eq!(post.creator.id(), "u1");
        assert_eq!(post.like_ids(), vec!["u2", "u3"]);
    }
}
