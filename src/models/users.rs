use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::documents::HasId;

/// Identity record held by the BaaS account service.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub expire: Option<DateTime<Utc>>,
}

/// Profile document in the users collection.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl HasId for User {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct NewUserDocument {
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(length(min = 2, message = "Username must be at least 2 characters"))]
    pub username: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email address")
    )]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

impl From<RegisterUserDto> for NewUser {
    fn from(dto: RegisterUserDto) -> Self {
        NewUser {
            name: dto.name,
            email: dto.email,
            username: dto.username,
            password: dto.password,
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_owned(),
            account_id: user.account_id.to_owned(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            username: user.username.to_owned(),
            image_url: user.image_url.to_owned(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub session: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_dto_enforces_lengths() {
        let dto = RegisterUserDto {
            name: "A".to_string(),
            username: "ab".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };

        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("username"));
    }

    #[test]
    fn user_document_parses_system_attributes() {
        let user: User = serde_json::from_value(serde_json::json!({
            "$id": "u1",
            "accountId": "acc1",
            "name": "Jane",
            "email": "jane@example.com",
            "username": "jane",
            "imageUrl": "https://cloud.example/avatars/initials?name=Jane",
            "$createdAt": "2024-05-01T10:00:00.000+00:00",
            "$updatedAt": "2024-05-01T10:00:00.000+00:00",
            "$permissions": []
        }))
        .unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(user.account_id, "acc1");
        assert_eq!(user.username.as_deref(), Some("jane"));
    }
}
