//! API models for user management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{db::models::users::UserDBResponse, types::UserId};

/// User role, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Editor => write!(f, "editor"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// The authenticated caller, as loaded by the auth extractor
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
        }
    }
}

/// Public representation of a user. The password hash never leaves the db layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Admin request to create a user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 100, message = "must be between 6 and 100 characters"))]
    pub password: String,
    pub role: Option<Role>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Admin request to update a user. All fields optional.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Query filters for the user listing
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UserListFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

/// Content counts and view tally for one user
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub posts_count: i64,
    pub projects_count: i64,
    pub downloads_count: i64,
    pub total_views: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate as _;

    #[test]
    fn create_request_rejects_short_password() {
        let req = UserCreate {
            email: "user@example.com".to_string(),
            username: "user".to_string(),
            password: "short".to_string(),
            role: None,
            first_name: None,
            last_name: None,
        };
        let errs = req.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("password"));
    }

    #[test]
    fn create_request_rejects_bad_email() {
        let req = UserCreate {
            email: "not-an-email".to_string(),
            username: "user".to_string(),
            password: "long enough".to_string(),
            role: None,
            first_name: None,
            last_name: None,
        };
        let errs = req.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("email"));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::from_str::<Role>("\"viewer\"").unwrap(), Role::Viewer);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let stats = UserStats {
            posts_count: 3,
            projects_count: 2,
            downloads_count: 1,
            total_views: 40,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["postsCount"], 3);
        assert_eq!(json["projectsCount"], 2);
        assert_eq!(json["downloadsCount"], 1);
        assert_eq!(json["totalViews"], 40);
    }
}
