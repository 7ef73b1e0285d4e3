//! API models for authentication.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::users::UserResponse;

/// Public registration body. The role always starts as viewer.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 100, message = "must be between 6 and 100 characters"))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// Body for exchanging a refresh token for a fresh access token
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// User snapshot plus a token pair, returned by register and login
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Fresh access token returned by the refresh endpoint
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub user: UserResponse,
    pub access_token: String,
}

/// Self-service profile update
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Self-service password change
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub current_password: String,
    #[validate(length(min = 6, max = 100, message = "must be between 6 and 100 characters"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate as _;

    #[test]
    fn refresh_body_uses_camel_case() {
        let body: RefreshRequest = serde_json::from_value(serde_json::json!({
            "refreshToken": "abc.def.ghi"
        }))
        .unwrap();
        assert_eq!(body.refresh_token, "abc.def.ghi");
    }

    #[test]
    fn password_change_validates_new_password_only() {
        let body = PasswordChange {
            current_password: "old-password".to_string(),
            new_password: "short".to_string(),
        };
        let errs = body.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("new_password"));
        assert!(!errs.field_errors().contains_key("current_password"));
    }
}
