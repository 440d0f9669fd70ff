use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// `?action=` selector of the `/api/auth` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Verify,
    ChangePassword,
    CreateUser,
}

impl FromStr for AuthAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(AuthAction::Login),
            "verify" => Ok(AuthAction::Verify),
            "change-password" => Ok(AuthAction::ChangePassword),
            "create-user" => Ok(AuthAction::CreateUser),
            _ => Err("Invalid action. Use: login, verify, change-password, create-user".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    /// Defaults to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 6, message = "New password must have at least 6 characters"))]
    pub new_password: String,
}

/// Login result: the user's public fields plus the session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    pub rol: String,
    pub foto: Option<String>,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
