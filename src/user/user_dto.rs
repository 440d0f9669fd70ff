use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::empty_as_none;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(email(message = "Email, nombre and rol are required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Email, nombre and rol are required"))]
    pub nombre: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email, nombre and rol are required"))]
    pub rol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foto: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none() && self.rol.is_none() && self.foto.is_none() && self.activo.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub id: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub rol: Option<String>,
}
