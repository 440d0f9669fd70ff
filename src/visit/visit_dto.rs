use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::empty_as_none;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateVisitRequest {
    #[serde(default)]
    pub notificacion_id: Option<Uuid>,
    #[serde(default)]
    pub ujier_id: Option<Uuid>,
    #[serde(default)]
    pub resultado: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub ubicacion_lat: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub ubicacion_lng: Option<f64>,
    #[serde(default)]
    pub foto_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Validated insert, with the notice id resolved.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub notificacion_id: Uuid,
    pub ujier_id: Option<Uuid>,
    pub resultado: Option<String>,
    pub observaciones: Option<String>,
    pub ubicacion_lat: Option<f64>,
    pub ubicacion_lng: Option<f64>,
    pub foto_url: Option<String>,
    pub audio_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VisitQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub notificacion_id: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ujier_id: Option<Uuid>,
}
