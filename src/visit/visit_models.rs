use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One attempt at the door. Rows are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visit {
    pub id: Uuid,
    pub notificacion_id: Uuid,
    pub ujier_id: Option<Uuid>,
    pub resultado: Option<String>,
    pub observaciones: Option<String>,
    pub ubicacion_lat: Option<f64>,
    pub ubicacion_lng: Option<f64>,
    pub foto_url: Option<String>,
    pub audio_url: Option<String>,
    pub fecha: DateTime<Utc>,
}

/// Visit joined with the agent's name and a few fields of its notice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VisitDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub visit: Visit,
    pub ujier_nombre: Option<String>,
    pub n_expediente: Option<String>,
    pub destinatario_nombre: Option<String>,
    pub tipo_notificacion: Option<String>,
}
