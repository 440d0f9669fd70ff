use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dto::empty_as_none, error::AppError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Field 'tipo_notificacion' is required"))]
    pub tipo_notificacion: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Field 'n_expediente' is required"))]
    pub n_expediente: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Field 'caratula' is required"))]
    pub caratula: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Field 'origen' is required"))]
    pub origen: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Field 'destinatario_nombre' is required"))]
    pub destinatario_nombre: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Field 'domicilio' is required"))]
    pub domicilio: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Field 'zona' is required"))]
    pub zona: String,
    /// Email of the clerk who loaded the record; defaults to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario_carga: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letrado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destinatario_especial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_troquel: Option<String>,
    #[serde(default)]
    pub sin_troquel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_troquel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medio_pago: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub costo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones_iniciales: Option<String>,
}

/// Allow-listed generic update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateNotificationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones_iniciales: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_notificacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub n_expediente: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub caratula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub origen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letrado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub destinatario_nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub domicilio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50))]
    pub zona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Uuid>,
}

impl UpdateNotificationRequest {
    /// Column/value pairs in allow-list order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("estado", &self.estado),
            ("observaciones_iniciales", &self.observaciones_iniciales),
            ("tipo_notificacion", &self.tipo_notificacion),
            ("n_expediente", &self.n_expediente),
            ("caratula", &self.caratula),
            ("origen", &self.origen),
            ("letrado", &self.letrado),
            ("destinatario_nombre", &self.destinatario_nombre),
            ("domicilio", &self.domicilio),
            ("zona", &self.zona),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssignRequest {
    #[serde(default)]
    pub asignado_a: Option<Uuid>,
    /// Defaults to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asignado_por: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterResultRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Field 'resultado' is required"))]
    pub resultado: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub ubicacion_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub ubicacion_lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidencia_foto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacion_audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcripcion_audio: Option<String>,
    /// Set when the result is uploaded after the visit because the device had no signal.
    #[serde(default)]
    pub es_carga_diferida: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivo_falla_senal: Option<String>,
    /// Agent who performed the visit; defaults to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// The three shapes a `PUT /api/notificaciones` body can take, keyed by `action`.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationUpdate {
    Assign(AssignRequest),
    Result(RegisterResultRequest),
    Fields(UpdateNotificationRequest),
}

impl NotificationUpdate {
    pub fn from_body(body: serde_json::Value) -> Result<(Uuid, Self), AppError> {
        let id = body
            .get("id")
            .filter(|v| !v.is_null())
            .ok_or_else(|| AppError::BadRequest("Notification ID is required".to_string()))
            .and_then(|v| {
                serde_json::from_value::<Uuid>(v.clone())
                    .map_err(|_| AppError::BadRequest("Invalid notification ID".to_string()))
            })?;

        let action = body.get("action").and_then(|v| v.as_str()).map(String::from);
        let invalid = |e: serde_json::Error| AppError::BadRequest(e.to_string());

        let update = match action.as_deref() {
            Some("assign") => {
                NotificationUpdate::Assign(serde_json::from_value(body).map_err(invalid)?)
            }
            Some("result") => {
                NotificationUpdate::Result(serde_json::from_value(body).map_err(invalid)?)
            }
            None => NotificationUpdate::Fields(serde_json::from_value(body).map_err(invalid)?),
            Some(_) => return Err(AppError::BadRequest("Invalid action".to_string())),
        };

        Ok((id, update))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationFilters {
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Uuid>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub asignado_a: Option<Uuid>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub estado: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub tipo: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub search: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<u32>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_required_field_fails_validation() {
        let req: CreateNotificationRequest = serde_json::from_value(json!({
            "tipo_notificacion": "cedulas",
            "n_expediente": "EXP-1/2026",
            "origen": "Juzgado Civil 3",
            "destinatario_nombre": "Juan Pérez",
            "domicilio": "San Martín 123",
            "zona": "norte"
        }))
        .unwrap();

        let err = req.validate().unwrap_err().to_string();
        assert!(err.contains("Field 'caratula' is required"), "{err}");
    }

    #[test]
    fn test_update_body_without_id_rejected() {
        let err = NotificationUpdate::from_body(json!({ "estado": "diferida" })).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Notification ID is required"));
    }

    #[test]
    fn test_update_body_dispatches_on_action() {
        let id = Uuid::new_v4();
        let agent = Uuid::new_v4();

        let (parsed_id, update) =
            NotificationUpdate::from_body(json!({ "id": id, "action": "assign", "asignado_a": agent }))
                .unwrap();
        assert_eq!(parsed_id, id);
        assert!(matches!(update, NotificationUpdate::Assign(a) if a.asignado_a == Some(agent)));

        let (_, update) = NotificationUpdate::from_body(json!({
            "id": id,
            "action": "result",
            "resultado": "atiende",
            "es_carga_diferida": true
        }))
        .unwrap();
        assert!(matches!(update, NotificationUpdate::Result(r) if r.es_carga_diferida));

        let (_, update) =
            NotificationUpdate::from_body(json!({ "id": id, "zona": "sur" })).unwrap();
        match update {
            NotificationUpdate::Fields(fields) => assert_eq!(fields.fields(), vec![("zona", "sur")]),
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn test_blank_filters_from_a_full_form_are_absent() {
        let uri: axum::http::Uri = "/api/notificaciones?estado=&tipo=&fecha=&search=&page=1&limit="
            .parse()
            .unwrap();
        let axum::extract::Query(filters) =
            axum::extract::Query::<NotificationFilters>::try_from_uri(&uri).unwrap();

        assert!(filters.estado.is_none());
        assert!(filters.tipo.is_none());
        assert!(filters.fecha.is_none());
        assert!(filters.search.is_none());
        assert_eq!(filters.page, Some(1));
        assert!(filters.limit.is_none());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = NotificationUpdate::from_body(json!({ "id": Uuid::new_v4(), "action": "archive" }))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid action"));
    }
}
