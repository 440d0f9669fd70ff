use crate::{
    db::DbPool,
    dto::{page_window, PaginatedResponse},
    error::{AppError, Result},
    notification::{
        notification_dto::{
            AssignRequest, CreateNotificationRequest, NotificationFilters, RegisterResultRequest,
            UpdateNotificationRequest,
        },
        notification_models::{
            FailureReason, Notification, NotificationStatus, NotificationType,
            NotificationWithAgent, PaymentMethod, VisitResult,
        },
        notification_repository::{NotificationListFilters, NotificationRepository},
    },
    sanitize::{sanitize, sanitize_bounded, sanitize_opt},
    visit::{visit_dto::NewVisit, visit_repository::VisitRepository},
};
use uuid::Uuid;

/// Width of the `VARCHAR` notice columns that take free text.
fn column_width(column: &str) -> Option<usize> {
    match column {
        "n_expediente" | "tipo_notificacion" | "tipo_troquel" | "n_troquel" => Some(100),
        "origen" | "letrado" | "destinatario_especial" | "destinatario_nombre" | "usuario_carga" => {
            Some(255)
        }
        "zona" => Some(50),
        "estado" => Some(20),
        _ => None,
    }
}

fn clean_field(column: &str, value: &str) -> Result<String> {
    match column_width(column) {
        Some(max) => sanitize_bounded(column, value, max),
        None => Ok(sanitize(value)),
    }
}

fn clean_opt(column: &str, value: Option<&str>) -> Result<Option<String>> {
    value.map(|v| clean_field(column, v)).transpose()
}

#[derive(Clone)]
pub struct NotificationService {
    db: DbPool,
    repo: NotificationRepository,
    visit_repo: VisitRepository,
}

impl NotificationService {
    pub fn new(db: DbPool, repo: NotificationRepository, visit_repo: VisitRepository) -> Self {
        Self {
            db,
            repo,
            visit_repo,
        }
    }

    pub async fn list(
        &self,
        filters: NotificationFilters,
    ) -> Result<PaginatedResponse<NotificationWithAgent>> {
        let (page, limit, offset) = page_window(filters.page, filters.limit);

        let (rows, total) = self
            .repo
            .find_page(
                NotificationListFilters {
                    estado: filters.estado,
                    tipo: filters.tipo,
                    fecha: filters.fecha,
                    search: filters.search.filter(|s| !s.trim().is_empty()),
                },
                limit as i64,
                offset,
            )
            .await?;

        Ok(PaginatedResponse::new(rows, total, page, limit))
    }

    pub async fn get(&self, id: Uuid) -> Result<NotificationWithAgent> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    /// Notices assigned to an agent in the given state (`pendiente` when absent).
    pub async fn assigned_to(&self, agent_id: Uuid, estado: Option<&str>) -> Result<Vec<Notification>> {
        let estado = estado.unwrap_or(NotificationStatus::Pendiente.as_str());
        self.repo.find_assigned(agent_id, estado).await
    }

    pub async fn create(
        &self,
        payload: CreateNotificationRequest,
        caller_email: &str,
    ) -> Result<Notification> {
        let tipo: NotificationType = payload
            .tipo_notificacion
            .parse()
            .map_err(AppError::Validation)?;
        let medio_pago = payload
            .medio_pago
            .as_deref()
            .map(|m| m.parse::<PaymentMethod>().map_err(AppError::Validation))
            .transpose()?;

        let usuario_carga = match clean_opt("usuario_carga", payload.usuario_carga.as_deref())? {
            Some(email) if !email.is_empty() => email,
            _ => clean_field("usuario_carga", caller_email)?,
        };

        let req = CreateNotificationRequest {
            tipo_notificacion: tipo.as_str().to_string(),
            n_expediente: clean_field("n_expediente", &payload.n_expediente)?,
            caratula: sanitize(&payload.caratula),
            origen: clean_field("origen", &payload.origen)?,
            destinatario_nombre: clean_field("destinatario_nombre", &payload.destinatario_nombre)?,
            domicilio: sanitize(&payload.domicilio),
            zona: clean_field("zona", &payload.zona)?,
            usuario_carga: Some(usuario_carga),
            letrado: clean_opt("letrado", payload.letrado.as_deref())?,
            destinatario_especial: clean_opt(
                "destinatario_especial",
                payload.destinatario_especial.as_deref(),
            )?,
            tipo_troquel: clean_opt("tipo_troquel", payload.tipo_troquel.as_deref())?,
            sin_troquel: payload.sin_troquel,
            n_troquel: clean_opt("n_troquel", payload.n_troquel.as_deref())?,
            medio_pago: medio_pago.map(|m| m.as_str().to_string()),
            costo: payload.costo,
            observaciones_iniciales: sanitize_opt(payload.observaciones_iniciales.as_deref()),
        };

        let notification = self.repo.create(&req).await?;

        tracing::info!(
            notification_id = %notification.id,
            tipo = %tipo,
            "Notification created"
        );
        Ok(notification)
    }

    pub async fn assign(&self, id: Uuid, payload: AssignRequest, caller: Uuid) -> Result<Notification> {
        let asignado_a = payload
            .asignado_a
            .ok_or_else(|| AppError::Validation("Field 'asignado_a' is required".to_string()))?;
        let asignado_por = payload.asignado_por.unwrap_or(caller);

        let notification = self
            .repo
            .assign(id, asignado_a, asignado_por)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        tracing::info!(notification_id = %id, asignado_a = %asignado_a, "Notification assigned");
        Ok(notification)
    }

    /// Stores the visit outcome on the notice and appends it to the visit history atomically.
    pub async fn register_result(
        &self,
        id: Uuid,
        payload: RegisterResultRequest,
        caller: Uuid,
    ) -> Result<Notification> {
        let resultado: VisitResult = payload.resultado.parse().map_err(AppError::Validation)?;
        let motivo = payload
            .motivo_falla_senal
            .as_deref()
            .map(|m| m.parse::<FailureReason>().map_err(AppError::Validation))
            .transpose()?;

        let estado = if payload.es_carga_diferida {
            NotificationStatus::Diferida
        } else {
            NotificationStatus::Diligenciada
        };
        let agent_id = payload.user_id.unwrap_or(caller);

        let req = RegisterResultRequest {
            resultado: resultado.as_str().to_string(),
            observaciones: sanitize_opt(payload.observaciones.as_deref()),
            transcripcion_audio: sanitize_opt(payload.transcripcion_audio.as_deref()),
            motivo_falla_senal: motivo.map(|m| m.as_str().to_string()),
            user_id: Some(agent_id),
            ..payload
        };

        let mut tx = self.db.begin().await?;

        let notification = self
            .repo
            .register_result_with_tx(&mut tx, id, estado.as_str(), agent_id, &req)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        self.visit_repo
            .create_with_tx(
                &mut tx,
                &NewVisit {
                    notificacion_id: id,
                    ujier_id: Some(agent_id),
                    resultado: Some(req.resultado.clone()),
                    observaciones: req.observaciones.clone(),
                    ubicacion_lat: req.ubicacion_lat,
                    ubicacion_lng: req.ubicacion_lng,
                    foto_url: req.evidencia_foto.clone(),
                    audio_url: req.observacion_audio.clone(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            notification_id = %id,
            resultado = %resultado,
            estado = %estado,
            "Visit result registered"
        );
        Ok(notification)
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: UpdateNotificationRequest,
        caller: Uuid,
    ) -> Result<Notification> {
        if let Some(estado) = payload.estado.as_deref() {
            estado.parse::<NotificationStatus>().map_err(AppError::Validation)?;
        }
        if let Some(tipo) = payload.tipo_notificacion.as_deref() {
            tipo.parse::<NotificationType>().map_err(AppError::Validation)?;
        }

        let fields = payload
            .fields()
            .into_iter()
            .map(|(column, value)| Ok((column, clean_field(column, value)?)))
            .collect::<Result<Vec<(&'static str, String)>>>()?;

        if fields.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        self.repo
            .update_fields(id, &fields, Some(payload.updated_by.unwrap_or(caller)))
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if self.repo.delete(id).await? == 0 {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }

        tracing::info!(notification_id = %id, "Notification deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaped_value_must_fit_its_column() {
        let expediente = format!("{}&", "A".repeat(99));

        let err = clean_field("n_expediente", &expediente).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = clean_field("zona", &"'".repeat(10)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("'zona'")));
    }

    #[test]
    fn test_text_columns_are_unbounded() {
        let caratula = "&".repeat(1000);
        assert_eq!(clean_field("caratula", &caratula).unwrap().len(), 5000);
        assert_eq!(clean_opt("letrado", None).unwrap(), None);
    }
}
