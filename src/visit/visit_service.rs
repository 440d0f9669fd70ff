use crate::{
    error::{AppError, Result},
    notification::notification_models::VisitResult,
    sanitize::sanitize_opt,
    visit::{
        visit_dto::{CreateVisitRequest, NewVisit},
        visit_models::{Visit, VisitDetail},
        visit_repository::VisitRepository,
    },
};
use uuid::Uuid;

/// Per-agent and recent listings are capped at this many rows.
pub const VISIT_LIST_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct VisitService {
    repo: VisitRepository,
}

impl VisitService {
    pub fn new(repo: VisitRepository) -> Self {
        Self { repo }
    }

    pub async fn for_notification(&self, notificacion_id: Uuid) -> Result<Vec<VisitDetail>> {
        self.repo.find_by_notification(notificacion_id).await
    }

    pub async fn for_agent(&self, ujier_id: Uuid) -> Result<Vec<VisitDetail>> {
        self.repo.find_by_agent(ujier_id, VISIT_LIST_LIMIT).await
    }

    pub async fn recent(&self) -> Result<Vec<VisitDetail>> {
        self.repo.find_recent(VISIT_LIST_LIMIT).await
    }

    pub async fn record_visit(&self, payload: CreateVisitRequest) -> Result<Visit> {
        let notificacion_id = payload
            .notificacion_id
            .ok_or_else(|| AppError::BadRequest("Notification ID is required".to_string()))?;

        if let Some(resultado) = payload.resultado.as_deref() {
            resultado.parse::<VisitResult>().map_err(AppError::Validation)?;
        }

        let visit = self
            .repo
            .create(&NewVisit {
                notificacion_id,
                ujier_id: payload.ujier_id,
                resultado: payload.resultado,
                observaciones: sanitize_opt(payload.observaciones.as_deref()),
                ubicacion_lat: payload.ubicacion_lat,
                ubicacion_lng: payload.ubicacion_lng,
                foto_url: payload.foto_url,
                audio_url: payload.audio_url,
            })
            .await?;

        tracing::info!(visit_id = %visit.id, notificacion_id = %notificacion_id, "Visit recorded");
        Ok(visit)
    }
}
