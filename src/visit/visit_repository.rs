use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;
use super::visit_dto::NewVisit;
use super::visit_models::{Visit, VisitDetail};

const SELECT_DETAIL: &str = "SELECT v.*, u.nombre AS ujier_nombre, n.n_expediente,
            n.destinatario_nombre, n.tipo_notificacion
     FROM visitas v
     LEFT JOIN usuarios u ON u.id = v.ujier_id
     LEFT JOIN notificaciones n ON n.id = v.notificacion_id";

const INSERT: &str = "INSERT INTO visitas (
        notificacion_id, ujier_id, resultado, observaciones,
        ubicacion_lat, ubicacion_lng, foto_url, audio_url
     )
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
     RETURNING *";

#[derive(Clone)]
pub struct VisitRepository {
    pool: PgPool,
}

impl VisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_notification(&self, notificacion_id: Uuid) -> Result<Vec<VisitDetail>> {
        let query = format!("{} WHERE v.notificacion_id = $1 ORDER BY v.fecha DESC", SELECT_DETAIL);
        let visits = sqlx::query_as::<_, VisitDetail>(&query)
            .bind(notificacion_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(visits)
    }

    pub async fn find_by_agent(&self, ujier_id: Uuid, limit: i64) -> Result<Vec<VisitDetail>> {
        let query = format!("{} WHERE v.ujier_id = $1 ORDER BY v.fecha DESC LIMIT $2", SELECT_DETAIL);
        let visits = sqlx::query_as::<_, VisitDetail>(&query)
            .bind(ujier_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(visits)
    }

    pub async fn find_recent(&self, limit: i64) -> Result<Vec<VisitDetail>> {
        let query = format!("{} ORDER BY v.fecha DESC LIMIT $1", SELECT_DETAIL);
        let visits = sqlx::query_as::<_, VisitDetail>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(visits)
    }

    pub async fn create(&self, visit: &NewVisit) -> Result<Visit> {
        let visit = sqlx::query_as::<_, Visit>(INSERT)
            .bind(visit.notificacion_id)
            .bind(visit.ujier_id)
            .bind(&visit.resultado)
            .bind(&visit.observaciones)
            .bind(visit.ubicacion_lat)
            .bind(visit.ubicacion_lng)
            .bind(&visit.foto_url)
            .bind(&visit.audio_url)
            .fetch_one(&self.pool)
            .await?;

        Ok(visit)
    }

    pub async fn create_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        visit: &NewVisit,
    ) -> Result<Visit> {
        let visit = sqlx::query_as::<_, Visit>(INSERT)
            .bind(visit.notificacion_id)
            .bind(visit.ujier_id)
            .bind(&visit.resultado)
            .bind(&visit.observaciones)
            .bind(visit.ubicacion_lat)
            .bind(visit.ubicacion_lng)
            .bind(&visit.foto_url)
            .bind(&visit.audio_url)
            .fetch_one(&mut **tx)
            .await?;

        Ok(visit)
    }
}
