use crate::error::Result;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;
use super::notification_dto::{CreateNotificationRequest, RegisterResultRequest};
use super::notification_models::{Notification, NotificationWithAgent};

const SELECT_WITH_AGENT: &str = "SELECT n.*, u.nombre AS ujier_nombre, u.email AS ujier_email
     FROM notificaciones n
     LEFT JOIN usuarios u ON u.id = n.asignado_a";

pub struct NotificationListFilters {
    pub estado: Option<String>,
    pub tipo: Option<String>,
    pub fecha: Option<NaiveDate>,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns one page of notices, newest first, plus the unpaged total.
    pub async fn find_page(
        &self,
        filters: NotificationListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<NotificationWithAgent>, i64)> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut params_count = 0;

        if filters.estado.is_some() {
            params_count += 1;
            where_clause.push_str(&format!(" AND n.estado = ${}", params_count));
        }
        if filters.tipo.is_some() {
            params_count += 1;
            where_clause.push_str(&format!(" AND n.tipo_notificacion = ${}", params_count));
        }
        if filters.fecha.is_some() {
            params_count += 1;
            where_clause.push_str(&format!(" AND n.fecha_carga::date = ${}", params_count));
        }
        if filters.search.is_some() {
            params_count += 1;
            where_clause.push_str(&format!(
                " AND (n.n_expediente ILIKE ${0} OR n.caratula ILIKE ${0} OR n.destinatario_nombre ILIKE ${0})",
                params_count
            ));
        }

        let search = filters.search.map(|s| format!("%{}%", s));

        let count_query = format!("SELECT COUNT(*) FROM notificaciones n{}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(estado) = &filters.estado {
            count = count.bind(estado);
        }
        if let Some(tipo) = &filters.tipo {
            count = count.bind(tipo);
        }
        if let Some(fecha) = filters.fecha {
            count = count.bind(fecha);
        }
        if let Some(search) = &search {
            count = count.bind(search);
        }
        let total = count.fetch_one(&self.pool).await?;

        let page_query = format!(
            "{}{} ORDER BY n.fecha_carga DESC LIMIT ${} OFFSET ${}",
            SELECT_WITH_AGENT,
            where_clause,
            params_count + 1,
            params_count + 2
        );
        let mut page = sqlx::query_as::<_, NotificationWithAgent>(&page_query);
        if let Some(estado) = filters.estado {
            page = page.bind(estado);
        }
        if let Some(tipo) = filters.tipo {
            page = page.bind(tipo);
        }
        if let Some(fecha) = filters.fecha {
            page = page.bind(fecha);
        }
        if let Some(search) = search {
            page = page.bind(search);
        }
        let rows = page.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<NotificationWithAgent>> {
        let query = format!("{} WHERE n.id = $1", SELECT_WITH_AGENT);
        let notification = sqlx::query_as::<_, NotificationWithAgent>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(notification)
    }

    /// Work list of an agent, oldest first.
    pub async fn find_assigned(&self, agent_id: Uuid, estado: &str) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notificaciones
             WHERE asignado_a = $1 AND estado = $2
             ORDER BY fecha_carga ASC"
        )
        .bind(agent_id)
        .bind(estado)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn create(&self, req: &CreateNotificationRequest) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notificaciones (
                usuario_carga, tipo_notificacion, n_expediente, caratula, origen, letrado,
                destinatario_especial, destinatario_nombre, domicilio, zona, tipo_troquel,
                sin_troquel, n_troquel, medio_pago, costo, observaciones_iniciales
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *"
        )
        .bind(&req.usuario_carga)
        .bind(&req.tipo_notificacion)
        .bind(&req.n_expediente)
        .bind(&req.caratula)
        .bind(&req.origen)
        .bind(&req.letrado)
        .bind(&req.destinatario_especial)
        .bind(&req.destinatario_nombre)
        .bind(&req.domicilio)
        .bind(&req.zona)
        .bind(&req.tipo_troquel)
        .bind(req.sin_troquel)
        .bind(&req.n_troquel)
        .bind(&req.medio_pago)
        .bind(req.costo.unwrap_or(0.0))
        .bind(&req.observaciones_iniciales)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn assign(
        &self,
        id: Uuid,
        asignado_a: Uuid,
        asignado_por: Uuid,
    ) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notificaciones
             SET asignado_a = $2, asignado_por = $3, fecha_asignacion = NOW(),
                 updated_at = NOW(), updated_by = $3
             WHERE id = $1
             RETURNING *"
        )
        .bind(id)
        .bind(asignado_a)
        .bind(asignado_por)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn register_result_with_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        estado: &str,
        agent_id: Uuid,
        req: &RegisterResultRequest,
    ) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notificaciones
             SET estado = $2, resultado_diligencia = $3, fecha_diligencia = NOW(),
                 observaciones_resultado = $4, ubicacion_lat = $5, ubicacion_lng = $6,
                 evidencia_foto = $7, observacion_audio = $8, transcripcion_audio = $9,
                 es_carga_diferida = $10, motivo_falla_senal = $11,
                 diligenciado_por = $12, updated_at = NOW(), updated_by = $12
             WHERE id = $1
             RETURNING *"
        )
        .bind(id)
        .bind(estado)
        .bind(&req.resultado)
        .bind(&req.observaciones)
        .bind(req.ubicacion_lat)
        .bind(req.ubicacion_lng)
        .bind(&req.evidencia_foto)
        .bind(&req.observacion_audio)
        .bind(&req.transcripcion_audio)
        .bind(req.es_carga_diferida)
        .bind(&req.motivo_falla_senal)
        .bind(agent_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(notification)
    }

    /// Applies `(column, value)` pairs; columns must come from the update allow-list.
    pub async fn update_fields(
        &self,
        id: Uuid,
        fields: &[(&'static str, String)],
        updated_by: Option<Uuid>,
    ) -> Result<Option<Notification>> {
        let mut query = String::from("UPDATE notificaciones SET updated_at = NOW(), updated_by = $2");
        let mut params_count = 2;

        for (column, _) in fields {
            params_count += 1;
            query.push_str(&format!(", {} = ${}", column, params_count));
        }

        query.push_str(" WHERE id = $1 RETURNING *");

        let mut q = sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(updated_by);
        for (_, value) in fields {
            q = q.bind(value);
        }

        let notification = q.fetch_optional(&self.pool).await?;

        Ok(notification)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notificaciones WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
