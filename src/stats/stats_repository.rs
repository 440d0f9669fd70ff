use crate::error::Result;
use sqlx::PgPool;
use super::stats_models::{
    AgentPerformance, DailyStats, GeneralStats, ResultCount, TypeCount, ZoneStats,
};

#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn general(&self) -> Result<GeneralStats> {
        let stats = sqlx::query_as::<_, GeneralStats>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE estado = 'pendiente') AS pendientes,
                COUNT(*) FILTER (WHERE estado = 'diligenciada') AS diligenciadas,
                COUNT(*) FILTER (WHERE estado = 'diferida') AS diferidas
             FROM notificaciones"
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    pub async fn by_type(&self) -> Result<Vec<TypeCount>> {
        let rows = sqlx::query_as::<_, TypeCount>(
            "SELECT tipo_notificacion AS tipo, COUNT(*) AS count
             FROM notificaciones
             GROUP BY tipo_notificacion
             ORDER BY count DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn by_result(&self) -> Result<Vec<ResultCount>> {
        let rows = sqlx::query_as::<_, ResultCount>(
            "SELECT resultado_diligencia AS result, COUNT(*) AS count
             FROM notificaciones
             WHERE resultado_diligencia IS NOT NULL
             GROUP BY resultado_diligencia
             ORDER BY count DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Active agents with assigned and completed counts, agents without work included.
    pub async fn by_agent(&self) -> Result<Vec<AgentPerformance>> {
        let rows = sqlx::query_as::<_, AgentPerformance>(
            "SELECT
                u.id,
                u.nombre,
                COUNT(n.id) AS total,
                COUNT(n.id) FILTER (WHERE n.estado = 'diligenciada') AS completed
             FROM usuarios u
             LEFT JOIN notificaciones n ON n.asignado_a = u.id
             WHERE u.rol = 'ujier' AND u.activo = TRUE
             GROUP BY u.id, u.nombre
             ORDER BY completed DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn by_zone(&self) -> Result<Vec<ZoneStats>> {
        let rows = sqlx::query_as::<_, ZoneStats>(
            "SELECT
                zona AS zone,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE estado = 'pendiente') AS pendientes,
                COUNT(*) FILTER (WHERE estado = 'diligenciada') AS diligenciadas
             FROM notificaciones
             GROUP BY zona
             ORDER BY total DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn daily(&self, days: i32) -> Result<Vec<DailyStats>> {
        let rows = sqlx::query_as::<_, DailyStats>(
            "SELECT
                fecha_carga::date AS date,
                COUNT(*) AS created,
                COUNT(*) FILTER (WHERE estado = 'diligenciada') AS completed
             FROM notificaciones
             WHERE fecha_carga >= NOW() - make_interval(days => $1)
             GROUP BY fecha_carga::date
             ORDER BY date DESC"
        )
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
