use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::{
    dto::{ok, ApiQuery},
    error::{AppError, Result},
    state::AppState,
    stats::stats_models::{StatsKind, StatsQuery},
};

/// Aggregate counters for the dashboard
#[utoipa::path(
    get,
    path = "/api/stats",
    params(
        ("type" = Option<String>, Query, description = "general | by_type | by_result | by_ujier | by_zone | daily")
    ),
    responses(
        (status = 200, description = "Statistics of the requested kind", body = GeneralStats),
        (status = 400, description = "Invalid stats type")
    ),
    tag = "stats",
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Response> {
    let kind = match query.kind.as_deref() {
        Some(kind) => kind.parse::<StatsKind>().map_err(AppError::BadRequest)?,
        None => StatsKind::default(),
    };

    let stats = &state.stats_service;
    let response = match kind {
        StatsKind::General => ok(stats.general().await?).into_response(),
        StatsKind::ByType => ok(stats.by_type().await?).into_response(),
        StatsKind::ByResult => ok(stats.by_result().await?).into_response(),
        StatsKind::ByUjier => ok(stats.by_agent().await?).into_response(),
        StatsKind::ByZone => ok(stats.by_zone().await?).into_response(),
        StatsKind::Daily => ok(stats.daily().await?).into_response(),
    };

    Ok(response)
}
