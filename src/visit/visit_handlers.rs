use axum::{extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    dto::{created, ok, ApiJson, ApiQuery},
    error::Result,
    middleware::AuthUser,
    state::AppState,
    visit::visit_dto::{CreateVisitRequest, VisitQuery},
};

/// Visit history of a notice, of an agent, or the latest visits overall
#[utoipa::path(
    get,
    path = "/api/visitas",
    params(
        ("notificacion_id" = Option<uuid::Uuid>, Query, description = "Visits of one notice"),
        ("ujier_id" = Option<uuid::Uuid>, Query, description = "Latest 100 visits of one agent")
    ),
    responses(
        (status = 200, description = "Visits, newest first", body = [VisitDetail]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "visitas",
    security(("bearer_auth" = []))
)]
pub async fn get_visits(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VisitQuery>,
) -> Result<impl IntoResponse> {
    let visits = if let Some(notificacion_id) = query.notificacion_id {
        state.visit_service.for_notification(notificacion_id).await?
    } else if let Some(ujier_id) = query.ujier_id {
        state.visit_service.for_agent(ujier_id).await?
    } else {
        state.visit_service.recent().await?
    };

    Ok(ok(visits))
}

/// Append a visit to a notice's history
#[utoipa::path(
    post,
    path = "/api/visitas",
    request_body = CreateVisitRequest,
    responses(
        (status = 201, description = "Visit recorded", body = Visit),
        (status = 400, description = "Notification ID is required")
    ),
    tag = "visitas",
    security(("bearer_auth" = []))
)]
pub async fn create_visit(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(mut payload): ApiJson<CreateVisitRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    payload.ujier_id = payload.ujier_id.or(Some(user.id));

    let visit = state.visit_service.record_visit(payload).await?;

    Ok(created(visit))
}
