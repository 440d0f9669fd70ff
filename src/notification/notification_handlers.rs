use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use validator::Validate;

use crate::{
    dto::{created, ok, ApiJson, ApiQuery, DeleteRequest, DeletedResponse},
    error::{AppError, Result},
    middleware::AuthUser,
    notification::notification_dto::{
        CreateNotificationRequest, NotificationFilters, NotificationUpdate,
    },
    state::AppState,
};

/// List notices (paginated), fetch one by id, or an agent's work list
#[utoipa::path(
    get,
    path = "/api/notificaciones",
    params(
        ("id" = Option<uuid::Uuid>, Query, description = "Single notice"),
        ("asignado_a" = Option<uuid::Uuid>, Query, description = "Agent work list, oldest first"),
        ("estado" = Option<String>, Query, description = "pendiente | diligenciada | diferida"),
        ("tipo" = Option<String>, Query, description = "Notice type"),
        ("fecha" = Option<String>, Query, description = "Load date, YYYY-MM-DD"),
        ("search" = Option<String>, Query, description = "File number, caption or addressee"),
        ("page" = Option<u32>, Query, description = "Page number, from 1"),
        ("limit" = Option<u32>, Query, description = "Page size, 1 to 100")
    ),
    responses(
        (status = 200, description = "Notice, work list or page of notices", body = [NotificationWithAgent]),
        (status = 404, description = "Notification not found")
    ),
    tag = "notificaciones",
    security(("bearer_auth" = []))
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<NotificationFilters>,
) -> Result<Response> {
    if let Some(id) = filters.id {
        let notification = state.notification_service.get(id).await?;
        return Ok(ok(notification).into_response());
    }

    if let Some(agent_id) = filters.asignado_a {
        let notifications = state
            .notification_service
            .assigned_to(agent_id, filters.estado.as_deref())
            .await?;
        return Ok(ok(notifications).into_response());
    }

    let page = state.notification_service.list(filters).await?;
    Ok(ok(page).into_response())
}

/// Load a new notice
#[utoipa::path(
    post,
    path = "/api/notificaciones",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notice created", body = Notification),
        (status = 400, description = "Missing or invalid fields")
    ),
    tag = "notificaciones",
    security(("bearer_auth" = []))
)]
pub async fn create_notification(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateNotificationRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let notification = state
        .notification_service
        .create(payload, &user.email)
        .await?;

    Ok(created(notification))
}

/// Assign, register a visit result, or edit a notice
///
/// `action = "assign"` and `action = "result"` select the first two; without
/// an action the body is an allow-listed field update.
#[utoipa::path(
    put,
    path = "/api/notificaciones",
    request_body = UpdateNotificationRequest,
    responses(
        (status = 200, description = "Notice updated", body = Notification),
        (status = 400, description = "Missing id, invalid action or nothing to update"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notificaciones",
    security(("bearer_auth" = []))
)]
pub async fn update_notification(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<impl IntoResponse> {
    let (id, update) = NotificationUpdate::from_body(body)?;

    let notification = match update {
        NotificationUpdate::Assign(payload) => {
            let notification = state
                .notification_service
                .assign(id, payload, user.id)
                .await?;

            if let Some(agent_id) = notification.asignado_a {
                // No subscribers is not an error
                let _ = state.assignment_tx.send((agent_id, notification.clone()));
            }
            notification
        }
        NotificationUpdate::Result(payload) => {
            payload.validate()?;
            state
                .notification_service
                .register_result(id, payload, user.id)
                .await?
        }
        NotificationUpdate::Fields(payload) => {
            payload.validate()?;
            state
                .notification_service
                .update(id, payload, user.id)
                .await?
        }
    };

    Ok(ok(notification))
}

/// Delete a notice and its visit history
#[utoipa::path(
    delete,
    path = "/api/notificaciones",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Notice deleted", body = DeletedResponse),
        (status = 400, description = "Missing id"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notificaciones",
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<DeleteRequest>,
) -> Result<impl IntoResponse> {
    let id = payload
        .id
        .ok_or_else(|| AppError::BadRequest("Notification ID is required".to_string()))?;

    state.notification_service.delete(id).await?;

    Ok(ok(DeletedResponse { deleted: true }))
}

/// Live feed of notices assigned to the caller (SSE)
#[utoipa::path(
    get,
    path = "/api/notificaciones/stream",
    responses(
        (status = 200, description = "Assignment stream established"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notificaciones",
    security(("bearer_auth" = []))
)]
pub async fn assignment_stream(
    State(state): State<AppState>,
    user: AuthUser,
) -> Sse<impl Stream<Item = std::result::Result<Event, std::convert::Infallible>>> {
    let rx = state.assignment_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok((agent_id, notification)) if agent_id == user.id => {
            let json = serde_json::to_string(&notification).ok()?;
            Some(Ok(Event::default().event("assignment").data(json)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
