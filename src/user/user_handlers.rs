use axum::{extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    dto::{created, ok, ApiJson, ApiQuery, DeleteRequest, DeletedResponse},
    error::{AppError, Result},
    state::AppState,
    user::user_dto::{CreateUserRequest, UpdateUserRequest, UserQuery},
};

/// List active users, or look one up by id or email
#[utoipa::path(
    get,
    path = "/api/usuarios",
    params(
        ("id" = Option<uuid::Uuid>, Query, description = "Single user by id"),
        ("email" = Option<String>, Query, description = "Single user by email"),
        ("rol" = Option<String>, Query, description = "Active users with this role")
    ),
    responses(
        (status = 200, description = "User or list of users", body = [User]),
        (status = 404, description = "User not found")
    ),
    tag = "usuarios",
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<impl IntoResponse> {
    if let Some(id) = query.id {
        let user = state.user_service.get_user(id).await?;
        return Ok(ok(serde_json::to_value(user).map_err(|_| AppError::InternalError)?));
    }

    if let Some(email) = query.email {
        let user = state.user_service.get_user_by_email(&email).await?;
        return Ok(ok(serde_json::to_value(user).map_err(|_| AppError::InternalError)?));
    }

    let users = state.user_service.list_active(query.rol.as_deref()).await?;
    Ok(ok(serde_json::to_value(users).map_err(|_| AppError::InternalError)?))
}

/// Create a user (admin only)
#[utoipa::path(
    post,
    path = "/api/usuarios",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "usuarios",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let user = state.user_service.create_user(payload).await?;

    Ok(created(user))
}

/// Update a user's name, role, photo or active flag (admin only)
#[utoipa::path(
    put,
    path = "/api/usuarios",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Missing id or nothing to update"),
        (status = 404, description = "User not found")
    ),
    tag = "usuarios",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let id = payload
        .id
        .ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))?;

    let user = state.user_service.update_user(id, payload).await?;

    Ok(ok(user))
}

/// Deactivate a user (admin only); users are never hard-deleted
#[utoipa::path(
    delete,
    path = "/api/usuarios",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "User deactivated", body = DeletedResponse),
        (status = 400, description = "Missing id"),
        (status = 404, description = "User not found")
    ),
    tag = "usuarios",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<DeleteRequest>,
) -> Result<impl IntoResponse> {
    let id = payload
        .id
        .ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))?;

    state.user_service.deactivate_user(id).await?;

    Ok(ok(DeletedResponse { deleted: true }))
}
