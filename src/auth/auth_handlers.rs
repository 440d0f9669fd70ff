use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::auth_dto::{
    AuthAction, AuthQuery, ChangePasswordRequest, LoginRequest, MessageResponse, VerifyRequest,
};
use crate::{
    dto::{created, ok, ApiJson, ApiQuery},
    error::{AppError, Result},
    middleware::auth_user_from_headers,
    state::AppState,
    user::{user_dto::CreateUserRequest, user_models::Role, user_models::UserProfile},
};

fn parse_body<T: DeserializeOwned + Validate>(body: serde_json::Value) -> Result<T> {
    let payload: T =
        serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    payload.validate()?;
    Ok(payload)
}

/// Session actions: `login`, `verify`, `change-password`, `create-user`
#[utoipa::path(
    post,
    path = "/api/auth",
    params(
        ("action" = String, Query, description = "login | verify | change-password | create-user")
    ),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 201, description = "User created", body = UserProfile),
        (status = 400, description = "Invalid action or missing fields"),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn auth(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuthQuery>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<Response> {
    let action: AuthAction = query
        .action
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::BadRequest)?;

    match action {
        AuthAction::Login => {
            let payload: LoginRequest = parse_body(body)?;
            let session = state
                .auth_service
                .login(&payload.email, &payload.password)
                .await?;
            Ok(ok(session).into_response())
        }
        AuthAction::Verify => {
            let payload: VerifyRequest = parse_body(body)?;
            let profile = state.auth_service.verify(&payload.email).await?;
            Ok(ok(profile).into_response())
        }
        AuthAction::ChangePassword => {
            let caller = auth_user_from_headers(&headers, &state.config.jwt_secret)?;
            let payload: ChangePasswordRequest = parse_body(body)?;
            let target = payload.user_id.unwrap_or(caller.id);

            if target != caller.id && caller.rol != Role::Admin.as_str() {
                return Err(AppError::Forbidden(
                    "Only administrators can change other users' passwords".to_string(),
                ));
            }

            state
                .auth_service
                .change_password(target, &payload.new_password)
                .await?;
            Ok(ok(MessageResponse {
                message: "Password updated".to_string(),
            })
            .into_response())
        }
        AuthAction::CreateUser => {
            let caller = auth_user_from_headers(&headers, &state.config.jwt_secret)?;
            if caller.rol != Role::Admin.as_str() {
                return Err(AppError::Forbidden("Admin access required".to_string()));
            }

            let payload: CreateUserRequest = parse_body(body)?;
            let user = state.user_service.create_user(payload).await?;
            Ok(created(UserProfile::from(user)).into_response())
        }
    }
}
