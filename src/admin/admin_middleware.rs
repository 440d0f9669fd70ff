use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use crate::{
    error::{AppError, Result},
    middleware::auth::AuthUser,
    state::AppState,
    user::user_models::Role,
};

/// Lets the request through only when the caller is an active administrator.
///
/// The role is re-read from the database so a revoked or deactivated account loses
/// access before its token expires.
pub async fn admin_authorization(
    State(state): State<AppState>,
    auth: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await?
        .filter(|user| user.activo)
        .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))?;

    if user.rol != Role::Admin.as_str() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
