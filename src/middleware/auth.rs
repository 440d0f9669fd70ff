use crate::{
    auth::{verify_jwt, Claims},
    error::AppError,
    state::AppState,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Caller identity taken from a verified session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub rol: String,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;
        Ok(Self {
            id,
            email: claims.email,
            rol: claims.rol,
        })
    }
}

/// Reads and verifies the `Authorization: Bearer` header.
pub fn auth_user_from_headers(headers: &HeaderMap, secret: &str) -> Result<AuthUser, AppError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))?;

    verify_jwt(token, secret)?.try_into()
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = auth_user_from_headers(req.headers(), &state.config.jwt_secret)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_session_token;

    #[test]
    fn test_bearer_header_accepted() {
        let id = Uuid::new_v4();
        let token = create_session_token(id, "u@x.y", "ujier", "s3cret", 1).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", format!("Bearer {token}").parse().unwrap());

        let user = auth_user_from_headers(&headers, "s3cret").unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.rol, "ujier");
    }

    #[test]
    fn test_missing_or_malformed_header_rejected() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            auth_user_from_headers(&headers, "s3cret"),
            Err(AppError::Unauthorized(_))
        ));

        headers.insert("Authorization", "Token abc".parse().unwrap());
        assert!(matches!(
            auth_user_from_headers(&headers, "s3cret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
