use crate::auth::auth_dto::SessionResponse;
use crate::auth::{create_session_token, hash_password, verify_password};
use crate::error::{AppError, Result};
use crate::sanitize::sanitize;
use crate::user::user_models::UserProfile;
use crate::user::user_repository::UserRepository;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    jwt_expiration_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, jwt_expiration_hours: i64) -> Self {
        Self {
            user_repo,
            jwt_secret,
            jwt_expiration_hours,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionResponse> {
        let invalid = || AppError::Authentication("Credenciales inválidas".into());

        let user = self
            .user_repo
            .find_active_by_email(&sanitize(email))
            .await?
            .ok_or_else(invalid)?;

        // Accounts created without a password cannot log in until one is set.
        let password_hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        if !verify_password(password, password_hash)? {
            return Err(invalid());
        }

        let token = create_session_token(
            user.id,
            &user.email,
            &user.rol,
            &self.jwt_secret,
            self.jwt_expiration_hours,
        )?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(SessionResponse {
            id: user.id,
            email: user.email,
            nombre: user.nombre,
            rol: user.rol,
            foto: user.foto,
            token,
        })
    }

    pub async fn verify(&self, email: &str) -> Result<UserProfile> {
        self.user_repo
            .find_active_by_email(&sanitize(email))
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn change_password(&self, user_id: Uuid, new_password: &str) -> Result<()> {
        let password_hash = hash_password(new_password)?;

        if self.user_repo.update_password(user_id, &password_hash).await? == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }

        tracing::info!(user_id = %user_id, "Password updated");
        Ok(())
    }
}
