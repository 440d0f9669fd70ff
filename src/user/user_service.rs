use crate::{
    auth::hash_password,
    error::{AppError, Result},
    sanitize::sanitize_bounded,
    user::{
        user_dto::{CreateUserRequest, UpdateUserRequest},
        user_models::{Role, User},
        user_repository::UserRepository,
    },
};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
}

impl UserService {
    pub fn new(user_repository: UserRepository) -> Self {
        Self { user_repository }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.user_repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list_active(&self, rol: Option<&str>) -> Result<Vec<User>> {
        match rol {
            Some(rol) => self.user_repository.find_active_by_role(rol).await,
            None => self.user_repository.find_active().await,
        }
    }

    pub async fn create_user(&self, payload: CreateUserRequest) -> Result<User> {
        let rol: Role = payload.rol.parse().map_err(AppError::Validation)?;
        let email = sanitize_bounded("email", &payload.email, 255)?;
        let nombre = sanitize_bounded("nombre", &payload.nombre, 255)?;

        if self.user_repository.find_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest("Email already exists".to_string()));
        }

        let password_hash = payload.password.as_deref().map(hash_password).transpose()?;

        let user = self
            .user_repository
            .create(
                &email,
                &nombre,
                rol.as_str(),
                password_hash.as_deref(),
                payload.foto.as_deref(),
            )
            .await?;

        tracing::info!(user_id = %user.id, rol = %rol, "User created");
        Ok(user)
    }

    pub async fn update_user(&self, user_id: Uuid, payload: UpdateUserRequest) -> Result<User> {
        if payload.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let rol = payload
            .rol
            .as_deref()
            .map(|r| r.parse::<Role>().map_err(AppError::Validation))
            .transpose()?;

        self.user_repository
            .update(
                user_id,
                payload
                    .nombre
                    .as_deref()
                    .map(|n| sanitize_bounded("nombre", n, 255))
                    .transpose()?,
                rol.map(|r| r.as_str().to_string()),
                payload.foto,
                payload.activo,
            )
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn deactivate_user(&self, user_id: Uuid) -> Result<()> {
        if self.user_repository.deactivate(user_id).await? == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id = %user_id, "User deactivated");
        Ok(())
    }
}
