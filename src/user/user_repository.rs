use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;
use super::user_models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        email: &str,
        nombre: &str,
        rol: &str,
        password_hash: Option<&str>,
        foto: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO usuarios (email, nombre, rol, password_hash, foto)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *"
        )
        .bind(email)
        .bind(nombre)
        .bind(rol)
        .bind(password_hash)
        .bind(foto)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM usuarios WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM usuarios WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM usuarios WHERE email = $1 AND activo = TRUE"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_active(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM usuarios WHERE activo = TRUE ORDER BY nombre"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn find_active_by_role(&self, rol: &str) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM usuarios WHERE rol = $1 AND activo = TRUE ORDER BY nombre"
        )
        .bind(rol)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        nombre: Option<String>,
        rol: Option<String>,
        foto: Option<String>,
        activo: Option<bool>,
    ) -> Result<Option<User>> {
        let mut query = String::from("UPDATE usuarios SET updated_at = NOW()");
        let mut param_count = 1;

        if nombre.is_some() {
            param_count += 1;
            query.push_str(&format!(", nombre = ${}", param_count));
        }
        if rol.is_some() {
            param_count += 1;
            query.push_str(&format!(", rol = ${}", param_count));
        }
        if foto.is_some() {
            param_count += 1;
            query.push_str(&format!(", foto = ${}", param_count));
        }
        if activo.is_some() {
            param_count += 1;
            query.push_str(&format!(", activo = ${}", param_count));
        }

        query.push_str(" WHERE id = $1 RETURNING *");

        let mut q = sqlx::query_as::<_, User>(&query).bind(user_id);
        if let Some(nombre) = nombre {
            q = q.bind(nombre);
        }
        if let Some(rol) = rol {
            q = q.bind(rol);
        }
        if let Some(foto) = foto {
            q = q.bind(foto);
        }
        if let Some(activo) = activo {
            q = q.bind(activo);
        }

        let user = q.fetch_optional(&self.pool).await?;

        Ok(user)
    }

    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE usuarios SET password_hash = $1, updated_at = NOW() WHERE id = $2"
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn deactivate(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE usuarios SET activo = FALSE, updated_at = NOW() WHERE id = $1"
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
