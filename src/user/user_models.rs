use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Administrativo,
    Ujier,
    Auditor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Administrativo => "administrativo",
            Role::Ujier => "ujier",
            Role::Auditor => "auditor",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Administrativo => "Administrativo",
            Role::Ujier => "Ujier",
            Role::Auditor => "Auditor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "administrativo" => Ok(Role::Administrativo),
            "ujier" => Ok(Role::Ujier),
            "auditor" => Ok(Role::Auditor),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    pub rol: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub foto: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public subset returned by the session lookup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    pub rol: String,
    pub foto: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            nombre: user.nombre,
            rol: user.rol,
            foto: user.foto,
        }
    }
}
