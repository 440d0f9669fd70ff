use crate::db::DbPool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    auth::auth_service::AuthService,
    notification::{
        notification_models::Notification, notification_repository::NotificationRepository,
        notification_service::NotificationService,
    },
    stats::{stats_repository::StatsRepository, stats_service::StatsService},
    upload::upload_storage::UploadStorage,
    user::{user_repository::UserRepository, user_service::UserService},
    visit::{visit_repository::VisitRepository, visit_service::VisitService},
};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    /// Fan-out of `(agent id, notification)` pairs published on assignment.
    pub assignment_tx: broadcast::Sender<(Uuid, Notification)>,
    pub user_repository: UserRepository,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub notification_service: NotificationService,
    pub visit_service: VisitService,
    pub stats_service: StatsService,
    pub upload_storage: UploadStorage,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let config = Arc::new(config);
        let (assignment_tx, _) = broadcast::channel(100);

        let user_repository = UserRepository::new(db.clone());
        let notification_repository = NotificationRepository::new(db.clone());
        let visit_repository = VisitRepository::new(db.clone());
        let stats_repository = StatsRepository::new(db.clone());

        let auth_service = AuthService::new(
            user_repository.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        );
        let user_service = UserService::new(user_repository.clone());
        let notification_service = NotificationService::new(
            db.clone(),
            notification_repository,
            visit_repository.clone(),
        );
        let visit_service = VisitService::new(visit_repository);
        let stats_service = StatsService::new(stats_repository);
        let upload_storage = UploadStorage::new(config.upload_dir.clone(), config.max_upload_bytes);

        Self {
            db,
            config,
            assignment_tx,
            user_repository,
            auth_service,
            user_service,
            notification_service,
            visit_service,
            stats_service,
            upload_storage,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Prefix for public upload URLs; derived from the `Host` header when unset.
    pub public_base_url: Option<String>,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a number"))?,
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("JWT_EXPIRATION_HOURS must be a number"))?,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a number"))?,
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".to_string())
                .into(),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_BYTES must be a number"))?,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string()),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}
