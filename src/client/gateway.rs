use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::session::Session;
use crate::{
    auth::auth_dto::MessageResponse,
    dto::{DeletedResponse, PaginatedResponse},
    notification::{
        notification_dto::{
            CreateNotificationRequest, NotificationFilters, RegisterResultRequest,
            UpdateNotificationRequest,
        },
        notification_models::{Notification, NotificationWithAgent},
    },
    stats::stats_models::{
        AgentPerformance, DailyStats, GeneralStats, ResultCount, TypeCount, ZoneStats,
    },
    upload::upload_storage::UploadResponse,
    user::{
        user_dto::{CreateUserRequest, UpdateUserRequest},
        user_models::{User, UserProfile},
    },
    visit::visit_models::VisitDetail,
};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response: connection refused, DNS failure, timeout.
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with `success: false`.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    /// The request could not be built locally.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Rejected { status, .. } => *status >= 500,
            GatewayError::Decode(_) | GatewayError::InvalidRequest(_) => false,
        }
    }

    /// A 4xx answer: resending the same payload will not change the outcome.
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, GatewayError::Rejected { status, .. } if (400..500).contains(status))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// The write operations the offline queue replays.
#[async_trait]
pub trait RemoteWriter: Send + Sync {
    async fn create_notification(
        &self,
        req: &CreateNotificationRequest,
    ) -> Result<Notification, GatewayError>;

    async fn update_notification(
        &self,
        id: Uuid,
        updates: &UpdateNotificationRequest,
    ) -> Result<Notification, GatewayError>;

    async fn register_result(
        &self,
        id: Uuid,
        result: &RegisterResultRequest,
    ) -> Result<Notification, GatewayError>;
}

/// REST client for the dispatch API. Clones share the session token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

fn merge_fields<T: Serialize>(mut base: Value, extra: &T) -> Result<Value, GatewayError> {
    let extra =
        serde_json::to_value(extra).map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        for (key, value) in extra {
            base.entry(key).or_insert(value);
        }
    }
    Ok(base)
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn endpoint(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}/{}", self.base_url, path))
    }

    /// Sends the request and unwraps the `{success, data, error}` envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let builder = match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(GatewayError::Rejected {
                    status: status.as_u16(),
                    message: format!("HTTP {}", status),
                })
            }
            Err(e) => return Err(GatewayError::Decode(e.to_string())),
        };

        if !envelope.success {
            let message = envelope
                .error
                .unwrap_or_else(|| "API request failed".to_string());
            tracing::debug!(status = status.as_u16(), "API rejected request: {}", message);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_value(envelope.data.unwrap_or(Value::Null))
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    // Session

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        self.send(
            self.endpoint(Method::POST, "auth")
                .query(&[("action", "login")])
                .json(&json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn verify(&self, email: &str) -> Result<UserProfile, GatewayError> {
        self.send(
            self.endpoint(Method::POST, "auth")
                .query(&[("action", "verify")])
                .json(&json!({ "email": email })),
        )
        .await
    }

    pub async fn change_password(
        &self,
        user_id: Option<Uuid>,
        new_password: &str,
    ) -> Result<MessageResponse, GatewayError> {
        self.send(
            self.endpoint(Method::POST, "auth")
                .query(&[("action", "change-password")])
                .json(&json!({ "user_id": user_id, "new_password": new_password })),
        )
        .await
    }

    // Users

    pub async fn list_users(&self) -> Result<Vec<User>, GatewayError> {
        self.send(self.endpoint(Method::GET, "usuarios")).await
    }

    pub async fn users_by_role(&self, rol: &str) -> Result<Vec<User>, GatewayError> {
        self.send(self.endpoint(Method::GET, "usuarios").query(&[("rol", rol)]))
            .await
    }

    pub async fn user_by_email(&self, email: &str) -> Result<User, GatewayError> {
        self.send(self.endpoint(Method::GET, "usuarios").query(&[("email", email)]))
            .await
    }

    pub async fn create_user(&self, req: &CreateUserRequest) -> Result<User, GatewayError> {
        self.send(self.endpoint(Method::POST, "usuarios").json(req))
            .await
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        updates: &UpdateUserRequest,
    ) -> Result<User, GatewayError> {
        let body = merge_fields(json!({ "id": id }), updates)?;
        self.send(self.endpoint(Method::PUT, "usuarios").json(&body))
            .await
    }

    pub async fn deactivate_user(&self, id: Uuid) -> Result<DeletedResponse, GatewayError> {
        self.send(self.endpoint(Method::DELETE, "usuarios").json(&json!({ "id": id })))
            .await
    }

    // Notifications

    pub async fn list_notifications(
        &self,
        filters: &NotificationFilters,
    ) -> Result<PaginatedResponse<NotificationWithAgent>, GatewayError> {
        self.send(self.endpoint(Method::GET, "notificaciones").query(filters))
            .await
    }

    pub async fn get_notification(&self, id: Uuid) -> Result<NotificationWithAgent, GatewayError> {
        self.send(self.endpoint(Method::GET, "notificaciones").query(&[("id", id)]))
            .await
    }

    /// Notices assigned to an agent; `estado` defaults to `pendiente` server-side.
    pub async fn my_assignments(
        &self,
        agent_id: Uuid,
        estado: Option<&str>,
    ) -> Result<Vec<Notification>, GatewayError> {
        let mut query = vec![("asignado_a", agent_id.to_string())];
        if let Some(estado) = estado {
            query.push(("estado", estado.to_string()));
        }
        self.send(self.endpoint(Method::GET, "notificaciones").query(&query))
            .await
    }

    pub async fn create_notification(
        &self,
        req: &CreateNotificationRequest,
    ) -> Result<Notification, GatewayError> {
        self.send(self.endpoint(Method::POST, "notificaciones").json(req))
            .await
    }

    pub async fn update_notification(
        &self,
        id: Uuid,
        updates: &UpdateNotificationRequest,
    ) -> Result<Notification, GatewayError> {
        let body = merge_fields(json!({ "id": id }), updates)?;
        self.send(self.endpoint(Method::PUT, "notificaciones").json(&body))
            .await
    }

    pub async fn assign_notification(
        &self,
        id: Uuid,
        asignado_a: Uuid,
        asignado_por: Option<Uuid>,
    ) -> Result<Notification, GatewayError> {
        let body = json!({
            "id": id,
            "action": "assign",
            "asignado_a": asignado_a,
            "asignado_por": asignado_por,
        });
        self.send(self.endpoint(Method::PUT, "notificaciones").json(&body))
            .await
    }

    pub async fn register_result(
        &self,
        id: Uuid,
        result: &RegisterResultRequest,
    ) -> Result<Notification, GatewayError> {
        let body = merge_fields(json!({ "id": id, "action": "result" }), result)?;
        self.send(self.endpoint(Method::PUT, "notificaciones").json(&body))
            .await
    }

    pub async fn delete_notification(&self, id: Uuid) -> Result<DeletedResponse, GatewayError> {
        self.send(self.endpoint(Method::DELETE, "notificaciones").json(&json!({ "id": id })))
            .await
    }

    // Visits

    pub async fn notification_visits(
        &self,
        notificacion_id: Uuid,
    ) -> Result<Vec<VisitDetail>, GatewayError> {
        self.send(
            self.endpoint(Method::GET, "visitas")
                .query(&[("notificacion_id", notificacion_id)]),
        )
        .await
    }

    pub async fn agent_visits(&self, ujier_id: Uuid) -> Result<Vec<VisitDetail>, GatewayError> {
        self.send(self.endpoint(Method::GET, "visitas").query(&[("ujier_id", ujier_id)]))
            .await
    }

    // Stats

    async fn stats<T: DeserializeOwned>(&self, kind: &str) -> Result<T, GatewayError> {
        self.send(self.endpoint(Method::GET, "stats").query(&[("type", kind)]))
            .await
    }

    pub async fn general_stats(&self) -> Result<GeneralStats, GatewayError> {
        self.stats("general").await
    }

    pub async fn stats_by_type(&self) -> Result<Vec<TypeCount>, GatewayError> {
        self.stats("by_type").await
    }

    pub async fn stats_by_result(&self) -> Result<Vec<ResultCount>, GatewayError> {
        self.stats("by_result").await
    }

    pub async fn agent_performance(&self) -> Result<Vec<AgentPerformance>, GatewayError> {
        self.stats("by_ujier").await
    }

    pub async fn stats_by_zone(&self) -> Result<Vec<ZoneStats>, GatewayError> {
        self.stats("by_zone").await
    }

    pub async fn daily_stats(&self) -> Result<Vec<DailyStats>, GatewayError> {
        self.stats("daily").await
    }

    // Uploads

    /// Uploads evidence; `kind` is `photo` or `audio`.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
        notification_id: Uuid,
        kind: &str,
    ) -> Result<UploadResponse, GatewayError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("notification_id", notification_id.to_string())
            .text("type", kind.to_string());

        self.send(self.endpoint(Method::POST, "upload").multipart(form))
            .await
    }
}

#[async_trait]
impl RemoteWriter for ApiClient {
    async fn create_notification(
        &self,
        req: &CreateNotificationRequest,
    ) -> Result<Notification, GatewayError> {
        ApiClient::create_notification(self, req).await
    }

    async fn update_notification(
        &self,
        id: Uuid,
        updates: &UpdateNotificationRequest,
    ) -> Result<Notification, GatewayError> {
        ApiClient::update_notification(self, id, updates).await
    }

    async fn register_result(
        &self,
        id: Uuid,
        result: &RegisterResultRequest,
    ) -> Result<Notification, GatewayError> {
        ApiClient::register_result(self, id, result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(GatewayError::Transport("refused".into()).is_retryable());
        assert!(GatewayError::Rejected { status: 503, message: "down".into() }.is_retryable());
        assert!(!GatewayError::Rejected { status: 400, message: "bad".into() }.is_retryable());
        assert!(!GatewayError::Decode("eof".into()).is_retryable());

        assert!(GatewayError::Rejected { status: 404, message: "gone".into() }.is_client_rejection());
        assert!(!GatewayError::Transport("refused".into()).is_client_rejection());
    }

    #[test]
    fn test_merge_fields_keeps_routing_keys() {
        let result = RegisterResultRequest {
            resultado: "atiende".to_string(),
            es_carga_diferida: true,
            ..Default::default()
        };
        let id = Uuid::new_v4();

        let body = merge_fields(json!({ "id": id, "action": "result" }), &result).unwrap();

        assert_eq!(body["id"], json!(id));
        assert_eq!(body["action"], "result");
        assert_eq!(body["resultado"], "atiende");
        assert_eq!(body["es_carga_diferida"], true);
    }
}
