use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::config::ClientConfig;
use super::gateway::{ApiClient, GatewayError, RemoteWriter};
use super::queue::{DrainReport, OfflineQueue, QueuedAction, SyncEvent};
use super::session::{Session, SessionStore};
use super::store::{FileStore, KeyValueStore, StoreError};
use crate::notification::{
    notification_dto::{CreateNotificationRequest, RegisterResultRequest, UpdateNotificationRequest},
    notification_models::Notification,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Device is offline")]
    Offline,
}

/// Where a write ended up.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Accepted by the server.
    Applied(Notification),
    /// Stored in the offline queue under this id.
    Queued(String),
}

/// Owns everything the device needs: API client, offline queue, session and
/// connectivity flag.
pub struct ClientContext {
    api: ApiClient,
    writer: Arc<dyn RemoteWriter>,
    queue: Arc<OfflineQueue>,
    sessions: SessionStore,
    session: RwLock<Option<Session>>,
    online: AtomicBool,
    events: broadcast::Sender<SyncEvent>,
}

impl ClientContext {
    /// File-backed context talking to the configured API. Starts online.
    pub async fn start(config: &ClientConfig) -> Self {
        let api = ApiClient::new(config.api_base_url.clone());
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.data_dir.clone()));
        Self::from_parts(api.clone(), Arc::new(api), store, config).await
    }

    /// Builds a context from explicit parts; `writer` receives every write.
    pub async fn from_parts(
        api: ApiClient,
        writer: Arc<dyn RemoteWriter>,
        store: Arc<dyn KeyValueStore>,
        config: &ClientConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let queue = OfflineQueue::load(
            store.clone(),
            writer.clone(),
            config.retry.clone(),
            events.clone(),
        )
        .await;

        Self {
            api,
            writer,
            queue: Arc::new(queue),
            sessions: SessionStore::new(store, config.session_ttl),
            session: RwLock::new(None),
            online: AtomicBool::new(true),
            events,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let session = self.api.login(email, password).await?;

        self.api.set_token(Some(session.token.clone())).await;
        self.sessions.save(&session).await?;
        *self.session.write().await = Some(session.clone());

        tracing::info!(user_id = %session.id, "Signed in");
        Ok(session)
    }

    /// Picks up a stored session from a previous run, if still valid.
    pub async fn restore_session(&self) -> Option<Session> {
        let session = self.sessions.load().await?;

        self.api.set_token(Some(session.token.clone())).await;
        *self.session.write().await = Some(session.clone());
        Some(session)
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.api.set_token(None).await;
        *self.session.write().await = None;
        self.sessions.clear().await?;

        tracing::info!("Signed out");
        Ok(())
    }

    /// Connectivity signal. Coming online drains the queue once when it has work.
    pub async fn set_online(&self, online: bool) -> Option<DrainReport> {
        self.online.store(online, Ordering::SeqCst);

        if !online {
            tracing::info!("Connection lost, writes will be queued");
            let _ = self.events.send(SyncEvent::Offline);
            return None;
        }

        let _ = self.events.send(SyncEvent::Online);
        if self.queue.pending_count().await == 0 {
            return None;
        }

        tracing::info!("Connection restored, syncing queued writes");
        Some(self.queue.drain().await)
    }

    /// Manual sync.
    pub async fn sync_now(&self) -> Result<DrainReport, ClientError> {
        if !self.is_online() {
            return Err(ClientError::Offline);
        }
        Ok(self.queue.drain().await)
    }

    async fn submit<F>(&self, action: QueuedAction, send: F) -> Result<Submission, ClientError>
    where
        F: std::future::Future<Output = Result<Notification, GatewayError>>,
    {
        if !self.is_online() {
            return Ok(Submission::Queued(self.queue.enqueue(action).await));
        }

        match send.await {
            Ok(notification) => Ok(Submission::Applied(notification)),
            Err(GatewayError::Transport(message)) => {
                tracing::warn!("Write failed in transit, queueing: {}", message);
                Ok(Submission::Queued(self.queue.enqueue(action).await))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes carry the signed-in user so a later replay is attributed to
    /// them, even if someone else holds the session by then.
    pub async fn create_notification(
        &self,
        mut req: CreateNotificationRequest,
    ) -> Result<Submission, ClientError> {
        if req.usuario_carga.is_none() {
            req.usuario_carga = self.current_session().await.map(|s| s.email);
        }

        let send = self.writer.create_notification(&req);
        self.submit(QueuedAction::CreateNotification(req.clone()), send)
            .await
    }

    pub async fn update_notification(
        &self,
        id: Uuid,
        mut updates: UpdateNotificationRequest,
    ) -> Result<Submission, ClientError> {
        if updates.updated_by.is_none() {
            updates.updated_by = self.current_session().await.map(|s| s.id);
        }

        let send = self.writer.update_notification(id, &updates);
        self.submit(
            QueuedAction::UpdateNotification {
                id,
                updates: updates.clone(),
            },
            send,
        )
        .await
    }

    pub async fn register_result(
        &self,
        id: Uuid,
        mut result: RegisterResultRequest,
    ) -> Result<Submission, ClientError> {
        if result.user_id.is_none() {
            result.user_id = self.current_session().await.map(|s| s.id);
        }

        let send = self.writer.register_result(id, &result);
        self.submit(
            QueuedAction::RegisterResult {
                id,
                result: result.clone(),
            },
            send,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::MemoryStore;
    use crate::client::testing::{sample_notification, FakeWriter};

    async fn context() -> (ClientContext, Arc<FakeWriter>) {
        let writer = Arc::new(FakeWriter::default());
        let config = ClientConfig::new("http://127.0.0.1:9/api", "unused");
        let ctx = ClientContext::from_parts(
            ApiClient::new(config.api_base_url.clone()),
            writer.clone(),
            Arc::new(MemoryStore::new()),
            &config,
        )
        .await;
        (ctx, writer)
    }

    #[tokio::test]
    async fn test_offline_create_is_queued_then_synced_when_online() {
        let (ctx, writer) = context().await;

        ctx.set_online(false).await;
        let submission = ctx.create_notification(sample_notification()).await.unwrap();

        assert!(matches!(submission, Submission::Queued(_)));
        assert_eq!(ctx.queue().pending_count().await, 1);
        assert!(writer.calls().is_empty());

        let report = ctx.set_online(true).await.expect("drain should run");

        assert_eq!(report.synced.len(), 1);
        assert_eq!(ctx.queue().pending_count().await, 0);
        assert_eq!(
            writer.calls(),
            vec![QueuedAction::CreateNotification(sample_notification())]
        );
    }

    #[tokio::test]
    async fn test_online_with_empty_queue_does_not_drain() {
        let (ctx, _writer) = context().await;
        ctx.set_online(false).await;
        assert!(ctx.set_online(true).await.is_none());
    }

    #[tokio::test]
    async fn test_online_write_is_applied_directly() {
        let (ctx, writer) = context().await;

        let submission = ctx.create_notification(sample_notification()).await.unwrap();

        match submission {
            Submission::Applied(notification) => {
                assert_eq!(notification.n_expediente, "EXP-100/2026")
            }
            other => panic!("unexpected submission {other:?}"),
        }
        assert_eq!(writer.calls().len(), 1);
        assert_eq!(ctx.queue().pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_queue() {
        let (ctx, writer) = context().await;
        writer.fail_next(GatewayError::Transport("connection reset".into()));

        let submission = ctx
            .register_result(
                Uuid::new_v4(),
                RegisterResultRequest {
                    resultado: "no_atiende".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(submission, Submission::Queued(_)));
        assert_eq!(ctx.queue().pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_rejection_is_returned_not_queued() {
        let (ctx, writer) = context().await;
        writer.fail_next(GatewayError::Rejected {
            status: 400,
            message: "No fields to update".into(),
        });

        let err = ctx
            .update_notification(Uuid::new_v4(), UpdateNotificationRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Gateway(GatewayError::Rejected { status: 400, .. })
        ));
        assert_eq!(ctx.queue().pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_connectivity_events_are_published() {
        let (ctx, _writer) = context().await;
        let mut rx = ctx.subscribe();

        ctx.set_online(false).await;
        ctx.set_online(true).await;

        assert_eq!(rx.recv().await.unwrap(), SyncEvent::Offline);
        assert_eq!(rx.recv().await.unwrap(), SyncEvent::Online);
    }

    #[tokio::test]
    async fn test_manual_sync_requires_connectivity() {
        let (ctx, _writer) = context().await;
        ctx.set_online(false).await;

        assert!(matches!(ctx.sync_now().await, Err(ClientError::Offline)));
    }

    fn session(email: &str) -> Session {
        Session {
            id: Uuid::new_v4(),
            email: email.to_string(),
            nombre: "Ujier".to_string(),
            rol: "ujier".to_string(),
            foto: None,
            token: format!("jwt-{email}"),
            stored_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_queued_writes_keep_the_author() {
        let store = Arc::new(MemoryStore::new());
        let config = ClientConfig::new("http://127.0.0.1:9/api", "unused");
        let writer = Arc::new(FakeWriter::default());
        let ctx = ClientContext::from_parts(
            ApiClient::new(config.api_base_url.clone()),
            writer.clone(),
            store.clone(),
            &config,
        )
        .await;

        let first = session("ana@juzgado.gob.ar");
        SessionStore::new(store.clone(), None).save(&first).await.unwrap();
        ctx.restore_session().await.unwrap();
        ctx.set_online(false).await;

        let notice = Uuid::new_v4();
        ctx.register_result(
            notice,
            RegisterResultRequest {
                resultado: "atiende".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        ctx.create_notification(sample_notification()).await.unwrap();

        // Another agent takes over the device before the queue drains.
        let second = session("beto@juzgado.gob.ar");
        SessionStore::new(store.clone(), None).save(&second).await.unwrap();
        ctx.restore_session().await.unwrap();
        ctx.set_online(true).await.expect("drain should run");

        let calls = writer.calls();
        match &calls[0] {
            QueuedAction::RegisterResult { id, result } => {
                assert_eq!(*id, notice);
                assert_eq!(result.user_id, Some(first.id));
            }
            other => panic!("unexpected action {other:?}"),
        }
        match &calls[1] {
            QueuedAction::CreateNotification(req) => {
                assert_eq!(req.usuario_carga.as_deref(), Some("ana@juzgado.gob.ar"))
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_explicit_author_is_not_overwritten() {
        let (ctx, writer) = context().await;
        let req = CreateNotificationRequest {
            usuario_carga: Some("mesa@juzgado.gob.ar".to_string()),
            ..sample_notification()
        };

        ctx.create_notification(req.clone()).await.unwrap();

        assert_eq!(writer.calls(), vec![QueuedAction::CreateNotification(req)]);
    }

    #[tokio::test]
    async fn test_sign_out_clears_stored_session() {
        let store = Arc::new(MemoryStore::new());
        let config = ClientConfig::new("http://127.0.0.1:9/api", "unused");
        let ctx = ClientContext::from_parts(
            ApiClient::new(config.api_base_url.clone()),
            Arc::new(FakeWriter::default()),
            store.clone(),
            &config,
        )
        .await;

        let session = Session {
            id: Uuid::new_v4(),
            email: "admin@juzgado.gob.ar".to_string(),
            nombre: "Admin".to_string(),
            rol: "admin".to_string(),
            foto: None,
            token: "jwt".to_string(),
            stored_at: chrono::Utc::now(),
        };
        SessionStore::new(store.clone(), None).save(&session).await.unwrap();

        assert_eq!(ctx.restore_session().await, Some(session));
        assert!(ctx.api().has_token().await);

        ctx.sign_out().await.unwrap();

        assert!(ctx.current_session().await.is_none());
        assert!(!ctx.api().has_token().await);
        assert!(ctx.restore_session().await.is_none());
    }
}
