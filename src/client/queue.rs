use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use super::config::RetryPolicy;
use super::gateway::{GatewayError, RemoteWriter};
use super::store::{get_json, set_json, KeyValueStore};
use crate::notification::notification_dto::{
    CreateNotificationRequest, RegisterResultRequest, UpdateNotificationRequest,
};

pub const QUEUE_KEY: &str = "sgnd_offline_queue";

/// A write captured while offline, with everything needed to replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum QueuedAction {
    CreateNotification(CreateNotificationRequest),
    UpdateNotification {
        id: Uuid,
        updates: UpdateNotificationRequest,
    },
    RegisterResult {
        id: Uuid,
        result: RegisterResultRequest,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateNotification,
    UpdateNotification,
    RegisterResult,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateNotification => "create_notification",
            ActionKind::UpdateNotification => "update_notification",
            ActionKind::RegisterResult => "register_result",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueuedAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            QueuedAction::CreateNotification(_) => ActionKind::CreateNotification,
            QueuedAction::UpdateNotification { .. } => ActionKind::UpdateNotification,
            QueuedAction::RegisterResult { .. } => ActionKind::RegisterResult,
        }
    }
}

/// Persisted queue entry. `failed` implies `retry_count >= max_retries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    #[serde(flatten)]
    pub action: QueuedAction,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub failed: bool,
}

/// Notifications for whatever is showing sync state to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Queued { id: String, action: ActionKind },
    Synced { count: usize },
    ItemFailed {
        id: String,
        action: ActionKind,
        error: String,
    },
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarantinedItem {
    pub id: String,
    pub action: ActionKind,
    pub error: String,
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    pub synced: Vec<String>,
    /// Failed this pass but still below the retry ceiling.
    pub retrying: Vec<String>,
    pub quarantined: Vec<QuarantinedItem>,
    /// Another drain was already running; nothing was attempted.
    pub skipped: bool,
}

impl DrainReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// FIFO of offline writes, replayed in submission order.
///
/// The in-memory list is the source of truth; it is written back to the
/// key-value store after every mutation. At most one drain runs at a time.
pub struct OfflineQueue {
    items: Mutex<Vec<QueueItem>>,
    drain_lock: Mutex<()>,
    store: Arc<dyn KeyValueStore>,
    writer: Arc<dyn RemoteWriter>,
    policy: RetryPolicy,
    events: broadcast::Sender<SyncEvent>,
}

impl OfflineQueue {
    /// Restores the persisted queue; an unreadable copy starts an empty queue.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        writer: Arc<dyn RemoteWriter>,
        policy: RetryPolicy,
        events: broadcast::Sender<SyncEvent>,
    ) -> Self {
        let mut items = match get_json::<Vec<QueueItem>>(store.as_ref(), QUEUE_KEY).await {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Error loading offline queue: {}", e);
                Vec::new()
            }
        };

        for item in items.iter_mut().filter(|item| item.failed) {
            item.retry_count = item.retry_count.max(policy.max_retries);
        }

        if !items.is_empty() {
            tracing::info!(count = items.len(), "Offline queue restored");
        }

        Self {
            items: Mutex::new(items),
            drain_lock: Mutex::new(()),
            store,
            writer,
            policy,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    async fn persist(&self, items: &[QueueItem]) {
        if let Err(e) = set_json(self.store.as_ref(), QUEUE_KEY, items).await {
            tracing::error!("Error saving offline queue: {}", e);
        }
    }

    pub async fn enqueue(&self, action: QueuedAction) -> String {
        let id = Uuid::new_v4().to_string();
        let kind = action.kind();

        let mut items = self.items.lock().await;
        items.push(QueueItem {
            id: id.clone(),
            action,
            enqueued_at: Utc::now(),
            retry_count: 0,
            failed: false,
        });
        self.persist(&items).await;
        drop(items);

        tracing::info!(item_id = %id, action = %kind, "Write queued for sync");
        self.emit(SyncEvent::Queued {
            id: id.clone(),
            action: kind,
        });
        id
    }

    async fn dispatch(&self, action: &QueuedAction) -> Result<(), GatewayError> {
        let attempt = async {
            match action {
                QueuedAction::CreateNotification(req) => {
                    self.writer.create_notification(req).await.map(|_| ())
                }
                QueuedAction::UpdateNotification { id, updates } => {
                    self.writer.update_notification(*id, updates).await.map(|_| ())
                }
                QueuedAction::RegisterResult { id, result } => {
                    self.writer.register_result(*id, result).await.map(|_| ())
                }
            }
        };

        match self.policy.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, attempt).await.map_err(|_| {
                GatewayError::Transport(format!("attempt timed out after {:?}", limit))
            })?,
            None => attempt.await,
        }
    }

    /// Replays every non-failed item present when the pass starts, oldest first.
    ///
    /// A failure never stops the pass. Items enqueued meanwhile wait for the
    /// next one.
    pub async fn drain(&self) -> DrainReport {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            tracing::debug!("Drain already in progress, skipping");
            return DrainReport::skipped();
        };

        let snapshot: Vec<(String, QueuedAction)> = self
            .items
            .lock()
            .await
            .iter()
            .filter(|item| !item.failed)
            .map(|item| (item.id.clone(), item.action.clone()))
            .collect();

        let mut report = DrainReport::default();

        for (id, action) in snapshot {
            let outcome = self.dispatch(&action).await;

            let mut items = self.items.lock().await;
            match outcome {
                Ok(()) => {
                    items.retain(|item| item.id != id);
                    tracing::debug!(item_id = %id, action = %action.kind(), "Queued write synced");
                    report.synced.push(id);
                }
                Err(err) => {
                    let Some(item) = items.iter_mut().find(|item| item.id == id) else {
                        continue;
                    };

                    item.retry_count += 1;
                    if self.policy.quarantine_rejections && err.is_client_rejection() {
                        item.retry_count = item.retry_count.max(self.policy.max_retries);
                    }

                    if item.retry_count >= self.policy.max_retries {
                        item.failed = true;
                        tracing::warn!(
                            item_id = %id,
                            action = %action.kind(),
                            retry_count = item.retry_count,
                            "Queued write failed permanently: {}",
                            err
                        );
                        self.emit(SyncEvent::ItemFailed {
                            id: id.clone(),
                            action: action.kind(),
                            error: err.to_string(),
                        });
                        report.quarantined.push(QuarantinedItem {
                            id,
                            action: action.kind(),
                            error: err.to_string(),
                        });
                    } else {
                        tracing::debug!(
                            item_id = %id,
                            retry_count = item.retry_count,
                            "Queued write failed, will retry: {}",
                            err
                        );
                        report.retrying.push(id);
                    }
                }
            }
            self.persist(&items).await;
        }

        if !report.synced.is_empty() {
            tracing::info!(count = report.synced.len(), "Offline queue synced");
            self.emit(SyncEvent::Synced {
                count: report.synced.len(),
            });
        }

        report
    }

    /// Gives every quarantined item a fresh set of attempts and drains.
    ///
    /// A pass already in flight took its snapshot before the reset, so it is
    /// awaited first. If yet another pass starts in between, that one picks up
    /// the reset items and this call reports `skipped`.
    pub async fn retry_failed(&self) -> DrainReport {
        let mut items = self.items.lock().await;
        for item in items.iter_mut().filter(|item| item.failed) {
            item.failed = false;
            item.retry_count = 0;
        }
        self.persist(&items).await;
        drop(items);

        drop(self.drain_lock.lock().await);
        self.drain().await
    }

    /// Drops quarantined items for good, returning how many were removed.
    pub async fn clear_failed(&self) -> usize {
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|item| !item.failed);
        let removed = before - items.len();
        self.persist(&items).await;

        if removed > 0 {
            tracing::info!(count = removed, "Failed queue items discarded");
        }
        removed
    }

    pub async fn pending_count(&self) -> usize {
        self.items
            .lock()
            .await
            .iter()
            .filter(|item| !item.failed)
            .count()
    }

    pub async fn failed_items(&self) -> Vec<QueueItem> {
        self.items
            .lock()
            .await
            .iter()
            .filter(|item| item.failed)
            .cloned()
            .collect()
    }

    pub async fn items(&self) -> Vec<QueueItem> {
        self.items.lock().await.clone()
    }
}
