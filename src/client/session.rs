use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::{get_json, set_json, KeyValueStore, StoreError};

pub const SESSION_KEY: &str = "sgnd_session";

/// Signed-in user as returned by the login endpoint, plus when it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    pub rol: String,
    #[serde(default)]
    pub foto: Option<String>,
    pub token: String,
    #[serde(default = "Utc::now")]
    pub stored_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        let Some(ttl) = ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok()) else {
            return false;
        };
        now - self.stored_at > ttl
    }
}

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    pub async fn save(&self, session: &Session) -> Result<(), StoreError> {
        set_json(self.store.as_ref(), SESSION_KEY, session).await
    }

    /// The stored session, unless missing, unreadable or expired. Stale entries are deleted.
    pub async fn load(&self) -> Option<Session> {
        let session = match get_json::<Session>(self.store.as_ref(), SESSION_KEY).await {
            Ok(session) => session?,
            Err(e) => {
                tracing::warn!("Discarding unreadable session: {}", e);
                self.discard().await;
                return None;
            }
        };

        if session.is_expired(self.ttl, Utc::now()) {
            tracing::info!(user_id = %session.id, "Stored session expired");
            self.discard().await;
            return None;
        }

        Some(session)
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(SESSION_KEY).await
    }

    async fn discard(&self) {
        if let Err(e) = self.clear().await {
            tracing::error!("Error removing stored session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::MemoryStore;

    fn session(stored_at: DateTime<Utc>) -> Session {
        Session {
            id: Uuid::new_v4(),
            email: "ujier@juzgado.gob.ar".to_string(),
            nombre: "Ana Ujier".to_string(),
            rol: "ujier".to_string(),
            foto: None,
            token: "token".to_string(),
            stored_at,
        }
    }

    #[tokio::test]
    async fn test_session_without_ttl_never_expires() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(store, None);

        let old = session(Utc::now() - chrono::Duration::days(400));
        sessions.save(&old).await.unwrap();

        assert_eq!(sessions.load().await, Some(old));
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped_and_deleted() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(store.clone(), Some(Duration::from_secs(3600)));

        sessions
            .save(&session(Utc::now() - chrono::Duration::hours(2)))
            .await
            .unwrap();

        assert_eq!(sessions.load().await, None);
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_session_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        store.set(SESSION_KEY, "{broken").await.unwrap();

        let sessions = SessionStore::new(store.clone(), None);
        assert_eq!(sessions.load().await, None);
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    }

    #[test]
    fn test_login_payload_gets_stored_at() {
        let parsed: Session = serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "email": "a@b.c",
            "nombre": "A",
            "rol": "admin",
            "foto": null,
            "token": "t"
        }))
        .unwrap();

        assert!(Utc::now() - parsed.stored_at < chrono::Duration::seconds(5));
    }
}
