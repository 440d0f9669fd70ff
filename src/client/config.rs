use std::path::PathBuf;
use std::time::Duration;

/// Replay rules of the offline queue.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Failed attempts after which an item is quarantined.
    pub max_retries: u32,
    /// Upper bound for one replay attempt; `None` waits for the server indefinitely.
    pub attempt_timeout: Option<Duration>,
    /// Quarantine an item on its first 4xx rejection instead of retrying it.
    pub quarantine_rejections: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            attempt_timeout: None,
            quarantine_rejections: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Directory holding the persisted queue and session.
    pub data_dir: PathBuf,
    pub retry: RetryPolicy,
    /// Stored sessions older than this are discarded; `None` keeps them forever.
    pub session_ttl: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            data_dir: data_dir.into(),
            retry: RetryPolicy::default(),
            session_ttl: None,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = RetryPolicy::default();

        Ok(Self {
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3000/api".to_string()),
            data_dir: std::env::var("CLIENT_DATA_DIR")
                .unwrap_or_else(|_| "./client-data".to_string())
                .into(),
            retry: RetryPolicy {
                max_retries: std::env::var("SYNC_MAX_RETRIES")
                    .unwrap_or_else(|_| defaults.max_retries.to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("SYNC_MAX_RETRIES must be a number"))?,
                attempt_timeout: std::env::var("SYNC_ATTEMPT_TIMEOUT_SECS")
                    .ok()
                    .map(|secs| secs.parse().map(Duration::from_secs))
                    .transpose()
                    .map_err(|_| anyhow::anyhow!("SYNC_ATTEMPT_TIMEOUT_SECS must be a number"))?,
                quarantine_rejections: std::env::var("SYNC_QUARANTINE_REJECTIONS")
                    .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                    .unwrap_or(defaults.quarantine_rejections),
            },
            session_ttl: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .map(|hours| session_ttl_from_hours(&hours))
                .transpose()?,
        })
    }
}

fn session_ttl_from_hours(hours: &str) -> anyhow::Result<Duration> {
    hours
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|h| h.checked_mul(3600))
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow::anyhow!("SESSION_TTL_HOURS must be a number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_baseline() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert!(policy.attempt_timeout.is_none());
        assert!(!policy.quarantine_rejections);
    }

    #[test]
    fn test_session_ttl_hours() {
        assert_eq!(
            session_ttl_from_hours("24").unwrap(),
            Duration::from_secs(24 * 3600)
        );
        assert!(session_ttl_from_hours("soon").is_err());
        assert!(session_ttl_from_hours(&u64::MAX.to_string()).is_err());
    }
}
