use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Fixed key the SMTP diagnostics live under.
pub const ERROR_LOG_KEY: &str = "smtp_errors";

/// How long a batch of diagnostics stays visible.
pub const ERROR_LOG_TTL: Duration = Duration::from_secs(60);

struct Transient {
    value: Vec<String>,
    expires_at: Instant,
}

/// In-memory key/value store where every entry carries its own expiry.
/// Expired entries read as absent and are evicted on access.
pub struct TransientStore {
    entries: Mutex<HashMap<String, Transient>>,
}

impl TransientStore {
    pub fn new() -> Self {
        TransientStore {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match map.get(key) {
            Some(t) => Instant::now() >= t.expires_at,
            None => return None,
        };
        if expired {
            map.remove(key);
            return None;
        }
        map.get(key).map(|t| t.value.clone())
    }

    pub fn set(&self, key: &str, value: Vec<String>, ttl: Duration) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(
            key.to_string(),
            Transient {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn delete(&self, key: &str) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(key);
    }
}

/// Short-lived queue of SMTP diagnostics, shown once on the next admin page render.
///
/// `append` is a plain read-then-write against the store; two simultaneous
/// failures can race and drop one message.
pub struct ErrorLog {
    store: TransientStore,
    ttl: Duration,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::with_ttl(ERROR_LOG_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        ErrorLog {
            store: TransientStore::new(),
            ttl,
        }
    }

    pub fn append(&self, message: &str) {
        let mut errors = self.store.get(ERROR_LOG_KEY).unwrap_or_default();
        errors.push(message.to_string());
        self.store.set(ERROR_LOG_KEY, errors, self.ttl);
    }

    /// Take every pending message in insertion order and clear the queue.
    pub fn drain_all(&self) -> Vec<String> {
        let errors = self.store.get(ERROR_LOG_KEY).unwrap_or_default();
        self.store.delete(ERROR_LOG_KEY);
        errors
    }

    /// Pending messages without consuming them.
    pub fn peek(&self) -> Vec<String> {
        self.store.get(ERROR_LOG_KEY).unwrap_or_default()
    }
}
