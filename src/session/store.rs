//! Durable session storage. Mirrors the three string-keyed entries the web
//! shell keeps (token, serialized user record, login time) so a restart
//! restores the session before any network round-trip.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::warn;

pub const KEY_TOKEN: &str = "token";
pub const KEY_IDENTITY: &str = "user";
pub const KEY_LOGIN_TIME: &str = "login_time";

/// String-keyed durable store. Writes are last-writer-wins; all mutation
/// happens under the session manager's lock so read-modify-write races are
/// not a concern.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and embedders that manage persistence themselves.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

/// File-backed store: one flat JSON object, rewritten through a sidecar file
/// and a rename so a crash mid-write cannot corrupt the restored session.
pub struct FileSessionStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileSessionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create session store dir {}", parent.display()))?;
            }
        }
        // A missing or unreadable file is an empty session, not an error.
        let entries = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
            Err(_) => HashMap::new(),
        };
        Ok(Self { path, entries: RwLock::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) {
        let tmp = self.path.with_extension("json.tmp");
        let body = match serde_json::to_string_pretty(entries) {
            Ok(s) => s,
            Err(e) => {
                warn!("session store serialize failed: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&tmp, body).and_then(|_| fs::rename(&tmp, &self.path)) {
            warn!("session store flush failed at {}: {}", self.path.display(), e);
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut m = self.entries.write();
        m.insert(key.to_string(), value.to_string());
        self.flush(&m);
    }

    fn remove(&self, key: &str) {
        let mut m = self.entries.write();
        if m.remove(key).is_some() {
            self.flush(&m);
        }
    }
}
