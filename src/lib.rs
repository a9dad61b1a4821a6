pub mod api;
pub mod config;
pub mod session;

use std::sync::Arc;

use anyhow::Result;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::session::{ExpiryWatchdog, FileSessionStore, SessionManager};

/// Install the default diagnostics subscriber (RUST_LOG-style filtering).
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Everything the application shell needs from the session core, wired.
pub struct AppCore {
    pub manager: Arc<SessionManager>,
    pub api: ApiClient,
    pub watchdog: ExpiryWatchdog,
}

/// Wire the session core the way the shell does on startup: restore the
/// durable session, run the mount-time expiry check, kick off an identity
/// refresh, and start the expiry watchdog. The watchdog stops when the
/// returned `AppCore` is dropped.
pub async fn mount(cfg: &ClientConfig) -> Result<AppCore> {
    let store = Arc::new(FileSessionStore::open(&cfg.session_file)?);
    let manager = SessionManager::with_lifetime(store, cfg.session_lifetime);
    let api = ApiClient::new(cfg.api_url.clone());
    manager.refresh_identity(&api).await;
    let watchdog =
        ExpiryWatchdog::spawn_every(manager.clone(), Some(api.clone()), cfg.expiry_check_interval);
    Ok(AppCore { manager, api, watchdog })
}
