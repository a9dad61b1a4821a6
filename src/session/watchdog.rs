//! Repeating session maintenance tied to the application shell's lifetime:
//! the expiry check every minute, plus the silent identity refresh when an
//! `ApiClient` is supplied.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::manager::{SessionManager, EXPIRY_CHECK_INTERVAL};
use crate::api::ApiClient;

/// Owns the background task; dropping the watchdog aborts it so no callback
/// outlives the shell that spawned it.
pub struct ExpiryWatchdog {
    handle: JoinHandle<()>,
}

impl ExpiryWatchdog {
    pub fn spawn(manager: Arc<SessionManager>, api: Option<ApiClient>) -> Self {
        Self::spawn_every(manager, api, EXPIRY_CHECK_INTERVAL)
    }

    pub fn spawn_every(
        manager: Arc<SessionManager>,
        api: Option<ApiClient>,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately: run the expiry check right
            // away so a watchdog spawned on its own still covers a session
            // that aged out before it started. The identity refresh waits for
            // the next tick; the shell already refreshes on mount.
            tick.tick().await;
            manager.enforce_expiry();
            loop {
                tick.tick().await;
                manager.enforce_expiry();
                if let Some(api) = &api {
                    manager.refresh_identity(api).await;
                }
            }
        });
        Self { handle }
    }

    /// Explicit cancellation; equivalent to dropping the handle.
    pub fn stop(self) {}
}

impl Drop for ExpiryWatchdog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
