//! Session lifecycle: the single source of truth for "is there a usable
//! credential, and who does it belong to".
//!
//! Policy preserved exactly from the web shell: only an explicit 401 from the
//! backend or locally computed expiry destroys the session. Every other
//! refresh failure is logged and swallowed so a transient outage never logs
//! anyone out; the next watchdog tick retries implicitly.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::identity::Identity;
use super::store::{SessionStore, KEY_IDENTITY, KEY_LOGIN_TIME, KEY_TOKEN};
use crate::api::{ApiClient, ApiError};

/// Client-enforced session lifetime (one hour, matching the web shell).
pub const SESSION_LIFETIME: Duration = Duration::from_secs(3600);
/// Cadence of the expiry watchdog.
pub const EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    /// Token held, identity not yet confirmed by the backend since the most
    /// recent login. Counts as authenticated for route access.
    Pending,
    Authenticated,
    Expired,
}

/// Immutable view published to observers on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub identity: Option<Identity>,
    /// True until the first refresh attempt after startup settles.
    pub loading: bool,
}

impl SessionSnapshot {
    /// Token presence gates route access, not identity-fetch completion.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, SessionStatus::Pending | SessionStatus::Authenticated)
    }
}

struct SessionState {
    token: Option<String>,
    identity: Option<Identity>,
    issued_at_ms: Option<i64>,
    /// Identity confirmed by the backend since the most recent login. A
    /// record restored from the store is usable but stale until then.
    confirmed: bool,
    /// Bumped on every login/logout; fences out stale refresh responses.
    epoch: u64,
    loading: bool,
}

fn status_of(state: &SessionState, lifetime_ms: i64, now_ms: i64) -> SessionStatus {
    match (&state.token, state.issued_at_ms) {
        (Some(_), Some(t0)) if now_ms - t0 >= lifetime_ms => SessionStatus::Expired,
        (Some(_), _) if state.confirmed => SessionStatus::Authenticated,
        (Some(_), _) => SessionStatus::Pending,
        _ => SessionStatus::Unauthenticated,
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Opaque handle pairing an in-flight identity refresh with the session it
/// was started for. A response settling under a different epoch is discarded
/// wholesale, so a logout can never be undone by a late-arriving success.
#[derive(Debug, Clone, Copy)]
pub struct RefreshTicket {
    epoch: u64,
}

pub struct SessionManager {
    state: RwLock<SessionState>,
    store: Arc<dyn SessionStore>,
    lifetime_ms: i64,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Arc<Self> {
        Self::with_lifetime(store, SESSION_LIFETIME)
    }

    /// Restore whatever the durable store holds and run the mount-time expiry
    /// check, so a stale restored session is dropped before any guard sees it.
    pub fn with_lifetime(store: Arc<dyn SessionStore>, lifetime: Duration) -> Arc<Self> {
        let token = store.get(KEY_TOKEN);
        let identity = store.get(KEY_IDENTITY).and_then(|s| serde_json::from_str(&s).ok());
        let issued_at_ms = store.get(KEY_LOGIN_TIME).and_then(|s| s.parse::<i64>().ok());
        let loading = token.is_some();
        let state = SessionState { token, identity, issued_at_ms, confirmed: false, epoch: 0, loading };
        let lifetime_ms = lifetime.as_millis() as i64;
        let snapshot = SessionSnapshot {
            status: status_of(&state, lifetime_ms, now_ms()),
            identity: state.identity.clone(),
            loading: state.loading,
        };
        let (tx, _rx) = watch::channel(snapshot);
        let mgr = Arc::new(Self { state: RwLock::new(state), store, lifetime_ms, tx });
        mgr.enforce_expiry();
        mgr
    }

    // --- public contract -------------------------------------------------

    /// Record a fresh credential. Pure state transition: no network, no
    /// failure path. With an inline identity the session is authenticated at
    /// once; without one, whatever identity was cached stays in place and the
    /// session is pending until a refresh confirms it.
    pub fn login(&self, token: impl Into<String>, identity: Option<Identity>) {
        let token = token.into();
        debug_assert!(!token.is_empty(), "login requires a non-empty token");
        let now = now_ms();
        {
            let mut st = self.state.write();
            self.store.set(KEY_TOKEN, &token);
            self.store.set(KEY_LOGIN_TIME, &now.to_string());
            st.token = Some(token);
            st.issued_at_ms = Some(now);
            st.epoch += 1;
            st.loading = false;
            match identity {
                Some(id) => {
                    if let Ok(s) = serde_json::to_string(&id) {
                        self.store.set(KEY_IDENTITY, &s);
                    }
                    st.identity = Some(id);
                    st.confirmed = true;
                }
                None => st.confirmed = false,
            }
            debug!("session.login epoch={}", st.epoch);
        }
        self.publish();
    }

    /// Destroy the session in memory and in the durable store. Idempotent.
    pub fn logout(&self) {
        {
            let mut st = self.state.write();
            self.clear_locked(&mut st);
        }
        self.publish();
    }

    /// Teardown body shared by `logout` and the fenced 401 paths. The caller
    /// holds the write lock and publishes after releasing it.
    fn clear_locked(&self, st: &mut SessionState) {
        self.store.remove(KEY_TOKEN);
        self.store.remove(KEY_IDENTITY);
        self.store.remove(KEY_LOGIN_TIME);
        st.token = None;
        st.identity = None;
        st.issued_at_ms = None;
        st.confirmed = false;
        st.epoch += 1;
        st.loading = false;
        debug!("session.logout epoch={}", st.epoch);
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.read().identity.clone()
    }

    pub fn current_token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn issued_at_ms(&self) -> Option<i64> {
        self.state.read().issued_at_ms
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn status(&self) -> SessionStatus {
        self.status_at(now_ms())
    }

    pub fn status_at(&self, now_ms: i64) -> SessionStatus {
        status_of(&self.state.read(), self.lifetime_ms, now_ms)
    }

    /// True iff a non-expired token is present; identity arrival is not
    /// waited on.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(now_ms())
    }

    pub fn is_authenticated_at(&self, now_ms: i64) -> bool {
        matches!(self.status_at(now_ms), SessionStatus::Pending | SessionStatus::Authenticated)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_at(now_ms())
    }

    pub fn snapshot_at(&self, now_ms: i64) -> SessionSnapshot {
        let st = self.state.read();
        SessionSnapshot {
            status: status_of(&st, self.lifetime_ms, now_ms),
            identity: st.identity.clone(),
            loading: st.loading,
        }
    }

    /// Observe session transitions. Consumers re-render or navigate on change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    // --- expiry -----------------------------------------------------------

    /// Mount-time and watchdog entry point: destroys the session once its age
    /// reaches the lifetime, regardless of any refresh in flight. Purely
    /// local; no network involved.
    pub fn enforce_expiry(&self) {
        self.enforce_expiry_at(now_ms());
    }

    pub fn enforce_expiry_at(&self, now_ms: i64) {
        let expired = {
            let st = self.state.read();
            matches!((&st.token, st.issued_at_ms),
                (Some(_), Some(t0)) if now_ms - t0 >= self.lifetime_ms)
        };
        if expired {
            warn!("session expired after {}s, logging out", self.lifetime_ms / 1000);
            self.logout();
        }
    }

    // --- identity refresh --------------------------------------------------

    /// Start an identity refresh. None when no token is held. The ticket pins
    /// the current epoch so the response can be fenced when it settles.
    pub fn begin_refresh(&self) -> Option<RefreshTicket> {
        let st = self.state.read();
        st.token.as_ref()?;
        Some(RefreshTicket { epoch: st.epoch })
    }

    /// Settle a refresh. 401 tears the session down; any other failure is
    /// swallowed (fail open on ambiguous errors) and retried on the next
    /// cycle. A stale ticket discards the outcome entirely.
    pub fn apply_refresh(&self, ticket: RefreshTicket, outcome: Result<Identity, ApiError>) {
        match outcome {
            Ok(identity) => {
                {
                    let mut st = self.state.write();
                    if st.epoch != ticket.epoch {
                        debug!("discarding stale identity refresh (epoch {} != {})", ticket.epoch, st.epoch);
                        return;
                    }
                    if let Ok(s) = serde_json::to_string(&identity) {
                        self.store.set(KEY_IDENTITY, &s);
                    }
                    st.identity = Some(identity);
                    st.confirmed = true;
                    st.loading = false;
                }
                self.publish();
            }
            Err(err) => {
                // Fence and effect under one write lock: a login landing
                // between the two must not be wiped by this outcome.
                let publish = {
                    let mut st = self.state.write();
                    if st.epoch != ticket.epoch {
                        debug!("discarding stale identity refresh failure");
                        return;
                    }
                    if err.is_unauthorized() {
                        warn!("identity refresh rejected (401), tearing session down");
                        self.clear_locked(&mut st);
                        true
                    } else {
                        warn!("identity refresh failed, keeping session: {err}");
                        let was_loading = st.loading;
                        st.loading = false;
                        was_loading
                    }
                };
                if publish {
                    self.publish();
                }
            }
        }
    }

    /// Collaborator views funnel their transport errors here, along with the
    /// token the failing request carried: an explicit 401 means that
    /// credential is dead, but only the session it belongs to is torn down.
    /// A 401 arriving for a token that has since been replaced or cleared is
    /// discarded. All other errors are the caller's to report; the session is
    /// untouched.
    pub fn note_api_error(&self, token_used: &str, err: &ApiError) {
        if !err.is_unauthorized() {
            return;
        }
        let torn_down = {
            let mut st = self.state.write();
            if st.token.as_deref() != Some(token_used) {
                debug!("discarding 401 for a superseded credential");
                false
            } else {
                warn!("authenticated call rejected (401), tearing session down");
                self.clear_locked(&mut st);
                true
            }
        };
        if torn_down {
            self.publish();
        }
    }

    /// Full refresh cycle against the backend; runs on mount and on each
    /// watchdog tick. The caller never consumes a result.
    pub async fn refresh_identity(&self, api: &ApiClient) {
        let Some(ticket) = self.begin_refresh() else {
            // No token: nothing to confirm, but startup is settled.
            self.settle_loading();
            return;
        };
        let Some(token) = self.current_token() else {
            self.settle_loading();
            return;
        };
        let outcome = api.fetch_me(&token).await;
        self.apply_refresh(ticket, outcome);
    }

    fn settle_loading(&self) {
        let changed = {
            let mut st = self.state.write();
            let was = st.loading;
            st.loading = false;
            was
        };
        if changed {
            self.publish();
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }
}
