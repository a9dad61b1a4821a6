//! Client-held session: bearer token lifecycle, cached identity, expiry
//! enforcement and the route guards that consume it. Keep the public surface
//! thin and split implementation across sub-modules.

mod guard;
mod identity;
mod manager;
mod store;
mod watchdog;

pub use guard::{guard_admin_route, guard_route, GuardOutcome};
pub use identity::{Identity, Role};
pub use manager::{
    RefreshTicket, SessionManager, SessionSnapshot, SessionStatus, EXPIRY_CHECK_INTERVAL,
    SESSION_LIFETIME,
};
pub use store::{
    FileSessionStore, MemorySessionStore, SessionStore, KEY_IDENTITY, KEY_LOGIN_TIME, KEY_TOKEN,
};
pub use watchdog::ExpiryWatchdog;
