//! Strongly-typed accessors over the per-visitor session bag.
//!
//! `tower-sessions` owns the token cookie, the durable SQLite store and
//! the save-on-change behaviour; this module is the only place that knows
//! the bag's key names, so the rest of the code cannot misspell them.
//!
//! Session lifetime is a fixed 12 hours from the first write, not sliding:
//! the first mutation pins an absolute expiry on the session, and logging
//! in re-pins it (an explicit renewal). The token itself is rotated on
//! every privilege change to defeat session fixation.

use rand::Rng;
use time::{Duration, OffsetDateTime};
use tower_sessions::{Expiry, Session};

use crate::error::AppResult;

const FLASH_KEY: &str = "flash";
const AUTH_ID_KEY: &str = "authenticated_user_id";
const CSRF_KEY: &str = "csrf_token";

/// Fixed time-to-live, measured from the first write to the session.
pub const SESSION_LIFETIME: Duration = Duration::hours(12);

/// Pins an absolute expiry on the session unless one is already pinned.
fn pin_lifetime(session: &Session) {
    if !matches!(session.expiry(), Some(Expiry::AtDateTime(_))) {
        session.set_expiry(Some(Expiry::AtDateTime(
            OffsetDateTime::now_utc() + SESSION_LIFETIME,
        )));
    }
}

/// Queues a one-shot message for the next page view.
pub async fn set_flash(session: &Session, message: &str) -> AppResult<()> {
    pin_lifetime(session);
    session.insert(FLASH_KEY, message).await?;
    Ok(())
}

/// Takes the flash message, removing it in the same step, so a message is
/// shown at most once even under an immediate reload.
pub async fn pop_flash(session: &Session) -> AppResult<Option<String>> {
    Ok(session.remove::<String>(FLASH_KEY).await?)
}

pub async fn authenticated_user(session: &Session) -> AppResult<Option<i64>> {
    Ok(session.get::<i64>(AUTH_ID_KEY).await?)
}

pub async fn is_authenticated(session: &Session) -> AppResult<bool> {
    Ok(authenticated_user(session).await?.is_some())
}

/// Marks the session as belonging to `user_id`.
///
/// Rotates the session token first, keeping the rest of the bag, and
/// restarts the fixed lifetime from now.
pub async fn log_in(session: &Session, user_id: i64) -> AppResult<()> {
    session.cycle_id().await?;
    session.set_expiry(Some(Expiry::AtDateTime(
        OffsetDateTime::now_utc() + SESSION_LIFETIME,
    )));
    session.insert(AUTH_ID_KEY, user_id).await?;
    Ok(())
}

/// Drops the authentication identity and rotates the token. The rest of
/// the bag (e.g. a queued flash message) survives.
pub async fn log_out(session: &Session) -> AppResult<()> {
    session.cycle_id().await?;
    session.remove::<i64>(AUTH_ID_KEY).await?;
    Ok(())
}

/// Returns the session-scoped CSRF token, minting one on first use.
pub async fn csrf_token(session: &Session) -> AppResult<String> {
    if let Some(token) = session.get::<String>(CSRF_KEY).await? {
        return Ok(token);
    }
    let raw: [u8; 32] = rand::thread_rng().gen();
    let token = hex::encode(raw);
    pin_lifetime(session);
    session.insert(CSRF_KEY, &token).await?;
    Ok(token)
}
