//! One-shot messages carried across a redirect.

use tower_sessions::Session;

use crate::models::session_keys;

/// Queue a message for the next page view.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(session: &Session, message: &str) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, message).await
}

/// Take the queued message, if any.
///
/// A session that cannot be read is treated as having no message.
pub async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}
