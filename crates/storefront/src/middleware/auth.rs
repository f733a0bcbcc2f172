//! Authentication middleware and extractors.
//!
//! The logged-in identity lives in the session. Handlers obtain it through
//! these extractors and pass it explicitly to services.
//!
//! The session only stores which user logged in. [`RequireAuth`] and
//! [`RequireAdmin`] reload that user on every request, so deleted accounts
//! lose their sessions and role changes apply immediately.

use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// If the user is not logged in, returns a redirect to the login page that
/// comes back to the requested path afterwards.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in admin.
///
/// Anonymous requests are handled as in [`RequireAuth`]; logged-in users
/// without the admin role get 403.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when authentication is required but missing.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to the login page, then back to `next`.
    RedirectToLogin { next: String },
    /// Unauthorized response (for JSON clients).
    Unauthorized,
    /// Logged in, but not allowed.
    Forbidden,
    /// The user table could not be read.
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        }
    }
}

/// `/login?next=<path>` with the path percent-encoded.
#[must_use]
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/login?next={encoded}")
}

fn wants_json(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

fn missing_login(parts: &Parts) -> AuthRejection {
    if wants_json(parts) {
        return AuthRejection::Unauthorized;
    }
    // Nested routers see a stripped path; redirect back to the full one
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |OriginalUri(uri)| uri);
    let next = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_owned(), ToString::to_string);
    AuthRejection::RedirectToLogin { next }
}

/// Reload the session's user from the database.
///
/// A session whose user no longer exists is flushed and treated as anonymous.
/// A changed email or role is written back to the session.
async fn verified_user(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthRejection> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Err(missing_login(parts));
    };
    let Some(snapshot) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
    else {
        return Err(missing_login(parts));
    };

    let stored = UserRepository::new(state.pool())
        .get_by_id(snapshot.id)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %snapshot.id, error = %e, "failed to reload session user");
            AuthRejection::Unavailable
        })?;

    let Some(stored) = stored else {
        tracing::info!(user_id = %snapshot.id, "session user no longer exists");
        if let Err(e) = session.flush().await {
            tracing::warn!(error = %e, "failed to flush stale session");
        }
        return Err(missing_login(parts));
    };

    let current = CurrentUser::from(&stored);
    if current != snapshot
        && let Err(e) = session.insert(session_keys::CURRENT_USER, &current).await
    {
        tracing::warn!(user_id = %current.id, error = %e, "failed to refresh session user");
    }
    Ok(current)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(Self(verified_user(parts, &state).await?))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = verified_user(parts, &state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "non-admin hit admin route");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged
/// in. It reads the session snapshot without reloading the user, so it is
/// only fit for display.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Helper to set the current user in the session.
///
/// The session ID is cycled first so a pre-login session cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(uri: &str, accept: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(login_url("/cart"), "/login?next=%2Fcart");
        assert_eq!(
            login_url("/catalog?category=1&category=2"),
            "/login?next=%2Fcatalog%3Fcategory%3D1%26category%3D2"
        );
    }

    #[test]
    fn test_missing_login_redirects_html() {
        assert_eq!(
            missing_login(&parts("/order?x=1", None)),
            AuthRejection::RedirectToLogin {
                next: "/order?x=1".to_string()
            }
        );
    }

    #[test]
    fn test_missing_login_json_is_unauthorized() {
        assert_eq!(
            missing_login(&parts("/cart", Some("application/json"))),
            AuthRejection::Unauthorized
        );
    }

    #[test]
    fn test_missing_login_prefers_original_uri() {
        let mut p = parts("/product", None);
        p.extensions
            .insert(OriginalUri("/admin/product".parse().unwrap()));
        assert_eq!(
            missing_login(&p),
            AuthRejection::RedirectToLogin {
                next: "/admin/product".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_no_session_layer_means_anonymous() {
        let mut p = parts("/", None);
        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut p, &()).await.unwrap();
        assert!(user.is_none());
    }

    #[test]
    fn test_unavailable_maps_to_503() {
        let response = AuthRejection::Unavailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
