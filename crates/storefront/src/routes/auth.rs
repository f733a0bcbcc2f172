//! Login, registration and logout handlers.

use axum::{
    Form, Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user, set_flash, take_flash};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Where to go after logging in; also accepted as a query parameter.
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub repeat_password: String,
}

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login/registration page data.
#[derive(Debug, Serialize)]
pub struct AuthPageView {
    pub flash: Option<String>,
    pub next: Option<String>,
    pub user: Option<CurrentUser>,
}

/// Accept `next` only if it is a path on this site.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') && !n.contains("://")
    })
}

/// Where a freshly logged-in user lands.
#[must_use]
pub fn landing_for(user: &CurrentUser, next: Option<&str>) -> String {
    if user.is_admin() {
        return "/admin".to_string();
    }
    safe_next(next).unwrap_or("/").to_string()
}

// =============================================================================
// Handlers
// =============================================================================

/// Login page data.
pub async fn login_page(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Json<AuthPageView> {
    Json(AuthPageView {
        flash: take_flash(&session).await,
        next: safe_next(query.next.as_deref()).map(str::to_owned),
        user,
    })
}

/// Verify credentials and start a session.
///
/// Wrong credentials go back to `/login` with a message; `next` is kept.
///
/// # Errors
///
/// Returns 500 if the user table or the session store fails.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = form.next.as_deref().or(query.next.as_deref());

    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from(&user);
            set_current_user(&session, &current).await?;
            set_sentry_user(&current.id, Some(current.email.as_str()));
            tracing::info!(user_id = %current.id, role = %current.role, "user logged in");

            Ok(Redirect::to(&landing_for(&current, next)).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("login failed");
            set_flash(&session, "Invalid email or password").await?;
            let back = safe_next(next).map_or_else(
                || "/login".to_string(),
                crate::middleware::auth::login_url,
            );
            Ok(Redirect::to(&back).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Registration page data.
pub async fn register_page(
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Json<AuthPageView> {
    Json(AuthPageView {
        flash: take_flash(&session).await,
        next: None,
        user,
    })
}

/// Create an account, then send the visitor to log in.
///
/// # Errors
///
/// Returns 422 for invalid input, 409 for a taken email and 500 on storage failure.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    AuthService::new(state.pool())
        .register(&form.email, &form.password, &form.repeat_password)
        .await?;

    set_flash(&session, "Registration complete, please log in").await?;
    Ok(Redirect::to("/login"))
}

/// End the session.
///
/// # Errors
///
/// Returns 500 if the session cannot be flushed.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Email, UserId, UserRole};

    use super::*;

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: Email::parse("a@b.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/cart")), Some("/cart"));
        assert_eq!(safe_next(Some("/catalog?category=1")), Some("/catalog?category=1"));
    }

    #[test]
    fn test_safe_next_rejects_offsite() {
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(Some("cart")), None);
        assert_eq!(safe_next(None), None);
    }

    #[test]
    fn test_admins_land_on_admin() {
        assert_eq!(landing_for(&user(UserRole::Admin), Some("/cart")), "/admin");
    }

    #[test]
    fn test_users_follow_next() {
        assert_eq!(landing_for(&user(UserRole::User), Some("/cart")), "/cart");
        assert_eq!(landing_for(&user(UserRole::User), Some("http://x")), "/");
        assert_eq!(landing_for(&user(UserRole::User), None), "/");
    }
}
