//! Profile handlers.

use axum::{
    Form, Json,
    extract::State,
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::{RequireAuth, set_current_user, set_flash, take_flash};
use crate::models::CurrentUser;
use crate::services::account::{AccountService, ProfileEdit, ProfileView};
use crate::state::AppState;

/// Profile edit form. Blank optional fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// `/profile` response.
#[derive(Debug, Serialize)]
pub struct ProfilePage {
    #[serde(flatten)]
    pub view: ProfileView,
    pub flash: Option<String>,
}

/// The logged-in user's profile, or the admin dashboard for admins.
///
/// # Errors
///
/// Returns 500 if the profile or orders cannot be read.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfilePage>> {
    let view = AccountService::new(state.pool(), state.media())
        .profile(&user)
        .await?;

    Ok(Json(ProfilePage {
        view,
        flash: take_flash(&session).await,
    }))
}

/// Save profile changes.
///
/// # Errors
///
/// Returns 422 for invalid input, 409 for a taken email and 500 on storage failure.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect> {
    let updated = AccountService::new(state.pool(), state.media())
        .edit(
            user.id,
            &ProfileEdit {
                email: form.email,
                password: form.password,
                name: form.name,
                surname: form.surname,
                phone: form.phone,
            },
        )
        .await?;

    // Keep the session identity in step with a changed email.
    let current = CurrentUser::from(&updated);
    if current != user {
        set_current_user(&session, &current).await?;
    }

    set_flash(&session, "Profile updated").await?;
    Ok(Redirect::to("/profile"))
}

/// Delete the logged-in user's own account and end the session.
///
/// # Errors
///
/// Returns 404 if the account is already gone and 500 on storage failure.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    AccountService::new(state.pool(), state.media())
        .delete(user.id)
        .await?;

    session.flush().await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
