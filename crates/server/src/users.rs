//! User API endpoints

use api_types::user::{UserNew, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::User;

use crate::{ServerError, server::ServerState};

fn view(user: User) -> UserView {
    UserView {
        username: user.username,
        is_superuser: user.is_superuser,
    }
}

/// Public sign-up. New accounts are never superusers.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserNew>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let user = state
        .engine
        .new_user(&payload.username, &payload.password, false)
        .await?;
    Ok((StatusCode::CREATED, Json(view(user))))
}

/// The authenticated caller.
pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(view(user))
}
