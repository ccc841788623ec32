//! Contribution API endpoints

use api_types::contribution::{ContributionNew, ContributionView, MyContributionView};
use axum::{Extension, Json, extract::State};
use chrono::Utc;
use engine::{Contribution, NewContributionCmd, User};

use crate::{ServerError, server::ServerState};

fn view(contribution: Contribution) -> ContributionView {
    let fundable = &contribution.fundable;
    ContributionView {
        id: fundable.id(),
        amount: fundable.target_amount(),
        allocated_amount: fundable.allocated_amount(),
        is_settled: fundable.is_settled(),
        created_at: fundable.created_at(),
        settled_at: fundable.settled_at(),
        user_id: contribution.user_id,
        comment: contribution.comment,
    }
}

fn my_view(contribution: Contribution) -> MyContributionView {
    MyContributionView {
        id: contribution.fundable.id(),
        amount: contribution.fundable.target_amount(),
        created_at: contribution.fundable.created_at(),
        comment: contribution.comment,
    }
}

/// Contribute money. It is spent on open funding requests right away.
pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<ContributionNew>,
) -> Result<Json<MyContributionView>, ServerError> {
    let mut cmd = NewContributionCmd::new(user.username, payload.amount, Utc::now());
    cmd.comment = payload.comment;
    let contribution = state.engine.create_contribution(cmd).await?;
    Ok(Json(my_view(contribution)))
}

/// All contributions, for superusers.
pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ContributionView>>, ServerError> {
    let contributions = state.engine.contributions(&user.username).await?;
    Ok(Json(contributions.into_iter().map(view).collect()))
}

/// The caller's own contributions.
pub async fn list_mine(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<MyContributionView>>, ServerError> {
    let contributions = state
        .engine
        .contributions_for_user(&user.username)
        .await?;
    Ok(Json(contributions.into_iter().map(my_view).collect()))
}
