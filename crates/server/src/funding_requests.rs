//! Funding request API endpoints

use api_types::funding_request::{FundingRequestNew, FundingRequestUpdate, FundingRequestView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use engine::{FundingRequest, FundingRequestUpdateCmd, NewFundingRequestCmd, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(request: FundingRequest) -> FundingRequestView {
    let fundable = &request.fundable;
    FundingRequestView {
        id: fundable.id(),
        target_amount: fundable.target_amount(),
        allocated_amount: fundable.allocated_amount(),
        is_settled: fundable.is_settled(),
        created_at: fundable.created_at(),
        settled_at: fundable.settled_at(),
        name: request.name,
        description: request.description,
    }
}

/// List every funding request. Public.
pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<FundingRequestView>>, ServerError> {
    let requests = state.engine.funding_requests().await?;
    Ok(Json(requests.into_iter().map(view).collect()))
}

/// Create a funding request. Waiting contributions are spent on it right away.
pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<FundingRequestNew>,
) -> Result<Json<FundingRequestView>, ServerError> {
    let cmd = NewFundingRequestCmd::new(
        user.username,
        payload.name,
        payload.target_amount,
        Utc::now(),
    )
    .description(payload.description);
    let request = state.engine.create_funding_request(cmd).await?;
    Ok(Json(view(request)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FundingRequestUpdate>,
) -> Result<Json<FundingRequestView>, ServerError> {
    if payload.is_empty() {
        return Err(ServerError::Generic(
            "at least one of name, description, target_amount is required".to_string(),
        ));
    }

    let mut cmd = FundingRequestUpdateCmd::new(user.username, id);
    cmd.name = payload.name;
    cmd.description = payload.description;
    cmd.target_amount = payload.target_amount;
    let request = state.engine.update_funding_request(cmd).await?;
    Ok(Json(view(request)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FundingRequestView>, ServerError> {
    let request = state
        .engine
        .delete_funding_request(id, &user.username)
        .await?;
    Ok(Json(view(request)))
}
