use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, Select, TransactionTrait, prelude::*};

use crate::{
    Contribution, EngineError, NewContributionCmd, ResultEngine, contributions,
    util::{normalize_optional_text, validate_positive_amount},
};

use super::{Engine, with_tx};

fn oldest_first(query: Select<contributions::Entity>) -> Select<contributions::Entity> {
    query
        .order_by_asc(contributions::Column::CreatedAt)
        .order_by_asc(contributions::Column::Id)
}

impl Engine {
    /// Record a contribution and spend it on open funding requests.
    pub async fn create_contribution(&self, cmd: NewContributionCmd) -> ResultEngine<Contribution> {
        validate_positive_amount(cmd.amount, "amount")?;
        let comment = normalize_optional_text(cmd.comment.as_deref());

        let _guard = self.allocation_lock.lock().await;
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, &cmd.user_id).await?;
            let contribution = Contribution::new(user.username, cmd.amount, comment, cmd.created_at)?;
            let contribution_id = contribution.fundable.id();
            contributions::ActiveModel::from(&contribution)
                .insert(&db_tx)
                .await?;
            tracing::info!(id = %contribution_id, amount = cmd.amount, "contribution created");

            self.allocate_in(&db_tx, Utc::now()).await?;
            contributions::Entity::find_by_id(contribution_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("contribution not exists".to_string()))
                .and_then(Contribution::try_from)
        })
    }

    /// Every contribution, oldest first. Superusers only.
    pub async fn contributions(&self, user_id: &str) -> ResultEngine<Vec<Contribution>> {
        with_tx!(self, |db_tx| {
            self.require_superuser(&db_tx, user_id).await?;
            let models = oldest_first(contributions::Entity::find())
                .all(&db_tx)
                .await?;
            models.into_iter().map(Contribution::try_from).collect()
        })
    }

    /// Contributions made by `user_id`, oldest first.
    pub async fn contributions_for_user(&self, user_id: &str) -> ResultEngine<Vec<Contribution>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let models = oldest_first(
                contributions::Entity::find()
                    .filter(contributions::Column::UserId.eq(user_id.to_string())),
            )
            .all(&db_tx)
            .await?;
            models.into_iter().map(Contribution::try_from).collect()
        })
    }
}
