//! Storage adapter for the allocation sweep.
//!
//! The sweep only needs two things from the database: the unsettled entities
//! of one kind in creation order, and a way to write back the allocation
//! columns of the ones it changed. Both functions run on whatever connection
//! they are handed; callers pass a `DatabaseTransaction` so a sweep commits
//! all-or-nothing.

use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Contribution, Fundable, FundableKind, FundingRequest, ResultEngine, contributions,
    funding_requests,
};

/// Unsettled entities of `kind`, ordered by `created_at` then `id`.
pub(crate) async fn list_unsettled<C: ConnectionTrait>(
    db: &C,
    kind: FundableKind,
) -> ResultEngine<Vec<Fundable>> {
    match kind {
        FundableKind::FundingRequest => {
            let models = funding_requests::Entity::find()
                .filter(funding_requests::Column::IsSettled.eq(false))
                .order_by_asc(funding_requests::Column::CreatedAt)
                .order_by_asc(funding_requests::Column::Id)
                .all(db)
                .await?;
            models
                .into_iter()
                .map(|model| FundingRequest::try_from(model).map(|r| r.fundable))
                .collect()
        }
        FundableKind::Contribution => {
            let models = contributions::Entity::find()
                .filter(contributions::Column::IsSettled.eq(false))
                .order_by_asc(contributions::Column::CreatedAt)
                .order_by_asc(contributions::Column::Id)
                .all(db)
                .await?;
            models
                .into_iter()
                .map(|model| Contribution::try_from(model).map(|c| c.fundable))
                .collect()
        }
    }
}

/// Loads one entity, settled or not.
pub(crate) async fn find<C: ConnectionTrait>(
    db: &C,
    kind: FundableKind,
    id: Uuid,
) -> ResultEngine<Option<Fundable>> {
    let fundable = match kind {
        FundableKind::FundingRequest => funding_requests::Entity::find_by_id(id.to_string())
            .one(db)
            .await?
            .map(FundingRequest::try_from)
            .transpose()?
            .map(|r| r.fundable),
        FundableKind::Contribution => contributions::Entity::find_by_id(id.to_string())
            .one(db)
            .await?
            .map(Contribution::try_from)
            .transpose()?
            .map(|c| c.fundable),
    };
    Ok(fundable)
}

/// Writes the allocation columns of `changed` back to their rows.
///
/// `target_amount` is written too, so an edited target and the settlement it
/// causes land in the same statement.
pub(crate) async fn commit<C: ConnectionTrait>(db: &C, changed: &[&Fundable]) -> ResultEngine<()> {
    for fundable in changed {
        let id = fundable.id().to_string();
        match fundable.kind() {
            FundableKind::FundingRequest => {
                funding_requests::ActiveModel {
                    id: ActiveValue::Set(id),
                    target_amount: ActiveValue::Set(fundable.target_amount()),
                    allocated_amount: ActiveValue::Set(fundable.allocated_amount()),
                    is_settled: ActiveValue::Set(fundable.is_settled()),
                    settled_at: ActiveValue::Set(fundable.settled_at()),
                    ..Default::default()
                }
                .update(db)
                .await?;
            }
            FundableKind::Contribution => {
                contributions::ActiveModel {
                    id: ActiveValue::Set(id),
                    target_amount: ActiveValue::Set(fundable.target_amount()),
                    allocated_amount: ActiveValue::Set(fundable.allocated_amount()),
                    is_settled: ActiveValue::Set(fundable.is_settled()),
                    settled_at: ActiveValue::Set(fundable.settled_at()),
                    ..Default::default()
                }
                .update(db)
                .await?;
            }
        }
    }
    Ok(())
}
