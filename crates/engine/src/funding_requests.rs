//! The module contains `FundingRequest` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Fundable, FundableKind, ResultEngine,
    util::{normalize_name_key, parse_uuid},
};

/// A request for money, e.g. a charity project with a fundraising goal.
///
/// The name is unique (case-insensitive) across all requests. Only the
/// embedded [`Fundable`] matters to the allocation sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRequest {
    pub fundable: Fundable,
    pub name: String,
    pub description: String,
}

impl FundingRequest {
    pub fn new(
        name: String,
        description: String,
        target_amount: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            fundable: Fundable::new(FundableKind::FundingRequest, target_amount, created_at)?,
            name,
            description,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "funding_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub name_norm: String,
    pub description: String,
    pub target_amount: i64,
    pub allocated_amount: i64,
    pub is_settled: bool,
    pub created_at: DateTimeUtc,
    pub settled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&FundingRequest> for ActiveModel {
    type Error = EngineError;

    fn try_from(value: &FundingRequest) -> Result<Self, Self::Error> {
        let fundable = &value.fundable;
        Ok(Self {
            id: ActiveValue::Set(fundable.id().to_string()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(normalize_name_key(&value.name)?),
            description: ActiveValue::Set(value.description.clone()),
            target_amount: ActiveValue::Set(fundable.target_amount()),
            allocated_amount: ActiveValue::Set(fundable.allocated_amount()),
            is_settled: ActiveValue::Set(fundable.is_settled()),
            created_at: ActiveValue::Set(fundable.created_at()),
            settled_at: ActiveValue::Set(fundable.settled_at()),
        })
    }
}

impl TryFrom<Model> for FundingRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            fundable: Fundable::from_parts(
                parse_uuid(&model.id, "funding request")?,
                FundableKind::FundingRequest,
                model.target_amount,
                model.allocated_amount,
                model.is_settled,
                model.created_at,
                model.settled_at,
            ),
            name: model.name,
            description: model.description,
        })
    }
}
