//! The module contains `Contribution` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Fundable, FundableKind, ResultEngine, util::parse_uuid};

/// Money given by a user, spent on funding requests in creation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub fundable: Fundable,
    /// Username of the contributor.
    pub user_id: String,
    pub comment: Option<String>,
}

impl Contribution {
    pub fn new(
        user_id: String,
        amount: i64,
        comment: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            fundable: Fundable::new(FundableKind::Contribution, amount, created_at)?,
            user_id,
            comment,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub comment: Option<String>,
    pub target_amount: i64,
    pub allocated_amount: i64,
    pub is_settled: bool,
    pub created_at: DateTimeUtc,
    pub settled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Contribution> for ActiveModel {
    fn from(value: &Contribution) -> Self {
        let fundable = &value.fundable;
        Self {
            id: ActiveValue::Set(fundable.id().to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            comment: ActiveValue::Set(value.comment.clone()),
            target_amount: ActiveValue::Set(fundable.target_amount()),
            allocated_amount: ActiveValue::Set(fundable.allocated_amount()),
            is_settled: ActiveValue::Set(fundable.is_settled()),
            created_at: ActiveValue::Set(fundable.created_at()),
            settled_at: ActiveValue::Set(fundable.settled_at()),
        }
    }
}

impl TryFrom<Model> for Contribution {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            fundable: Fundable::from_parts(
                parse_uuid(&model.id, "contribution")?,
                FundableKind::Contribution,
                model.target_amount,
                model.allocated_amount,
                model.is_settled,
                model.created_at,
                model.settled_at,
            ),
            user_id: model.user_id,
            comment: model.comment,
        })
    }
}
