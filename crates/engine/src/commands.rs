//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create/update funding
//! requests, contribute), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Create a funding request.
#[derive(Clone, Debug)]
pub struct NewFundingRequestCmd {
    pub name: String,
    pub description: String,
    pub target_amount: i64,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl NewFundingRequestCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        target_amount: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            target_amount,
            created_at,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Edit a funding request. `None` fields are left unchanged.
#[derive(Clone, Debug)]
pub struct FundingRequestUpdateCmd {
    pub request_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<i64>,
    pub user_id: String,
}

impl FundingRequestUpdateCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            request_id,
            name: None,
            description: None,
            target_amount: None,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn target_amount(mut self, target_amount: i64) -> Self {
        self.target_amount = Some(target_amount);
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.target_amount.is_none()
    }
}

/// Contribute money.
#[derive(Clone, Debug)]
pub struct NewContributionCmd {
    pub amount: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl NewContributionCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, amount: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            amount,
            comment: None,
            created_at,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}
