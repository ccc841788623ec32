use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod funding_request {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct FundingRequestNew {
        pub name: String,
        pub description: String,
        /// Must be > 0.
        pub target_amount: i64,
    }

    /// Partial edit. At least one field must be set.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct FundingRequestUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        /// Must be > 0 and not below the amount already allocated.
        pub target_amount: Option<i64>,
    }

    impl FundingRequestUpdate {
        pub fn is_empty(&self) -> bool {
            self.name.is_none() && self.description.is_none() && self.target_amount.is_none()
        }
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FundingRequestView {
        pub id: Uuid,
        pub name: String,
        pub description: String,
        pub target_amount: i64,
        pub allocated_amount: i64,
        pub is_settled: bool,
        pub created_at: DateTime<Utc>,
        pub settled_at: Option<DateTime<Utc>>,
    }
}

pub mod contribution {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct ContributionNew {
        /// Must be > 0.
        pub amount: i64,
        pub comment: Option<String>,
    }

    /// Full view, for superusers.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ContributionView {
        pub id: Uuid,
        pub user_id: String,
        pub comment: Option<String>,
        pub amount: i64,
        pub allocated_amount: i64,
        pub is_settled: bool,
        pub created_at: DateTime<Utc>,
        pub settled_at: Option<DateTime<Utc>>,
    }

    /// What a contributor sees of their own contributions.
    ///
    /// Allocation state is internal bookkeeping and is not exposed.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MyContributionView {
        pub id: Uuid,
        pub comment: Option<String>,
        pub amount: i64,
        pub created_at: DateTime<Utc>,
    }
}

pub mod user {
    use super::*;

    /// Self-registration. The password needs at least 3 characters and must
    /// not contain the username.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct UserNew {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub username: String,
        pub is_superuser: bool,
    }
}
