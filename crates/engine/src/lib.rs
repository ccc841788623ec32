//! Fund allocation engine.
//!
//! Funding requests (what needs money) and contributions (money given) are
//! both [`Fundable`]: a target amount, an allocated amount and a settled flag.
//! Every time either side grows, [`Engine`] runs the allocation sweep which
//! spends open contributions on open requests, oldest first.

pub use allocation::{Allocation, SweepOutcome, sweep};
pub use commands::{FundingRequestUpdateCmd, NewContributionCmd, NewFundingRequestCmd};
pub use contributions::Contribution;
pub use error::EngineError;
pub use fundable::{Fundable, FundableKind, InvariantViolation};
pub use funding_requests::FundingRequest;
pub use ops::{Engine, EngineBuilder};
pub use users::User;

mod allocation;
mod commands;
mod contributions;
mod error;
mod fundable;
mod funding_requests;
mod ops;
mod password;
mod store;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
