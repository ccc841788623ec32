//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an item are not found.
//! - [`ExistingKey`] thrown when a unique name is already taken.
//! - [`FundingLocked`] thrown when a funding request can no longer be edited
//!   or removed because money has already been allocated to it.
//! - [`InvalidPassword`] thrown when a new password breaks the password rules.
//!
//! The allocation sweep itself only surfaces [`Database`] errors: every other
//! variant is raised by the validators that run before it.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`FundingLocked`]: EngineError::FundingLocked
//!  [`InvalidPassword`]: EngineError::InvalidPassword
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Funding locked: {0}")]
    FundingLocked(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid password: {0}")]
    InvalidPassword(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::FundingLocked(a), Self::FundingLocked(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidPassword(a), Self::InvalidPassword(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
