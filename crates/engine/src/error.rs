//! The module contains the errors the engine can throw.
//!
//! Validation and state-conflict errors are raised before anything is
//! mutated; a [`Database`] error inside an operation rolls back the whole
//! unit of work.
//!
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("campaign not found: {0}")]
    CampaignNotFound(String),
    #[error("donation not found: {0}")]
    DonationNotFound(String),
    #[error("campaign is not open for donation: {0}")]
    CampaignClosed(String),
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),
    #[error("invalid goal: {0}")]
    InvalidGoal(String),
    #[error("invalid campaign: {0}")]
    InvalidCampaign(String),
    #[error("invalid user: {0}")]
    InvalidUser(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::UserNotFound(a), Self::UserNotFound(b)) => a == b,
            (Self::CampaignNotFound(a), Self::CampaignNotFound(b)) => a == b,
            (Self::DonationNotFound(a), Self::DonationNotFound(b)) => a == b,
            (Self::CampaignClosed(a), Self::CampaignClosed(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDateRange(a), Self::InvalidDateRange(b)) => a == b,
            (Self::InvalidGoal(a), Self::InvalidGoal(b)) => a == b,
            (Self::InvalidCampaign(a), Self::InvalidCampaign(b)) => a == b,
            (Self::InvalidUser(a), Self::InvalidUser(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
