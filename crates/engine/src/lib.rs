pub use campaigns::{Campaign, CampaignStatus, format_percent_bp};
pub use donations::{Donation, PaymentStatus};
pub use error::EngineError;
pub use money::Amount;
pub use ops::{
    CampaignReport, DonationView, Engine, EngineBuilder, UserReport, MIN_DONATION_MINOR,
    MIN_GOAL_MINOR,
};
pub use users::{Role, User};

mod campaigns;
mod donations;
mod error;
mod money;
mod ops;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
