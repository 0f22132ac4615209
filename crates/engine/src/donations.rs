//! Donation ledger primitives.
//!
//! A `Donation` is one row of the ledger: who gave how much to which
//! campaign, with a unique transaction reference. Rows are append-only;
//! status taxonomy beyond `paid` exists for future asynchronous settlement
//! and is not reached by the synchronous path.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Amount, EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

/// One recorded transfer from a user's wallet to a campaign.
#[derive(Clone, Debug)]
pub struct Donation {
    pub id: String,
    pub user_id: String,
    pub campaign_id: String,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub payment_mode: Option<String>,
    /// Unique, generated reference for external reconciliation.
    pub transaction_ref: String,
    pub donated_at: DateTime<Utc>,
}

impl Donation {
    /// Builds a settled (`paid`) donation with a fresh transaction reference.
    pub fn new(
        user_id: String,
        campaign_id: String,
        amount: Amount,
        payment_mode: Option<String>,
        donated_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "donation amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            campaign_id,
            amount,
            status: PaymentStatus::Paid,
            payment_mode,
            transaction_ref: generate_transaction_ref(),
            donated_at,
        })
    }
}

/// Short random reference. Uniqueness is enforced by the DB index; the
/// donation path retries on the (rare) collision.
fn generate_transaction_ref() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("TXN{}", uuid[..8].to_uppercase())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub campaign_id: String,
    pub amount_minor: i64,
    pub status: String,
    pub payment_mode: Option<String>,
    pub transaction_ref: String,
    pub donated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::campaigns::Entity",
        from = "Column::CampaignId",
        to = "super::campaigns::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Campaigns,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::campaigns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Donation> for ActiveModel {
    fn from(donation: &Donation) -> Self {
        Self {
            id: ActiveValue::Set(donation.id.clone()),
            user_id: ActiveValue::Set(donation.user_id.clone()),
            campaign_id: ActiveValue::Set(donation.campaign_id.clone()),
            amount_minor: ActiveValue::Set(donation.amount.minor()),
            status: ActiveValue::Set(donation.status.as_str().to_string()),
            payment_mode: ActiveValue::Set(donation.payment_mode.clone()),
            transaction_ref: ActiveValue::Set(donation.transaction_ref.clone()),
            donated_at: ActiveValue::Set(donation.donated_at),
        }
    }
}

impl TryFrom<Model> for Donation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            campaign_id: model.campaign_id,
            amount: Amount::new(model.amount_minor),
            status: PaymentStatus::try_from(model.status.as_str())?,
            payment_mode: model.payment_mode,
            transaction_ref: model.transaction_ref,
            donated_at: model.donated_at,
        })
    }
}
