//! The module contains the `Campaign` struct and its sea-orm entity.
//!
//! A campaign accumulates the amounts of its PAID donations into
//! `raised`. The raised amount and the derived status are written only by
//! the donation path and the reconciliation pass, never by callers.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{Amount, EngineError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CampaignStatus {
    Active,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for CampaignStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidCampaign(format!(
                "invalid campaign status: {other}"
            ))),
        }
    }
}

/// A time-boxed fundraising campaign.
#[derive(Clone, Debug)]
pub struct Campaign {
    /// Stable identifier, a UUID generated once at creation.
    pub id: String,
    pub title: String,
    pub description: String,
    pub goal: Amount,
    pub raised: Amount,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CampaignStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(
        title: String,
        description: String,
        goal: Amount,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            goal,
            raised: Amount::ZERO,
            start_date,
            end_date,
            status: CampaignStatus::Active,
            created_by,
            created_at,
        }
    }

    /// Returns `true` if the campaign accepts donations on `date`.
    ///
    /// The end date is inclusive: a campaign ending today is still open.
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.status == CampaignStatus::Active && date <= self.end_date
    }

    /// Progress towards the goal in hundredths of a percent
    /// (`10_000` = 100.00%), rounded half-up.
    ///
    /// Returns 0 for a non-positive goal.
    pub fn progress_percent_bp(&self) -> i64 {
        let goal = self.goal.minor();
        if goal <= 0 {
            return 0;
        }
        let scaled = i128::from(self.raised.minor()) * 10_000;
        let goal = i128::from(goal);
        ((scaled * 2 + goal) / (goal * 2)) as i64
    }
}

/// Formats a `progress_percent_bp` value as a 2-decimal percentage string.
pub fn format_percent_bp(bp: i64) -> String {
    format!("{}.{:02}", bp / 100, (bp % 100).abs())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: String,
    pub goal_minor: i64,
    pub raised_minor: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::donations::Entity")]
    Donations,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::donations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donations.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Campaign> for ActiveModel {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: ActiveValue::Set(campaign.id.clone()),
            title: ActiveValue::Set(campaign.title.clone()),
            description: ActiveValue::Set(campaign.description.clone()),
            goal_minor: ActiveValue::Set(campaign.goal.minor()),
            raised_minor: ActiveValue::Set(campaign.raised.minor()),
            start_date: ActiveValue::Set(campaign.start_date),
            end_date: ActiveValue::Set(campaign.end_date),
            status: ActiveValue::Set(campaign.status.as_str().to_string()),
            created_by: ActiveValue::Set(campaign.created_by.clone()),
            created_at: ActiveValue::Set(campaign.created_at),
        }
    }
}

impl TryFrom<Model> for Campaign {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            title: model.title,
            description: model.description,
            goal: Amount::new(model.goal_minor),
            raised: Amount::new(model.raised_minor),
            start_date: model.start_date,
            end_date: model.end_date,
            status: CampaignStatus::try_from(model.status.as_str())?,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
