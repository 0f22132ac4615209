use chrono::{NaiveDate, Utc};

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Amount, Campaign, CampaignStatus, EngineError, ResultEngine, Role, campaigns,
};

use super::{Engine, MIN_GOAL_MINOR, normalize_required_text, with_tx};

const TITLE_MIN: usize = 5;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MIN: usize = 20;

impl Engine {
    /// Creates a campaign in `active` status with nothing raised yet.
    pub async fn new_campaign(
        &self,
        title: &str,
        description: &str,
        goal: Amount,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_by: &str,
    ) -> ResultEngine<Campaign> {
        let title = normalize_required_text(title, "title")?;
        if title.chars().count() < TITLE_MIN || title.chars().count() > TITLE_MAX {
            return Err(EngineError::InvalidCampaign(format!(
                "title must be between {TITLE_MIN} and {TITLE_MAX} characters"
            )));
        }
        let description = normalize_required_text(description, "description")?;
        if description.chars().count() < DESCRIPTION_MIN {
            return Err(EngineError::InvalidCampaign(format!(
                "description must be at least {DESCRIPTION_MIN} characters"
            )));
        }
        if goal.minor() < MIN_GOAL_MINOR {
            return Err(EngineError::InvalidGoal(format!(
                "goal must be at least {}",
                Amount::new(MIN_GOAL_MINOR)
            )));
        }
        if end_date < start_date {
            return Err(EngineError::InvalidDateRange(
                "end date must not precede start date".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, created_by).await?;

            let campaign = Campaign::new(
                title,
                description,
                goal,
                start_date,
                end_date,
                created_by.to_string(),
                Utc::now(),
            );
            let model: campaigns::ActiveModel = (&campaign).into();
            model.insert(&db_tx).await?;
            Ok(campaign)
        })
    }

    /// Return a campaign snapshot from DB.
    pub async fn campaign(&self, campaign_id: &str) -> ResultEngine<Campaign> {
        with_tx!(self, |db_tx| {
            let model = self.require_campaign(&db_tx, campaign_id).await?;
            Campaign::try_from(model)
        })
    }

    /// Campaigns still accepting donations on `on`: active and not past
    /// their end date (the end date itself counts as open).
    pub async fn list_open_campaigns(&self, on: NaiveDate) -> ResultEngine<Vec<Campaign>> {
        with_tx!(self, |db_tx| {
            let models = campaigns::Entity::find()
                .filter(campaigns::Column::Status.eq(CampaignStatus::Active.as_str()))
                .filter(campaigns::Column::EndDate.gte(on))
                .order_by_asc(campaigns::Column::EndDate)
                .order_by_asc(campaigns::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Campaign::try_from).collect()
        })
    }

    pub async fn list_campaigns_by_creator(&self, user_id: &str) -> ResultEngine<Vec<Campaign>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let models = campaigns::Entity::find()
                .filter(campaigns::Column::CreatedBy.eq(user_id.to_string()))
                .order_by_desc(campaigns::Column::CreatedAt)
                .order_by_desc(campaigns::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Campaign::try_from).collect()
        })
    }

    /// Cancels an active campaign.
    ///
    /// Authorization: admins only. Completed and already-cancelled
    /// campaigns cannot be cancelled.
    pub async fn cancel_campaign(&self, campaign_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let actor = self.require_user(&db_tx, user_id).await?;
            if Role::try_from(actor.role.as_str())? != Role::Admin {
                return Err(EngineError::Forbidden(
                    "only admins may cancel campaigns".to_string(),
                ));
            }

            let model = self.require_campaign(&db_tx, campaign_id).await?;
            let status = CampaignStatus::try_from(model.status.as_str())?;
            if status != CampaignStatus::Active {
                return Err(EngineError::CampaignClosed(format!(
                    "campaign is {} and cannot be cancelled",
                    status.as_str()
                )));
            }

            let active = campaigns::ActiveModel {
                id: ActiveValue::Set(model.id),
                status: ActiveValue::Set(CampaignStatus::Cancelled.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Adds a settled donation to the campaign total, flipping the
    /// campaign to `completed` once the goal is reached. Completion is
    /// one-way.
    pub(super) async fn apply_donation_to_campaign(
        &self,
        db_tx: &DatabaseTransaction,
        campaign: &campaigns::Model,
        amount: Amount,
    ) -> ResultEngine<()> {
        let raised = Amount::new(campaign.raised_minor)
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidAmount("raised overflow".to_string()))?;

        let status = if raised.minor() >= campaign.goal_minor {
            CampaignStatus::Completed
        } else {
            CampaignStatus::Active
        };

        let active = campaigns::ActiveModel {
            id: ActiveValue::Set(campaign.id.clone()),
            raised_minor: ActiveValue::Set(raised.minor()),
            status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        active.update(db_tx).await?;
        Ok(())
    }
}
