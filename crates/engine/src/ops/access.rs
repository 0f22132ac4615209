use sea_orm::{ConnectionTrait, prelude::*};

use crate::{EngineError, ResultEngine, campaigns, donations, users};

use super::Engine;

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &impl ConnectionTrait,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::UserNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_campaign(
        &self,
        db: &impl ConnectionTrait,
        campaign_id: &str,
    ) -> ResultEngine<campaigns::Model> {
        campaigns::Entity::find_by_id(campaign_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::CampaignNotFound("campaign not exists".to_string()))
    }

    pub(super) async fn require_donation(
        &self,
        db: &impl ConnectionTrait,
        donation_id: &str,
    ) -> ResultEngine<donations::Model> {
        donations::Entity::find_by_id(donation_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::DonationNotFound("donation not exists".to_string()))
    }
}
