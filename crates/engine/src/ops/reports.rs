use sea_orm::{
    QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait, prelude::*,
};

use crate::{
    Amount, Campaign, Donation, EngineError, PaymentStatus, ResultEngine, User, campaigns,
    donations, users,
};

use super::{Engine, with_tx};

const RECENT_DONATIONS_LIMIT: u64 = 10;
const TOP_DONATIONS_LIMIT: u64 = 5;

/// A donation joined with the donor's name and the campaign title.
#[derive(Clone, Debug)]
pub struct DonationView {
    pub donation: Donation,
    pub donor_name: String,
    pub campaign_title: String,
}

/// Aggregated snapshot of a campaign's progress.
#[derive(Clone, Debug)]
pub struct CampaignReport {
    pub campaign: Campaign,
    /// Progress toward the goal in basis points, rounded half-up.
    pub progress_bp: i64,
    /// Distinct donors with at least one settled donation.
    pub total_donors: u64,
    /// Latest settled donations, newest first, at most 10.
    pub recent_donations: Vec<DonationView>,
    /// Largest settled donations, at most 5; earlier donations win ties.
    pub top_donations: Vec<DonationView>,
}

/// Aggregated snapshot of a user's giving.
#[derive(Clone, Debug)]
pub struct UserReport {
    pub user: User,
    /// Lifetime total over settled donations only.
    pub total_donated: Amount,
    /// Number of recorded donations, any status; always `history.len()`.
    pub total_donations: u64,
    /// Full donation history with campaign titles, newest first.
    pub history: Vec<DonationView>,
}

impl Engine {
    /// Builds a campaign report in one read transaction so the totals,
    /// counts, and listings describe the same ledger state.
    pub async fn campaign_report(&self, campaign_id: &str) -> ResultEngine<CampaignReport> {
        with_tx!(self, |db_tx| {
            let model = self.require_campaign(&db_tx, campaign_id).await?;
            let campaign = Campaign::try_from(model)?;

            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                "SELECT COUNT(DISTINCT user_id) AS donors \
                 FROM donations \
                 WHERE campaign_id = ? AND status = ?",
                vec![
                    campaign.id.clone().into(),
                    PaymentStatus::Paid.as_str().into(),
                ],
            );
            let row = db_tx.query_one(stmt).await?;
            let total_donors: i64 = row.and_then(|r| r.try_get("", "donors").ok()).unwrap_or(0);

            let recent_rows = donations::Entity::find()
                .filter(donations::Column::CampaignId.eq(campaign.id.clone()))
                .filter(donations::Column::Status.eq(PaymentStatus::Paid.as_str()))
                .find_also_related(users::Entity)
                .order_by_desc(donations::Column::DonatedAt)
                .order_by_desc(donations::Column::Id)
                .limit(RECENT_DONATIONS_LIMIT)
                .all(&db_tx)
                .await?;

            let top_rows = donations::Entity::find()
                .filter(donations::Column::CampaignId.eq(campaign.id.clone()))
                .filter(donations::Column::Status.eq(PaymentStatus::Paid.as_str()))
                .find_also_related(users::Entity)
                .order_by_desc(donations::Column::AmountMinor)
                .order_by_asc(donations::Column::DonatedAt)
                .order_by_asc(donations::Column::Id)
                .limit(TOP_DONATIONS_LIMIT)
                .all(&db_tx)
                .await?;

            let recent_donations = donor_views(recent_rows, &campaign.title)?;
            let top_donations = donor_views(top_rows, &campaign.title)?;

            Ok(CampaignReport {
                progress_bp: campaign.progress_percent_bp(),
                total_donors: total_donors.max(0) as u64,
                recent_donations,
                top_donations,
                campaign,
            })
        })
    }

    /// Builds a user report: lifetime totals over settled donations plus
    /// the full history, in one read transaction.
    pub async fn user_report(&self, user_id: &str) -> ResultEngine<UserReport> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let user = User::try_from(model)?;

            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                "SELECT COALESCE(SUM(CASE WHEN status = ? THEN amount_minor ELSE 0 END), 0) AS total, \
                 COUNT(*) AS n \
                 FROM donations \
                 WHERE user_id = ?",
                vec![PaymentStatus::Paid.as_str().into(), user.id.clone().into()],
            );
            let row = db_tx.query_one(stmt).await?;
            let (total_minor, count): (i64, i64) = match row {
                Some(r) => (
                    r.try_get("", "total").unwrap_or(0),
                    r.try_get("", "n").unwrap_or(0),
                ),
                None => (0, 0),
            };

            let rows = donations::Entity::find()
                .filter(donations::Column::UserId.eq(user.id.clone()))
                .find_also_related(campaigns::Entity)
                .order_by_desc(donations::Column::DonatedAt)
                .order_by_desc(donations::Column::Id)
                .all(&db_tx)
                .await?;

            let mut history = Vec::with_capacity(rows.len());
            for (donation_model, campaign_model) in rows {
                let campaign_title = campaign_model
                    .ok_or_else(|| {
                        EngineError::CampaignNotFound("campaign not exists".to_string())
                    })?
                    .title;
                history.push(DonationView {
                    donation: Donation::try_from(donation_model)?,
                    donor_name: user.name.clone(),
                    campaign_title,
                });
            }

            Ok(UserReport {
                user,
                total_donated: Amount::new(total_minor),
                total_donations: count.max(0) as u64,
                history,
            })
        })
    }
}

fn donor_views(
    rows: Vec<(donations::Model, Option<users::Model>)>,
    campaign_title: &str,
) -> ResultEngine<Vec<DonationView>> {
    let mut out = Vec::with_capacity(rows.len());
    for (donation_model, user_model) in rows {
        let donor_name = user_model
            .ok_or_else(|| EngineError::UserNotFound("user not exists".to_string()))?
            .name;
        out.push(DonationView {
            donation: Donation::try_from(donation_model)?,
            donor_name,
            campaign_title: campaign_title.to_string(),
        });
    }
    Ok(out)
}
