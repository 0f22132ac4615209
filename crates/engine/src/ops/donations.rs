use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sea_orm::{
    Condition, DbErr, QueryFilter, QueryOrder, QuerySelect, RuntimeErr, TransactionTrait,
    prelude::*,
};

use crate::{Amount, CampaignStatus, Donation, EngineError, ResultEngine, donations};

use super::{Engine, MIN_DONATION_MINOR, normalize_optional_text, with_tx};

/// Bounded retries for transient write conflicts (SQLite busy/locked,
/// transaction reference collisions).
const MAX_CONFLICT_RETRIES: u32 = 3;

fn is_transient_conflict(err: &DbErr) -> bool {
    let message = match err {
        DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) => {
            e.to_string()
        }
        other => other.to_string(),
    };
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database is busy")
        || message.contains("transaction_ref")
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DonationsCursor {
    donated_at: DateTime<Utc>,
    donation_id: String,
}

impl DonationsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid donations cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid donations cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid donations cursor".to_string()))
    }
}

impl Engine {
    /// Moves `amount` from a user's wallet into a campaign as one settled
    /// donation.
    ///
    /// The debit, the ledger row, and the campaign credit commit together
    /// or not at all. Checks run in order: campaign openness (the end date
    /// itself is still open), minimum amount, then wallet funds.
    ///
    /// Transient write conflicts are retried a bounded number of times
    /// before surfacing as [`EngineError::Conflict`].
    pub async fn make_donation(
        &self,
        user_id: &str,
        campaign_id: &str,
        amount: Amount,
        payment_mode: Option<&str>,
        donated_at: DateTime<Utc>,
    ) -> ResultEngine<Donation> {
        let payment_mode = normalize_optional_text(payment_mode);
        let mut attempts = 0;
        loop {
            let result = self
                .make_donation_once(user_id, campaign_id, amount, payment_mode.clone(), donated_at)
                .await;
            match result {
                Err(EngineError::Database(ref err)) if is_transient_conflict(err) => {
                    attempts += 1;
                    if attempts > MAX_CONFLICT_RETRIES {
                        return Err(EngineError::Conflict(
                            "donation could not be committed after retries".to_string(),
                        ));
                    }
                }
                other => return other,
            }
        }
    }

    async fn make_donation_once(
        &self,
        user_id: &str,
        campaign_id: &str,
        amount: Amount,
        payment_mode: Option<String>,
        donated_at: DateTime<Utc>,
    ) -> ResultEngine<Donation> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let campaign_model = self.require_campaign(&db_tx, campaign_id).await?;

            let status = CampaignStatus::try_from(campaign_model.status.as_str())?;
            let open = status == CampaignStatus::Active
                && donated_at.date_naive() <= campaign_model.end_date;
            if !open {
                return Err(EngineError::CampaignClosed(
                    "campaign is not accepting donations".to_string(),
                ));
            }

            if amount.minor() < MIN_DONATION_MINOR {
                return Err(EngineError::InvalidAmount(format!(
                    "donation must be at least {}",
                    Amount::new(MIN_DONATION_MINOR)
                )));
            }

            self.debit_wallet(&db_tx, &user, amount).await?;

            let donation = Donation::new(
                user.id,
                campaign_model.id.clone(),
                amount,
                payment_mode,
                donated_at,
            )?;
            let model: donations::ActiveModel = (&donation).into();
            model.insert(&db_tx).await?;

            self.apply_donation_to_campaign(&db_tx, &campaign_model, amount)
                .await?;

            Ok(donation)
        })
    }

    /// Return a donation snapshot from DB.
    pub async fn donation(&self, donation_id: &str) -> ResultEngine<Donation> {
        with_tx!(self, |db_tx| {
            let model = self.require_donation(&db_tx, donation_id).await?;
            Donation::try_from(model)
        })
    }

    /// All donations recorded against a campaign, newest first.
    pub async fn list_donations_for_campaign(
        &self,
        campaign_id: &str,
    ) -> ResultEngine<Vec<Donation>> {
        with_tx!(self, |db_tx| {
            self.require_campaign(&db_tx, campaign_id).await?;
            let models = donations::Entity::find()
                .filter(donations::Column::CampaignId.eq(campaign_id.to_string()))
                .order_by_desc(donations::Column::DonatedAt)
                .order_by_desc(donations::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Donation::try_from).collect()
        })
    }

    /// A user's donation history, with cursor-based pagination.
    ///
    /// Pagination is newest to older by `(donated_at DESC, id DESC)`.
    pub async fn list_donations_for_user_page(
        &self,
        user_id: &str,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<Donation>, Option<String>)> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = donations::Entity::find()
                .filter(donations::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(donations::Column::DonatedAt)
                .order_by_desc(donations::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = DonationsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(donations::Column::DonatedAt.lt(cursor.donated_at))
                        .add(
                            Condition::all()
                                .add(donations::Column::DonatedAt.eq(cursor.donated_at))
                                .add(donations::Column::Id.lt(cursor.donation_id)),
                        ),
                );
            }

            let rows: Vec<donations::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<Donation> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                out.push(Donation::try_from(model)?);
            }

            let next_cursor = out.last().map(|d| DonationsCursor {
                donated_at: d.donated_at,
                donation_id: d.id.clone(),
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }
}
