use sea_orm::{ActiveValue, Statement, TransactionTrait, prelude::*};

use crate::{CampaignStatus, ResultEngine, campaigns, donations::PaymentStatus};

use super::{Engine, with_tx};

impl Engine {
    /// Recomputes every campaign's denormalized `raised` total from the
    /// settled rows of the donation ledger.
    ///
    /// - Only `paid` donations count.
    /// - An active campaign whose recomputed total meets the goal flips to
    ///   `completed`; completion is never reverted.
    /// - Cancelled campaigns keep their status.
    ///
    /// Returns the number of campaigns whose stored total was corrected.
    pub async fn reconcile_campaigns(&self) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let campaign_models: Vec<campaigns::Model> =
                campaigns::Entity::find().all(&db_tx).await?;

            let mut corrected = 0u64;
            for model in campaign_models {
                let stmt = Statement::from_sql_and_values(
                    db_tx.get_database_backend(),
                    "SELECT COALESCE(SUM(amount_minor), 0) AS total \
                     FROM donations \
                     WHERE campaign_id = ? AND status = ?",
                    vec![model.id.clone().into(), PaymentStatus::Paid.as_str().into()],
                );
                let row = db_tx.query_one(stmt).await?;
                let total_minor: i64 = row.and_then(|r| r.try_get("", "total").ok()).unwrap_or(0);

                let status = CampaignStatus::try_from(model.status.as_str())?;
                let new_status = match status {
                    CampaignStatus::Active if total_minor >= model.goal_minor => {
                        CampaignStatus::Completed
                    }
                    other => other,
                };

                if total_minor == model.raised_minor && new_status == status {
                    continue;
                }
                corrected += 1;

                let active = campaigns::ActiveModel {
                    id: ActiveValue::Set(model.id),
                    raised_minor: ActiveValue::Set(total_minor),
                    status: ActiveValue::Set(new_status.as_str().to_string()),
                    ..Default::default()
                };
                active.update(&db_tx).await?;
            }

            Ok(corrected)
        })
    }
}
