use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{Amount, EngineError, ResultEngine, users};

use super::{Engine, with_tx};

impl Engine {
    /// Current wallet balance for a user.
    pub async fn wallet_balance(&self, user_id: &str) -> ResultEngine<Amount> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            Ok(Amount::new(model.balance_minor))
        })
    }

    /// Credits a user's wallet and returns the new balance.
    ///
    /// Top-up amounts must be strictly positive.
    pub async fn add_to_wallet(&self, user_id: &str, amount: Amount) -> ResultEngine<Amount> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "top-up amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let new_balance = Amount::new(model.balance_minor)
                .checked_add(amount)
                .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;

            let active = users::ActiveModel {
                id: ActiveValue::Set(model.id),
                balance_minor: ActiveValue::Set(new_balance.minor()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(new_balance)
        })
    }

    /// Whether the user's wallet covers `amount`.
    pub async fn has_sufficient_balance(
        &self,
        user_id: &str,
        amount: Amount,
    ) -> ResultEngine<bool> {
        let balance = self.wallet_balance(user_id).await?;
        Ok(balance >= amount)
    }

    /// Debits `amount` from a user's wallet inside an open transaction.
    ///
    /// Balances never go negative; a short wallet fails the whole
    /// transaction with [`EngineError::InsufficientFunds`].
    pub(super) async fn debit_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        user: &users::Model,
        amount: Amount,
    ) -> ResultEngine<Amount> {
        let balance = Amount::new(user.balance_minor);
        let new_balance = balance
            .checked_sub(amount)
            .filter(|b| b.minor() >= 0)
            .ok_or_else(|| {
                EngineError::InsufficientFunds(format!(
                    "wallet balance {balance} does not cover {amount}"
                ))
            })?;

        let active = users::ActiveModel {
            id: ActiveValue::Set(user.id.clone()),
            balance_minor: ActiveValue::Set(new_balance.minor()),
            ..Default::default()
        };
        active.update(db_tx).await?;
        Ok(new_balance)
    }
}
