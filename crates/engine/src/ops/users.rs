use chrono::Utc;

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, Role, User, users};

use super::{Engine, normalize_required_text, with_tx};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;

impl Engine {
    /// Registers a new user with an empty wallet.
    ///
    /// Emails are stored lowercased so the unique index enforces
    /// case-insensitive uniqueness; a duplicate yields
    /// [`EngineError::ExistingKey`].
    pub async fn register_user(&self, name: &str, email: &str, role: Role) -> ResultEngine<User> {
        let name = normalize_required_text(name, "user name")?;
        if name.chars().count() < NAME_MIN || name.chars().count() > NAME_MAX {
            return Err(EngineError::InvalidUser(format!(
                "user name must be between {NAME_MIN} and {NAME_MAX} characters"
            )));
        }
        let email = normalize_required_text(email, "email")?.to_lowercase();
        if !email.contains('@') {
            return Err(EngineError::InvalidUser(
                "email must contain '@'".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email));
            }

            let user = User::new(name, email, role, Utc::now());
            let model: users::ActiveModel = (&user).into();
            model.insert(&db_tx).await?;
            Ok(user)
        })
    }

    /// Return a user snapshot from DB.
    pub async fn user(&self, user_id: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            User::try_from(model)
        })
    }

    /// Case-insensitive lookup by email.
    pub async fn user_by_email(&self, email: &str) -> ResultEngine<User> {
        let email = normalize_required_text(email, "email")?.to_lowercase();
        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(users::Column::Email.eq(email))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::UserNotFound("user not exists".to_string()))?;
            User::try_from(model)
        })
    }
}
