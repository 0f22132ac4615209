//! The module contains the `User` struct and its sea-orm entity.
//!
//! A user owns a wallet balance (minor units, never negative) funded through
//! top-ups and spent through donations. The balance column is mutated only by
//! the wallet/donation operations in `ops`.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{Amount, EngineError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::InvalidUser(format!("invalid role: {other}"))),
        }
    }
}

/// A registered user with an internal wallet.
#[derive(Clone, Debug)]
pub struct User {
    /// Stable identifier, a UUID generated once at registration.
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub balance: Amount,
    pub joined_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a zero wallet balance.
    pub fn new(name: String, email: String, role: Role, joined_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            role,
            balance: Amount::ZERO,
            joined_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub balance_minor: i64,
    pub joined_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::donations::Entity")]
    Donations,
    #[sea_orm(has_many = "super::campaigns::Entity")]
    Campaigns,
}

impl Related<super::donations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donations.def()
    }
}

impl Related<super::campaigns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.clone()),
            name: ActiveValue::Set(user.name.clone()),
            email: ActiveValue::Set(user.email.clone()),
            role: ActiveValue::Set(user.role.as_str().to_string()),
            balance_minor: ActiveValue::Set(user.balance.minor()),
            joined_at: ActiveValue::Set(user.joined_at),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: Role::try_from(model.role.as_str())?,
            balance: Amount::new(model.balance_minor),
            joined_at: model.joined_at,
        })
    }
}
