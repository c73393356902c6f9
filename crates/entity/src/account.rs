use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A registered user account.
///
/// `is_active` flips true exactly once, when an email verification token is
/// confirmed. `is_subscribed` flips true when the payment gateway reports a
/// completed checkout. Both flags are monotonic; accounts are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// 128-bit random id, hex-encoded.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Stored trimmed and lowercased. Uniqueness is enforced by the store.
    #[sea_orm(unique)]
    pub email: String,

    /// Server-side PBKDF2 output. Never serialized to clients.
    pub password_hash: Vec<u8>,

    /// Per-account random salt.
    pub salt: Vec<u8>,

    pub password_iterations: i32,

    pub is_active: bool,

    pub is_subscribed: bool,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
