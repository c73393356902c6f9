use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Email verification tokens for the `/api/users/confirm` flow.
///
/// The opaque token value is the primary key. A token is usable only while
/// unexpired and while its owning account is still inactive; confirmation
/// does not delete the row, it flips the account's `is_active` flag, which is
/// what makes the token single-use. Rows are never deleted, so the per-account
/// count reflects every token ever issued (the resend limit counts these).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "verification_tokens")]
pub struct Model {
    /// Opaque verification token (hex, 128 bits of entropy).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub account_id: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
