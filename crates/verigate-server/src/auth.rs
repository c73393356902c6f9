//! Auth gate: credential checks, session token issuance and validation, and
//! profile access for authenticated requests.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use entity::{account, Account};

use crate::config::AppConfig;
use crate::crypto;
use crate::error::ApiError;
use crate::jwt;
use crate::lifecycle::{AccountSummary, AuthenticatedAccount};
use crate::util::now_ts;
use crate::validate;

// Fed to a throwaway hash verification when the login email matches no
// account, so both failure paths pay the same PBKDF2 cost.
const DUMMY_SALT: &[u8] = &[0x5a; 64];
const DUMMY_HASH: &[u8] = &[0x00; 32];

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Name and email only; this is the shape the public profile route returns.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
}

pub fn issue_session_token(config: &AppConfig, account_id: &str) -> Result<String, ApiError> {
    let now = now_ts();
    let claims = SessionClaims {
        sub: account_id.to_string(),
        iat: now,
        exp: now + config.session_ttl.as_secs() as i64,
    };
    jwt::encode_hs256(config.jwt_secret.as_bytes(), &claims)
        .map_err(|e| ApiError::Internal(format!("Failed to sign session token: {e}")))
}

/// Password login with state gating.
///
/// Unknown email and wrong password produce the same error, so the response
/// does not leak which accounts exist. An unverified account cannot log in;
/// when subscription gating is enabled, a verified-but-unsubscribed account
/// cannot either.
pub async fn login(
    db: &DatabaseConnection,
    config: &AppConfig,
    email: &str,
    password: &str,
) -> Result<AuthenticatedAccount, ApiError> {
    let email = validate::normalize_email(email);

    let Some(account) = Account::find()
        .filter(account::Column::Email.eq(&email))
        .one(db)
        .await?
    else {
        crypto::verify_password_hash(
            password.as_bytes(),
            DUMMY_SALT,
            DUMMY_HASH,
            config.password_iterations,
        );
        return Err(ApiError::InvalidCredentials);
    };

    if !crypto::verify_password_hash(
        password.as_bytes(),
        &account.salt,
        &account.password_hash,
        account.password_iterations as u32,
    ) {
        return Err(ApiError::InvalidCredentials);
    }

    if !account.is_active {
        return Err(ApiError::NotVerified);
    }

    if config.require_subscription && !account.is_subscribed {
        return Err(ApiError::SubscriptionRequired);
    }

    let token = issue_session_token(config, &account.id)?;

    Ok(AuthenticatedAccount {
        account: (&account).into(),
        token,
    })
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Resolve the bearer token on a request to its account.
///
/// Signature and expiry problems surface as `InvalidToken`; a token whose
/// account no longer exists surfaces as `AccountNotFound`.
pub async fn authenticate(
    db: &DatabaseConnection,
    config: &AppConfig,
    headers: &HeaderMap,
) -> Result<account::Model, ApiError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(ApiError::Unauthenticated);
    };

    let claims: SessionClaims = jwt::decode_hs256(config.jwt_secret.as_bytes(), &token)
        .map_err(|_| ApiError::InvalidToken)?;

    if claims.exp <= now_ts() {
        return Err(ApiError::InvalidToken);
    }

    let Some(account) = Account::find_by_id(&claims.sub).one(db).await? else {
        return Err(ApiError::AccountNotFound);
    };

    Ok(account)
}

/// Public profile read. No identity required; any existing account id
/// resolves (preserved from the original design).
pub async fn get_profile(db: &DatabaseConnection, account_id: &str) -> Result<Profile, ApiError> {
    let Some(account) = Account::find_by_id(account_id).one(db).await? else {
        return Err(ApiError::AccountNotFound);
    };

    Ok(Profile {
        id: account.id,
        name: account.name,
        email: account.email,
    })
}

/// Rename the caller's own account.
///
/// The path target must be the caller's id; a mismatch reads the same as a
/// missing account so foreign ids are not probeable here.
pub async fn update_profile(
    db: &DatabaseConnection,
    caller: &account::Model,
    target_id: &str,
    new_name: &str,
) -> Result<AccountSummary, ApiError> {
    if target_id != caller.id {
        return Err(ApiError::AccountNotFound);
    }

    let name = validate::validate_name(new_name)?;

    let mut active: account::ActiveModel = caller.clone().into();
    active.name = Set(name);
    active.updated_at = Set(now_ts());
    let updated = active.update(db).await?;

    Ok((&updated).into())
}
