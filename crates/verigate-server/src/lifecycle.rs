//! Account lifecycle manager.
//!
//! Owns the per-account state machine (`unverified -> verified -> subscribed`,
//! both flags monotonic), verification token issuance and consumption, and the
//! partial-failure policy around email delivery. The auth gate in
//! [`crate::auth`] consults the flags this module maintains.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, SqlErr,
};
use serde::Serialize;

use entity::{account, verification_token, Account, VerificationToken};

use crate::auth;
use crate::config::AppConfig;
use crate::crypto;
use crate::error::ApiError;
use crate::mailer::NotificationSender;
use crate::payments::{CheckoutOrder, PaymentGateway};
use crate::util::{generate_account_id, generate_verification_token, now_ts, random_bytes};
use crate::validate;

const SALT_LEN: usize = 64;

/// Public account fields, safe to return to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_subscribed: bool,
}

impl From<&account::Model> for AccountSummary {
    fn from(m: &account::Model) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            email: m.email.clone(),
            is_active: m.is_active,
            is_subscribed: m.is_subscribed,
        }
    }
}

/// Account summary plus a freshly issued session token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedAccount {
    #[serde(flatten)]
    pub account: AccountSummary,
    pub token: String,
}

/// Create an account in the unverified state, issue its first verification
/// token, and email the confirmation link.
///
/// The returned session token lets the account authenticate immediately even
/// though it is unverified; login stays gated until confirmation. A delivery
/// failure surfaces as an error but does NOT roll back the account or the
/// token: resend is the recovery path.
pub async fn register(
    db: &DatabaseConnection,
    config: &AppConfig,
    mailer: &dyn NotificationSender,
    name: &str,
    email: &str,
    password: &str,
) -> Result<AuthenticatedAccount, ApiError> {
    let name = validate::validate_name(name)?;
    let email = validate::validate_email(email)?;
    validate::validate_password(password)?;

    let now = now_ts();
    let salt = random_bytes(SALT_LEN);
    let password_hash = crypto::hash_password(password.as_bytes(), &salt, config.password_iterations);

    let active = account::ActiveModel {
        id: Set(generate_account_id()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        salt: Set(salt),
        password_iterations: Set(config.password_iterations as i32),
        is_active: Set(false),
        is_subscribed: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };

    // No prior existence check: the unique email column makes the insert the
    // arbiter, so concurrent duplicate registrations cannot both succeed.
    let created = match active.insert(db).await {
        Ok(model) => model,
        Err(e) => {
            if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
                return Err(ApiError::DuplicateAccount);
            }
            return Err(e.into());
        }
    };

    let token = auth::issue_session_token(config, &created.id)?;

    issue_verification(db, config, mailer, &created).await?;

    Ok(AuthenticatedAccount {
        account: (&created).into(),
        token,
    })
}

/// Persist a new verification token for `account` and send the confirmation
/// link. Shared by register and resend.
async fn issue_verification(
    db: &DatabaseConnection,
    config: &AppConfig,
    mailer: &dyn NotificationSender,
    account: &account::Model,
) -> Result<(), ApiError> {
    let now = now_ts();
    let value = generate_verification_token();

    let token = verification_token::ActiveModel {
        id: Set(value.clone()),
        account_id: Set(account.id.clone()),
        created_at: Set(now),
        expires_at: Set(now + config.verification_ttl.as_secs() as i64),
    };
    token.insert(db).await?;

    let confirmation_url = format!(
        "{}/api/users/confirm/{}/{}",
        config.public_base_url.trim_end_matches('/'),
        account.email,
        value,
    );

    mailer
        .send_verification_link(&account.email, &account.name, &confirmation_url)
        .await
        .map_err(ApiError::Delivery)
}

/// Consume a verification token and activate its account.
///
/// An unknown and an expired token are indistinguishable to the caller. The
/// token is single-use via the owner's `is_active` check: a second attempt
/// with the same value fails with `AlreadyVerified`, never silently succeeds.
pub async fn confirm_email(db: &DatabaseConnection, token_value: &str) -> Result<String, ApiError> {
    let Some(token) = VerificationToken::find_by_id(token_value).one(db).await? else {
        return Err(ApiError::TokenNotFound);
    };

    if token.expires_at <= now_ts() {
        return Err(ApiError::TokenNotFound);
    }

    let Some(owner) = Account::find_by_id(&token.account_id).one(db).await? else {
        return Err(ApiError::AccountNotFound);
    };

    if owner.is_active {
        return Err(ApiError::AlreadyVerified);
    }

    let email = owner.email.clone();
    let mut active: account::ActiveModel = owner.into();
    active.is_active = Set(true);
    active.updated_at = Set(now_ts());
    active.update(db).await?;

    Ok(email)
}

/// Issue a replacement verification token for an unverified account.
///
/// At most one resend is allowed beyond the original token: the gate counts
/// every token ever issued for the account (token rows are never deleted, so
/// expired tokens count too) and rejects once more than one exists.
pub async fn resend_verification(
    db: &DatabaseConnection,
    config: &AppConfig,
    mailer: &dyn NotificationSender,
    email: &str,
) -> Result<(), ApiError> {
    let email = validate::normalize_email(email);

    let Some(account) = Account::find()
        .filter(account::Column::Email.eq(&email))
        .one(db)
        .await?
    else {
        return Err(ApiError::AccountNotFound);
    };

    if account.is_active {
        return Err(ApiError::AlreadyVerified);
    }

    let outstanding = VerificationToken::find()
        .filter(verification_token::Column::AccountId.eq(&account.id))
        .count(db)
        .await?;
    if outstanding > 1 {
        return Err(ApiError::ResendLimit);
    }

    issue_verification(db, config, mailer, &account).await
}

/// Payment-gateway completion callback: mark the payer's account subscribed.
///
/// The flag set is unconditional and monotonic, so replayed callbacks are
/// harmless.
pub async fn activate_subscription(
    db: &DatabaseConnection,
    payer_email: &str,
) -> Result<AccountSummary, ApiError> {
    let email = validate::normalize_email(payer_email);

    let Some(account) = Account::find()
        .filter(account::Column::Email.eq(&email))
        .one(db)
        .await?
    else {
        return Err(ApiError::AccountNotFound);
    };

    let mut active: account::ActiveModel = account.into();
    active.is_subscribed = Set(true);
    active.updated_at = Set(now_ts());
    let updated = active.update(db).await?;

    Ok((&updated).into())
}

/// Start a checkout with the payment gateway for an existing account.
pub async fn begin_checkout(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    email: &str,
    quantity: u32,
    price: &str,
    currency: &str,
) -> Result<CheckoutOrder, ApiError> {
    if quantity == 0 {
        return Err(ApiError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    if price.trim().is_empty() || currency.trim().is_empty() {
        return Err(ApiError::Validation(
            "Price and currency are required".to_string(),
        ));
    }

    let email = validate::normalize_email(email);

    if Account::find()
        .filter(account::Column::Email.eq(&email))
        .one(db)
        .await?
        .is_none()
    {
        return Err(ApiError::AccountNotFound);
    }

    gateway
        .create_order(&email, quantity, price, currency)
        .await
        .map_err(ApiError::Gateway)
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, Set};

    use entity::{verification_token, Account, VerificationToken};

    use super::*;
    use crate::db::testing::test_db;
    use crate::mailer::testing::RecordingMailer;

    async fn setup() -> (DatabaseConnection, AppConfig, RecordingMailer) {
        (test_db().await, AppConfig::testing(), RecordingMailer::default())
    }

    async fn register_ana(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &RecordingMailer,
    ) -> AuthenticatedAccount {
        register(db, config, mailer, "Ana", "ana@x.com", "secret123")
            .await
            .expect("registration should succeed")
    }

    async fn issued_token_value(db: &DatabaseConnection) -> String {
        VerificationToken::find()
            .one(db)
            .await
            .unwrap()
            .expect("a token should exist")
            .id
    }

    #[tokio::test]
    async fn register_creates_inactive_account_with_one_token() {
        let (db, config, mailer) = setup().await;

        let out = register_ana(&db, &config, &mailer).await;
        assert_eq!(out.account.email, "ana@x.com");
        assert_eq!(out.account.name, "Ana");
        assert!(!out.account.is_active);
        assert!(!out.account.is_subscribed);
        assert!(!out.token.is_empty());

        assert_eq!(Account::find().count(&db).await.unwrap(), 1);
        let tokens = VerificationToken::find().all(&db).await.unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].account_id, out.account.id);
        assert!(tokens[0].expires_at > tokens[0].created_at);

        assert_eq!(mailer.sent_count(), 1);
        let mail = mailer.last_sent().unwrap();
        assert_eq!(mail.to_email, "ana@x.com");
        assert!(mail.confirmation_url.contains(&tokens[0].id));
    }

    #[tokio::test]
    async fn register_normalizes_email() {
        let (db, config, mailer) = setup().await;

        let out = register(&db, &config, &mailer, "Ana", "  Ana@X.Com ", "secret123")
            .await
            .unwrap();
        assert_eq!(out.account.email, "ana@x.com");
    }

    #[tokio::test]
    async fn register_rejects_invalid_fields() {
        let (db, config, mailer) = setup().await;

        let cases = [
            ("ab", "ana@x.com", "secret123"),
            ("", "ana@x.com", "secret123"),
            ("Ana", "not-an-email", "secret123"),
            ("Ana", "ana@x.com", "short12"),
        ];
        for (name, email, password) in cases {
            let err = register(&db, &config, &mailer, name, email, password)
                .await
                .unwrap_err();
            assert!(
                matches!(err, ApiError::Validation(_)),
                "expected validation error for {name:?}/{email:?}"
            );
        }

        assert_eq!(Account::find().count(&db).await.unwrap(), 0);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_email_fails_and_leaves_store_unchanged() {
        let (db, config, mailer) = setup().await;

        register_ana(&db, &config, &mailer).await;
        let err = register(&db, &config, &mailer, "Other", "ana@x.com", "password9")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateAccount));

        assert_eq!(Account::find().count(&db).await.unwrap(), 1);
        assert_eq!(VerificationToken::find().count(&db).await.unwrap(), 1);
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_roll_back_account() {
        let (db, config, _) = setup().await;
        let mailer = RecordingMailer::failing();

        let err = register(&db, &config, &mailer, "Ana", "ana@x.com", "secret123")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Delivery(_)));

        // Account and token remain; resend is the recovery path.
        assert_eq!(Account::find().count(&db).await.unwrap(), 1);
        assert_eq!(VerificationToken::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn confirm_activates_account_once() {
        let (db, config, mailer) = setup().await;

        let out = register_ana(&db, &config, &mailer).await;
        let token = issued_token_value(&db).await;

        let email = confirm_email(&db, &token).await.unwrap();
        assert_eq!(email, "ana@x.com");

        let account = Account::find_by_id(&out.account.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(account.is_active);

        // Second confirmation with the same token must fail, not silently
        // succeed.
        let err = confirm_email(&db, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::AlreadyVerified));
    }

    #[tokio::test]
    async fn confirm_rejects_unknown_token() {
        let (db, _, _) = setup().await;

        let err = confirm_email(&db, "ffffffffffffffffffffffffffffffff")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::TokenNotFound));
    }

    #[tokio::test]
    async fn confirm_rejects_expired_token() {
        let (db, config, mailer) = setup().await;

        let out = register_ana(&db, &config, &mailer).await;

        let expired = verification_token::ActiveModel {
            id: Set("deadbeefdeadbeefdeadbeefdeadbeef".to_string()),
            account_id: Set(out.account.id.clone()),
            created_at: Set(now_ts() - 100_000),
            expires_at: Set(now_ts() - 10),
        };
        expired.insert(&db).await.unwrap();

        let err = confirm_email(&db, "deadbeefdeadbeefdeadbeefdeadbeef")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::TokenNotFound));
    }

    #[tokio::test]
    async fn confirm_fails_when_the_owning_account_is_gone() {
        let (db, config, mailer) = setup().await;

        let out = register_ana(&db, &config, &mailer).await;
        let token = issued_token_value(&db).await;

        // Accounts are never deleted by the service itself; simulate an
        // out-of-band removal.
        let account = Account::find_by_id(&out.account.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        account.delete(&db).await.unwrap();

        let err = confirm_email(&db, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::AccountNotFound));
    }

    #[tokio::test]
    async fn resend_allows_exactly_one_extra_token() {
        let (db, config, mailer) = setup().await;

        register_ana(&db, &config, &mailer).await;

        // One outstanding token: resend succeeds and issues token #2.
        resend_verification(&db, &config, &mailer, "ana@x.com")
            .await
            .unwrap();
        assert_eq!(VerificationToken::find().count(&db).await.unwrap(), 2);
        assert_eq!(mailer.sent_count(), 2);

        // Two outstanding tokens: limit reached.
        let err = resend_verification(&db, &config, &mailer, "ana@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ResendLimit));
        assert_eq!(VerificationToken::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn expired_tokens_still_count_toward_the_resend_limit() {
        let (db, config, mailer) = setup().await;

        let out = register_ana(&db, &config, &mailer).await;

        // The gate counts every token ever issued, expired included.
        let expired = verification_token::ActiveModel {
            id: Set("deadbeefdeadbeefdeadbeefdeadbeef".to_string()),
            account_id: Set(out.account.id.clone()),
            created_at: Set(now_ts() - 100_000),
            expires_at: Set(now_ts() - 10),
        };
        expired.insert(&db).await.unwrap();

        let err = resend_verification(&db, &config, &mailer, "ana@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ResendLimit));
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn resend_rejects_unknown_and_verified_accounts() {
        let (db, config, mailer) = setup().await;

        let err = resend_verification(&db, &config, &mailer, "nobody@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AccountNotFound));

        register_ana(&db, &config, &mailer).await;
        let token = issued_token_value(&db).await;
        confirm_email(&db, &token).await.unwrap();

        let err = resend_verification(&db, &config, &mailer, "ana@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyVerified));
    }

    #[tokio::test]
    async fn activate_subscription_is_idempotent() {
        let (db, config, mailer) = setup().await;

        register_ana(&db, &config, &mailer).await;

        let first = activate_subscription(&db, "ana@x.com").await.unwrap();
        assert!(first.is_subscribed);

        let second = activate_subscription(&db, "Ana@X.com").await.unwrap();
        assert!(second.is_subscribed);

        let err = activate_subscription(&db, "nobody@x.com").await.unwrap_err();
        assert!(matches!(err, ApiError::AccountNotFound));
    }

    #[tokio::test]
    async fn begin_checkout_requires_an_account() {
        let (db, config, mailer) = setup().await;
        let gateway = crate::payments::testing::FakeGateway;

        let err = begin_checkout(&db, &gateway, "nobody@x.com", 1, "9.99", "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AccountNotFound));

        register_ana(&db, &config, &mailer).await;
        let order = begin_checkout(&db, &gateway, "ana@x.com", 1, "9.99", "USD")
            .await
            .unwrap();
        assert!(!order.order_id.is_empty());
        assert!(!order.approval_url.is_empty());
    }

    #[tokio::test]
    async fn begin_checkout_validates_order_fields() {
        let (db, config, mailer) = setup().await;
        let gateway = crate::payments::testing::FakeGateway;

        register_ana(&db, &config, &mailer).await;

        let err = begin_checkout(&db, &gateway, "ana@x.com", 0, "9.99", "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = begin_checkout(&db, &gateway, "ana@x.com", 1, " ", "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = begin_checkout(&db, &gateway, "ana@x.com", 1, "9.99", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
