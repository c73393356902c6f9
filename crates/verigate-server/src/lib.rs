pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jwt;
pub mod lifecycle;
pub mod mailer;
pub mod payments;
pub mod util;
pub mod validate;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::mailer::NotificationSender;
use crate::payments::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn NotificationSender>,
    pub gateway: Arc<dyn PaymentGateway>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/users", post(handlers::accounts::register))
        .route("/api/users/login", post(handlers::accounts::login))
        .route(
            "/api/users/confirm/:email/:token",
            get(handlers::accounts::confirm_email),
        )
        .route(
            "/api/users/resend",
            post(handlers::accounts::resend_verification),
        )
        .route("/api/users/me", get(handlers::profile::me))
        .route(
            "/api/users/subscribe",
            post(handlers::subscriptions::subscribe),
        )
        .route(
            "/api/users/subscription-completed",
            post(handlers::subscriptions::subscription_completed),
        )
        .route(
            "/api/users/:id",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .with_state(state)
}
