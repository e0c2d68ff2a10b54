pub mod funds;
pub mod health;
pub mod payouts;
pub mod settings;
pub mod shares;
pub mod status;

use crate::db::Repository;
use crate::domain::Address;
use crate::error::AppError;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/status", get(status::get_status))
        .route("/v1/funds/:id", get(funds::get_fund))
        .route("/v1/funds/:id/fee-payouts", get(payouts::list_fee_payouts))
        .route(
            "/v1/funds/:id/shares-requests",
            get(shares::list_shares_requests),
        )
        .route("/v1/funds/:id/settings", get(settings::get_settings))
        // Payout ids are slash-separated keys.
        .route("/v1/fee-payouts/*id", get(payouts::get_fee_payout))
        .layer(cors)
        .with_state(state)
}

/// Fund ids are lowercase vault addresses.
fn parse_fund_id(raw: &str) -> Result<Address, AppError> {
    Address::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}
