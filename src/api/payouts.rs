use super::{parse_fund_id, AppState};
use crate::domain::{FeePayout, IndividualPayout};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePayoutsResponse {
    pub fee_payouts: Vec<FeePayoutDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePayoutDto {
    pub id: String,
    pub fund: String,
    pub timestamp: i64,
    pub shares: String,
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual_payouts: Option<Vec<IndividualPayoutDto>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualPayoutDto {
    pub id: String,
    pub kind: String,
    pub fee: String,
    pub shares: String,
    pub timestamp: i64,
    pub event: String,
}

impl FeePayoutDto {
    fn new(payout: FeePayout, individual: Option<Vec<IndividualPayout>>) -> Self {
        Self {
            id: payout.id,
            fund: payout.fund,
            timestamp: payout.timestamp.as_i64(),
            shares: payout.shares.to_canonical_string(),
            events: payout.events,
            individual_payouts: individual.map(|list| {
                list.into_iter()
                    .map(|p| IndividualPayoutDto {
                        id: p.id,
                        kind: p.kind.as_str().to_string(),
                        fee: p.fee,
                        shares: p.shares.to_canonical_string(),
                        timestamp: p.timestamp.as_i64(),
                        event: p.event,
                    })
                    .collect()
            }),
        }
    }
}

/// Payouts of one fund, newest first.
pub async fn list_fee_payouts(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<FeePayoutsResponse>, AppError> {
    let fund = parse_fund_id(&id)?;
    let fee_payouts = state
        .repo
        .list_fee_payouts(fund.as_str())
        .await?
        .into_iter()
        .map(|p| FeePayoutDto::new(p, None))
        .collect();

    Ok(Json(FeePayoutsResponse { fee_payouts }))
}

pub async fn get_fee_payout(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<FeePayoutDto>, AppError> {
    let id = id.trim_start_matches('/').to_lowercase();
    let payout = state
        .repo
        .get_fee_payout(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("FeePayout {}", id)))?;
    let individual = state.repo.get_individual_payouts(&payout.id).await?;

    Ok(Json(FeePayoutDto::new(payout, Some(individual))))
}
