use super::{parse_fund_id, AppState};
use crate::domain::{Fund, FundState};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundResponse {
    pub id: String,
    pub name: Option<String>,
    pub manager: Option<String>,
    pub comptroller_proxy: String,
    pub denomination_asset: Option<String>,
    pub inception: i64,
    pub state: Option<FundStateDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundStateDto {
    pub fee_payout: Option<String>,
    pub events: Vec<String>,
    pub timestamp: i64,
}

impl FundResponse {
    fn new(fund: Fund, state: Option<FundState>) -> Self {
        Self {
            id: fund.id,
            name: fund.name,
            manager: fund.manager,
            comptroller_proxy: fund.accessor,
            denomination_asset: fund.denomination_asset,
            inception: fund.inception.as_i64(),
            state: state.map(|s| FundStateDto {
                fee_payout: s.fee_payout,
                events: s.events,
                timestamp: s.timestamp.as_i64(),
            }),
        }
    }
}

pub async fn get_fund(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<FundResponse>, AppError> {
    let id = parse_fund_id(&id)?;
    let fund = state
        .repo
        .get_fund(id.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Fund {}", id)))?;
    let fund_state = state.repo.get_fund_state(&fund.id).await?;

    Ok(Json(FundResponse::new(fund, fund_state)))
}
