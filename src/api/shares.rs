use super::{parse_fund_id, AppState};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharesRequestsResponse {
    pub requests: Vec<SharesRequestDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharesRequestDto {
    pub id: String,
    pub account: String,
    pub shares_requestor: String,
    pub investment_amount: String,
    pub min_shares_quantity: String,
    pub timestamp: i64,
}

/// Pending requests, oldest first.
pub async fn list_shares_requests(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SharesRequestsResponse>, AppError> {
    let fund = parse_fund_id(&id)?;
    let requests = state
        .repo
        .list_shares_requests(fund.as_str())
        .await?
        .into_iter()
        .map(|r| SharesRequestDto {
            id: r.id,
            account: r.account,
            shares_requestor: r.shares_requestor,
            investment_amount: r.investment_amount.to_canonical_string(),
            min_shares_quantity: r.min_shares_quantity.to_canonical_string(),
            timestamp: r.timestamp.as_i64(),
        })
        .collect();

    Ok(Json(SharesRequestsResponse { requests }))
}
