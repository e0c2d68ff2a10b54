use super::{parse_fund_id, AppState};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub address_lists: Vec<AddressListDto>,
    pub fees: Vec<FeeSettingDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressListDto {
    pub policy: String,
    pub kind: String,
    pub listed: Vec<String>,
    pub adapters: Vec<String>,
    pub events: Vec<String>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSettingDto {
    pub fee: String,
    pub rate: String,
    pub events: Vec<String>,
    pub timestamp: i64,
}

pub async fn get_settings(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, AppError> {
    let fund = parse_fund_id(&id)?;

    let address_lists = state
        .repo
        .list_address_list_settings(fund.as_str())
        .await?
        .into_iter()
        .map(|s| AddressListDto {
            policy: s.policy,
            kind: s.kind.as_str().to_string(),
            listed: s.listed,
            adapters: s.adapters,
            events: s.events,
            timestamp: s.timestamp.as_i64(),
        })
        .collect();

    let fees = state
        .repo
        .list_fee_settings(fund.as_str())
        .await?
        .into_iter()
        .map(|s| FeeSettingDto {
            fee: s.fee,
            rate: s.rate.to_canonical_string(),
            events: s.events,
            timestamp: s.timestamp.as_i64(),
        })
        .collect();

    Ok(Json(SettingsResponse {
        address_lists,
        fees,
    }))
}
