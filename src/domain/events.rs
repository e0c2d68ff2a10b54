//! Decoded protocol events as delivered by the event source.
//!
//! One JSON object per log:
//!
//! ```json
//! { "meta": { "txHash": "0x..", "logIndex": 3, "blockNumber": 100,
//!             "timestamp": 1700000000, "address": "0x..", "from": "0x.." },
//!   "event": { "type": "AdapterBlacklist.AddressesAdded",
//!              "comptrollerProxy": "0x..", "items": ["0x.."] } }
//! ```
//!
//! Integer quantities stay raw decimal strings here; handlers scale them.

use super::{Address, EventMeta};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub meta: EventMeta,
    pub event: ProtocolEvent,
}

impl LogEvent {
    pub fn event_id(&self) -> String {
        self.meta.event_id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolEvent {
    #[serde(rename = "FundDeployer.NewFundCreated")]
    NewFundCreated(NewFundCreated),
    #[serde(rename = "FeeManager.FeeRegistered")]
    FeeRegistered(FeeRegistered),
    #[serde(rename = "PolicyManager.PolicyRegistered")]
    PolicyRegistered(PolicyRegistered),
    #[serde(rename = "IntegrationManager.AdapterRegistered")]
    AdapterRegistered(AdapterRegistered),

    #[serde(rename = "ManagementFee.FundSettingsAdded")]
    ManagementFeeSettingsAdded(FeeSettingsAdded),
    #[serde(rename = "ManagementFee.Settled")]
    ManagementFeeSettled(FeeSettled),
    #[serde(rename = "PerformanceFee.FundSettingsAdded")]
    PerformanceFeeSettingsAdded(FeeSettingsAdded),
    #[serde(rename = "PerformanceFee.Settled")]
    PerformanceFeeSettled(FeeSettled),
    #[serde(rename = "EntranceRateBurnFee.FundSettingsAdded")]
    EntranceRateBurnFeeSettingsAdded(FeeSettingsAdded),
    #[serde(rename = "EntranceRateBurnFee.Settled")]
    EntranceRateBurnFeeSettled(FeeSettled),
    #[serde(rename = "EntranceRateDirectFee.FundSettingsAdded")]
    EntranceRateDirectFeeSettingsAdded(FeeSettingsAdded),
    #[serde(rename = "EntranceRateDirectFee.Settled")]
    EntranceRateDirectFeeSettled(FeeSettled),

    #[serde(rename = "AdapterBlacklist.AddressesAdded")]
    AdapterBlacklistAddressesAdded(AddressListChange),
    #[serde(rename = "AdapterBlacklist.AddressesRemoved")]
    AdapterBlacklistAddressesRemoved(AddressListChange),
    #[serde(rename = "AdapterWhitelist.AddressesAdded")]
    AdapterWhitelistAddressesAdded(AddressListChange),
    #[serde(rename = "AdapterWhitelist.AddressesRemoved")]
    AdapterWhitelistAddressesRemoved(AddressListChange),

    #[serde(rename = "SharesRequestor.RequestCreated")]
    RequestCreated(SharesRequestTerms),
    #[serde(rename = "SharesRequestor.RequestCanceled")]
    RequestCanceled(SharesRequestTerms),
    #[serde(rename = "SharesRequestor.RequestExecuted")]
    RequestExecuted(SharesRequestTerms),
    #[serde(rename = "SharesRequestor.RequestExecutorAdded")]
    RequestExecutorAdded(RequestExecutorChange),
    #[serde(rename = "SharesRequestor.RequestExecutorRemoved")]
    RequestExecutorRemoved(RequestExecutorChange),
}

impl ProtocolEvent {
    /// Qualified `Contract.Event` name, also used as the audit record kind.
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolEvent::NewFundCreated(_) => "FundDeployer.NewFundCreated",
            ProtocolEvent::FeeRegistered(_) => "FeeManager.FeeRegistered",
            ProtocolEvent::PolicyRegistered(_) => "PolicyManager.PolicyRegistered",
            ProtocolEvent::AdapterRegistered(_) => "IntegrationManager.AdapterRegistered",
            ProtocolEvent::ManagementFeeSettingsAdded(_) => "ManagementFee.FundSettingsAdded",
            ProtocolEvent::ManagementFeeSettled(_) => "ManagementFee.Settled",
            ProtocolEvent::PerformanceFeeSettingsAdded(_) => "PerformanceFee.FundSettingsAdded",
            ProtocolEvent::PerformanceFeeSettled(_) => "PerformanceFee.Settled",
            ProtocolEvent::EntranceRateBurnFeeSettingsAdded(_) => {
                "EntranceRateBurnFee.FundSettingsAdded"
            }
            ProtocolEvent::EntranceRateBurnFeeSettled(_) => "EntranceRateBurnFee.Settled",
            ProtocolEvent::EntranceRateDirectFeeSettingsAdded(_) => {
                "EntranceRateDirectFee.FundSettingsAdded"
            }
            ProtocolEvent::EntranceRateDirectFeeSettled(_) => "EntranceRateDirectFee.Settled",
            ProtocolEvent::AdapterBlacklistAddressesAdded(_) => "AdapterBlacklist.AddressesAdded",
            ProtocolEvent::AdapterBlacklistAddressesRemoved(_) => {
                "AdapterBlacklist.AddressesRemoved"
            }
            ProtocolEvent::AdapterWhitelistAddressesAdded(_) => "AdapterWhitelist.AddressesAdded",
            ProtocolEvent::AdapterWhitelistAddressesRemoved(_) => {
                "AdapterWhitelist.AddressesRemoved"
            }
            ProtocolEvent::RequestCreated(_) => "SharesRequestor.RequestCreated",
            ProtocolEvent::RequestCanceled(_) => "SharesRequestor.RequestCanceled",
            ProtocolEvent::RequestExecuted(_) => "SharesRequestor.RequestExecuted",
            ProtocolEvent::RequestExecutorAdded(_) => "SharesRequestor.RequestExecutorAdded",
            ProtocolEvent::RequestExecutorRemoved(_) => "SharesRequestor.RequestExecutorRemoved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFundCreated {
    pub creator: Address,
    pub vault_proxy: Address,
    pub comptroller_proxy: Address,
    pub fund_owner: Address,
    pub fund_name: String,
    pub denomination_asset: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRegistered {
    pub fee: Address,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRegistered {
    pub policy: Address,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterRegistered {
    pub adapter: Address,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSettingsAdded {
    pub comptroller_proxy: Address,
    /// Raw 18-decimal rate.
    #[serde(alias = "scaledPerSecondRate")]
    pub rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSettled {
    pub comptroller_proxy: Address,
    /// Raw 18-decimal share quantity.
    #[serde(alias = "sharesDue")]
    pub shares_quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressListChange {
    pub comptroller_proxy: Address,
    pub items: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharesRequestTerms {
    pub request_owner: Address,
    /// Raw amount in the fund's denomination asset units.
    pub investment_amount: String,
    /// Raw 18-decimal share quantity.
    pub min_shares_quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestExecutorChange {
    pub account: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"{
        "meta": {
            "txHash": "0xAB",
            "logIndex": 3,
            "blockNumber": 100,
            "timestamp": 1700000000,
            "address": "0x00000000000000000000000000000000000000a1",
            "from": "0x00000000000000000000000000000000000000f0"
        },
        "event": {
            "type": "AdapterBlacklist.AddressesAdded",
            "comptrollerProxy": "0x00000000000000000000000000000000000000c1",
            "items": ["0x00000000000000000000000000000000000000B2"]
        }
    }"#;

    #[test]
    fn test_decode_log_event() {
        let event: LogEvent = serde_json::from_str(LINE).unwrap();
        assert_eq!(event.event_id(), "0xab/3");
        assert_eq!(event.event.name(), "AdapterBlacklist.AddressesAdded");
        match event.event {
            ProtocolEvent::AdapterBlacklistAddressesAdded(change) => {
                assert_eq!(change.items.len(), 1);
                assert_eq!(
                    change.items[0].as_str(),
                    "0x00000000000000000000000000000000000000b2"
                );
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_accepts_abi_field_aliases() {
        let json = r#"{
            "type": "ManagementFee.Settled",
            "comptrollerProxy": "0x00000000000000000000000000000000000000c1",
            "sharesDue": "10000000000000000000"
        }"#;
        let event: ProtocolEvent = serde_json::from_str(json).unwrap();
        match event {
            ProtocolEvent::ManagementFeeSettled(settled) => {
                assert_eq!(settled.shares_quantity, "10000000000000000000");
                assert!(settled.payer.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let json = r#"{ "type": "Vault.Migrated" }"#;
        assert!(serde_json::from_str::<ProtocolEvent>(json).is_err());
    }

    #[test]
    fn test_name_matches_serde_tag() {
        let event: LogEvent = serde_json::from_str(LINE).unwrap();
        let value = serde_json::to_value(&event.event).unwrap();
        assert_eq!(value["type"], event.event.name());
    }
}
