//! Contract reads over Ethereum JSON-RPC `eth_call`.

use super::{ContractError, ContractReader};
use crate::domain::Address;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// `getVaultProxy()` on a comptroller.
const GET_VAULT_PROXY: &str = "0xc9809187";
/// `getDenominationAsset()` on a comptroller.
const GET_DENOMINATION_ASSET: &str = "0xe269c3d6";
/// ERC-20 `decimals()`.
const DECIMALS: &str = "0x313ce567";

#[derive(Debug, Clone)]
pub struct RpcContractReader {
    client: Client,
    rpc_url: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcContractReader {
    pub fn new(rpc_url: String) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
        }
    }

    /// Execute a read-only call at `block` and return the raw return data.
    async fn eth_call(
        &self,
        to: &Address,
        data: &str,
        block: u64,
    ) -> Result<Vec<u8>, ContractError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": to.as_str(), "data": data },
                format!("0x{:x}", block)
            ]
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let response = retry(backoff, || async {
            let response = self
                .client
                .post(&self.rpc_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(ContractError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(ContractError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(ContractError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(ContractError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response.json::<RpcResponse>().await.map_err(|e| {
                backoff::Error::permanent(ContractError::Decode {
                    call: "eth_call",
                    message: e.to_string(),
                })
            })
        })
        .await?;

        if let Some(error) = response.error {
            return Err(ContractError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        let result = response.result.ok_or_else(|| ContractError::Decode {
            call: "eth_call",
            message: "missing result".to_string(),
        })?;
        decode_hex(&result)
    }
}

#[async_trait]
impl ContractReader for RpcContractReader {
    async fn vault_proxy(
        &self,
        comptroller: &Address,
        block: u64,
    ) -> Result<Address, ContractError> {
        debug!(comptroller = %comptroller, block, "getVaultProxy");
        let data = self.eth_call(comptroller, GET_VAULT_PROXY, block).await?;
        decode_address(&data, "getVaultProxy")
    }

    async fn denomination_asset(
        &self,
        comptroller: &Address,
        block: u64,
    ) -> Result<Address, ContractError> {
        debug!(comptroller = %comptroller, block, "getDenominationAsset");
        let data = self
            .eth_call(comptroller, GET_DENOMINATION_ASSET, block)
            .await?;
        decode_address(&data, "getDenominationAsset")
    }

    async fn decimals(&self, asset: &Address, block: u64) -> Result<u32, ContractError> {
        debug!(asset = %asset, block, "decimals");
        let data = self.eth_call(asset, DECIMALS, block).await?;
        decode_u32(&data, "decimals")
    }
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, ContractError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| ContractError::Decode {
        call: "eth_call",
        message: e.to_string(),
    })
}

/// First ABI word as an address (right-aligned, 12 zero bytes of padding).
fn decode_address(data: &[u8], call: &'static str) -> Result<Address, ContractError> {
    let word = first_word(data, call)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(ContractError::Decode {
            call,
            message: "address word has non-zero padding".to_string(),
        });
    }
    let hex_addr = format!("0x{}", hex::encode(&word[12..]));
    Address::parse(&hex_addr).map_err(|e| ContractError::Decode {
        call,
        message: e.to_string(),
    })
}

fn decode_u32(data: &[u8], call: &'static str) -> Result<u32, ContractError> {
    let word = first_word(data, call)?;
    if word[..28].iter().any(|b| *b != 0) {
        return Err(ContractError::Decode {
            call,
            message: "value does not fit u32".to_string(),
        });
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&word[28..]);
    Ok(u32::from_be_bytes(bytes))
}

fn first_word<'a>(data: &'a [u8], call: &'static str) -> Result<&'a [u8], ContractError> {
    data.get(..32).ok_or_else(|| ContractError::Decode {
        call,
        message: format!("expected 32 bytes, got {}", data.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(hex_str: &str) -> Vec<u8> {
        decode_hex(&format!("0x{:0>64}", hex_str)).unwrap()
    }

    #[test]
    fn test_decode_address_word() {
        let data = word("00000000000000000000000000000000000000000000000000000000000000ab");
        let addr = decode_address(&data, "getVaultProxy").unwrap();
        assert_eq!(addr.as_str(), "0x00000000000000000000000000000000000000ab");

        let data = word("ABCDEFabcdef0123456789ABCDEF0123456789ab");
        let addr = decode_address(&data, "getVaultProxy").unwrap();
        assert_eq!(addr.as_str(), "0xabcdefabcdef0123456789abcdef0123456789ab");
    }

    #[test]
    fn test_decode_address_rejects_dirty_padding() {
        let data = word("ff00000000000000000000000000000000000000000000000000000000000000");
        assert!(matches!(
            decode_address(&data, "getVaultProxy"),
            Err(ContractError::Decode { .. })
        ));
    }

    #[test]
    fn test_decode_u32() {
        assert_eq!(decode_u32(&word("12"), "decimals").unwrap(), 18);
        assert_eq!(decode_u32(&word("6"), "decimals").unwrap(), 6);
        assert!(decode_u32(&word("100000000"), "decimals").is_err());
    }

    #[test]
    fn test_short_return_data() {
        let err = decode_u32(&[0u8; 4], "decimals").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot decode decimals result: expected 32 bytes, got 4"
        );
        assert!(decode_hex("0xzz").is_err());
        assert!(decode_hex("0x").unwrap().is_empty());
    }
}
