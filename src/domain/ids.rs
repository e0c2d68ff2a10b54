//! Deterministic entity keys.
//!
//! Every accessor derives its key through these helpers so that the same
//! logical coordinates resolve to the same row regardless of which handler
//! touches the entity first.

use super::{Address, Timestamp};

/// Separator placed between key parts.
pub const KEY_SEPARATOR: &str = "/";

/// Join ordered key parts with [`KEY_SEPARATOR`].
pub fn derive_key<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Id of a single log: `txHash/logIndex`.
pub fn event_id(tx_hash: &str, log_index: u64) -> String {
    derive_key(&[tx_hash.to_lowercase(), log_index.to_string()])
}

pub fn fee_payout_id(fund: &str, timestamp: Timestamp) -> String {
    let ts = timestamp.to_string();
    derive_key(&[fund, ts.as_str(), "payout"])
}

/// One contribution row per (fund, fee, event).
pub fn individual_payout_id(fund: &str, fee: &str, event_id: &str) -> String {
    derive_key(&[fund, fee, event_id])
}

pub fn fund_state_id(fund: &str) -> String {
    derive_key(&[fund, "state"])
}

pub fn fee_state_id(fund: &str, fee: &str) -> String {
    derive_key(&[fund, fee, "state"])
}

pub fn fee_setting_id(fund: &str, fee: &str) -> String {
    derive_key(&[fund, fee])
}

pub fn address_list_setting_id(fund: &str, policy: &str) -> String {
    derive_key(&[fund, policy])
}

pub fn shares_request_id(fund: &str, account: &Address) -> String {
    derive_key(&[fund, account.as_str()])
}

pub fn shares_request_executor_id(requestor: &str, account: &Address) -> String {
    derive_key(&[requestor, account.as_str()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[test]
    fn test_derive_key_joins_in_order() {
        assert_eq!(derive_key(&["a", "b", "c"]), "a/b/c");
        assert_eq!(derive_key::<&str>(&[]), "");
        assert_eq!(derive_key(&["solo"]), "solo");
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        let parts = vec!["fund".to_string(), "123".to_string()];
        assert_eq!(derive_key(&parts), derive_key(&parts));
    }

    #[test]
    fn test_event_id_normalizes_hash_case() {
        assert_eq!(event_id("0xABC", 7), "0xabc/7");
        assert_eq!(event_id("0xabc", 7), event_id("0xABC", 7));
    }

    #[test]
    fn test_fee_payout_id_is_per_fund_and_timestamp() {
        let fund = addr(1);
        let a = fee_payout_id(fund.as_str(), Timestamp::new(100));
        let b = fee_payout_id(fund.as_str(), Timestamp::new(100));
        let c = fee_payout_id(fund.as_str(), Timestamp::new(101));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with("/100/payout"));
    }

    #[test]
    fn test_shares_request_id_pairs_fund_and_account() {
        let fund = addr(1);
        let account = addr(2);
        assert_eq!(
            shares_request_id(fund.as_str(), &account),
            format!("{}/{}", fund, account)
        );
    }
}
