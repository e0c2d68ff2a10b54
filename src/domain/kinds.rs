//! Closed sets of fee and policy kinds.
//!
//! Identifiers arrive as strings from registration events and are parsed once
//! at the boundary. Past that point every dispatch is an exhaustive match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} identifier: {identifier}")]
pub struct UnknownKind {
    pub kind: &'static str,
    pub identifier: String,
}

/// Fee policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeKind {
    Management,
    Performance,
    EntranceRateBurn,
    EntranceRateDirect,
}

impl FeeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeKind::Management => "MANAGEMENT",
            FeeKind::Performance => "PERFORMANCE",
            FeeKind::EntranceRateBurn => "ENTRANCE_RATE_BURN",
            FeeKind::EntranceRateDirect => "ENTRANCE_RATE_DIRECT",
        }
    }
}

impl fmt::Display for FeeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANAGEMENT" => Ok(FeeKind::Management),
            "PERFORMANCE" => Ok(FeeKind::Performance),
            "ENTRANCE_RATE_BURN" => Ok(FeeKind::EntranceRateBurn),
            "ENTRANCE_RATE_DIRECT" => Ok(FeeKind::EntranceRateDirect),
            other => Err(UnknownKind {
                kind: "fee",
                identifier: other.to_string(),
            }),
        }
    }
}

/// Kind of contribution a fee settlement makes to a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutKind {
    Management,
    Performance,
}

impl PayoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutKind::Management => "management",
            PayoutKind::Performance => "performance",
        }
    }
}

impl FromStr for PayoutKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "management" => Ok(PayoutKind::Management),
            "performance" => Ok(PayoutKind::Performance),
            other => Err(UnknownKind {
                kind: "payout",
                identifier: other.to_string(),
            }),
        }
    }
}

/// Policies that keep an address membership list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyKind {
    AdapterBlacklist,
    AdapterWhitelist,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::AdapterBlacklist => "ADAPTER_BLACKLIST",
            PolicyKind::AdapterWhitelist => "ADAPTER_WHITELIST",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADAPTER_BLACKLIST" => Ok(PolicyKind::AdapterBlacklist),
            "ADAPTER_WHITELIST" => Ok(PolicyKind::AdapterWhitelist),
            other => Err(UnknownKind {
                kind: "policy",
                identifier: other.to_string(),
            }),
        }
    }
}
