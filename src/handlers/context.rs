//! Per-deployment contract context.
//!
//! Some contracts (shares requestors) are deployed per fund and the events
//! they emit do not name the fund. The deployment supplies that mapping up
//! front as a JSON object keyed by contract address:
//!
//! ```json
//! { "0x…requestor": { "vaultProxy": "0x…vault" } }
//! ```

use crate::domain::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractContext {
    pub vault_proxy: Address,
}

/// Read-only map from emitting contract to its context.
#[derive(Debug, Clone, Default)]
pub struct ContractContexts {
    contexts: HashMap<Address, ContractContext>,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read contract context file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid contract context file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ContractContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, contract: Address, context: ContractContext) -> Self {
        self.contexts.insert(contract, context);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, ContextError> {
        let contexts: HashMap<Address, ContractContext> = serde_json::from_str(raw)?;
        Ok(Self { contexts })
    }

    pub async fn load(path: &Path) -> Result<Self, ContextError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    pub fn get(&self, contract: &Address) -> Option<&ContractContext> {
        self.contexts.get(contract)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
