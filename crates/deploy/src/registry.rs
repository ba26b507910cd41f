//! Static description of the participating chains.
//!
//! The registry is loaded once at process start and threaded by reference
//! through every component; it never changes for the lifetime of a run.

use std::path::Path;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::RolloutError;

/// Role of a chain in the bridge topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChainRole {
    Hub,
    Spoke,
}

/// Bridge-protocol endpoint addresses on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeEndpoints {
    /// The message-relay core contract.
    pub core: Address,
    /// The relayer contract.
    pub relayer: Address,
}

/// Identity of one participating chain.
///
/// `bridge_chain_id` lives in the bridge protocol's numeric space, which is
/// distinct from the chain's native network id. `rpc_env` names the
/// environment variable holding the RPC endpoint URL, so endpoints stay out
/// of checked-in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub name: String,
    pub bridge_chain_id: u16,
    pub rpc_env: String,
    pub endpoints: BridgeEndpoints,
}

/// The validated set of chains: one hub, any number of spokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    hub: ChainDescriptor,
    #[serde(default)]
    spokes: Vec<ChainDescriptor>,
}

impl Registry {
    /// Load and validate the registry from a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RolloutError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RolloutError::Config(format!(
                "cannot read chain registry at {}: {e}",
                path.display()
            ))
        })?;
        let registry: Self = toml::from_str(&content).map_err(|e| {
            RolloutError::Config(format!("malformed chain registry at {}: {e}", path.display()))
        })?;
        registry.validate()?;
        tracing::debug!(path = %path.display(), chains = 1 + registry.spokes.len(), "Chain registry loaded");
        Ok(registry)
    }

    fn validate(&self) -> Result<(), RolloutError> {
        if self.hub.name.is_empty() {
            return Err(RolloutError::Config("hub chain has no name".to_string()));
        }
        for chain in self.chains() {
            if chain.rpc_env.is_empty() {
                return Err(RolloutError::Config(format!(
                    "chain {} has no RPC binding",
                    chain.name
                )));
            }
            let same_name = self.chains().filter(|c| c.name == chain.name).count();
            if same_name > 1 {
                return Err(RolloutError::Config(format!(
                    "duplicate chain name {}",
                    chain.name
                )));
            }
            let same_id = self
                .chains()
                .filter(|c| c.bridge_chain_id == chain.bridge_chain_id)
                .count();
            if same_id > 1 {
                return Err(RolloutError::Config(format!(
                    "duplicate bridge chain id {} ({})",
                    chain.bridge_chain_id, chain.name
                )));
            }
        }
        Ok(())
    }

    /// All chains, hub first, spokes in configured order.
    pub fn chains(&self) -> impl Iterator<Item = &ChainDescriptor> {
        std::iter::once(&self.hub).chain(self.spokes.iter())
    }

    pub fn hub(&self) -> &ChainDescriptor {
        &self.hub
    }

    pub fn spokes(&self) -> &[ChainDescriptor] {
        &self.spokes
    }

    pub fn get(&self, name: &str) -> Option<&ChainDescriptor> {
        self.chains().find(|c| c.name == name)
    }

    /// Look up a chain by its bridge-protocol id.
    pub fn by_bridge_id(&self, id: u16) -> Option<&ChainDescriptor> {
        self.chains().find(|c| c.bridge_chain_id == id)
    }

    pub fn role(&self, name: &str) -> Option<ChainRole> {
        if self.hub.name == name {
            Some(ChainRole::Hub)
        } else if self.spokes.iter().any(|c| c.name == name) {
            Some(ChainRole::Spoke)
        } else {
            None
        }
    }

}
