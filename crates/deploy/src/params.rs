//! Per-chain bridge parameters and the shared token identity.
//!
//! One [`BridgeLinkConfig`] per chain drives manager deployment and the
//! final configuration pass. A chain missing its entry, or an inbound-limit
//! peer that is not part of the deployment set, is a configuration error —
//! never a silent skip.

use std::path::Path;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::RolloutError;
use crate::registry::Registry;

/// Operating mode of a chain's manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Locking,
    Burning,
}

impl Mode {
    /// Encoding used by the manager constructor.
    pub fn wire(&self) -> u8 {
        match self {
            Mode::Locking => 0,
            Mode::Burning => 1,
        }
    }
}

/// Cap on inbound transfers from one peer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundLimit {
    /// Bridge-protocol id of the peer chain.
    pub chain_id: u16,
    pub limit: u64,
}

/// Desired bridge configuration for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeLinkConfig {
    pub chain: String,
    pub mode: Mode,
    pub bridge_chain_id: u16,
    /// Rate-limit decay duration in seconds.
    pub rate_limit_duration: u64,
    /// Bypass rate limiting entirely. Test deployments only.
    #[serde(default)]
    pub skip_rate_limit: bool,
    /// Attestations required before an inbound message is accepted.
    pub threshold: u8,
    pub outbound_limit: u64,
    #[serde(default)]
    pub inbound_limits: Vec<InboundLimit>,
}

/// Token identity shared by hub and spokes. One canonical token, minted on
/// every chain and bridged burn/mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    pub minter: Address,
    pub owner: Address,
}

/// The full parameter file: the token plus one link config per chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeParams {
    pub token: TokenSpec,
    #[serde(rename = "chain")]
    pub chains: Vec<BridgeLinkConfig>,
}

impl BridgeParams {
    /// Load the parameter file and check it against the registry.
    pub fn load_from_file(
        path: impl AsRef<Path>,
        registry: &Registry,
    ) -> Result<Self, RolloutError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RolloutError::Config(format!(
                "cannot read bridge parameters at {}: {e}",
                path.display()
            ))
        })?;
        let params: Self = toml::from_str(&content).map_err(|e| {
            RolloutError::Config(format!(
                "malformed bridge parameters at {}: {e}",
                path.display()
            ))
        })?;
        params.validate(registry)?;
        tracing::debug!(path = %path.display(), "Bridge parameters loaded");
        Ok(params)
    }

    /// Cross-check against the registry: every chain has an entry, ids
    /// match, and every inbound peer is another member of the set.
    pub fn validate(&self, registry: &Registry) -> Result<(), RolloutError> {
        for descriptor in registry.chains() {
            let config = self.for_chain(&descriptor.name).ok_or_else(|| {
                RolloutError::Config(format!(
                    "no bridge parameters configured for chain {}",
                    descriptor.name
                ))
            })?;
            if config.bridge_chain_id != descriptor.bridge_chain_id {
                return Err(RolloutError::Config(format!(
                    "{}: bridge chain id {} disagrees with registry ({})",
                    descriptor.name, config.bridge_chain_id, descriptor.bridge_chain_id
                )));
            }
            for inbound in &config.inbound_limits {
                let peer = registry.by_bridge_id(inbound.chain_id);
                match peer {
                    None => {
                        return Err(RolloutError::Config(format!(
                            "{}: inbound limit names unknown peer chain id {}",
                            descriptor.name, inbound.chain_id
                        )));
                    }
                    Some(peer) if peer.name == descriptor.name => {
                        return Err(RolloutError::Config(format!(
                            "{}: inbound limit names the chain itself",
                            descriptor.name
                        )));
                    }
                    Some(_) => {}
                }
            }
        }
        for config in &self.chains {
            if registry.get(&config.chain).is_none() {
                return Err(RolloutError::Config(format!(
                    "bridge parameters name unknown chain {}",
                    config.chain
                )));
            }
        }
        Ok(())
    }

    pub fn for_chain(&self, name: &str) -> Option<&BridgeLinkConfig> {
        self.chains.iter().find(|c| c.chain == name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registry::tests::three_chain_registry;

    pub(crate) fn link(chain: &str, bridge_chain_id: u16) -> BridgeLinkConfig {
        BridgeLinkConfig {
            chain: chain.to_string(),
            mode: if chain == "hub" {
                Mode::Locking
            } else {
                Mode::Burning
            },
            bridge_chain_id,
            rate_limit_duration: 86_400,
            skip_rate_limit: false,
            threshold: 1,
            outbound_limit: 1_000,
            inbound_limits: Vec::new(),
        }
    }

    pub(crate) fn token_spec() -> TokenSpec {
        TokenSpec {
            name: "Spoked Token".to_string(),
            symbol: "SPKD".to_string(),
            minter: Address::repeat_byte(0x11),
            owner: Address::repeat_byte(0x22),
        }
    }

    pub(crate) fn three_chain_params() -> BridgeParams {
        let mut alpha = link("alpha", 2);
        alpha.inbound_limits.push(InboundLimit {
            chain_id: 1,
            limit: 500,
        });
        BridgeParams {
            token: token_spec(),
            chains: vec![link("hub", 1), alpha, link("beta", 3)],
        }
    }

    #[test]
    fn valid_params_pass_validation() {
        let registry = three_chain_registry();
        three_chain_params().validate(&registry).unwrap();
    }

    #[test]
    fn missing_chain_entry_is_rejected() {
        let registry = three_chain_registry();
        let params = BridgeParams {
            token: token_spec(),
            chains: vec![link("hub", 1), link("alpha", 2)],
        };
        let err = params.validate(&registry).unwrap_err();
        assert!(matches!(err, RolloutError::Config(_)));
        assert!(err.to_string().contains("beta"));
    }

    #[test]
    fn unknown_inbound_peer_is_rejected() {
        let registry = three_chain_registry();
        let mut params = three_chain_params();
        params.chains[0].inbound_limits.push(InboundLimit {
            chain_id: 999,
            limit: 10,
        });
        assert!(matches!(
            params.validate(&registry),
            Err(RolloutError::Config(_))
        ));
    }

    #[test]
    fn self_referential_inbound_peer_is_rejected() {
        let registry = three_chain_registry();
        let mut params = three_chain_params();
        params.chains[0].inbound_limits.push(InboundLimit {
            chain_id: 1,
            limit: 10,
        });
        assert!(matches!(
            params.validate(&registry),
            Err(RolloutError::Config(_))
        ));
    }

    #[test]
    fn mismatched_bridge_id_is_rejected() {
        let registry = three_chain_registry();
        let mut params = three_chain_params();
        params.chains[2].bridge_chain_id = 42;
        assert!(matches!(
            params.validate(&registry),
            Err(RolloutError::Config(_))
        ));
    }

    #[test]
    fn unreadable_params_file_is_a_config_error() {
        let registry = three_chain_registry();
        let err = BridgeParams::load_from_file("/nonexistent/bridge.toml", &registry).unwrap_err();
        assert!(matches!(err, RolloutError::Config(_)));
        assert!(err.to_string().contains("bridge.toml"));
    }

    #[test]
    fn parses_toml_params() {
        let toml = r#"
            [token]
            name = "Spoked Token"
            symbol = "SPKD"
            minter = "0xC5a84964846E74227535aE5750EeF546aC8C357A"
            owner = "0xC5a84964846E74227535aE5750EeF546aC8C357A"

            [[chain]]
            chain = "fuji"
            mode = "locking"
            bridge_chain_id = 6
            rate_limit_duration = 86400
            threshold = 1
            outbound_limit = 1000
            inbound_limits = [{ chain_id = 10002, limit = 500 }]
        "#;
        let params: BridgeParams = toml::from_str(toml).unwrap();
        assert_eq!(params.chains[0].mode, Mode::Locking);
        assert_eq!(params.chains[0].inbound_limits[0].limit, 500);
        assert!(!params.chains[0].skip_rate_limit);
    }
}
