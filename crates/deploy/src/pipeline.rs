//! The deployment pipeline.
//!
//! Five step groups run in a fixed order, each for the hub first and then
//! every spoke. A group only starts once the previous group has run for all
//! chains in scope, and the ledger is persisted between groups, so a crash
//! costs at most one group's worth of re-deployable work. Every step skips
//! itself when its ledger field is already populated, which makes re-running
//! the whole pipeline the recovery path for any failure.

use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::Address;
use strum::IntoEnumIterator;

use crate::client::{ChainClient, DeployRequest};
use crate::error::RolloutError;
use crate::ledger::{Artifact, DeploymentLedger};
use crate::params::BridgeParams;
use crate::registry::{ChainDescriptor, ChainRole, Registry};

/// Finality level requested from the message-relay core.
pub const CONSISTENCY_LEVEL: u8 = 200;

/// Gas limit the transceiver quotes for delivery on the peer chain.
pub const TRANSCEIVER_GAS_LIMIT: u64 = 360_000;

/// The pipeline's step groups, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum StepGroup {
    Token,
    Manager,
    ManagerProxy,
    Transceiver,
    TransceiverProxy,
}

/// Drives the deployment pipeline over a set of chains.
pub struct Sequencer<'a> {
    registry: &'a Registry,
    params: &'a BridgeParams,
    scope: BTreeSet<String>,
}

impl<'a> Sequencer<'a> {
    /// An empty `scope` means every registry chain; otherwise each name must
    /// exist in the registry.
    pub fn new(
        registry: &'a Registry,
        params: &'a BridgeParams,
        scope: &[String],
    ) -> Result<Self, RolloutError> {
        let scope = if scope.is_empty() {
            registry.chains().map(|c| c.name.clone()).collect()
        } else {
            let mut set = BTreeSet::new();
            for name in scope {
                if registry.get(name).is_none() {
                    return Err(RolloutError::Config(format!(
                        "scoped chain {name} is not in the registry"
                    )));
                }
                set.insert(name.clone());
            }
            set
        };
        Ok(Self {
            registry,
            params,
            scope,
        })
    }

    /// Run every step group over every in-scope chain.
    ///
    /// A failing step halts that chain for the rest of the run; other chains
    /// continue. The first failure is returned after the run completes, and
    /// the ledger keeps everything that succeeded before it.
    pub async fn run<C: ChainClient>(
        &self,
        ledger: &mut DeploymentLedger,
        clients: &BTreeMap<String, C>,
    ) -> Result<(), RolloutError> {
        // Every scoped chain needs a client before the first transaction
        // goes out; discovering a missing one mid-group would leave
        // freshly deployed addresses unpersisted.
        for name in &self.scope {
            if !clients.contains_key(name) {
                return Err(RolloutError::Config(format!(
                    "no client connected for chain {name}"
                )));
            }
        }

        let mut halted: BTreeSet<&str> = BTreeSet::new();
        let mut first_failure = None;

        for group in StepGroup::iter() {
            for chain in self.registry.chains() {
                if !self.scope.contains(&chain.name) || halted.contains(chain.name.as_str()) {
                    continue;
                }
                let client = clients.get(&chain.name).ok_or_else(|| {
                    RolloutError::Config(format!("no client connected for chain {}", chain.name))
                })?;
                if let Err(err) = self.run_step(group, chain, ledger, client).await {
                    tracing::error!(chain = %chain.name, step = %group, error = %err, "Deployment step failed, halting this chain");
                    halted.insert(chain.name.as_str());
                    first_failure.get_or_insert(err);
                }
            }
            ledger.persist()?;
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn run_step<C: ChainClient>(
        &self,
        group: StepGroup,
        chain: &ChainDescriptor,
        ledger: &mut DeploymentLedger,
        client: &C,
    ) -> Result<(), RolloutError> {
        let name = chain.name.as_str();
        let step: &'static str = group.into();
        let config = self.params.for_chain(name).ok_or_else(|| {
            RolloutError::Config(format!("no bridge parameters configured for chain {name}"))
        })?;

        let target = match group {
            StepGroup::Token => Artifact::Token,
            StepGroup::Manager => Artifact::ManagerImpl,
            StepGroup::ManagerProxy => Artifact::ManagerProxy,
            StepGroup::Transceiver => Artifact::TransceiverImpl,
            StepGroup::TransceiverProxy => Artifact::TransceiverProxy,
        };
        if !ledger.artifact(name, target).is_empty() {
            tracing::debug!(chain = name, step, "Already deployed, skipping");
            return Ok(());
        }

        let request = match group {
            StepGroup::Token => {
                let token = &self.params.token;
                match self.registry.role(name) {
                    Some(ChainRole::Hub) => DeployRequest::HubToken {
                        name: token.name.clone(),
                        symbol: token.symbol.clone(),
                        owner: token.owner,
                        minter: token.minter,
                    },
                    _ => DeployRequest::SpokeToken {
                        name: token.name.clone(),
                        symbol: token.symbol.clone(),
                        minter: token.minter,
                        owner: token.owner,
                    },
                }
            }
            StepGroup::Manager => {
                let token = self.require(ledger, name, step, Artifact::Token)?;
                let structs_lib = match ledger.artifact(name, Artifact::StructsLib) {
                    "" => {
                        let address = client
                            .deploy(DeployRequest::TransceiverStructs)
                            .await
                            .map_err(|source| RolloutError::Chain {
                                chain: name.to_string(),
                                step,
                                source,
                            })?;
                        tracing::info!(chain = name, %address, "Transceiver structs library deployed");
                        ledger.set_artifact(name, Artifact::StructsLib, address.to_string());
                        address
                    }
                    raw => parse_address(name, raw)?,
                };
                DeployRequest::Manager {
                    token,
                    mode: config.mode.wire(),
                    chain_id: config.bridge_chain_id,
                    rate_limit_duration: config.rate_limit_duration,
                    skip_rate_limit: config.skip_rate_limit,
                    structs_lib,
                }
            }
            StepGroup::ManagerProxy => {
                let implementation = self.require(ledger, name, step, Artifact::ManagerImpl)?;
                DeployRequest::Proxy { implementation }
            }
            StepGroup::Transceiver => {
                let manager_proxy = self.require(ledger, name, step, Artifact::ManagerProxy)?;
                let structs_lib = self.require(ledger, name, step, Artifact::StructsLib)?;
                DeployRequest::Transceiver {
                    manager_proxy,
                    core: chain.endpoints.core,
                    relayer: chain.endpoints.relayer,
                    special_relayer: chain.endpoints.relayer,
                    consistency_level: CONSISTENCY_LEVEL,
                    gas_limit: TRANSCEIVER_GAS_LIMIT,
                    structs_lib,
                }
            }
            StepGroup::TransceiverProxy => {
                let implementation = self.require(ledger, name, step, Artifact::TransceiverImpl)?;
                DeployRequest::Proxy { implementation }
            }
        };

        let kind = request.kind();
        let address = client
            .deploy(request)
            .await
            .map_err(|source| RolloutError::Chain {
                chain: name.to_string(),
                step,
                source,
            })?;
        tracing::info!(chain = name, %kind, %address, "Contract deployed");
        ledger.set_artifact(name, target, address.to_string());
        Ok(())
    }

    fn require(
        &self,
        ledger: &DeploymentLedger,
        chain: &str,
        step: &'static str,
        artifact: Artifact,
    ) -> Result<Address, RolloutError> {
        match ledger.artifact(chain, artifact) {
            "" => Err(RolloutError::DependencyMissing {
                chain: chain.to_string(),
                step,
                artifact,
            }),
            raw => parse_address(chain, raw),
        }
    }
}

pub(crate) fn parse_address(chain: &str, raw: &str) -> Result<Address, RolloutError> {
    raw.parse()
        .map_err(|_| RolloutError::Config(format!("{chain}: ledger holds malformed address {raw}")))
}
