//! Post-deployment configuration pass.
//!
//! Runs strictly after the pipeline. A chain without a recorded manager
//! proxy is soft-skipped with zero on-chain calls, so configuration can be
//! re-run against any subset of deployed chains. Everything else about a
//! chain's record is expected to be present; a missing transceiver proxy is
//! a hard dependency failure for that chain.

use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::{Address, U256};

use crate::client::{ChainClient, SetterCall};
use crate::error::RolloutError;
use crate::ledger::{Artifact, DeploymentLedger};
use crate::params::BridgeParams;
use crate::pipeline::parse_address;
use crate::registry::{ChainDescriptor, Registry};

/// Applies each chain's bridge configuration through its manager proxy.
pub struct Configurator<'a> {
    registry: &'a Registry,
    params: &'a BridgeParams,
    scope: BTreeSet<String>,
}

impl<'a> Configurator<'a> {
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

    /// Configure every in-scope chain. A failing chain does not stop the
    /// others; the first failure is returned once all chains were attempted.
    pub async fn run<C: ChainClient>(
        &self,
        ledger: &DeploymentLedger,
        clients: &BTreeMap<String, C>,
    ) -> Result<(), RolloutError> {
        // Client coverage is checked before the first call goes out.
        for name in &self.scope {
            if !clients.contains_key(name) {
                return Err(RolloutError::Config(format!(
                    "no client connected for chain {name}"
                )));
            }
        }

        let mut first_failure = None;
        for chain in self.registry.chains() {
            if !self.scope.contains(&chain.name) {
                continue;
            }
            let client = clients.get(&chain.name).ok_or_else(|| {
                RolloutError::Config(format!("no client connected for chain {}", chain.name))
            })?;
            if let Err(err) = self.configure_chain(chain, ledger, client).await {
                tracing::error!(chain = %chain.name, error = %err, "Configuration failed for this chain");
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn configure_chain<C: ChainClient>(
        &self,
        chain: &ChainDescriptor,
        ledger: &DeploymentLedger,
        client: &C,
    ) -> Result<(), RolloutError> {
        let name = chain.name.as_str();
        let config = self.params.for_chain(name).ok_or_else(|| {
            RolloutError::Config(format!("no bridge parameters configured for chain {name}"))
        })?;

        let manager_proxy = match ledger.artifact(name, Artifact::ManagerProxy) {
            "" => {
                tracing::info!(chain = name, "No manager proxy recorded, skipping configuration");
                return Ok(());
            }
            raw => parse_address(name, raw)?,
        };

        match ledger.artifact(name, Artifact::Token) {
            "" => {
                tracing::warn!(chain = name, "No token recorded, leaving minter authority unset")
            }
            raw => {
                let token = parse_address(name, raw)?;
                self.call(name, "set-minter", client, token, SetterCall::SetMinter(manager_proxy))
                    .await?;
            }
        }

        let transceiver_proxy = match ledger.artifact(name, Artifact::TransceiverProxy) {
            "" => {
                return Err(RolloutError::DependencyMissing {
                    chain: name.to_string(),
                    step: "set-transceiver",
                    artifact: Artifact::TransceiverProxy,
                });
            }
            raw => parse_address(name, raw)?,
        };
        self.call(
            name,
            "set-transceiver",
            client,
            manager_proxy,
            SetterCall::SetTransceiver(transceiver_proxy),
        )
        .await?;

        self.call(
            name,
            "set-outbound-limit",
            client,
            manager_proxy,
            SetterCall::SetOutboundLimit(U256::from(config.outbound_limit)),
        )
        .await?;

        for inbound in &config.inbound_limits {
            self.call(
                name,
                "set-inbound-limit",
                client,
                manager_proxy,
                SetterCall::SetInboundLimit {
                    chain_id: inbound.chain_id,
                    limit: U256::from(inbound.limit),
                },
            )
            .await?;
        }

        self.call(
            name,
            "set-threshold",
            client,
            manager_proxy,
            SetterCall::SetThreshold(config.threshold),
        )
        .await?;

        tracing::info!(chain = name, "Bridge configuration applied");
        Ok(())
    }

    async fn call<C: ChainClient>(
        &self,
        chain: &str,
        step: &'static str,
        client: &C,
        to: Address,
        call: SetterCall,
    ) -> Result<(), RolloutError> {
        client
            .invoke(to, call)
            .await
            .map_err(|source| RolloutError::Chain {
                chain: chain.to_string(),
                step,
                source,
            })?;
        tracing::debug!(chain, step, %to, "Setter applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;
    use crate::client::mock::MockChain;
    use crate::params::tests::{link, token_spec};
    use crate::params::InboundLimit;
    use crate::pipeline::Sequencer;
    use crate::registry::tests::three_chain_registry;

    fn mock_clients(registry: &Registry) -> BTreeMap<String, MockChain> {
        registry
            .chains()
            .map(|c| (c.name.clone(), MockChain::default()))
            .collect()
    }

    /// Threshold 1, outbound limit 1000, hub accepts 500 inbound from alpha.
    fn end_to_end_params() -> BridgeParams {
        let mut hub = link("hub", 1);
        hub.inbound_limits.push(InboundLimit {
            chain_id: 2,
            limit: 500,
        });
        BridgeParams {
            token: token_spec(),
            chains: vec![hub, link("alpha", 2), link("beta", 3)],
        }
    }

    async fn deployed_ledger(
        dir: &TempDir,
        registry: &Registry,
        params: &BridgeParams,
        clients: &BTreeMap<String, MockChain>,
    ) -> DeploymentLedger {
        let names: Vec<_> = registry.chains().map(|c| c.name.clone()).collect();
        let mut ledger =
            DeploymentLedger::create_empty(dir.path().join("deployed.json"), &names).unwrap();
        Sequencer::new(registry, params, &[])
            .unwrap()
            .run(&mut ledger, clients)
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn undeployed_chain_gets_zero_calls() {
        let dir = TempDir::new("spoked-configure").unwrap();
        let registry = three_chain_registry();
        let params = end_to_end_params();
        let clients = mock_clients(&registry);
        let scope = vec!["hub".to_string(), "alpha".to_string()];
        let names: Vec<_> = registry.chains().map(|c| c.name.clone()).collect();
        let mut ledger =
            DeploymentLedger::create_empty(dir.path().join("deployed.json"), &names).unwrap();
        Sequencer::new(&registry, &params, &scope)
            .unwrap()
            .run(&mut ledger, &clients)
            .await
            .unwrap();

        Configurator::new(&registry, &params, &[])
            .unwrap()
            .run(&ledger, &clients)
            .await
            .unwrap();

        assert_eq!(clients["beta"].invoke_count(), 0);
        assert!(clients["hub"].invoke_count() > 0);
    }

    #[tokio::test]
    async fn call_count_matches_inbound_limit_list() {
        let dir = TempDir::new("spoked-configure").unwrap();
        let registry = three_chain_registry();
        let params = end_to_end_params();
        let clients = mock_clients(&registry);
        let ledger = deployed_ledger(&dir, &registry, &params, &clients).await;

        Configurator::new(&registry, &params, &[])
            .unwrap()
            .run(&ledger, &clients)
            .await
            .unwrap();

        // minter + transceiver + outbound + inbound list + threshold
        assert_eq!(clients["hub"].invoke_count(), 5);
        assert_eq!(clients["alpha"].invoke_count(), 4);
        assert_eq!(clients["beta"].invoke_count(), 4);
    }

    #[tokio::test]
    async fn applies_full_configuration_through_the_manager_proxy() {
        let dir = TempDir::new("spoked-configure").unwrap();
        let registry = three_chain_registry();
        let params = end_to_end_params();
        let clients = mock_clients(&registry);
        let ledger = deployed_ledger(&dir, &registry, &params, &clients).await;
        assert!(ledger.record("hub").unwrap().is_complete());

        Configurator::new(&registry, &params, &[])
            .unwrap()
            .run(&ledger, &clients)
            .await
            .unwrap();

        let token: Address = ledger.artifact("hub", Artifact::Token).parse().unwrap();
        let manager_proxy: Address =
            ledger.artifact("hub", Artifact::ManagerProxy).parse().unwrap();
        let transceiver_proxy: Address = ledger
            .artifact("hub", Artifact::TransceiverProxy)
            .parse()
            .unwrap();

        let invokes = clients["hub"].invokes();
        assert_eq!(
            invokes,
            vec![
                (token, SetterCall::SetMinter(manager_proxy)),
                (manager_proxy, SetterCall::SetTransceiver(transceiver_proxy)),
                (manager_proxy, SetterCall::SetOutboundLimit(U256::from(1_000u64))),
                (
                    manager_proxy,
                    SetterCall::SetInboundLimit {
                        chain_id: 2,
                        limit: U256::from(500u64),
                    },
                ),
                (manager_proxy, SetterCall::SetThreshold(1)),
            ]
        );
    }

    #[tokio::test]
    async fn missing_client_aborts_before_any_calls() {
        let dir = TempDir::new("spoked-configure").unwrap();
        let registry = three_chain_registry();
        let params = end_to_end_params();
        let clients = mock_clients(&registry);
        let ledger = deployed_ledger(&dir, &registry, &params, &clients).await;
        let mut configure_clients = mock_clients(&registry);
        configure_clients.remove("beta");

        let err = Configurator::new(&registry, &params, &[])
            .unwrap()
            .run(&ledger, &configure_clients)
            .await
            .unwrap_err();

        assert!(matches!(err, RolloutError::Config(_)));
        assert_eq!(configure_clients["hub"].invoke_count(), 0);
        assert_eq!(configure_clients["alpha"].invoke_count(), 0);
    }

    #[tokio::test]
    async fn failing_chain_does_not_block_the_others() {
        let dir = TempDir::new("spoked-configure").unwrap();
        let registry = three_chain_registry();
        let params = end_to_end_params();
        let clients = mock_clients(&registry);
        let ledger = deployed_ledger(&dir, &registry, &params, &clients).await;
        clients["alpha"].fail_invokes();

        let err = Configurator::new(&registry, &params, &[])
            .unwrap()
            .run(&ledger, &clients)
            .await
            .unwrap_err();

        assert!(matches!(err, RolloutError::Chain { .. }));
        assert_eq!(clients["hub"].invoke_count(), 5);
        assert_eq!(clients["beta"].invoke_count(), 4);
    }

    #[tokio::test]
    async fn missing_transceiver_proxy_is_dependency_missing() {
        let dir = TempDir::new("spoked-configure").unwrap();
        let registry = three_chain_registry();
        let params = end_to_end_params();
        let clients = mock_clients(&registry);
        let mut ledger = deployed_ledger(&dir, &registry, &params, &clients).await;
        ledger.set_artifact("beta", Artifact::TransceiverProxy, String::new());
        let configure_clients = mock_clients(&registry);

        let err = Configurator::new(&registry, &params, &[])
            .unwrap()
            .run(&ledger, &configure_clients)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RolloutError::DependencyMissing {
                artifact: Artifact::TransceiverProxy,
                ..
            }
        ));
        // The minter call lands before the dependency check fails.
        assert_eq!(configure_clients["beta"].invoke_count(), 1);
        assert_eq!(configure_clients["hub"].invoke_count(), 5);
    }
}
