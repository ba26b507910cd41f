//! Persisted record of every contract address produced by the rollout.
//!
//! The ledger is a plain JSON file holding one record per participating
//! chain. Fields start empty and are filled monotonically as deployment
//! steps complete; a populated field is the signal for the sequencer to
//! skip the corresponding step on re-runs. The file is deliberately
//! hand-editable: blanking a field forces redeployment of that artifact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RolloutError;

/// The artifact kinds tracked per chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Artifact {
    Token,
    ManagerImpl,
    ManagerProxy,
    TransceiverImpl,
    TransceiverProxy,
    StructsLib,
}

/// Addresses recorded for one chain. Empty string means "not deployed yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainArtifacts {
    pub token: String,
    pub manager_implementation: String,
    pub manager_proxy: String,
    pub transceiver_implementation: String,
    pub transceiver_proxy: String,
    pub structs_library: String,
}

impl ChainArtifacts {
    pub fn get(&self, kind: Artifact) -> &str {
        match kind {
            Artifact::Token => &self.token,
            Artifact::ManagerImpl => &self.manager_implementation,
            Artifact::ManagerProxy => &self.manager_proxy,
            Artifact::TransceiverImpl => &self.transceiver_implementation,
            Artifact::TransceiverProxy => &self.transceiver_proxy,
            Artifact::StructsLib => &self.structs_library,
        }
    }

    pub fn set(&mut self, kind: Artifact, address: String) {
        let slot = match kind {
            Artifact::Token => &mut self.token,
            Artifact::ManagerImpl => &mut self.manager_implementation,
            Artifact::ManagerProxy => &mut self.manager_proxy,
            Artifact::TransceiverImpl => &mut self.transceiver_implementation,
            Artifact::TransceiverProxy => &mut self.transceiver_proxy,
            Artifact::StructsLib => &mut self.structs_library,
        };
        *slot = address;
    }

    /// True once every deployment step for this chain has recorded an address.
    pub fn is_complete(&self) -> bool {
        !self.token.is_empty()
            && !self.manager_implementation.is_empty()
            && !self.manager_proxy.is_empty()
            && !self.transceiver_implementation.is_empty()
            && !self.transceiver_proxy.is_empty()
            && !self.structs_library.is_empty()
    }
}

/// On-disk shape of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerData {
    /// Name of the chain record acting as the bridge hub.
    hub: String,
    chains: BTreeMap<String, ChainArtifacts>,
}

/// The deployment ledger, bound to its backing file.
///
/// Single-writer by construction: the create-time existence check is the
/// only guard against two orchestrator runs sharing one file.
#[derive(Debug)]
pub struct DeploymentLedger {
    path: PathBuf,
    data: LedgerData,
}

impl DeploymentLedger {
    /// Create an all-empty ledger for the given chains and persist it.
    ///
    /// The first chain is marked as the hub. Fails with
    /// [`RolloutError::LedgerExists`] if the file already exists, so a live
    /// deployment can never be clobbered by a stray re-init.
    pub fn create_empty<S: AsRef<str>>(
        path: impl Into<PathBuf>,
        chains: &[S],
    ) -> Result<Self, RolloutError> {
        let path = path.into();
        if path.exists() {
            return Err(RolloutError::LedgerExists { path });
        }
        let hub = chains
            .first()
            .ok_or_else(|| RolloutError::Config("ledger needs at least one chain".to_string()))?
            .as_ref()
            .to_string();

        let mut records = BTreeMap::new();
        for chain in chains {
            records.insert(chain.as_ref().to_string(), ChainArtifacts::default());
        }

        let ledger = Self {
            path,
            data: LedgerData {
                hub,
                chains: records,
            },
        };
        ledger.persist()?;
        Ok(ledger)
    }

    /// Load a persisted ledger verbatim. No schema migration is attempted.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RolloutError> {
        let path = path.into();
        if !path.exists() {
            return Err(RolloutError::LedgerNotFound { path });
        }
        let content = std::fs::read_to_string(&path).map_err(|source| RolloutError::Io {
            path: path.clone(),
            source,
        })?;
        let data: LedgerData = serde_json::from_str(&content).map_err(|e| {
            RolloutError::Config(format!("malformed ledger at {}: {e}", path.display()))
        })?;
        Ok(Self { path, data })
    }

    /// Serialize the full ledger back to its file (total overwrite).
    pub fn persist(&self) -> Result<(), RolloutError> {
        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| RolloutError::Config(format!("ledger serialization failed: {e}")))?;
        std::fs::write(&self.path, json + "\n").map_err(|source| RolloutError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the hub chain record.
    pub fn hub(&self) -> &str {
        &self.data.hub
    }

    /// Chain names present in the ledger, in stored order.
    pub fn chains(&self) -> impl Iterator<Item = &str> {
        self.data.chains.keys().map(String::as_str)
    }

    pub fn record(&self, chain: &str) -> Option<&ChainArtifacts> {
        self.data.chains.get(chain)
    }

    /// Address recorded for (chain, kind); empty string when unset or when
    /// the chain has no record.
    pub fn artifact(&self, chain: &str, kind: Artifact) -> &str {
        self.data
            .chains
            .get(chain)
            .map(|r| r.get(kind))
            .unwrap_or("")
    }

    /// Record an address. Overwriting a non-empty field is permitted here;
    /// skip-if-populated is the sequencer's policy, not the ledger's.
    pub fn set_artifact(&mut self, chain: &str, kind: Artifact, address: String) {
        self.data
            .chains
            .entry(chain.to_string())
            .or_default()
            .set(kind, address);
    }
}
