//! Multi-chain token bridge rollout orchestrator.
//!
//! Deploys the bridge contract suite (token, manager, transceiver, their
//! proxies and the shared structs library) across a hub chain and any number
//! of spokes, records every address in a persisted ledger, and applies the
//! per-chain bridge configuration once deployment is complete. Every step is
//! idempotent against the ledger, so re-running after any failure performs
//! exactly the missing work.

pub mod artifacts;
pub mod client;
pub mod configure;
pub mod error;
pub mod evm;
pub mod ledger;
pub mod params;
pub mod pipeline;
pub mod registry;
pub mod signer;

pub use artifacts::ArtifactStore;
pub use client::{ChainClient, ContractKind, DeployRequest, SetterCall};
pub use configure::Configurator;
pub use error::RolloutError;
pub use evm::{connect, connect_all, EvmChainClient};
pub use ledger::{Artifact, ChainArtifacts, DeploymentLedger};
pub use params::{BridgeLinkConfig, BridgeParams, InboundLimit, Mode, TokenSpec};
pub use pipeline::{Sequencer, StepGroup};
pub use registry::{BridgeEndpoints, ChainDescriptor, ChainRole, Registry};
pub use signer::{ChainSigner, SignerResolver, PRIVATE_KEY_ENV};
