//! The seam between the orchestration core and actual chain I/O.
//!
//! The sequencer and configurator only ever talk to a [`ChainClient`], so
//! their behavior is testable without a network. The real implementation
//! lives in [`crate::evm`].

use std::future::Future;

use alloy::primitives::{Address, U256};

/// Which contract a deploy request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ContractKind {
    HubToken,
    SpokeToken,
    TransceiverStructs,
    Manager,
    Transceiver,
    Erc1967Proxy,
}

/// One contract deployment with its constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployRequest {
    HubToken {
        name: String,
        symbol: String,
        owner: Address,
        minter: Address,
    },
    // Spoke token constructor takes (name, symbol, minter, owner).
    SpokeToken {
        name: String,
        symbol: String,
        minter: Address,
        owner: Address,
    },
    TransceiverStructs,
    Manager {
        token: Address,
        mode: u8,
        chain_id: u16,
        rate_limit_duration: u64,
        skip_rate_limit: bool,
        structs_lib: Address,
    },
    Transceiver {
        manager_proxy: Address,
        core: Address,
        relayer: Address,
        special_relayer: Address,
        consistency_level: u8,
        gas_limit: u64,
        structs_lib: Address,
    },
    Proxy {
        implementation: Address,
    },
}

impl DeployRequest {
    pub fn kind(&self) -> ContractKind {
        match self {
            DeployRequest::HubToken { .. } => ContractKind::HubToken,
            DeployRequest::SpokeToken { .. } => ContractKind::SpokeToken,
            DeployRequest::TransceiverStructs => ContractKind::TransceiverStructs,
            DeployRequest::Manager { .. } => ContractKind::Manager,
            DeployRequest::Transceiver { .. } => ContractKind::Transceiver,
            DeployRequest::Proxy { .. } => ContractKind::Erc1967Proxy,
        }
    }
}

/// One configuration setter on an already-deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetterCall {
    SetMinter(Address),
    SetTransceiver(Address),
    SetOutboundLimit(U256),
    SetInboundLimit { chain_id: u16, limit: U256 },
    SetThreshold(u8),
}

/// Everything the orchestrator needs from one chain: deploy a contract and
/// invoke a setter. Implementations submit the transaction, wait for the
/// receipt, and treat a reverted receipt as an error.
pub trait ChainClient {
    fn deploy(&self, request: DeployRequest) -> impl Future<Output = anyhow::Result<Address>> + Send;

    fn invoke(
        &self,
        to: Address,
        call: SetterCall,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}
