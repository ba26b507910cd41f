//! EVM implementation of [`ChainClient`] backed by alloy.
//!
//! One client per chain, each with its own HTTP provider and the shared
//! operator wallet. Deploys append ABI-encoded constructor arguments to the
//! linked creation code; setters go through hand-rolled `sol!` interfaces.

use std::collections::BTreeMap;

use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};
use alloy::transports::http::{Client, Http};
use anyhow::{bail, Context};

use crate::artifacts::{link, ArtifactStore};
use crate::client::{ChainClient, DeployRequest, SetterCall};
use crate::error::RolloutError;
use crate::registry::ChainDescriptor;
use crate::signer::{ChainSigner, SignerResolver};

sol! {
    interface INttToken {
        function setMinter(address newMinter);
    }

    interface INttManager {
        function setTransceiver(address transceiver);
        function setOutboundLimit(uint256 limit);
        function setInboundLimit(uint256 limit, uint16 chainId);
        function setThreshold(uint8 threshold);
    }

    interface IInitialize {
        function initialize();
    }
}

impl SetterCall {
    /// ABI-encoded calldata for this setter.
    pub fn calldata(&self) -> Bytes {
        match *self {
            SetterCall::SetMinter(minter) => {
                INttToken::setMinterCall { newMinter: minter }.abi_encode()
            }
            SetterCall::SetTransceiver(transceiver) => {
                INttManager::setTransceiverCall { transceiver }.abi_encode()
            }
            SetterCall::SetOutboundLimit(limit) => {
                INttManager::setOutboundLimitCall { limit }.abi_encode()
            }
            SetterCall::SetInboundLimit { chain_id, limit } => {
                INttManager::setInboundLimitCall {
                    limit,
                    chainId: chain_id,
                }
                .abi_encode()
            }
            SetterCall::SetThreshold(threshold) => {
                INttManager::setThresholdCall { threshold }.abi_encode()
            }
        }
        .into()
    }
}

/// A connected chain: provider, wallet, and the artifact store to deploy
/// from.
pub struct EvmChainClient<P> {
    chain: String,
    provider: P,
    artifacts: ArtifactStore,
}

/// Build a client for one chain from its resolved signer.
pub fn connect(
    signer: ChainSigner,
    artifacts: ArtifactStore,
) -> EvmChainClient<impl Provider<Http<Client>>> {
    let ChainSigner {
        chain,
        signer,
        rpc_url,
    } = signer;
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(rpc_url);
    EvmChainClient {
        chain,
        provider,
        artifacts,
    }
}

/// Connect a client for every listed chain with the shared operator key.
pub fn connect_all<'a>(
    resolver: &SignerResolver,
    chains: impl IntoIterator<Item = &'a ChainDescriptor>,
    artifacts: &ArtifactStore,
) -> Result<BTreeMap<String, EvmChainClient<impl Provider<Http<Client>>>>, RolloutError> {
    let mut clients = BTreeMap::new();
    for chain in chains {
        let signer = resolver.resolve(chain)?;
        clients.insert(chain.name.clone(), connect(signer, artifacts.clone()));
    }
    Ok(clients)
}

impl<P: Provider<Http<Client>>> EvmChainClient<P> {
    /// Linked creation code plus ABI-encoded constructor arguments.
    fn init_code(&self, request: &DeployRequest) -> anyhow::Result<Vec<u8>> {
        let kind = request.kind();
        let bytecode = self.artifacts.creation_code(kind)?;

        let bytecode = match request {
            DeployRequest::Manager { structs_lib, .. }
            | DeployRequest::Transceiver { structs_lib, .. } => link(&bytecode, structs_lib),
            _ => bytecode,
        };

        let mut code = hex::decode(bytecode.trim_start_matches("0x"))
            .with_context(|| format!("{kind} bytecode is not valid hex"))?;

        let ctor_args = match request.clone() {
            DeployRequest::HubToken {
                name,
                symbol,
                owner,
                minter,
            } => (name, symbol, owner, minter).abi_encode_params(),
            DeployRequest::SpokeToken {
                name,
                symbol,
                minter,
                owner,
            } => (name, symbol, minter, owner).abi_encode_params(),
            DeployRequest::TransceiverStructs => Vec::new(),
            DeployRequest::Manager {
                token,
                mode,
                chain_id,
                rate_limit_duration,
                skip_rate_limit,
                ..
            } => (token, mode as u16, chain_id, rate_limit_duration, skip_rate_limit)
                .abi_encode_params(),
            DeployRequest::Transceiver {
                manager_proxy,
                core,
                relayer,
                special_relayer,
                consistency_level,
                gas_limit,
                ..
            } => (
                manager_proxy,
                core,
                relayer,
                special_relayer,
                consistency_level as u16,
                U256::from(gas_limit),
            )
                .abi_encode_params(),
            DeployRequest::Proxy { implementation } => {
                // The proxy constructor runs initialize() on the
                // implementation in the same transaction.
                let init: Bytes = IInitialize::initializeCall {}.abi_encode().into();
                (implementation, init).abi_encode_params()
            }
        };
        code.extend_from_slice(&ctor_args);
        Ok(code)
    }
}

impl<P: Provider<Http<Client>> + Sync> ChainClient for EvmChainClient<P> {
    async fn deploy(&self, request: DeployRequest) -> anyhow::Result<Address> {
        let kind = request.kind();
        let code = self.init_code(&request)?;

        let tx = TransactionRequest::default().with_deploy_code(code);
        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .with_context(|| format!("{}: {kind} deployment submission failed", self.chain))?
            .get_receipt()
            .await
            .with_context(|| format!("{}: {kind} deployment never confirmed", self.chain))?;

        if !receipt.status() {
            bail!(
                "{}: {kind} deployment reverted in tx {}",
                self.chain,
                receipt.transaction_hash()
            );
        }
        receipt
            .contract_address()
            .with_context(|| format!("{}: {kind} receipt carries no contract address", self.chain))
    }

    async fn invoke(&self, to: Address, call: SetterCall) -> anyhow::Result<()> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(call.calldata());
        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .with_context(|| format!("{}: call to {to} failed to submit", self.chain))?
            .get_receipt()
            .await
            .with_context(|| format!("{}: call to {to} never confirmed", self.chain))?;

        if !receipt.status() {
            bail!(
                "{}: call to {to} reverted in tx {}",
                self.chain,
                receipt.transaction_hash()
            );
        }
        Ok(())
    }
}
