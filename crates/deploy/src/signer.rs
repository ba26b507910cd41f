//! Operator credentials and per-chain endpoint resolution.
//!
//! One operator key signs on every chain; what varies per chain is only the
//! RPC endpoint, resolved through the environment variable the registry
//! names for it.

use alloy::signers::local::PrivateKeySigner;
use url::Url;

use crate::error::RolloutError;
use crate::registry::ChainDescriptor;

/// Environment variable holding the operator's hex private key.
pub const PRIVATE_KEY_ENV: &str = "SPOKED_PRIVATE_KEY";

/// Resolves the shared operator key into per-chain signers.
#[derive(Debug, Clone)]
pub struct SignerResolver {
    key: PrivateKeySigner,
}

/// A signer bound to one chain's RPC endpoint.
#[derive(Debug, Clone)]
pub struct ChainSigner {
    pub chain: String,
    pub signer: PrivateKeySigner,
    pub rpc_url: Url,
}

impl SignerResolver {
    /// Read the operator key from the process environment.
    pub fn from_env() -> Result<Self, RolloutError> {
        let raw = std::env::var(PRIVATE_KEY_ENV)
            .map_err(|_| RolloutError::MissingCredential(PRIVATE_KEY_ENV))?;
        let key: PrivateKeySigner = raw
            .trim()
            .parse()
            .map_err(|e| RolloutError::Config(format!("{PRIVATE_KEY_ENV} is not a valid private key: {e}")))?;
        Ok(Self { key })
    }

    pub fn new(key: PrivateKeySigner) -> Self {
        Self { key }
    }

    /// Bind the operator key to one chain's endpoint.
    pub fn resolve(&self, chain: &ChainDescriptor) -> Result<ChainSigner, RolloutError> {
        let endpoint = std::env::var(&chain.rpc_env).map_err(|_| RolloutError::MissingRpc {
            chain: chain.name.clone(),
            binding: chain.rpc_env.clone(),
        })?;
        let rpc_url = Url::parse(&endpoint).map_err(|_| RolloutError::MissingRpc {
            chain: chain.name.clone(),
            binding: chain.rpc_env.clone(),
        })?;
        tracing::debug!(chain = %chain.name, address = %self.key.address(), "Resolved chain signer");
        Ok(ChainSigner {
            chain: chain.name.clone(),
            signer: self.key.clone(),
            rpc_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::descriptor;

    fn test_resolver() -> SignerResolver {
        SignerResolver::new(PrivateKeySigner::random())
    }

    // Single test for every from_env outcome; the variable is process-wide
    // and parallel tests must not race on it.
    #[test]
    fn operator_key_is_read_from_the_environment() {
        unsafe { std::env::remove_var(PRIVATE_KEY_ENV) };
        assert!(matches!(
            SignerResolver::from_env(),
            Err(RolloutError::MissingCredential(PRIVATE_KEY_ENV))
        ));

        unsafe { std::env::set_var(PRIVATE_KEY_ENV, "not-a-key") };
        assert!(matches!(
            SignerResolver::from_env(),
            Err(RolloutError::Config(_))
        ));

        let key = PrivateKeySigner::random();
        unsafe { std::env::set_var(PRIVATE_KEY_ENV, hex::encode(key.to_bytes())) };
        let resolver = SignerResolver::from_env().unwrap();
        assert_eq!(resolver.key.address(), key.address());
        unsafe { std::env::remove_var(PRIVATE_KEY_ENV) };
    }

    #[test]
    fn unset_rpc_binding_is_missing_rpc() {
        let mut chain = descriptor("ghost", 9);
        chain.rpc_env = "SPOKED_TEST_RPC_UNSET_VAR".to_string();
        let err = test_resolver().resolve(&chain).unwrap_err();
        assert!(matches!(err, RolloutError::MissingRpc { .. }));
    }

    #[test]
    fn invalid_endpoint_url_is_missing_rpc() {
        let mut chain = descriptor("bad", 9);
        chain.rpc_env = "SPOKED_TEST_RPC_BAD_URL".to_string();
        unsafe { std::env::set_var(&chain.rpc_env, "not a url") };
        let err = test_resolver().resolve(&chain).unwrap_err();
        assert!(matches!(err, RolloutError::MissingRpc { .. }));
    }

    #[test]
    fn resolves_endpoint_from_named_variable() {
        let mut chain = descriptor("good", 9);
        chain.rpc_env = "SPOKED_TEST_RPC_GOOD_URL".to_string();
        unsafe { std::env::set_var(&chain.rpc_env, "http://127.0.0.1:8545") };
        let signer = test_resolver().resolve(&chain).unwrap();
        assert_eq!(signer.chain, "good");
        assert_eq!(signer.rpc_url.as_str(), "http://127.0.0.1:8545/");
    }
}
