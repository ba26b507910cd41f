//! Error taxonomy for the rollout orchestrator.

use std::path::PathBuf;

use crate::ledger::Artifact;

/// Errors surfaced by the orchestrator core.
///
/// Every variant halts forward progress for the scope it names; nothing in
/// the core downgrades a failure to a warning. Chain-scoped variants carry
/// the chain name so an operator can diagnose and safely re-invoke.
#[derive(Debug, thiserror::Error)]
pub enum RolloutError {
    /// Malformed or missing static configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A ledger file already exists where `init` would write one.
    #[error("refusing to overwrite existing ledger at {path}")]
    LedgerExists { path: PathBuf },

    /// No ledger file found where one was expected.
    #[error("no ledger found at {path} (run init first)")]
    LedgerNotFound { path: PathBuf },

    /// A step's prerequisite ledger field is empty.
    #[error("{chain}: {step} requires a {artifact} address but the ledger has none")]
    DependencyMissing {
        chain: String,
        step: &'static str,
        artifact: Artifact,
    },

    /// No operator private key is configured for the process.
    #[error("no operator private key configured (set {0})")]
    MissingCredential(&'static str),

    /// A chain's RPC binding does not resolve to a usable endpoint.
    #[error("{chain}: RPC binding {binding} does not resolve to a valid endpoint URL")]
    MissingRpc { chain: String, binding: String },

    /// An on-chain operation failed (revert, out of gas, RPC error).
    /// Surfaced as-is; the submitted transaction is not revocable.
    #[error("{chain}: {step} failed")]
    Chain {
        chain: String,
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Reading or writing a persisted file failed.
    #[error("i/o failure at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
