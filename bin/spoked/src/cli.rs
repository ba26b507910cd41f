use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "spoked")]
#[command(
    author,
    version,
    about = "Deploy and configure a hub-and-spoke token bridge across EVM chains"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "SPOKED_VERBOSITY", default_value_t = LevelFilter::INFO, global = true)]
    pub verbosity: LevelFilter,

    /// Path to the chain registry file.
    #[arg(long, env = "SPOKED_REGISTRY", default_value = "chains.toml", global = true)]
    pub registry: PathBuf,

    /// Path to the bridge parameters file.
    #[arg(long, env = "SPOKED_PARAMS", default_value = "bridge.toml", global = true)]
    pub params: PathBuf,

    /// Path to the deployment ledger.
    #[arg(long, env = "SPOKED_LEDGER", default_value = "deployed.json", global = true)]
    pub ledger: PathBuf,

    /// Directory holding the compiled contract artifacts.
    #[arg(long, env = "SPOKED_ARTIFACTS", default_value = "artifacts", global = true)]
    pub artifacts: PathBuf,

    /// Restrict the run to the named chains. Repeatable; defaults to every
    /// chain in the registry.
    #[arg(long = "chain", global = true)]
    pub chains: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty deployment ledger for the registry's chains.
    Init,
    /// Run the deployment pipeline over the chains in scope.
    Deploy,
    /// Apply bridge configuration to deployed chains.
    Configure,
    /// Print the ledger's recorded addresses per chain.
    Status,
}
