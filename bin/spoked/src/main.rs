//! spoked deploys and configures a hub-and-spoke token bridge across EVM
//! chains, recording every contract address in a re-runnable ledger.

mod cli;

use anyhow::Result;
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Table};

use cli::{Cli, Command};
use spoked_deploy::{
    connect_all, Artifact, ArtifactStore, BridgeParams, ChainDescriptor, Configurator,
    DeploymentLedger, Registry, Sequencer, SignerResolver,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let registry = Registry::load_from_file(&cli.registry)?;
    let params = BridgeParams::load_from_file(&cli.params, &registry)?;

    match cli.command {
        Command::Init => {
            let names: Vec<_> = registry.chains().map(|c| c.name.clone()).collect();
            let ledger = DeploymentLedger::create_empty(&cli.ledger, &names)?;
            tracing::info!(
                path = %ledger.path().display(),
                chains = names.len(),
                "Ledger initialized"
            );
        }
        Command::Deploy => {
            let mut ledger = DeploymentLedger::load(&cli.ledger)?;
            let sequencer = Sequencer::new(&registry, &params, &cli.chains)?;
            let resolver = SignerResolver::from_env()?;
            let artifacts = ArtifactStore::new(&cli.artifacts);
            let clients = connect_all(&resolver, scoped(&registry, &cli.chains), &artifacts)?;
            sequencer.run(&mut ledger, &clients).await?;
            tracing::info!("Deployment pipeline complete");
        }
        Command::Configure => {
            let ledger = DeploymentLedger::load(&cli.ledger)?;
            let configurator = Configurator::new(&registry, &params, &cli.chains)?;
            let resolver = SignerResolver::from_env()?;
            let artifacts = ArtifactStore::new(&cli.artifacts);
            let clients = connect_all(&resolver, scoped(&registry, &cli.chains), &artifacts)?;
            configurator.run(&ledger, &clients).await?;
            tracing::info!("Bridge configuration complete");
        }
        Command::Status => {
            let ledger = DeploymentLedger::load(&cli.ledger)?;
            print_status(&registry, &ledger);
        }
    }

    Ok(())
}

fn scoped<'a>(registry: &'a Registry, scope: &[String]) -> Vec<&'a ChainDescriptor> {
    registry
        .chains()
        .filter(|c| scope.is_empty() || scope.iter().any(|s| s == &c.name))
        .collect()
}

fn print_status(registry: &Registry, ledger: &DeploymentLedger) {
    const FIELDS: [Artifact; 6] = [
        Artifact::Token,
        Artifact::ManagerImpl,
        Artifact::ManagerProxy,
        Artifact::TransceiverImpl,
        Artifact::TransceiverProxy,
        Artifact::StructsLib,
    ];

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut header = vec!["chain".to_string(), "role".to_string()];
    header.extend(FIELDS.iter().map(|f| f.to_string()));
    table.set_header(header);

    for name in ledger.chains() {
        let role = registry
            .role(name)
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut row = vec![name.to_string(), role];
        for field in FIELDS {
            let address = ledger.artifact(name, field);
            row.push(if address.is_empty() {
                "-".to_string()
            } else {
                address.to_string()
            });
        }
        table.add_row(row);
    }
    println!("{table}");
}
