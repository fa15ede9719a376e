use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use escrow_migrate::{
    address::parse_address,
    artifact::ArtifactRegistry,
    command::{Cli, Commands},
    config::{MigrateConfig, PartyProfile},
    escrow::DeploymentDescriptor,
    handle::*,
    object::Network,
    rpc::RpcClient,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = MigrateConfig::resolve_config(cli.config)?;
    let network: Network = cli.network.unwrap_or(config.network.clone()).try_into()?;
    let registry = ArtifactRegistry::new(&config.artifacts_dir);

    match cli.command {
        Commands::Deploy {
            contract_name,
            tag,
            parties,
            from,
            gas,
            dry_run,
        } => {
            let escrow_parties = config.resolve_parties(
                parties.profile.as_deref(),
                PartyProfile::from_env(),
                parties.overrides(),
            )?;
            let from = from
                .or(config.from.clone())
                .map(|s| parse_address(&s))
                .transpose()?;
            let options = DeployOptions {
                network: network.clone(),
                records_dir: config.records_dir.clone(),
                registry,
                descriptor: DeploymentDescriptor {
                    contract_name,
                    parties: escrow_parties,
                },
                version: tag,
                from,
                gas: gas.unwrap_or(config.gas),
                receipt_timeout: Duration::from_secs(config.confirmations_timeout_secs),
                dry_run,
            };
            let rpc = RpcClient::new(network.rpc_url()?);
            let record = deploy_escrow(&rpc, options).await?;
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Commands::Check { parties } => {
            let escrow_parties = config.resolve_parties(
                parties.profile.as_deref(),
                PartyProfile::from_env(),
                parties.overrides(),
            )?;
            for (role, address) in check_parties(&escrow_parties) {
                println!("{:<12} {address}", role.name());
            }
        }
        Commands::Records {
            contract_name,
            mode,
        } => {
            let records = list_records(
                &config.records_dir,
                &network,
                &contract_name,
                mode.try_into()?,
            )?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Artifacts => {
            for name in registry.list()? {
                println!("{name}");
            }
        }
    }
    Ok(())
}
