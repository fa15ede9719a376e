use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::PartyProfile;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The network connect to, options are `development` or a node url like `http://localhost:8545`,
    /// falls back to the config file
    #[arg(short, long)]
    pub network: Option<String>,

    /// Path to configuration file (TOML), defaults to `$ESCROW_MIGRATE_CONFIG` or `./escrow-migrate.toml`
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Party addresses given on the command line, each overrides config and environment
#[derive(Args, Default)]
pub struct PartyArgs {
    /// Profile name under `[profiles]` in the config file
    #[arg(long)]
    pub profile: Option<String>,
    #[arg(long)]
    pub supplier: Option<String>,
    #[arg(long)]
    pub distributor: Option<String>,
    #[arg(long)]
    pub carrier: Option<String>,
}

impl PartyArgs {
    pub fn overrides(&self) -> PartyProfile {
        PartyProfile {
            supplier: self.supplier.clone(),
            distributor: self.distributor.clone(),
            carrier: self.carrier.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the escrow contract with its supplier, distributor and carrier
    Deploy {
        /// Contract name in the artifacts directory
        #[arg(long, default_value_t = String::from("Escrow"))]
        contract_name: String,
        /// The version of the deployment, which is used to distinguish records, e.g. `v0.1.8`
        #[arg(long)]
        tag: String,
        #[command(flatten)]
        parties: PartyArgs,
        /// Who sends the deployment transaction, defaults to the node's first account
        #[arg(long)]
        from: Option<String>,
        /// Gas limit of the deployment transaction, overrides the config file
        #[arg(long)]
        gas: Option<u64>,
        /// Validate and build the transaction without sending it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Validate a party address set without touching the network
    Check {
        #[command(flatten)]
        parties: PartyArgs,
    },
    /// Show deployment records of a contract
    Records {
        #[arg(long, default_value_t = String::from("Escrow"))]
        contract_name: String,
        /// Options are `all` and `latest`
        #[arg(long, default_value_t = String::from("all"))]
        mode: String,
    },
    /// List contracts available in the artifacts directory
    Artifacts,
}
