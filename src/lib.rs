pub mod address;
pub mod artifact;
pub mod command;
pub mod config;
pub mod escrow;
pub mod handle;
pub mod object;
pub mod rpc;

use std::path::Path;

pub use address::{parse_address, Address, AddressError};
pub use escrow::{EscrowParties, Role};
pub use object::{DeploymentRecord, Network};

/// Load the latest contract deployment record from the local migration directory
pub fn load_latest_contract_deployment(
    records_dir: &Path,
    network: &Network,
    contract_name: &str,
) -> eyre::Result<DeploymentRecord> {
    let path = records_dir
        .join(network.record_dir_name())
        .join(format!("{contract_name}.json"));
    handle::load_deployment_record(&path)
}
