use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use alloy::{network::TransactionBuilder, rpc::types::TransactionRequest};
use chrono::prelude::Utc;

use crate::{
    address::Address,
    artifact::ArtifactRegistry,
    escrow::{DeploymentDescriptor, EscrowParties, Role},
    object::*,
    rpc::{wait_for_receipt, Rpc},
};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub fn generate_deployment_record_path(
    records_dir: &Path,
    network: &Network,
    contract_name: &str,
) -> eyre::Result<PathBuf> {
    let path = records_dir.join(network.record_dir_name());
    if !path.exists() {
        fs::create_dir_all(&path)?;
    }
    Ok(path.join(format!("{contract_name}.json")))
}

pub fn save_deployment_record(path: &Path, record: DeploymentRecord) -> eyre::Result<()> {
    let mut records: Vec<DeploymentRecord> = if path.exists() {
        let content = fs::read(path)?;
        serde_json::from_slice(&content)?
    } else {
        Vec::new()
    };
    records.push(record);
    let new_content = serde_json::to_string_pretty(&records)?;
    fs::write(path, new_content)?;
    Ok(())
}

pub fn load_deployment_records(path: &Path) -> eyre::Result<Vec<DeploymentRecord>> {
    if !path.exists() {
        return Err(eyre::eyre!(
            "record file not exists: {}",
            path.to_string_lossy()
        ));
    }
    let file = fs::File::open(path)?;
    let records: Vec<DeploymentRecord> = serde_json::from_reader(file)?;
    Ok(records)
}

pub fn load_deployment_record(path: &Path) -> eyre::Result<DeploymentRecord> {
    let records = load_deployment_records(path)?;
    records.last().cloned().ok_or(eyre::eyre!("empty record"))
}

/// Everything a single escrow deployment needs, already merged from config and CLI
#[derive(Clone, Debug)]
pub struct DeployOptions {
    pub network: Network,
    pub records_dir: PathBuf,
    pub registry: ArtifactRegistry,
    pub descriptor: DeploymentDescriptor,
    pub version: String,
    pub from: Option<Address>,
    pub gas: u64,
    pub receipt_timeout: Duration,
    pub dry_run: bool,
}

/// Addresses of a validated party set, in constructor order
pub fn check_parties(parties: &EscrowParties) -> Vec<(Role, Address)> {
    Role::ORDER
        .iter()
        .map(|role| (*role, parties.get(*role)))
        .collect()
}

async fn pick_deployer<T: Rpc + ?Sized>(rpc: &T, from: Option<Address>) -> eyre::Result<Address> {
    if let Some(from) = from {
        return Ok(from);
    }
    let accounts = rpc.accounts().await?;
    accounts
        .first()
        .copied()
        .ok_or(eyre::eyre!("node exposes no accounts, pass --from"))
}

pub async fn deploy_escrow<T: Rpc + ?Sized>(
    rpc: &T,
    options: DeployOptions,
) -> eyre::Result<DeploymentRecord> {
    let DeploymentDescriptor {
        contract_name,
        parties,
    } = options.descriptor;
    // descriptors can be assembled by hand, nothing reaches the node unchecked
    let parties = EscrowParties::new(parties.supplier, parties.distributor, parties.carrier)?;
    let artifact = options.registry.require(&contract_name)?;
    artifact.check_escrow_constructor()?;
    let deployer = pick_deployer(rpc, options.from).await?;
    let creation_code = artifact.creation_code(&parties);
    let code_size = creation_code.len();
    let tx = TransactionRequest::default()
        .with_from(deployer)
        .with_deploy_code(creation_code)
        .with_gas_limit(options.gas);
    tracing::info!(
        contract = %contract_name,
        network = %options.network.record_dir_name(),
        deployer = %deployer,
        supplier = %parties.supplier,
        distributor = %parties.distributor,
        carrier = %parties.carrier,
        "deploying contract"
    );
    let mut record = DeploymentRecord {
        name: contract_name.clone(),
        date: Utc::now().to_rfc3339(),
        operation: "deploy".to_string(),
        version: options.version,
        tx_hash: None,
        contract_address: None,
        block_number: None,
        gas_used: None,
        bytecode_hash: artifact.bytecode_hash(),
        deployer,
        supplier: parties.supplier,
        distributor: parties.distributor,
        carrier: parties.carrier,
        comment: None,
    };
    if options.dry_run {
        tracing::info!(
            bytes = code_size,
            gas = options.gas,
            "dry run, transaction not sent"
        );
        return Ok(record);
    }

    let tx_hash = rpc
        .send_transaction(tx)
        .await
        .map_err(|e| e.wrap_err(format!("{contract_name} deployment rejected by node")))?;
    println!("Transaction hash: {}", tx_hash);
    let receipt = wait_for_receipt(
        rpc,
        tx_hash,
        options.receipt_timeout,
        RECEIPT_POLL_INTERVAL,
    )
    .await?;
    if !receipt.status {
        tracing::error!(tx_hash = %tx_hash, "deployment transaction reverted");
        return Err(eyre::eyre!("deployment transaction {tx_hash} reverted"));
    }
    let contract_address = receipt
        .contract_address
        .ok_or(eyre::eyre!("receipt of {tx_hash} has no contract address"))?;
    println!("{contract_name} deployed at: {contract_address}");

    record.tx_hash = Some(tx_hash);
    record.contract_address = Some(contract_address);
    record.block_number = receipt.block_number;
    record.gas_used = Some(receipt.gas_used);
    let tx_record_path =
        generate_deployment_record_path(&options.records_dir, &options.network, &contract_name)?;
    save_deployment_record(&tx_record_path, record.clone())?;
    tracing::info!(path = %tx_record_path.display(), "deployment recorded");
    Ok(record)
}

pub fn list_records(
    records_dir: &Path,
    network: &Network,
    contract_name: &str,
    mode: ListMode,
) -> eyre::Result<Vec<DeploymentRecord>> {
    let path = records_dir
        .join(network.record_dir_name())
        .join(format!("{contract_name}.json"));
    let mut records = load_deployment_records(&path)?;
    if mode == ListMode::Latest {
        records = records.pop().into_iter().collect();
    }
    Ok(records)
}
