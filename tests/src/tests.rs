use std::{fs, path::Path, time::Duration};

use escrow_client::{EscrowInstance, PartyMismatch};
use escrow_migrate::{
    artifact::ArtifactRegistry,
    config::{MigrateConfig, PartyProfile},
    escrow::{DeploymentDescriptor, EscrowError},
    handle::{deploy_escrow, list_records, DeployOptions},
    object::ListMode,
    rpc::{FakeRpcClient, Rpc},
    Address, EscrowParties, Network, Role,
};
use serde_json::json;

const ESCROW_BYTECODE: &str = "0x608060405234801561001057600080fd5b50";

const CONFIG: &str = r#"
artifacts_dir = "build/contracts"

[profiles.placeholder]
supplier = "0xSupplierAddress"
distributor = "0xDistributorAddress"
carrier = "0xCarrierAddress"

[profiles.ganache]
supplier = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
distributor = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
carrier = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB"
"#;

fn escrow_abi(with_getters: bool) -> serde_json::Value {
    let mut abi = vec![json!({
        "type": "constructor",
        "inputs": [
            { "name": "_supplier", "type": "address" },
            { "name": "_distributor", "type": "address" },
            { "name": "_carrier", "type": "address" }
        ],
        "stateMutability": "nonpayable"
    })];
    if with_getters {
        for role in Role::ORDER {
            abi.push(json!({
                "type": "function",
                "name": role.name(),
                "inputs": [],
                "outputs": [{ "name": "", "type": "address" }],
                "stateMutability": "view"
            }));
        }
    }
    serde_json::Value::Array(abi)
}

fn write_escrow_artifact(dir: &Path, abi: serde_json::Value) {
    let artifact = json!({
        "contractName": "Escrow",
        "abi": abi,
        "bytecode": ESCROW_BYTECODE,
        "deployedBytecode": ESCROW_BYTECODE,
    });
    fs::write(
        dir.join("Escrow.json"),
        serde_json::to_vec_pretty(&artifact).expect("serialize artifact"),
    )
    .expect("write artifact");
}

fn ganache_parties() -> EscrowParties {
    let config: MigrateConfig = toml::from_str(CONFIG).expect("parse config");
    config
        .resolve_parties(
            Some("ganache"),
            PartyProfile::default(),
            PartyProfile::default(),
        )
        .expect("ganache parties")
}

fn options(workspace: &Path, dry_run: bool) -> DeployOptions {
    DeployOptions {
        network: Network::Development,
        records_dir: workspace.join("migration"),
        registry: ArtifactRegistry::new(workspace),
        descriptor: DeploymentDescriptor {
            contract_name: "Escrow".to_string(),
            parties: ganache_parties(),
        },
        version: "v0.1.0".to_string(),
        from: None,
        gas: 3_000_000,
        receipt_timeout: Duration::from_secs(1),
        dry_run,
    }
}

#[test]
fn test_placeholder_profile_is_rejected() {
    let config: MigrateConfig = toml::from_str(CONFIG).expect("parse config");
    let err = config
        .resolve_parties(
            Some("placeholder"),
            PartyProfile::default(),
            PartyProfile::default(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("supplier"));
}

#[test]
fn test_ganache_profile_is_distinct_and_ordered() {
    let parties = ganache_parties();
    let args = parties.constructor_args();
    assert_ne!(args[0], args[1]);
    assert_ne!(args[1], args[2]);
    assert_ne!(args[0], args[2]);
    assert_eq!(args, [parties.supplier, parties.distributor, parties.carrier]);
}

#[tokio::test]
async fn test_deploy_records_and_verifies() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(true));
    let rpc = FakeRpcClient::default();

    let record = deploy_escrow(&rpc, options(workspace.path(), false))
        .await
        .expect("deploy escrow");
    let deployer = rpc.accounts().await.expect("accounts")[0];
    assert_eq!(record.deployer, deployer);
    assert_eq!(record.operation, "deploy");
    let contract_address = record.contract_address.expect("contract address");

    // creation input ends with supplier, distributor, carrier words
    let input = rpc
        .creation_input(contract_address)
        .expect("fake chain")
        .expect("contract created");
    let args = &input[input.len() - 96..];
    let decoded = EscrowParties::decode_constructor_args(args).expect("decode args");
    assert_eq!(decoded, ganache_parties());

    let records = list_records(
        &workspace.path().join("migration"),
        &Network::Development,
        "Escrow",
        ListMode::All,
    )
    .expect("records");
    assert_eq!(records, vec![record.clone()]);

    let escrow = EscrowInstance::load(
        &workspace.path().join("migration"),
        &Network::Development,
        &ArtifactRegistry::new(workspace.path()),
        "Escrow",
    )
    .expect("load escrow");
    assert!(escrow.is_deployed(&rpc).await.expect("get code"));
    let report = escrow.verify(&rpc).await.expect("verify");
    assert!(report.is_ok());
    assert_eq!(report.matched, Role::ORDER.to_vec());
}

#[tokio::test]
async fn test_second_deploy_appends_record() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(false));
    let rpc = FakeRpcClient::default();
    let first = deploy_escrow(&rpc, options(workspace.path(), false))
        .await
        .expect("first deploy");
    let mut second_options = options(workspace.path(), false);
    second_options.version = "v0.2.0".to_string();
    let second = deploy_escrow(&rpc, second_options)
        .await
        .expect("second deploy");
    assert_ne!(first.contract_address, second.contract_address);

    let latest = list_records(
        &workspace.path().join("migration"),
        &Network::Development,
        "Escrow",
        ListMode::Latest,
    )
    .expect("records");
    assert_eq!(latest, vec![second]);
}

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(false));
    let rpc = FakeRpcClient::default();
    let record = deploy_escrow(&rpc, options(workspace.path(), true))
        .await
        .expect("dry run");
    assert!(record.contract_address.is_none());
    assert!(record.tx_hash.is_none());
    assert!(!workspace.path().join("migration").exists());
}

#[tokio::test]
async fn test_rejected_deploy_is_reported() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(false));
    let rpc = FakeRpcClient::default();
    rpc.reject_next("insufficient funds for gas * price + value")
        .expect("fake chain");
    let err = deploy_escrow(&rpc, options(workspace.path(), false))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("deployment rejected by node"));
    assert!(format!("{err:?}").contains("insufficient funds"));
    assert!(!workspace
        .path()
        .join("migration/development/Escrow.json")
        .exists());
}

#[tokio::test]
async fn test_reverted_deploy_is_reported() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(false));
    let rpc = FakeRpcClient::default();
    rpc.revert_next().expect("fake chain");
    let err = deploy_escrow(&rpc, options(workspace.path(), false))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("reverted"));
}

#[tokio::test]
async fn test_unknown_sender_is_reported() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(false));
    let rpc = FakeRpcClient::default();
    let mut unknown = options(workspace.path(), false);
    unknown.from = Some(Address::repeat_byte(0xee));
    assert!(deploy_escrow(&rpc, unknown).await.is_err());
}

#[tokio::test]
async fn test_hand_built_parties_are_revalidated() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(false));
    let rpc = FakeRpcClient::default();
    let deployer = rpc.accounts().await.expect("accounts")[0];
    let ganache = ganache_parties();

    let mut forged = options(workspace.path(), false);
    forged.descriptor.parties = EscrowParties {
        supplier: ganache.supplier,
        distributor: ganache.supplier,
        carrier: Address::ZERO,
    };
    let err = deploy_escrow(&rpc, forged).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<EscrowError>(),
        Some(&EscrowError::ZeroAddress(Role::Carrier))
    );

    let mut forged = options(workspace.path(), false);
    forged.descriptor.parties.distributor = ganache.supplier;
    let err = deploy_escrow(&rpc, forged).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EscrowError>(),
        Some(EscrowError::DuplicateParty {
            first: Role::Supplier,
            second: Role::Distributor,
            ..
        })
    ));

    assert!(rpc
        .creation_input(deployer.create(0))
        .expect("fake chain")
        .is_none());
    assert!(!workspace.path().join("migration").exists());
}

#[tokio::test]
async fn test_custom_networks_keep_separate_records() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(false));
    let rpc = FakeRpcClient::default();
    let mainnet: Network = "https://rpc.example.com/mainnet".parse().expect("url");
    let sepolia: Network = "https://rpc.example.com/sepolia".parse().expect("url");
    for network in [&mainnet, &sepolia] {
        let mut custom = options(workspace.path(), false);
        custom.network = network.clone();
        deploy_escrow(&rpc, custom).await.expect("deploy escrow");
    }
    let records_dir = workspace.path().join("migration");
    for network in [&mainnet, &sepolia] {
        let records = list_records(&records_dir, network, "Escrow", ListMode::All)
            .expect("records");
        assert_eq!(records.len(), 1);
    }
}

#[tokio::test]
async fn test_permuted_abi_blocks_deploy() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let abi = json!([{
        "type": "constructor",
        "inputs": [
            { "name": "_distributor", "type": "address" },
            { "name": "_supplier", "type": "address" },
            { "name": "_carrier", "type": "address" }
        ],
        "stateMutability": "nonpayable"
    }]);
    write_escrow_artifact(workspace.path(), abi);
    let rpc = FakeRpcClient::default();
    let err = deploy_escrow(&rpc, options(workspace.path(), false))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("supplier is expected"));
}

#[tokio::test]
async fn test_verify_reports_mismatch_and_missing_getters() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_escrow_artifact(workspace.path(), escrow_abi(true));
    let rpc = FakeRpcClient::default();
    let record = deploy_escrow(&rpc, options(workspace.path(), false))
        .await
        .expect("deploy escrow");
    let contract_address = record.contract_address.expect("contract address");
    let intruder = Address::repeat_byte(0xaa);
    rpc.set_constructor_word(contract_address, 2, intruder)
        .expect("patch carrier");

    let escrow = EscrowInstance::load(
        &workspace.path().join("migration"),
        &Network::Development,
        &ArtifactRegistry::new(workspace.path()),
        "Escrow",
    )
    .expect("load escrow");
    let report = escrow.verify(&rpc).await.expect("verify");
    assert!(!report.is_ok());
    assert_eq!(
        report.mismatches,
        vec![PartyMismatch {
            role: Role::Carrier,
            recorded: record.carrier,
            on_chain: intruder,
        }]
    );

    // an abi without getters can only confirm the code is there
    write_escrow_artifact(workspace.path(), escrow_abi(false));
    let escrow = EscrowInstance::load(
        &workspace.path().join("migration"),
        &Network::Development,
        &ArtifactRegistry::new(workspace.path()),
        "Escrow",
    )
    .expect("load escrow");
    let report = escrow.verify(&rpc).await.expect("verify");
    assert!(report.is_ok());
    assert_eq!(report.unreadable, Role::ORDER.to_vec());

    rpc.set_code(contract_address, Vec::new()).expect("wipe code");
    let report = escrow.verify(&rpc).await.expect("verify");
    assert!(!report.is_ok());
    assert_eq!(report.code_size, 0);
}
