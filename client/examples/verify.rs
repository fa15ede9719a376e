use escrow_client::{EscrowInstance, ESCROW_NAME};
use escrow_migrate::{artifact::ArtifactRegistry, config::MigrateConfig, rpc::RpcClient, Network};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let mut args = std::env::args();
    // Skip the program name
    args.next();
    let contract_name = args.next().unwrap_or_else(|| ESCROW_NAME.to_string());
    let config = MigrateConfig::resolve_config(None).expect("load config");
    let network: Network = args
        .next()
        .unwrap_or(config.network.clone())
        .parse()
        .expect("parse network");

    let registry = ArtifactRegistry::new(&config.artifacts_dir);
    let escrow = EscrowInstance::load(&config.records_dir, &network, &registry, &contract_name)
        .expect("load escrow deployment");
    let rpc = RpcClient::new(network.rpc_url().expect("rpc url"));
    let report = escrow.verify(&rpc).await.expect("verify escrow");

    println!("{contract_name} at {}: {} bytes of code", report.address, report.code_size);
    for role in &report.matched {
        println!("  {role}: matches record");
    }
    for role in &report.unreadable {
        println!("  {role}: no getter in abi, skipped");
    }
    for mismatch in &report.mismatches {
        println!(
            "  {}: recorded {} but contract holds {}",
            mismatch.role, mismatch.recorded, mismatch.on_chain
        );
    }
    if !report.is_ok() {
        std::process::exit(1);
    }
}
