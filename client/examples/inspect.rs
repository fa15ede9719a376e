use escrow_migrate::{
    artifact::ArtifactRegistry, config::MigrateConfig, parse_address, rpc::RpcClient, Address,
    Network, Role,
};

#[tokio::main]
async fn main() {
    let mut args = std::env::args();
    // Skip the program name
    args.next();
    let address: Address = match args.next() {
        Some(address) => parse_address(&address).expect("parse escrow address"),
        _ => {
            eprintln!("Usage: inspect <escrow_address> [network]");
            std::process::exit(1);
        }
    };
    let config = MigrateConfig::resolve_config(None).expect("load config");
    let network: Network = args
        .next()
        .unwrap_or(config.network.clone())
        .parse()
        .expect("parse network");

    // Read the parties straight from the contract, no deployment record needed
    let artifact = ArtifactRegistry::new(&config.artifacts_dir)
        .require(escrow_client::ESCROW_NAME)
        .expect("require escrow artifact");
    let rpc = RpcClient::new(network.rpc_url().expect("rpc url"));
    for role in Role::ORDER {
        match escrow_client::read_party_at(&rpc, address, &artifact, role)
            .await
            .expect("read party")
        {
            Some(party) => println!("{role}: {party}"),
            None => println!("{role}: not exposed by the abi"),
        }
    }
}
