use std::path::Path;

use alloy::{
    json_abi::Function, network::TransactionBuilder, rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use escrow_migrate::{
    artifact::{ArtifactRegistry, ContractArtifact},
    escrow::Escrow,
    load_latest_contract_deployment,
    rpc::Rpc,
    Address, DeploymentRecord, EscrowParties, Network, Role,
};

pub const ESCROW_NAME: &str = "Escrow";

// A zero-argument getter returning a single address
fn is_address_getter(function: &Function) -> bool {
    function.inputs.is_empty()
        && function.outputs.len() == 1
        && function.outputs[0].ty == "address"
}

/// Typed calls against an escrow at a known address
pub struct EscrowContract<'a, T: ?Sized> {
    rpc: &'a T,
    address: Address,
}

impl<'a, T: Rpc + ?Sized> EscrowContract<'a, T> {
    pub fn new(address: Address, rpc: &'a T) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn call<C: SolCall>(&self, call: C) -> eyre::Result<C::Return> {
        let tx = TransactionRequest::default()
            .with_to(self.address)
            .with_input(call.abi_encode());
        let output = self.rpc.call(tx).await?;
        Ok(C::abi_decode_returns_validate(&output)?)
    }

    pub async fn supplier(&self) -> eyre::Result<Address> {
        self.call(Escrow::supplierCall {}).await
    }

    pub async fn distributor(&self) -> eyre::Result<Address> {
        self.call(Escrow::distributorCall {}).await
    }

    pub async fn carrier(&self) -> eyre::Result<Address> {
        self.call(Escrow::carrierCall {}).await
    }

    pub async fn party(&self, role: Role) -> eyre::Result<Address> {
        match role {
            Role::Supplier => self.supplier().await,
            Role::Distributor => self.distributor().await,
            Role::Carrier => self.carrier().await,
        }
    }
}

/// Call the role getter of the contract at `address`, `None` when `artifact` declares none
pub async fn read_party_at<T: Rpc + ?Sized>(
    rpc: &T,
    address: Address,
    artifact: &ContractArtifact,
    role: Role,
) -> eyre::Result<Option<Address>> {
    if !artifact
        .function(role.name())
        .is_some_and(is_address_getter)
    {
        return Ok(None);
    }
    let party = EscrowContract::new(address, rpc).party(role).await?;
    Ok(Some(party))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyMismatch {
    pub role: Role,
    pub recorded: Address,
    pub on_chain: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub address: Address,
    pub code_size: usize,
    pub matched: Vec<Role>,
    pub unreadable: Vec<Role>,
    pub mismatches: Vec<PartyMismatch>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.code_size > 0 && self.mismatches.is_empty()
    }
}

/// Handle to a deployed escrow: its address, abi and the parties it was deployed with
#[derive(Clone, Debug)]
pub struct EscrowInstance {
    pub address: Address,
    pub artifact: ContractArtifact,
    pub parties: EscrowParties,
}

impl EscrowInstance {
    pub fn new(address: Address, artifact: ContractArtifact, parties: EscrowParties) -> Self {
        Self {
            address,
            artifact,
            parties,
        }
    }

    pub fn from_record(
        record: &DeploymentRecord,
        artifact: ContractArtifact,
    ) -> eyre::Result<Self> {
        if record.name != artifact.name {
            return Err(eyre::eyre!(
                "record is for {} but artifact is {}",
                record.name,
                artifact.name
            ));
        }
        Ok(Self::new(
            record.deployed_address()?,
            artifact,
            record.parties()?,
        ))
    }

    /// Latest recorded deployment of `contract_name` on `network`, typed by its artifact
    pub fn load(
        records_dir: &Path,
        network: &Network,
        registry: &ArtifactRegistry,
        contract_name: &str,
    ) -> eyre::Result<Self> {
        let record = load_latest_contract_deployment(records_dir, network, contract_name)?;
        let artifact = registry.require(contract_name)?;
        if record.bytecode_hash != artifact.bytecode_hash() {
            tracing::warn!(
                contract = contract_name,
                "artifact bytecode changed since the recorded deployment"
            );
        }
        Self::from_record(&record, artifact)
    }

    pub async fn is_deployed<T: Rpc + ?Sized>(&self, rpc: &T) -> eyre::Result<bool> {
        Ok(!rpc.get_code(self.address).await?.is_empty())
    }

    /// Read a party address through the getter named after its role, if the abi has one
    pub async fn read_party<T: Rpc + ?Sized>(
        &self,
        rpc: &T,
        role: Role,
    ) -> eyre::Result<Option<Address>> {
        read_party_at(rpc, self.address, &self.artifact, role).await
    }

    pub async fn verify<T: Rpc + ?Sized>(&self, rpc: &T) -> eyre::Result<VerifyReport> {
        let code_size = rpc.get_code(self.address).await?.len();
        let mut report = VerifyReport {
            address: self.address,
            code_size,
            matched: Vec::new(),
            unreadable: Vec::new(),
            mismatches: Vec::new(),
        };
        if code_size == 0 {
            tracing::warn!(address = %self.address, "no code at recorded address");
            return Ok(report);
        }
        for role in Role::ORDER {
            let recorded = self.parties.get(role);
            match self.read_party(rpc, role).await? {
                None => report.unreadable.push(role),
                Some(on_chain) if on_chain == recorded => report.matched.push(role),
                Some(on_chain) => report.mismatches.push(PartyMismatch {
                    role,
                    recorded,
                    on_chain,
                }),
            }
        }
        Ok(report)
    }
}
