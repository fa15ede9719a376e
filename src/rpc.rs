use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy::{
    network::ReceiptResponse,
    primitives::{keccak256, Address, Bytes, TxHash, TxKind},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use reqwest::Url;

use crate::escrow::{Escrow, Role};

const ENCODED_WORD_LENGTH: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },
}

impl RpcError {
    fn reverted() -> Self {
        RpcError::Node {
            code: -32000,
            message: "execution reverted".to_string(),
        }
    }
}

/// The parts of a transaction receipt the deployment flow reads
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub contract_address: Option<Address>,
    pub status: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

impl Receipt {
    pub fn from_response<R: ReceiptResponse>(receipt: &R) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash(),
            contract_address: receipt.contract_address(),
            status: receipt.status(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        }
    }
}

/// Everything the deployment flow needs from a node
#[async_trait::async_trait]
pub trait Rpc: Send + Sync {
    async fn accounts(&self) -> eyre::Result<Vec<Address>>;

    async fn send_transaction(&self, tx: TransactionRequest) -> eyre::Result<TxHash>;

    async fn transaction_receipt(&self, tx_hash: TxHash) -> eyre::Result<Option<Receipt>>;

    async fn get_code(&self, address: Address) -> eyre::Result<Bytes>;

    async fn call(&self, tx: TransactionRequest) -> eyre::Result<Bytes>;
}

/// Node client over HTTP; signing and nonces are left to the node's unlocked accounts
#[derive(Clone)]
pub struct RpcClient {
    url: Url,
    provider: DynProvider,
}

impl RpcClient {
    pub fn new(url: Url) -> Self {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url.clone())
            .erased();
        Self { url, provider }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl Rpc for RpcClient {
    async fn accounts(&self) -> eyre::Result<Vec<Address>> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> eyre::Result<TxHash> {
        tracing::debug!(from = ?tx.from, to = ?tx.to, "eth_sendTransaction");
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> eyre::Result<Option<Receipt>> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt.as_ref().map(Receipt::from_response))
    }

    async fn get_code(&self, address: Address) -> eyre::Result<Bytes> {
        Ok(self.provider.get_code_at(address).await?)
    }

    async fn call(&self, tx: TransactionRequest) -> eyre::Result<Bytes> {
        Ok(self.provider.call(tx).await?)
    }
}

/// Poll for the receipt of `tx_hash` until it shows up or `timeout` elapses
pub async fn wait_for_receipt<T: Rpc + ?Sized>(
    rpc: &T,
    tx_hash: TxHash,
    timeout: Duration,
    interval: Duration,
) -> eyre::Result<Receipt> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(receipt) = rpc.transaction_receipt(tx_hash).await? {
            return Ok(receipt);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(eyre::eyre!(
                "no receipt for {tx_hash} after {}s",
                timeout.as_secs()
            ));
        }
        tokio::time::sleep(interval).await;
    }
}

#[derive(Default)]
struct FakeChain {
    nonces: HashMap<Address, u64>,
    contracts: HashMap<Address, FakeContract>,
    receipts: HashMap<TxHash, Receipt>,
    block_number: u64,
    reject_next: Option<String>,
    revert_next: bool,
}

#[derive(Clone, Default)]
struct FakeContract {
    code: Bytes,
    creation_input: Vec<u8>,
}

impl FakeContract {
    // Trailing constructor arguments of the creation input
    fn constructor_args(&self) -> Option<&[u8]> {
        let len = self.creation_input.len();
        let args_len = Role::ORDER.len() * ENCODED_WORD_LENGTH;
        (len >= args_len).then(|| &self.creation_input[len - args_len..])
    }
}

/// In-memory node for tests; contract creation stores code without executing it
#[derive(Clone)]
pub struct FakeRpcClient {
    accounts: Vec<Address>,
    chain: Arc<Mutex<FakeChain>>,
}

impl Default for FakeRpcClient {
    fn default() -> Self {
        let accounts = (1..=4u8).map(Address::repeat_byte).collect::<Vec<_>>();
        Self::new(accounts)
    }
}

impl FakeRpcClient {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            chain: Arc::new(Mutex::new(FakeChain::default())),
        }
    }

    fn chain(&self) -> eyre::Result<std::sync::MutexGuard<'_, FakeChain>> {
        self.chain
            .lock()
            .map_err(|_| eyre::eyre!("fake chain lock poisoned"))
    }

    /// The next `send_transaction` fails with `message`
    pub fn reject_next(&self, message: &str) -> eyre::Result<()> {
        self.chain()?.reject_next = Some(message.to_string());
        Ok(())
    }

    /// The next contract creation is mined with status 0
    pub fn revert_next(&self) -> eyre::Result<()> {
        self.chain()?.revert_next = true;
        Ok(())
    }

    /// Creation input of the contract at `address`, as submitted
    pub fn creation_input(&self, address: Address) -> eyre::Result<Option<Vec<u8>>> {
        Ok(self
            .chain()?
            .contracts
            .get(&address)
            .map(|c| c.creation_input.clone()))
    }

    /// Overwrite the runtime code of an existing contract
    pub fn set_code(&self, address: Address, code: impl Into<Bytes>) -> eyre::Result<()> {
        self.chain()?.contracts.entry(address).or_default().code = code.into();
        Ok(())
    }

    /// Replace one constructor argument of a deployed contract, `index` in constructor order
    pub fn set_constructor_word(
        &self,
        address: Address,
        index: usize,
        value: Address,
    ) -> eyre::Result<()> {
        if index >= Role::ORDER.len() {
            return Err(eyre::eyre!(
                "constructor argument {index} out of range, escrow takes {}",
                Role::ORDER.len()
            ));
        }
        let mut chain = self.chain()?;
        let contract = chain
            .contracts
            .get_mut(&address)
            .ok_or(eyre::eyre!("no contract at {address}"))?;
        let args_start = contract
            .creation_input
            .len()
            .checked_sub(Role::ORDER.len() * ENCODED_WORD_LENGTH)
            .ok_or(eyre::eyre!("contract at {address} has no constructor args"))?;
        let start = args_start + index * ENCODED_WORD_LENGTH + 12;
        contract.creation_input[start..start + 20].copy_from_slice(value.as_slice());
        Ok(())
    }
}

#[async_trait::async_trait]
impl Rpc for FakeRpcClient {
    async fn accounts(&self) -> eyre::Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> eyre::Result<TxHash> {
        let mut chain = self.chain()?;
        if let Some(message) = chain.reject_next.take() {
            return Err(RpcError::Node {
                code: -32000,
                message,
            }
            .into());
        }
        let from = tx
            .from
            .filter(|from| self.accounts.contains(from))
            .ok_or(RpcError::Node {
                code: -32000,
                message: format!("sender account not recognized: {:?}", tx.from),
            })?;
        let input = tx.input.input().cloned().unwrap_or_default();
        let nonce = chain.nonces.entry(from).or_default();
        let current = *nonce;
        *nonce += 1;
        chain.block_number += 1;
        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&current.to_be_bytes());
        preimage.extend_from_slice(&input);
        let tx_hash = keccak256(&preimage);
        let reverted = std::mem::take(&mut chain.revert_next);
        let creates = matches!(tx.to, None | Some(TxKind::Create));
        let contract_address = if creates && !reverted {
            let address = from.create(current);
            chain.contracts.insert(
                address,
                FakeContract {
                    code: input.clone(),
                    creation_input: input.to_vec(),
                },
            );
            Some(address)
        } else {
            None
        };
        let receipt = Receipt {
            transaction_hash: tx_hash,
            contract_address,
            status: !reverted,
            block_number: Some(chain.block_number),
            gas_used: 21_000 + input.len() as u64 * 16,
        };
        chain.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> eyre::Result<Option<Receipt>> {
        Ok(self.chain()?.receipts.get(&tx_hash).cloned())
    }

    async fn get_code(&self, address: Address) -> eyre::Result<Bytes> {
        Ok(self
            .chain()?
            .contracts
            .get(&address)
            .map(|c| c.code.clone())
            .unwrap_or_default())
    }

    // Answers the role getters from the stored constructor arguments
    async fn call(&self, tx: TransactionRequest) -> eyre::Result<Bytes> {
        let to = tx
            .to
            .and_then(|kind| kind.to().copied())
            .ok_or(eyre::eyre!("call has no target address"))?;
        let data = tx.input.input().cloned().unwrap_or_default();
        let chain = self.chain()?;
        let contract = chain
            .contracts
            .get(&to)
            .ok_or(eyre::eyre!("no contract at {to}"))?;
        let args = contract.constructor_args().ok_or(RpcError::reverted())?;
        let index = [
            Escrow::supplierCall::SELECTOR,
            Escrow::distributorCall::SELECTOR,
            Escrow::carrierCall::SELECTOR,
        ]
        .iter()
        .position(|selector| data.starts_with(selector))
        .ok_or(RpcError::reverted())?;
        let word = &args[index * ENCODED_WORD_LENGTH..(index + 1) * ENCODED_WORD_LENGTH];
        Ok(Bytes::copy_from_slice(word))
    }
}
