//! Typed access to the on-chain Storage and AccessManager contracts.
//!
//! Owns the account private key: transactions and per-block EIP-712
//! authorizations are signed here and nowhere else.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256};
use k256::ecdsa::SigningKey;
use tracing::{debug, instrument, warn};

use crate::eip712::{self, StorageData};
use crate::errors::SdkError;

pub mod contracts;
mod nonce;
mod retry;

pub use contracts::{BucketInfo, FileInfo};
pub use nonce::NonceManager;
pub use retry::{is_retryable_tx_error, RetryPolicy};

const DEFAULT_GAS_LIMIT: u64 = 500_000;

/// Client for the bucket/file registry contracts behind a JSON-RPC endpoint.
pub struct ChainClient<P: JsonRpcClient = Http> {
    provider: Arc<Provider<P>>,
    wallet: LocalWallet,
    signing_key: SigningKey,
    chain_id: u64,
    storage_address: Address,
    access_manager_address: Option<Address>,
    domain: eip712::Domain,
    nonce: NonceManager<P>,
    retry: RetryPolicy,
    receipt_timeout: Duration,
    poll_latency: Duration,
}

impl ChainClient<Http> {
    /// Connects to `rpc_url`, fetches the chain id and binds the wallet to
    /// it. Proof-of-authority chains with oversized header `extraData` are
    /// fine: the client never inspects block headers.
    pub async fn dial(
        rpc_url: &str,
        private_key: &str,
        storage_address: Address,
        access_manager_address: Option<Address>,
        retry: RetryPolicy,
        receipt_timeout: Duration,
        poll_latency: Duration,
    ) -> Result<Self, SdkError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| SdkError::Config(format!("invalid chain endpoint {}: {}", rpc_url, e)))?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| SdkError::Chain(format!("failed to fetch chain id: {}", e)))?
            .low_u64();

        Self::new(
            provider,
            private_key,
            chain_id,
            storage_address,
            access_manager_address,
            retry,
            receipt_timeout,
            poll_latency,
        )
    }
}

impl<P: JsonRpcClient> ChainClient<P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Provider<P>,
        private_key: &str,
        chain_id: u64,
        storage_address: Address,
        access_manager_address: Option<Address>,
        retry: RetryPolicy,
        receipt_timeout: Duration,
        poll_latency: Duration,
    ) -> Result<Self, SdkError> {
        let stripped = private_key.strip_prefix("0x").unwrap_or(private_key);
        let raw = hex::decode(stripped)
            .map_err(|e| SdkError::Config(format!("invalid private key hex: {}", e)))?;
        let wallet = LocalWallet::from_bytes(&raw)
            .map_err(|_| SdkError::Config("invalid secp256k1 private key".into()))?
            .with_chain_id(chain_id);
        let signing_key = crate::crypto::parse_signing_key(private_key)?;

        let provider = Arc::new(provider);
        let nonce = NonceManager::new(provider.clone(), wallet.address());
        let domain = eip712::Domain::storage(chain_id, storage_address.0);

        Ok(Self {
            provider,
            wallet,
            signing_key,
            chain_id,
            storage_address,
            access_manager_address,
            domain,
            nonce,
            retry,
            receipt_timeout,
            poll_latency,
        })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// The account address as raw bytes, for id derivation.
    pub fn owner_bytes(&self) -> [u8; 20] {
        self.wallet.address().0
    }

    pub fn domain(&self) -> &eip712::Domain {
        &self.domain
    }

    /// Signs one block-write authorization against the storage domain.
    pub fn sign_block(&self, data: &StorageData) -> Result<[u8; 65], SdkError> {
        data.sign(&self.domain, &self.signing_key)
    }

    #[instrument(skip(self), fields(bucket = name))]
    pub async fn create_bucket(&self, name: &str) -> Result<(), SdkError> {
        self.send_tx(self.storage_address, contracts::create_bucket(name))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = name))]
    pub async fn delete_bucket(&self, name: &str) -> Result<(), SdkError> {
        self.send_tx(self.storage_address, contracts::delete_bucket(name))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, file_id), fields(bucket = bucket_name, file = file_name))]
    pub async fn create_file(
        &self,
        bucket_name: &str,
        file_name: &str,
        file_id: [u8; 32],
        size: U256,
    ) -> Result<(), SdkError> {
        self.send_tx(
            self.storage_address,
            contracts::create_file(bucket_name, file_name, file_id, size),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, root_cid), fields(bucket = bucket_name, file = file_name))]
    pub async fn commit_file(
        &self,
        bucket_name: &str,
        file_name: &str,
        size: U256,
        root_cid: &[u8],
    ) -> Result<(), SdkError> {
        self.send_tx(
            self.storage_address,
            contracts::commit_file(bucket_name, file_name, size, root_cid),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = bucket_name, file = file_name))]
    pub async fn delete_file(&self, bucket_name: &str, file_name: &str) -> Result<(), SdkError> {
        self.send_tx(
            self.storage_address,
            contracts::delete_file(bucket_name, file_name),
        )
        .await?;
        Ok(())
    }

    pub async fn get_bucket(&self, name: &str) -> Result<BucketInfo, SdkError> {
        let output = self
            .call(self.storage_address, contracts::get_bucket(name))
            .await?;
        let bucket = contracts::decode_bucket(&output)?;
        if bucket.owner == Address::zero() {
            return Err(SdkError::NotFound(format!("bucket {}", name)));
        }
        Ok(bucket)
    }

    pub async fn get_file(&self, bucket_name: &str, file_name: &str) -> Result<FileInfo, SdkError> {
        let output = self
            .call(
                self.storage_address,
                contracts::get_file(bucket_name, file_name),
            )
            .await?;
        let file = contracts::decode_file(&output)?;
        if file.id == [0u8; 32] {
            return Err(SdkError::NotFound(format!(
                "file {}/{}",
                bucket_name, file_name
            )));
        }
        Ok(file)
    }

    /// Flips the public-access grant for a file through the AccessManager.
    pub async fn set_public_access(&self, file_id: [u8; 32], public: bool) -> Result<(), SdkError> {
        let access_manager = self.access_manager_address.ok_or_else(|| {
            SdkError::Config("access manager contract address not configured".into())
        })?;
        self.send_tx(access_manager, contracts::set_public_access(file_id, public))
            .await?;
        Ok(())
    }

    /// Builds, signs and submits a transaction, retrying classified
    /// submission failures with a nonce resync and refreshed gas price.
    async fn send_tx(&self, to: Address, data: Bytes) -> Result<TransactionReceipt, SdkError> {
        let mut attempt = 0u32;
        loop {
            let nonce = self.nonce.next().await?;
            let gas_price = self
                .provider
                .get_gas_price()
                .await
                .map_err(|e| SdkError::Chain(format!("failed to fetch gas price: {}", e)))?;

            let tx: TypedTransaction = TransactionRequest::new()
                .from(self.wallet.address())
                .to(to)
                .data(data.clone())
                .gas(DEFAULT_GAS_LIMIT)
                .gas_price(gas_price)
                .nonce(nonce)
                .chain_id(self.chain_id)
                .into();
            let signature = self
                .wallet
                .sign_transaction_sync(&tx)
                .map_err(|e| SdkError::Chain(format!("transaction signing failed: {}", e)))?;
            let raw = tx.rlp_signed(&signature);

            match self.provider.send_raw_transaction(raw).await {
                Ok(pending) => {
                    let tx_hash: H256 = *pending;
                    return self.wait_for_receipt(tx_hash, Some(&tx)).await;
                }
                Err(e) => {
                    let message = e.to_string();
                    if is_retryable_tx_error(&message) && attempt < self.retry.max_attempts {
                        debug!(attempt, error = %message, "retryable submission failure");
                        self.nonce.reset().await;
                        tokio::time::sleep(self.retry.backoff(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(classify_send_error(message));
                }
            }
        }
    }

    /// Polls for the transaction receipt until `receipt_timeout`. A failed
    /// receipt triggers a dry-run call to surface the revert reason.
    pub(crate) async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        probe: Option<&TypedTransaction>,
    ) -> Result<TransactionReceipt, SdkError> {
        let started = Instant::now();
        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    if receipt.status == Some(0.into()) {
                        return Err(self.revert_reason(tx_hash, probe).await);
                    }
                    return Ok(receipt);
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(SdkError::Chain(format!(
                        "receipt lookup for {:#x} failed: {}",
                        tx_hash, e
                    )));
                }
            }
            if started.elapsed() >= self.receipt_timeout {
                return Err(SdkError::Chain(format!(
                    "timeout waiting for transaction {:#x}",
                    tx_hash
                )));
            }
            tokio::time::sleep(self.poll_latency).await;
        }
    }

    async fn revert_reason(&self, tx_hash: H256, probe: Option<&TypedTransaction>) -> SdkError {
        if let Some(tx) = probe {
            if let Err(e) = self.provider.call(tx, None).await {
                return classify_send_error(format!(
                    "transaction {:#x} reverted: {}",
                    tx_hash, e
                ));
            }
        }
        warn!(tx = %format!("{:#x}", tx_hash), "transaction failed without a revert reason");
        SdkError::Chain(format!("transaction {:#x} failed", tx_hash))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, SdkError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| SdkError::Chain(e.to_string()))
    }
}

fn classify_send_error(message: String) -> SdkError {
    if message.contains("FileAlreadyExists") || message.contains("BucketAlreadyExists") {
        SdkError::AlreadyExists(message)
    } else if is_retryable_tx_error(&message) {
        SdkError::ChainRetryable(message)
    } else {
        SdkError::Chain(message)
    }
}
