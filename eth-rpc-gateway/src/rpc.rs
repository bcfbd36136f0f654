use std::{future::IntoFuture, sync::Arc, time::Duration};

use alloy::{
    json_abi::JsonAbi,
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use eyre::Result;
use mockall::automock;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{contract, error::ServiceError};

/// JSON-RPC "method not found"; a node without fee data answers `eth_gasPrice` with it
const METHOD_NOT_FOUND: i64 = -32601;

/// A plain value transfer (or raw call) ready to be signed and submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_price: u128,
    pub chain_id: u64,
}

/// Outcome of a confirmed contract deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub contract_address: Address,
    pub transaction_hash: TxHash,
    pub deployer: Address,
}

/// Everything the gateway needs from a blockchain client
///
/// Each method is one delegated call into the client library. Implementations
/// hold no per-request state; errors come back as [`ServiceError::Upstream`]
/// except where a signer is required and missing.
#[automock]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the configured signer, `None` in read-only mode
    fn signer_address(&self) -> Option<Address>;

    async fn block_number(&self) -> Result<u64, ServiceError>;

    async fn chain_id(&self) -> Result<u64, ServiceError>;

    /// Current gas price in wei, `None` when the node has no fee data
    async fn gas_price(&self) -> Result<Option<u128>, ServiceError>;

    async fn balance(&self, address: Address) -> Result<U256, ServiceError>;

    async fn transaction_count(&self, address: Address) -> Result<u64, ServiceError>;

    async fn send_transaction(&self, tx: OutgoingTransaction) -> Result<TxHash, ServiceError>;

    /// Receipt as the node returned it, `None` while pending or unknown
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<Value>, ServiceError>;

    async fn call_contract(
        &self,
        address: Address,
        abi: &JsonAbi,
        method: &str,
        params: &[Value],
    ) -> Result<Value, ServiceError>;

    /// Submits the deployment and waits for it to be mined
    async fn deploy_contract(
        &self,
        abi: &JsonAbi,
        bytecode: Bytes,
        constructor_args: &[Value],
    ) -> Result<Deployment, ServiceError>;
}

/// Ethereum RPC client for blockchain interactions
///
/// Wraps two alloy providers over the same endpoint: a read-only one, and,
/// when a private key is configured, one with a wallet filler that signs
/// outgoing transactions.
#[derive(Clone)]
pub struct EthereumClient {
    /// Typed provider for Ethereum network
    pub provider: Arc<dyn Provider<Ethereum>>,
    /// Signing provider, present only when a private key is configured
    signer_provider: Option<Arc<dyn Provider<Ethereum>>>,
    signer_address: Option<Address>,
    timeout: Duration,
}

impl EthereumClient {
    /// Create a new Ethereum client with an HTTP provider
    ///
    /// The node is probed once for its block number; an unreachable node is
    /// logged but does not prevent startup, since `/health` must keep
    /// answering.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - URL of the Ethereum RPC endpoint
    /// * `signer` - Key used for write operations, if any
    /// * `timeout` - Upper bound applied to every RPC call
    pub async fn new(
        rpc_url: &str,
        signer: Option<PrivateKeySigner>,
        timeout: Duration,
    ) -> Result<Self> {
        // Create a provider for the Ethereum network at the specified URL
        let provider = ProviderBuilder::new()
            .network::<Ethereum>()
            .on_http(rpc_url.parse()?);

        let (signer_provider, signer_address) = match signer {
            Some(signer) => {
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .on_http(rpc_url.parse()?);
                info!(%address, "Signer configured, write operations enabled");
                (Some(Arc::new(provider) as Arc<dyn Provider<Ethereum>>), Some(address))
            }
            None => {
                warn!("No signing key configured, running in read-only mode");
                (None, None)
            }
        };

        let client = Self {
            provider: Arc::new(provider),
            signer_provider,
            signer_address,
            timeout,
        };

        match client.block_number().await {
            Ok(block_number) => info!(rpc_url, block_number, "Connected to Ethereum node"),
            Err(e) => warn!(rpc_url, error = %e, "Ethereum node not reachable at startup"),
        }

        Ok(client)
    }

    fn signer(&self) -> Result<&Arc<dyn Provider<Ethereum>>, ServiceError> {
        self.signer_provider.as_ref().ok_or_else(ServiceError::no_signer)
    }

    /// Await an RPC call, bounding it by the configured timeout.
    async fn timed<F: IntoFuture>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<F::Output, ServiceError> {
        tokio::time::timeout(self.timeout, call.into_future())
            .await
            .map_err(|_| {
                ServiceError::Upstream(format!("{} timed out after {:?}", operation, self.timeout))
            })
    }

    /// Like [`Self::timed`], with any client error reported as upstream.
    async fn rpc<T, E, F>(&self, operation: &'static str, call: F) -> Result<T, ServiceError>
    where
        E: std::fmt::Display,
        F: IntoFuture<Output = std::result::Result<T, E>>,
    {
        self.timed(operation, call).await?.map_err(|e| {
            debug!(operation, error = %e, "RPC call failed");
            ServiceError::upstream(e)
        })
    }
}

#[async_trait]
impl ChainClient for EthereumClient {
    fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }

    async fn block_number(&self) -> Result<u64, ServiceError> {
        self.rpc("eth_blockNumber", self.provider.get_block_number()).await
    }

    async fn chain_id(&self) -> Result<u64, ServiceError> {
        self.rpc("eth_chainId", self.provider.get_chain_id()).await
    }

    async fn gas_price(&self) -> Result<Option<u128>, ServiceError> {
        match self.timed("eth_gasPrice", self.provider.get_gas_price()).await? {
            Ok(price) => Ok(Some(price)),
            Err(e) if e.as_error_resp().is_some_and(|resp| resp.code == METHOD_NOT_FOUND) => {
                warn!(error = %e, "Node has no fee data");
                Ok(None)
            }
            Err(e) => {
                debug!(operation = "eth_gasPrice", error = %e, "RPC call failed");
                Err(ServiceError::upstream(e))
            }
        }
    }

    async fn balance(&self, address: Address) -> Result<U256, ServiceError> {
        self.rpc("eth_getBalance", self.provider.get_balance(address)).await
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ServiceError> {
        self.rpc("eth_getTransactionCount", self.provider.get_transaction_count(address))
            .await
    }

    async fn send_transaction(&self, tx: OutgoingTransaction) -> Result<TxHash, ServiceError> {
        let provider = self.signer()?;
        let mut request = TransactionRequest::default()
            .with_to(tx.to)
            .with_value(tx.value)
            .with_input(tx.data)
            .with_gas_price(tx.gas_price)
            .with_chain_id(tx.chain_id);
        if let Some(from) = self.signer_address {
            request = request.with_from(from);
        }

        let pending = self
            .rpc("eth_sendRawTransaction", provider.send_transaction(request))
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<Value>, ServiceError> {
        let receipt = self
            .rpc("eth_getTransactionReceipt", self.provider.get_transaction_receipt(hash))
            .await?;
        receipt
            .map(|receipt| serde_json::to_value(receipt).map_err(ServiceError::upstream))
            .transpose()
    }

    async fn call_contract(
        &self,
        address: Address,
        abi: &JsonAbi,
        method: &str,
        params: &[Value],
    ) -> Result<Value, ServiceError> {
        let func = contract::resolve_function(abi, method, params.len())?;
        let input = contract::encode_call(func, params)?;
        let mut request = TransactionRequest::default().with_to(address).with_input(input);

        if contract::is_read_only(func) {
            if let Some(from) = self.signer_address {
                request = request.with_from(from);
            }
            let output = self.rpc("eth_call", self.provider.call(request)).await?;
            return contract::decode_output(func, &output);
        }

        // state-changing methods go out as signed transactions
        let provider = self.signer()?;
        let pending = self
            .rpc("eth_sendRawTransaction", provider.send_transaction(request))
            .await?;
        Ok(json!({
            "transactionHash": pending.tx_hash().to_string(),
            "from": self.signer_address.map(|a| a.to_string()),
        }))
    }

    async fn deploy_contract(
        &self,
        abi: &JsonAbi,
        bytecode: Bytes,
        constructor_args: &[Value],
    ) -> Result<Deployment, ServiceError> {
        let provider = self.signer()?;
        let deployer = self.signer_address.ok_or_else(ServiceError::no_signer)?;
        let code = contract::deploy_code(abi, &bytecode, constructor_args)?;
        let request = TransactionRequest::default()
            .with_from(deployer)
            .with_deploy_code(code);

        let pending = self
            .rpc("eth_sendRawTransaction", provider.send_transaction(request))
            .await?;
        let transaction_hash = *pending.tx_hash();
        info!(%transaction_hash, "Deployment submitted, waiting for receipt");

        // waiting for inclusion is not bounded by the per-call timeout
        let receipt = pending.get_receipt().await.map_err(ServiceError::upstream)?;
        if !receipt.status() {
            return Err(ServiceError::Upstream(format!(
                "deployment transaction {} reverted",
                transaction_hash
            )));
        }
        let contract_address = receipt.contract_address.ok_or_else(|| {
            ServiceError::Upstream(format!(
                "receipt for {} has no contract address",
                transaction_hash
            ))
        })?;

        Ok(Deployment {
            contract_address,
            transaction_hash,
            deployer,
        })
    }
}
