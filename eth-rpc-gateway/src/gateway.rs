use crate::{
    config::Config,
    contract,
    error::ServiceError,
    models::{
        parsing::{
            format_ether, format_gwei, parse_address, parse_ether_amount, parse_hex_bytes,
            parse_tx_hash,
        },
        responses::{
            BalanceInfo, DeployResult, GasPriceInfo, HealthStatus, NetworkStatus, NonceInfo,
            TransactionResult,
        },
    },
    rpc::{ChainClient, OutgoingTransaction},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Percentage applied to the node's gas price for outgoing transfers
pub const GAS_PRICE_BUMP_PERCENT: u128 = 110;

/// Empty call data marker
pub const EMPTY_DATA: &str = "0x";

/// Bump the reported gas price to 110%, truncating.
///
/// Integer math only: 999 wei becomes 1098, not 1098.9.
pub fn bumped_gas_price(reported: u128) -> u128 {
    reported.saturating_mul(GAS_PRICE_BUMP_PERCENT) / 100
}

/// Well-known name of an EVM chain id, `"unknown"` otherwise
pub fn network_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "mainnet",
        10 => "optimism",
        56 => "bnb",
        137 => "matic",
        8453 => "base",
        17000 => "holesky",
        42161 => "arbitrum",
        80002 => "matic-amoy",
        11155111 => "sepolia",
        31337 => "anvil",
        _ => "unknown",
    }
}

/// Static facts about this deployment, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub service_name: String,
    pub network_name: String,
    pub rpc_endpoint: String,
    /// Chain id stamped on outgoing transactions
    pub chain_id: u64,
}

impl From<&Config> for GatewaySettings {
    fn from(config: &Config) -> Self {
        Self {
            service_name: config.service_name.clone(),
            network_name: config
                .network_name
                .clone()
                .unwrap_or_else(|| network_name(config.chain_id).to_string()),
            rpc_endpoint: config.ethereum_rpc_url.clone(),
            chain_id: config.chain_id,
        }
    }
}

/// Gateway handler: one method per supported operation
///
/// Stateless apart from its immutable settings; every method is an
/// independent chain of calls into the [`ChainClient`] and nothing is cached
/// between requests. No method retries.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn ChainClient>,
    settings: GatewaySettings,
}

impl Gateway {
    pub fn new(client: Arc<dyn ChainClient>, settings: GatewaySettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Liveness payload; never touches the node
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok",
            service: self.settings.service_name.clone(),
            network: self.settings.network_name.clone(),
            rpc_endpoint: self.settings.rpc_endpoint.clone(),
        }
    }

    #[instrument(skip(self), err)]
    pub async fn network_status(&self) -> Result<NetworkStatus, ServiceError> {
        let block_number = self.client.block_number().await?;
        let chain_id = self.client.chain_id().await?;
        debug!(block_number, chain_id, "Fetched network status");

        Ok(NetworkStatus {
            block_number,
            chain_id,
            network_name: network_name(chain_id).to_string(),
            rpc_endpoint: self.settings.rpc_endpoint.clone(),
        })
    }

    #[instrument(skip(self), err)]
    pub async fn gas_price(&self) -> Result<GasPriceInfo, ServiceError> {
        Ok(match self.client.gas_price().await? {
            Some(price) => GasPriceInfo {
                gas_price: price.to_string(),
                gas_price_gwei: format_gwei(price),
            },
            None => GasPriceInfo {
                gas_price: "0".to_string(),
                gas_price_gwei: "0".to_string(),
            },
        })
    }

    #[instrument(skip(self), err)]
    pub async fn balance(&self, address: &str) -> Result<BalanceInfo, ServiceError> {
        let wei = self.client.balance(parse_address(address)?).await?;
        Ok(BalanceInfo {
            address: address.to_string(),
            balance: format_ether(wei),
            wei: wei.to_string(),
        })
    }

    #[instrument(skip(self), err)]
    pub async fn transaction_count(&self, address: &str) -> Result<NonceInfo, ServiceError> {
        let transaction_count = self.client.transaction_count(parse_address(address)?).await?;
        Ok(NonceInfo {
            address: address.to_string(),
            transaction_count,
        })
    }

    /// Sign and submit a transfer at 110% of the current gas price.
    ///
    /// `value` is in ether; `data` defaults to `0x`.
    #[instrument(skip(self, data), err)]
    pub async fn send_transaction(
        &self,
        to: &str,
        value: &str,
        data: Option<&str>,
    ) -> Result<TransactionResult, ServiceError> {
        let from = self.client.signer_address().ok_or_else(ServiceError::no_signer)?;

        let to_address = parse_address(to)?;
        let wei = parse_ether_amount(value)?;
        let data = parse_hex_bytes("data", data.unwrap_or(EMPTY_DATA))?;

        let reported = self.client.gas_price().await?.ok_or_else(|| {
            ServiceError::Upstream("fee data unavailable from RPC node".to_string())
        })?;
        let gas_price = bumped_gas_price(reported);
        debug!(reported, gas_price, "Bumped gas price");

        let hash = self
            .client
            .send_transaction(OutgoingTransaction {
                to: to_address,
                value: wei,
                data,
                gas_price,
                chain_id: self.settings.chain_id,
            })
            .await?;
        info!(%hash, %from, to = %to_address, "Transaction submitted");

        Ok(TransactionResult {
            transaction_hash: hash.to_string(),
            from: from.to_string(),
            to: to_address.to_string(),
            value: value.trim().to_string(),
            gas_price: gas_price.to_string(),
        })
    }

    #[instrument(skip(self), err)]
    pub async fn transaction_receipt(&self, tx_hash: &str) -> Result<Value, ServiceError> {
        let hash = parse_tx_hash(tx_hash)?;
        self.client
            .transaction_receipt(hash)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Transaction receipt not found".to_string()))
    }

    /// Invoke `method` on a contract described at runtime by `abi`.
    #[instrument(skip(self, abi, params), err)]
    pub async fn call_contract(
        &self,
        contract_address: &str,
        abi: &Value,
        method: &str,
        params: &[Value],
    ) -> Result<Value, ServiceError> {
        let abi = contract::parse_abi(abi)?;
        let address = parse_address(contract_address)?;
        self.client.call_contract(address, &abi, method, params).await
    }

    #[instrument(skip(self, abi, bytecode, constructor_args), err)]
    pub async fn deploy_contract(
        &self,
        abi: &Value,
        bytecode: &str,
        constructor_args: &[Value],
    ) -> Result<DeployResult, ServiceError> {
        if self.client.signer_address().is_none() {
            return Err(ServiceError::no_signer());
        }
        let abi = contract::parse_abi(abi)?;
        let bytecode = parse_hex_bytes("bytecode", bytecode)?;
        if bytecode.is_empty() {
            return Err(ServiceError::Validation("bytecode is empty".to_string()));
        }

        let deployment = self
            .client
            .deploy_contract(&abi, bytecode, constructor_args)
            .await?;
        info!(
            contract_address = %deployment.contract_address,
            hash = %deployment.transaction_hash,
            "Contract deployed"
        );

        Ok(DeployResult {
            contract_address: deployment.contract_address.to_string(),
            deployment_transaction_hash: deployment.transaction_hash.to_string(),
            deployer: deployment.deployer.to_string(),
        })
    }
}
