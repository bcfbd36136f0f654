use serde::Serialize;

/// Snapshot of the connected network, fetched fresh per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub block_number: u64,
    pub chain_id: u64,
    pub network_name: String,
    pub rpc_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPriceInfo {
    /// wei, decimal text
    pub gas_price: String,
    pub gas_price_gwei: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceInfo {
    pub address: String,
    /// ether, decimal text
    pub balance: String,
    pub wei: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceInfo {
    pub address: String,
    pub transaction_count: u64,
}

/// What was submitted by `POST /api/transaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub transaction_hash: String,
    pub from: String,
    pub to: String,
    /// ether, decimal text
    pub value: String,
    /// the bumped price actually used, wei
    pub gas_price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub contract_address: String,
    pub deployment_transaction_hash: String,
    pub deployer: String,
}

/// Body of `GET /health`; built from configuration only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
    pub network: String,
    pub rpc_endpoint: String,
}
