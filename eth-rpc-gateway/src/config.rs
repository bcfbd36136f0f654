use std::{fmt, time::Duration};

use alloy::signers::local::PrivateKeySigner;
use eyre::{Result, WrapErr};
use serde::Deserialize;

/// Service configuration structure
///
/// Built once at startup from environment variables (and an optional `.env`
/// file) and then only read.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Host address to bind the server to (default: 127.0.0.1)
    pub host: String,

    /// Port to listen on (default: 8080)
    pub port: u16,

    /// Number of HTTP worker threads (default: 4)
    pub workers: usize,

    /// Ethereum RPC endpoint URL for communicating with the blockchain
    pub ethereum_rpc_url: String,

    /// Signing key; absent means read-only mode
    #[serde(default)]
    pub private_key: Option<SecretKey>,

    /// Chain id stamped on submitted transactions (default: 31337)
    pub chain_id: u64,

    /// Label reported by `/health`; defaults to the well-known name of `chain_id`
    #[serde(default)]
    pub network_name: Option<String>,

    /// Name reported by `/health`
    pub service_name: String,

    /// Upper bound on every RPC call, in seconds (default: 30)
    pub rpc_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// * `HOST` - Server host address (default: "127.0.0.1")
    /// * `PORT` - Server port (default: 8080)
    /// * `WORKERS` - HTTP worker threads (default: 4)
    /// * `ETHEREUM_RPC_URL` - Ethereum RPC URL (default: "http://localhost:8545")
    /// * `PRIVATE_KEY` - Hex signing key (optional)
    /// * `CHAIN_ID` - Chain id for outgoing transactions (default: 31337)
    /// * `NETWORK_NAME` - Network label for `/health` (optional)
    /// * `SERVICE_NAME` - Service label for `/health` (default: "eth-rpc-gateway")
    /// * `RPC_TIMEOUT_SECS` - RPC call timeout (default: 30)
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (useful for development)
        let _ = dotenv::dotenv();

        Self::from_source(config::Environment::default())
    }

    /// Build the configuration from defaults overlaid with `source`.
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("workers", 4)?
            .set_default("ethereum_rpc_url", "http://localhost:8545")?
            .set_default("chain_id", 31337)?
            .set_default("service_name", "eth-rpc-gateway")?
            .set_default("rpc_timeout_secs", 30)?
            .add_source(source)
            .build()
            .wrap_err("failed to read configuration")?;

        let mut config: Config = settings
            .try_deserialize()
            .wrap_err("invalid configuration")?;

        // an empty PRIVATE_KEY= line in .env means "no key"
        if config
            .private_key
            .as_ref()
            .map_or(false, |key| key.expose().trim().is_empty())
        {
            config.private_key = None;
        }
        Ok(config)
    }

    /// Parse the configured private key, if any.
    pub fn signer(&self) -> Result<Option<PrivateKeySigner>> {
        let Some(key) = &self.private_key else {
            return Ok(None);
        };
        let hex = key.expose().trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let signer: PrivateKeySigner = hex
            .parse()
            .map_err(|e| eyre::eyre!("invalid PRIVATE_KEY: {}", e))?;
        Ok(Some(signer))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// Private key material that never shows up in `Debug` output or logs
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***REDACTED***)")
    }
}
