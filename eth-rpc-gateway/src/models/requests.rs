use serde::Deserialize;
use serde_json::Value;

use crate::error::ServiceError;

/// Body of `POST /api/transaction`
///
/// Fields are optional at the serde level so that missing ones produce a
/// descriptive 400 instead of a generic deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionBody {
    /// Recipient address
    #[serde(default)]
    pub to: Option<String>,

    /// Amount in ether, as decimal text
    #[serde(default)]
    pub value: Option<String>,

    /// Call data, defaults to `0x`
    #[serde(default)]
    pub data: Option<String>,
}

/// Body of `POST /api/contract/call`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCallBody {
    #[serde(default)]
    pub contract_address: Option<String>,

    /// JSON ABI, stringified JSON ABI, or human-readable signatures
    #[serde(default)]
    pub abi: Option<Value>,

    /// Function name or full signature
    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub params: Option<Vec<Value>>,
}

/// Body of `POST /api/contract/deploy`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDeployBody {
    #[serde(default)]
    pub abi: Option<Value>,

    /// Creation bytecode as hex
    #[serde(default)]
    pub bytecode: Option<String>,

    #[serde(default)]
    pub constructor_args: Option<Vec<Value>>,
}

/// 400 listing the fields flagged absent, in the order given
pub fn missing_fields(fields: &[(&str, bool)]) -> ServiceError {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    ServiceError::Validation(format!("Missing required fields: {}", missing.join(", ")))
}

/// The string, unless absent or blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// The JSON value, unless absent, `null` or `""`
pub fn non_empty_json(value: &Option<Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}
