//! Runtime-described contract interaction
//!
//! Callers hand us an ABI, a method name and positional JSON arguments. All
//! encoding and decoding is done by `alloy`'s dynamic ABI support; this module
//! only bridges between JSON values and `DynSolValue`s.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier},
    json_abi::{Function, JsonAbi, Param, StateMutability},
    primitives::Bytes,
};
use alloy_primitives::hex;
use serde_json::Value;

use crate::error::ServiceError;

/// Parse the `abi` field of a request.
///
/// Accepts a JSON ABI array, a string containing one, an array of
/// human-readable signatures, or a compiler artifact with an `abi` key.
pub fn parse_abi(value: &Value) -> Result<JsonAbi, ServiceError> {
    match value {
        Value::String(raw) => {
            let inner: Value = serde_json::from_str(raw)
                .map_err(|e| ServiceError::Validation(format!("Invalid ABI: {}", e)))?;
            if inner.is_string() {
                return Err(ServiceError::Validation("Invalid ABI: expected an array".to_string()));
            }
            parse_abi(&inner)
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_string) => {
            JsonAbi::parse(items.iter().filter_map(Value::as_str))
                .map_err(|e| ServiceError::Validation(format!("Invalid ABI: {}", e)))
        }
        Value::Array(_) => serde_json::from_value(value.clone())
            .map_err(|e| ServiceError::Validation(format!("Invalid ABI: {}", e))),
        Value::Object(artifact) => match artifact.get("abi") {
            Some(abi) => parse_abi(abi),
            None => Err(ServiceError::Validation(
                "Invalid ABI: object has no 'abi' key".to_string(),
            )),
        },
        _ => Err(ServiceError::Validation("Invalid ABI: expected an array".to_string())),
    }
}

/// Find the function `method` refers to.
///
/// `method` is either a bare name or a full signature such as
/// `transfer(address,uint256)`. Overloaded names are disambiguated by
/// argument count.
pub fn resolve_function<'a>(
    abi: &'a JsonAbi,
    method: &str,
    arg_count: usize,
) -> Result<&'a Function, ServiceError> {
    let method: String = method.chars().filter(|c| !c.is_whitespace()).collect();

    if method.contains('(') {
        return abi
            .functions()
            .find(|f| f.signature() == method)
            .ok_or_else(|| ServiceError::Upstream(format!("no function matching \"{}\"", method)));
    }

    let overloads = abi
        .function(&method)
        .ok_or_else(|| ServiceError::Upstream(format!("no function named \"{}\" in ABI", method)))?;

    match overloads.as_slice() {
        [only] => Ok(only),
        many => {
            let mut matching = many.iter().filter(|f| f.inputs.len() == arg_count);
            match (matching.next(), matching.next()) {
                (Some(func), None) => Ok(func),
                (None, _) => Err(ServiceError::Upstream(format!(
                    "no overload of \"{}\" takes {} arguments",
                    method, arg_count
                ))),
                (Some(_), Some(_)) => Err(ServiceError::Upstream(format!(
                    "ambiguous method \"{}\", use the full signature",
                    method
                ))),
            }
        }
    }
}

/// View and pure functions are executed with `eth_call`; everything else needs a transaction.
pub fn is_read_only(func: &Function) -> bool {
    matches!(
        func.state_mutability,
        StateMutability::View | StateMutability::Pure
    )
}

/// Selector plus encoded arguments.
pub fn encode_call(func: &Function, args: &[Value]) -> Result<Bytes, ServiceError> {
    let values = coerce_args(&func.inputs, args)?;
    let data = func
        .abi_encode_input(&values)
        .map_err(|e| ServiceError::Upstream(format!("failed to encode call to {}: {}", func.name, e)))?;
    Ok(data.into())
}

/// Decode return data into JSON: `null` for no outputs, the value itself for
/// one, an array for several.
pub fn decode_output(func: &Function, data: &[u8]) -> Result<Value, ServiceError> {
    let mut values = func.abi_decode_output(data, true).map_err(|e| {
        ServiceError::Upstream(format!("failed to decode result of {}: {}", func.name, e))
    })?;
    Ok(match values.len() {
        0 => Value::Null,
        1 => sol_value_to_json(&values.remove(0)),
        _ => Value::Array(values.iter().map(sol_value_to_json).collect()),
    })
}

/// Creation bytecode followed by the encoded constructor arguments.
pub fn deploy_code(abi: &JsonAbi, bytecode: &Bytes, args: &[Value]) -> Result<Bytes, ServiceError> {
    let mut code = bytecode.to_vec();
    match &abi.constructor {
        Some(constructor) => {
            let values = coerce_args(&constructor.inputs, args)?;
            let encoded = constructor.abi_encode_input(&values).map_err(|e| {
                ServiceError::Upstream(format!("failed to encode constructor arguments: {}", e))
            })?;
            code.extend_from_slice(&encoded);
        }
        None if !args.is_empty() => {
            return Err(ServiceError::Upstream(format!(
                "ABI has no constructor but {} arguments were given",
                args.len()
            )));
        }
        None => {}
    }
    Ok(code.into())
}

fn coerce_args(params: &[Param], args: &[Value]) -> Result<Vec<DynSolValue>, ServiceError> {
    if params.len() != args.len() {
        return Err(ServiceError::Upstream(format!(
            "expected {} arguments, got {}",
            params.len(),
            args.len()
        )));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param.resolve().map_err(|e| {
                ServiceError::Upstream(format!("unsupported parameter type {}: {}", param.ty, e))
            })?;
            coerce_value(&ty, arg).map_err(|e| {
                ServiceError::Upstream(format!("invalid argument \"{}\": {}", param.name, e))
            })
        })
        .collect()
}

/// Arrays and tuples are JSON arrays; scalars go through alloy's string coercion.
fn coerce_value(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(format!("expected {} elements, got {}", len, items.len()));
            }
            items
                .iter()
                .map(|item| coerce_value(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!("expected {} tuple fields, got {}", types.len(), items.len()));
            }
            types
                .iter()
                .zip(items)
                .map(|(ty, item)| coerce_value(ty, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        (_, Value::String(s)) => ty.coerce_str(s).map_err(|e| e.to_string()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, Value::Bool(b)) => ty
            .coerce_str(if *b { "true" } else { "false" })
            .map_err(|e| e.to_string()),
        (_, other) => Err(format!("cannot encode {} as {}", other, ty.sol_type_name())),
    }
}

/// Integers become decimal strings so no precision is lost in JSON.
pub fn sol_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => Value::String(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
        DynSolValue::Function(func) => Value::String(func.to_string()),
        DynSolValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(sol_value_to_json).collect())
        }
        #[allow(unreachable_patterns)]
        other => other
            .as_tuple()
            .map(|items| Value::Array(items.iter().map(sol_value_to_json).collect()))
            .unwrap_or(Value::Null),
    }
}
