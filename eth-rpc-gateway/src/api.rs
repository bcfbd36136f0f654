use crate::{
    error::ServiceError,
    gateway::Gateway,
    models::{
        envelope::ApiResponse,
        requests::{
            missing_fields, non_blank, non_empty_json, ContractCallBody, ContractDeployBody,
            TransactionBody,
        },
    },
};
use actix_web::{
    error::JsonPayloadError, get, http::header::ContentType, post, web, HttpRequest,
    HttpResponse,
};
use serde::Serialize;
use tracing::{debug, info};

/// Browser client driving the routes below
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Largest accepted JSON body; deploy requests carry bytecode
const JSON_BODY_LIMIT: usize = 4 * 1024 * 1024;

fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(data))
}

/// Static client page
#[get("/")]
async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

/// Liveness check; answers even when the node is down
#[get("/health")]
async fn health(gateway: web::Data<Gateway>) -> HttpResponse {
    HttpResponse::Ok().json(gateway.health())
}

#[get("/api/status")]
async fn network_status(gateway: web::Data<Gateway>) -> Result<HttpResponse, ServiceError> {
    Ok(ok(gateway.network_status().await?))
}

#[get("/api/gasprice")]
async fn gas_price(gateway: web::Data<Gateway>) -> Result<HttpResponse, ServiceError> {
    Ok(ok(gateway.gas_price().await?))
}

#[get("/api/balance/{address}")]
async fn balance(
    gateway: web::Data<Gateway>,
    address: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(ok(gateway.balance(&address).await?))
}

#[get("/api/nonce/{address}")]
async fn nonce(
    gateway: web::Data<Gateway>,
    address: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(ok(gateway.transaction_count(&address).await?))
}

#[post("/api/transaction")]
async fn send_transaction(
    gateway: web::Data<Gateway>,
    body: web::Json<TransactionBody>,
) -> Result<HttpResponse, ServiceError> {
    let (to, value) = match (non_blank(&body.to), non_blank(&body.value)) {
        (Some(to), Some(value)) => (to, value),
        (to, value) => {
            return Err(missing_fields(&[("to", to.is_some()), ("value", value.is_some())]))
        }
    };
    info!(to, value, "Transaction requested");

    Ok(ok(gateway
        .send_transaction(to, value, body.data.as_deref())
        .await?))
}

#[get("/api/receipt/{txhash}")]
async fn receipt(
    gateway: web::Data<Gateway>,
    tx_hash: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(ok(gateway.transaction_receipt(&tx_hash).await?))
}

#[post("/api/contract/call")]
async fn call_contract(
    gateway: web::Data<Gateway>,
    body: web::Json<ContractCallBody>,
) -> Result<HttpResponse, ServiceError> {
    let fields = (
        non_blank(&body.contract_address),
        non_empty_json(&body.abi),
        non_blank(&body.method),
    );
    let (address, abi, method) = match fields {
        (Some(address), Some(abi), Some(method)) => (address, abi, method),
        (address, abi, method) => {
            return Err(missing_fields(&[
                ("contractAddress", address.is_some()),
                ("abi", abi.is_some()),
                ("method", method.is_some()),
            ]))
        }
    };
    let params = body.params.as_deref().unwrap_or_default();
    debug!(address, method, params = params.len(), "Contract call requested");

    Ok(ok(gateway.call_contract(address, abi, method, params).await?))
}

#[post("/api/contract/deploy")]
async fn deploy_contract(
    gateway: web::Data<Gateway>,
    body: web::Json<ContractDeployBody>,
) -> Result<HttpResponse, ServiceError> {
    let (abi, bytecode) = match (non_empty_json(&body.abi), non_blank(&body.bytecode)) {
        (Some(abi), Some(bytecode)) => (abi, bytecode),
        (abi, bytecode) => {
            return Err(missing_fields(&[
                ("abi", abi.is_some()),
                ("bytecode", bytecode.is_some()),
            ]))
        }
    };
    let constructor_args = body.constructor_args.as_deref().unwrap_or_default();
    info!(args = constructor_args.len(), "Contract deployment requested");

    Ok(ok(gateway
        .deploy_contract(abi, bytecode, constructor_args)
        .await?))
}

/// Malformed JSON bodies get the same 400 envelope as missing fields
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::Validation(format!("Invalid JSON body: {}", err)).into()
}

/// Configure the API routes for the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(json_error_handler),
    )
    .service(index)
    .service(health)
    .service(network_status)
    .service(gas_price)
    .service(balance)
    .service(nonce)
    .service(send_transaction)
    .service(receipt)
    .service(call_contract)
    .service(deploy_contract);
}
