//! Route tests for the gateway, run against a mocked chain client

use actix_web::{
    http::{header, StatusCode},
    test, web, App,
};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

use eth_rpc_gateway::{api, error::ServiceError, rpc::MockChainClient};

use helpers::{gateway_with, read_json, RECIPIENT, RPC_ENDPOINT, SIGNER};

fn signer() -> Address {
    SIGNER.parse().unwrap()
}

#[actix_web::test]
async fn test_health_check_does_not_touch_the_node() {
    // No expectations: any client call would panic.
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(MockChainClient::new())))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let response = read_json(resp).await;
    assert_eq!(
        response,
        json!({
            "status": "ok",
            "service": "eth-rpc-gateway",
            "network": "anvil",
            "rpcEndpoint": RPC_ENDPOINT,
        })
    );
}

#[actix_web::test]
async fn test_index_serves_client_page() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(MockChainClient::new())))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let body = test::read_body(resp).await;
    let page = std::str::from_utf8(&body).unwrap();
    assert!(page.contains("/api/status"));
    assert!(page.contains("/api/contract/deploy"));
}

#[actix_web::test]
async fn test_status_envelope() {
    let mut client = MockChainClient::new();
    client.expect_block_number().returning(|| Ok(123));
    client.expect_chain_id().returning(|| Ok(31337));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/status").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let response = read_json(resp).await;
    assert_eq!(response["success"], true);
    assert!(response.get("error").is_none());
    assert_eq!(
        response["data"],
        json!({
            "blockNumber": 123,
            "chainId": 31337,
            "networkName": "anvil",
            "rpcEndpoint": RPC_ENDPOINT,
        })
    );
}

#[actix_web::test]
async fn test_upstream_failure_is_500_with_message() {
    let mut client = MockChainClient::new();
    client
        .expect_block_number()
        .returning(|| Err(ServiceError::Upstream("connection refused".to_string())));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/status").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = read_json(resp).await;
    assert_eq!(response, json!({"success": false, "error": "connection refused"}));
}

#[actix_web::test]
async fn test_concurrent_status_calls_are_fetched_independently() {
    let calls = AtomicU64::new(0);
    let mut client = MockChainClient::new();
    client
        .expect_block_number()
        .times(2)
        .returning(move || Ok(100 + calls.fetch_add(1, Ordering::SeqCst)));
    client.expect_chain_id().times(2).returning(|| Ok(1));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let (first, second) = tokio::join!(
        test::call_service(&app, test::TestRequest::get().uri("/api/status").to_request()),
        test::call_service(&app, test::TestRequest::get().uri("/api/status").to_request()),
    );
    let first = read_json(first).await;
    let second = read_json(second).await;

    let mut blocks = vec![
        first["data"]["blockNumber"].as_u64().unwrap(),
        second["data"]["blockNumber"].as_u64().unwrap(),
    ];
    blocks.sort_unstable();
    assert_eq!(blocks, vec![100, 101]);
}

#[actix_web::test]
async fn test_gas_price_defaults_to_zero_without_fee_data() {
    let mut client = MockChainClient::new();
    client.expect_gas_price().returning(|| Ok(None));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/gasprice").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let response = read_json(resp).await;
    assert_eq!(response["data"], json!({"gasPrice": "0", "gasPriceGwei": "0"}));
}

#[actix_web::test]
async fn test_gas_price_upstream_failure_is_500() {
    let mut client = MockChainClient::new();
    client
        .expect_gas_price()
        .returning(|| Err(ServiceError::Upstream("connection refused".to_string())));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/gasprice").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = read_json(resp).await;
    assert_eq!(response, json!({"success": false, "error": "connection refused"}));
}

#[actix_web::test]
async fn test_balance_wei_and_ether_agree() {
    let mut client = MockChainClient::new();
    client
        .expect_balance()
        .withf(|address| address.to_string() == RECIPIENT)
        .returning(|_| Ok(U256::from(1_500_000_000_000_000_000u128)));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/balance/{}", RECIPIENT))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let response = read_json(resp).await;
    assert_eq!(response["data"]["address"], RECIPIENT);
    assert_eq!(response["data"]["balance"], "1.5");
    assert_eq!(response["data"]["wei"], "1500000000000000000");

    let ether = response["data"]["balance"].as_str().unwrap();
    let wei = alloy::primitives::utils::parse_ether(ether).unwrap();
    assert_eq!(wei.to_string(), response["data"]["wei"].as_str().unwrap());
}

#[actix_web::test]
async fn test_malformed_address_is_500() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(MockChainClient::new())))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/balance/0xnothex").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = read_json(resp).await;
    assert_eq!(response["success"], false);
    assert!(response["error"].as_str().unwrap().contains("invalid address"));
}

#[actix_web::test]
async fn test_nonce() {
    let mut client = MockChainClient::new();
    client.expect_transaction_count().returning(|_| Ok(7));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/nonce/{}", SIGNER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let response = read_json(resp).await;
    assert_eq!(
        response["data"],
        json!({"address": SIGNER, "transactionCount": 7})
    );
}

#[actix_web::test]
async fn test_transaction_missing_fields_is_400_before_upstream() {
    // No expectations: reaching the client would panic.
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(MockChainClient::new())))
            .configure(api::configure),
    )
    .await;

    for (body, missing) in [
        (json!({"value": "1.0"}), "to"),
        (json!({"to": RECIPIENT}), "value"),
        (json!({"to": "", "value": "1.0"}), "to"),
        (json!({}), "to, value"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/transaction")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", body);

        let response = read_json(resp).await;
        assert_eq!(response["success"], false);
        assert_eq!(
            response["error"],
            format!("Missing required fields: {}", missing)
        );
    }
}

#[actix_web::test]
async fn test_transaction_without_signer_is_configuration_error() {
    let mut client = MockChainClient::new();
    client.expect_signer_address().returning(|| None);
    client.expect_send_transaction().never();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/transaction")
        .set_json(json!({"to": RECIPIENT, "value": "0.1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = read_json(resp).await;
    assert_eq!(
        response,
        json!({"success": false, "error": "no signing key configured"})
    );
}

#[actix_web::test]
async fn test_transaction_is_sent_at_bumped_gas_price() {
    let mut client = MockChainClient::new();
    client.expect_signer_address().returning(move || Some(signer()));
    client.expect_gas_price().returning(|| Ok(Some(1000)));
    client
        .expect_send_transaction()
        .withf(|tx| {
            tx.gas_price == 1100
                && tx.chain_id == 31337
                && tx.data == Bytes::from_static(&[0xab, 0xcd])
        })
        .times(1)
        .returning(|_| Ok(TxHash::repeat_byte(0x42)));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/transaction")
        .set_json(json!({"to": RECIPIENT, "value": "1", "data": "0xabcd"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let response = read_json(resp).await;
    assert_eq!(
        response["data"],
        json!({
            "transactionHash": TxHash::repeat_byte(0x42).to_string(),
            "from": SIGNER,
            "to": RECIPIENT,
            "value": "1",
            "gasPrice": "1100",
        })
    );
}

#[actix_web::test]
async fn test_malformed_json_body_is_400_envelope() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(MockChainClient::new())))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/transaction")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let response = read_json(resp).await;
    assert_eq!(response["success"], false);
    assert!(response["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[actix_web::test]
async fn test_receipt_not_found_and_found() {
    let pending = TxHash::repeat_byte(0x01);
    let mined = TxHash::repeat_byte(0x02);

    let mut client = MockChainClient::new();
    client
        .expect_transaction_receipt()
        .returning(move |hash| {
            if hash == mined {
                Ok(Some(json!({"transactionHash": mined.to_string(), "status": "0x1"})))
            } else {
                Ok(None)
            }
        });

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/receipt/{}", pending))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let response = read_json(resp).await;
    assert_eq!(response["success"], false);
    assert!(response.get("data").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/receipt/{}", mined))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let response = read_json(resp).await;
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["status"], "0x1");
}

#[actix_web::test]
async fn test_contract_call_missing_fields_is_400() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(MockChainClient::new())))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/contract/call")
        .set_json(json!({"params": []}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let response = read_json(resp).await;
    assert_eq!(
        response["error"],
        "Missing required fields: contractAddress, abi, method"
    );
}

#[actix_web::test]
async fn test_contract_call_returns_decoded_value() {
    let mut client = MockChainClient::new();
    client
        .expect_call_contract()
        .withf(|address, abi, method, params| {
            address.to_string() == RECIPIENT
                && abi.function("symbol").is_some()
                && method.to_string() == "symbol"
                && params.is_empty()
        })
        .returning(|_, _, _, _| Ok(json!("GTK")));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/contract/call")
        .set_json(json!({
            "contractAddress": RECIPIENT,
            "abi": ["function symbol() view returns (string)"],
            "method": "symbol"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let response = read_json(resp).await;
    assert_eq!(response, json!({"success": true, "data": "GTK"}));
}

#[actix_web::test]
async fn test_contract_call_with_invalid_abi_is_400() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(MockChainClient::new())))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/contract/call")
        .set_json(json!({
            "contractAddress": RECIPIENT,
            "abi": 17,
            "method": "symbol"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_deploy_missing_bytecode_is_400() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(MockChainClient::new())))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/contract/deploy")
        .set_json(json!({"abi": []}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let response = read_json(resp).await;
    assert_eq!(response["error"], "Missing required fields: bytecode");
}

#[actix_web::test]
async fn test_deploy_without_signer_is_configuration_error() {
    let mut client = MockChainClient::new();
    client.expect_signer_address().returning(|| None);
    client.expect_deploy_contract().never();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(gateway_with(client)))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/contract/deploy")
        .set_json(json!({"abi": [], "bytecode": "0x6080"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = read_json(resp).await;
    assert_eq!(response["error"], "no signing key configured");
}
