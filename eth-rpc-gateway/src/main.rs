use actix_web::{web, App, HttpServer};
use eth_rpc_gateway::{
    api,
    config::Config,
    gateway::{Gateway, GatewaySettings},
    rpc::EthereumClient,
};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

/// Application entry point
///
/// This is the main function that:
/// 1. Sets up logging
/// 2. Loads configuration and the optional signer
/// 3. Builds the Ethereum client
/// 4. Creates the gateway handler
/// 5. Starts the HTTP server with all endpoints
#[actix_web::main] // Actix will build a multithreaded runtime
async fn main() -> eyre::Result<()> {
    // Our crate at info, dependencies quieter; RUST_LOG still wins for anything it names
    let filter = EnvFilter::from_default_env()
        .add_directive("eth_rpc_gateway=info".parse()?)
        .add_directive("actix_web=error".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    info!(?config, "Configuration loaded");

    let signer = config.signer()?;
    let client = EthereumClient::new(&config.ethereum_rpc_url, signer, config.rpc_timeout()).await?;

    let gateway = Gateway::new(Arc::new(client), GatewaySettings::from(&config));

    info!(host = %config.host, port = config.port, "Starting HTTP server");
    HttpServer::new(move || {
        App::new()
            // Add logging middleware
            .wrap(TracingLogger::default())
            // Shared between workers; holds no mutable state
            .app_data(web::Data::new(gateway.clone()))
            .configure(api::configure)
    })
    .workers(config.workers)
    // SIGINT/SIGTERM stop the server without waiting for in-flight requests
    .shutdown_timeout(0)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
