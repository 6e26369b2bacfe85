// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use relational_portfolio::{
    api::router,
    blockchain::{ChainClient, RpcChainClient},
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    credentials::{CredentialResolver, PemKeyDirectory},
    engine::AssetCatalog,
    oracle::CoinMarketCapClient,
    state::{AppState, Services},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let catalog = match &config.catalog_path {
        Some(path) => AssetCatalog::load(path, config.reference_symbol.as_deref())?,
        None => {
            let catalog = AssetCatalog::builtin()?;
            match config.reference_symbol.as_deref() {
                Some(reference) => catalog.with_reference(reference)?,
                None => catalog,
            }
        }
    };
    info!(
        assets = catalog.assets().len(),
        reference = %catalog.reference_symbol(),
        "Asset catalog loaded"
    );

    let chain: Arc<dyn ChainClient> = Arc::new(RpcChainClient::connect(config.network.clone())?);
    let oracle = Arc::new(CoinMarketCapClient::new(
        config.oracle.base_url.clone(),
        config.oracle.api_key.clone(),
        config.call_timeout,
    )?);

    let credentials: Option<Arc<dyn CredentialResolver>> = match &config.signer_keys_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Signing credentials enabled");
            Some(Arc::new(PemKeyDirectory::new(dir)))
        }
        None => {
            warn!("SIGNER_KEYS_DIR not set; transfers and swaps cannot be executed");
            None
        }
    };
    if config.swap_router.is_none() {
        warn!("SWAP_ROUTER_ADDRESS not set; swaps are disabled");
    }

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        Services {
            network: config.network.clone(),
            catalog,
            chain,
            oracle,
            credentials,
            swap_router: config.swap_router,
            swap_deadline: config.swap_deadline,
            call_timeout: config.call_timeout,
        },
        shutdown.clone(),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        network = %config.network.name,
        "Relational Portfolio listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}
