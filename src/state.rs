// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    blockchain::{ChainClient, NetworkConfig},
    credentials::CredentialResolver,
    engine::{
        AddressLocks, AssetCatalog, BalanceAggregator, CallContext, SwapEngine, TransferEngine,
    },
    oracle::PriceOracle,
};

/// Shared handles for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub network: Arc<NetworkConfig>,
    pub catalog: Arc<AssetCatalog>,
    pub chain: Arc<dyn ChainClient>,
    pub portfolio: Arc<BalanceAggregator>,
    pub transfers: Arc<TransferEngine>,
    /// `None` when no swap router is configured
    pub swaps: Option<Arc<SwapEngine>>,
    /// `None` when no credential source is configured
    pub credentials: Option<Arc<dyn CredentialResolver>>,
    pub call_timeout: Duration,
    pub shutdown: CancellationToken,
}

/// Inputs for [`AppState::new`].
pub struct Services {
    pub network: NetworkConfig,
    pub catalog: AssetCatalog,
    pub chain: Arc<dyn ChainClient>,
    pub oracle: Arc<dyn PriceOracle>,
    pub credentials: Option<Arc<dyn CredentialResolver>>,
    pub swap_router: Option<alloy::primitives::Address>,
    pub swap_deadline: Duration,
    pub call_timeout: Duration,
}

impl AppState {
    pub fn new(services: Services, shutdown: CancellationToken) -> Self {
        let catalog = Arc::new(services.catalog);
        let locks = Arc::new(AddressLocks::new());

        let portfolio = Arc::new(BalanceAggregator::new(
            services.chain.clone(),
            services.oracle,
            catalog.clone(),
        ));
        let transfers = Arc::new(TransferEngine::new(
            services.chain.clone(),
            catalog.clone(),
            locks.clone(),
        ));
        let swaps = services.swap_router.map(|router| {
            Arc::new(SwapEngine::new(
                services.chain.clone(),
                catalog.clone(),
                router,
                services.swap_deadline,
                locks,
            ))
        });

        Self {
            network: Arc::new(services.network),
            catalog,
            chain: services.chain,
            portfolio,
            transfers,
            swaps,
            credentials: services.credentials,
            call_timeout: services.call_timeout,
            shutdown,
        }
    }

    /// Bounds for one request's outbound calls; cancelled on shutdown.
    pub fn call_context(&self) -> CallContext {
        CallContext::with_cancellation(self.call_timeout, self.shutdown.child_token())
    }
}
