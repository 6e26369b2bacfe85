// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM chain client for blockchain interactions.

use alloy::{
    network::Ethereum,
    primitives::{Address, Bytes, B256, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
    transports::TransportError,
};
use async_trait::async_trait;

use super::types::NetworkConfig;

/// HTTP provider type for the configured chain (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Read and submit operations the engines need from a chain node.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Native coin balance of `address`, in wei.
    async fn native_balance(&self, address: Address) -> Result<U256, ChainError>;

    /// Execute a read-only `eth_call` against `contract`.
    async fn contract_read(&self, contract: Address, call_data: Bytes) -> Result<Bytes, ChainError>;

    /// Next nonce for `address` (latest block).
    async fn nonce(&self, address: Address) -> Result<u64, ChainError>;

    /// Market-suggested legacy gas price, in wei.
    async fn suggest_gas_price(&self) -> Result<u128, ChainError>;

    /// Gas units needed to execute `call`.
    async fn estimate_gas(&self, call: TransactionRequest) -> Result<u64, ChainError>;

    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Submit an EIP-2718 encoded signed transaction, returning its hash.
    async fn broadcast(&self, signed_tx: Bytes) -> Result<B256, ChainError>;
}

/// JSON-RPC chain client backed by an alloy HTTP provider.
pub struct RpcChainClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider
    provider: HttpProvider,
}

impl RpcChainClient {
    /// Create a new client for the specified network.
    pub fn connect(network: NetworkConfig) -> Result<Self, ChainError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { network, provider })
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn native_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider.get_balance(address).await.map_err(classify)
    }

    async fn contract_read(&self, contract: Address, call_data: Bytes) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default()
            .to(contract)
            .input(call_data.into());

        self.provider.call(tx).await.map_err(classify)
    }

    async fn nonce(&self, address: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(classify)
    }

    async fn suggest_gas_price(&self) -> Result<u128, ChainError> {
        self.provider.get_gas_price().await.map_err(classify)
    }

    async fn estimate_gas(&self, call: TransactionRequest) -> Result<u64, ChainError> {
        self.provider.estimate_gas(call).await.map_err(classify)
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider.get_chain_id().await.map_err(classify)
    }

    async fn broadcast(&self, signed_tx: Bytes) -> Result<B256, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(&signed_tx)
            .await
            .map_err(classify)?;

        Ok(*pending.tx_hash())
    }
}

/// Split node-side rejections (JSON-RPC error responses) from transport
/// failures so callers can tell "node said no" from "node unreachable".
fn classify(error: TransportError) -> ChainError {
    match error.as_error_resp() {
        Some(payload) => ChainError::Rejected(payload.message.to_string()),
        None => ChainError::Rpc(error.to_string()),
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Node rejected request: {0}")]
    Rejected(String),

    #[error("Invalid node response: {0}")]
    InvalidResponse(String),
}
