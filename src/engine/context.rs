// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deadline and cancellation guard for outbound calls.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::error::{EngineError, Step};
use crate::blockchain::ChainError;

/// Per-operation bounds applied to every outbound call.
#[derive(Debug, Clone)]
pub struct CallContext {
    timeout: Duration,
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new(timeout: Duration) -> Self {
        Self::with_cancellation(timeout, CancellationToken::new())
    }

    pub fn with_cancellation(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// Run `call` under the deadline and cancellation token.
    ///
    /// The outer error reports a timeout or cancellation; the inner result is
    /// the call's own outcome, left for the caller to classify.
    pub async fn bounded<T, E, F>(&self, step: Step, call: F) -> Result<Result<T, E>, EngineError>
    where
        F: Future<Output = Result<T, E>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(step = %step, "Outbound call cancelled");
                Err(EngineError::Cancelled { step })
            }
            outcome = tokio::time::timeout(self.timeout, call) => match outcome {
                Ok(result) => Ok(result),
                Err(_) => {
                    warn!(step = %step, timeout_ms = self.timeout.as_millis() as u64, "Outbound call timed out");
                    Err(EngineError::Timeout { step, asset: None })
                }
            },
        }
    }

    /// Run a chain call, mapping its failure with [`EngineError::from_chain`].
    pub async fn chain<T, F>(&self, step: Step, call: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        self.bounded(step, call)
            .await?
            .map_err(|e| EngineError::from_chain(step, e))
    }

    /// Broadcast a signed transaction under the deadline alone.
    ///
    /// Cancellation does not apply here: the node may already hold the
    /// transaction.
    pub async fn submit<T, F>(&self, call: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|e| EngineError::from_chain(Step::Broadcast, e)),
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Broadcast timed out; transaction may still be pending"
                );
                Err(EngineError::Timeout {
                    step: Step::Broadcast,
                    asset: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_completed_calls() {
        let ctx = CallContext::new(Duration::from_secs(1));
        let value = ctx
            .chain(Step::Nonce, async { Ok::<_, ChainError>(7u64) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let ctx = CallContext::new(Duration::from_millis(20));
        let result = ctx
            .chain(Step::GasPrice, std::future::pending::<Result<u128, ChainError>>())
            .await;
        assert!(matches!(result, Err(EngineError::Timeout { step: Step::GasPrice, .. })));
    }

    #[tokio::test]
    async fn cancellation_wins_over_pending_call() {
        let token = CancellationToken::new();
        let ctx = CallContext::with_cancellation(Duration::from_secs(30), token.clone());
        token.cancel();

        let result = ctx
            .chain(Step::Broadcast, std::future::pending::<Result<(), ChainError>>())
            .await;
        assert!(matches!(result, Err(EngineError::Cancelled { step: Step::Broadcast })));
    }

    #[tokio::test]
    async fn submit_ignores_cancellation() {
        let token = CancellationToken::new();
        let ctx = CallContext::with_cancellation(Duration::from_secs(1), token.clone());
        token.cancel();

        let hash = ctx
            .submit(async { Ok::<_, ChainError>(42u64) })
            .await
            .unwrap();
        assert_eq!(hash, 42);

        let rejected = ctx
            .submit(async { Err::<(), _>(ChainError::Rejected("nonce too low".into())) })
            .await;
        assert!(matches!(rejected, Err(EngineError::BroadcastFailed(_))));
    }

    #[tokio::test]
    async fn submit_still_honours_the_deadline() {
        let ctx = CallContext::new(Duration::from_millis(20));
        let result = ctx
            .submit(std::future::pending::<Result<(), ChainError>>())
            .await;
        assert!(matches!(
            result,
            Err(EngineError::Timeout { step: Step::Broadcast, .. })
        ));
    }

    #[tokio::test]
    async fn inner_errors_are_left_to_the_caller() {
        let ctx = CallContext::new(Duration::from_secs(1));
        let outcome = ctx
            .bounded(Step::Quotes, async { Err::<(), _>("provider down") })
            .await
            .unwrap();
        assert_eq!(outcome, Err("provider down"));
    }
}
