// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-address serialization of signing operations.

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::Address;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async lock per sending address so two executes from the
/// same account never read the same nonce.
#[derive(Debug, Default)]
pub struct AddressLocks {
    locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl AddressLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `address`. Released when the guard drops.
    pub async fn acquire(&self, address: Address) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Forget locks nobody holds or waits on
            locks.retain(|held, lock| *held == address || Arc::strong_count(lock) > 1);
            locks.entry(address).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
