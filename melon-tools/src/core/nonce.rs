// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Per-account transaction sequencing.

use std::collections::HashMap;

use alloy::{
    primitives::Address,
    providers::Provider,
    transports::{RpcError, TransportErrorKind},
};
use tokio::sync::{Mutex, MutexGuard};

/// Allocates transaction nonces for every signing account in the process.
///
/// The first transaction from an account queries the network's pending count;
/// every later one increments an in-memory counter without asking again, since
/// the node's pending view can lag behind transactions it already accepted.
/// Every transaction for an account must flow through one manager for the
/// lifetime of the process or the counters diverge and collide.
#[derive(Debug)]
pub struct NonceManager {
    local_chain: bool,
    counters: Mutex<HashMap<Address, u64>>,
    serial: Mutex<()>,
}

impl NonceManager {
    pub fn new(local_chain: bool) -> Self {
        Self {
            local_chain,
            counters: Mutex::new(HashMap::new()),
            serial: Mutex::new(()),
        }
    }

    /// Allocates the next nonce for `from`.
    ///
    /// In local chain mode the pending count is re-queried on every call
    /// instead of counted locally.
    pub async fn next(
        &self,
        from: Address,
        provider: &impl Provider,
    ) -> Result<u64, RpcError<TransportErrorKind>> {
        if self.local_chain {
            return provider.get_transaction_count(from).pending().await;
        }

        let mut counters = self.counters.lock().await;
        let nonce = match counters.get(&from) {
            Some(nonce) => *nonce,
            None => provider.get_transaction_count(from).pending().await?,
        };
        counters.insert(from, nonce + 1);
        Ok(nonce)
    }

    /// Guard serializing allocate-and-send sequences in local chain mode.
    ///
    /// Batched submissions would otherwise re-read the same pending count
    /// until the previous transaction reaches the node.
    pub async fn serialize_sends(&self) -> Option<MutexGuard<'_, ()>> {
        if self.local_chain {
            Some(self.serial.lock().await)
        } else {
            None
        }
    }
}
