// SPDX-License-Identifier: MIT

//! In-flight effect bookkeeping
//!
//! Every effect that is still running after its first poll is registered
//! under a fresh id until it completes. The registry exists so a store can
//! release its effects when it is torn down; it is not a cancellation API.

use futures::future::AbortHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Registry of running effects, keyed by subscription id
#[derive(Debug, Default)]
pub struct EffectRegistry {
    inflight: Mutex<HashMap<Uuid, AbortHandle>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a running effect; returns how many are now in flight
    pub fn register(&self, id: Uuid, handle: AbortHandle) -> usize {
        let mut inflight = self.inflight.lock();
        inflight.insert(id, handle);
        inflight.len()
    }

    /// Forget a finished effect
    pub fn release(&self, id: &Uuid) -> bool {
        self.inflight.lock().remove(id).is_some()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.inflight.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inflight.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.lock().is_empty()
    }

    /// Stop every running effect and clear the registry
    pub fn abort_all(&self) -> usize {
        let drained: Vec<AbortHandle> = self.inflight.lock().drain().map(|(_, h)| h).collect();
        for handle in &drained {
            handle.abort();
        }
        drained.len()
    }
}
