//! Scoped tracking of sensitive buffers and a process-wide
//! memory-reservation budget, guarded by a single lock over a map of
//! outstanding reservations keyed by operation id.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::instrument;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoImgError;
use crate::validation::DEFAULT_MEMORY_BUDGET_BYTES;

/// Snapshot returned by [`BufferManager::memory_usage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub current: u64,
    pub max: u64,
    pub operations: usize,
}

impl MemoryUsage {
    /// `current / max` as a percentage in `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.current as f64 / self.max as f64) * 100.0
    }
}

struct Tracker {
    reservations: HashMap<String, u64>,
    budget: u64,
}

/// Process-wide accounting of outstanding memory reservations.
///
/// One instance is constructed at program start and held by the pipeline
/// orchestrator, passed to every component that reserves sensitive memory.
pub struct BufferManager {
    tracker: Mutex<Tracker>,
}

impl BufferManager {
    pub fn new(budget: u64) -> Self {
        Self { tracker: Mutex::new(Tracker { reservations: HashMap::new(), budget }) }
    }

    /// Reserve `bytes` under `op_id`. Fails [`CryptoImgError::MemoryLimit`]
    /// synchronously and atomically if the reservation would push total
    /// outstanding reservations past the budget. Reservations across
    /// concurrent operations compete for the same budget; the newest
    /// request loses.
    #[instrument(skip(self))]
    pub fn reserve(&self, op_id: &str, bytes: u64) -> Result<(), CryptoImgError> {
        let mut t = self.tracker.lock().expect("buffer tracker poisoned");
        let outstanding: u64 = t.reservations.values().sum();
        if outstanding.saturating_add(bytes) > t.budget {
            return Err(CryptoImgError::MemoryLimit);
        }
        *t.reservations.entry(op_id.to_string()).or_insert(0) += bytes;
        Ok(())
    }

    /// Release whatever `op_id` had reserved. Idempotent: releasing an
    /// unknown or already-released `op_id` is a no-op, so callers can call
    /// this unconditionally on every exit path.
    #[instrument(skip(self))]
    pub fn release(&self, op_id: &str) {
        let mut t = self.tracker.lock().expect("buffer tracker poisoned");
        t.reservations.remove(op_id);
    }

    /// Zeroize and drop every tracked reservation. Invoked at process-exit
    /// hooks and on critical-severity errors.
    pub fn cleanup_all(&self) {
        let mut t = self.tracker.lock().expect("buffer tracker poisoned");
        t.reservations.clear();
    }

    /// Health-check snapshot: `{current, max, percentage, operations}`.
    pub fn memory_usage(&self) -> MemoryUsage {
        let t = self.tracker.lock().expect("buffer tracker poisoned");
        MemoryUsage {
            current: t.reservations.values().sum(),
            max: t.budget,
            operations: t.reservations.len(),
        }
    }
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_BUDGET_BYTES)
    }
}

/// A byte buffer whose backing store is zeroized when it drops out of
/// scope, on every exit path including panics/unwinds.
#[derive(ZeroizeOnDrop)]
pub struct SecureBuffer {
    data: Vec<u8>,
}

impl SecureBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Hand the plaintext bytes to a caller that will take over their
    /// lifetime (e.g. returning decrypted output to the operation's
    /// caller). The emptied husk still zeroizes normally when it drops.
    pub fn into_inner(mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}
