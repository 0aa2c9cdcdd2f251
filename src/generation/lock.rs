//! Per-case-key generation locks.
//!
//! At most one generation runs per case key. Contenders for a held key wait
//! on that key's mutex instead of failing; once they get it they re-check the
//! artifact store, since the previous holder has usually just produced the
//! artifact. Distinct keys never wait on each other.
//!
//! **Design**:
//! - `GenerationLocks` owns `case key → slot`; a slot is an async mutex plus
//!   the start time of the current holder
//! - `acquire()` waits until the key is free and returns a `GenerationGuard`
//! - dropping the guard releases the key on every exit path (success, error,
//!   panic, task abort) and removes the slot once nobody else waits on it
//! - a contender cancelled while waiting deregisters itself, so an abandoned
//!   wait never leaves a slot behind
//! - `in_flight()` provides observability (which keys, since when)

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;

use crate::models::CaseKey;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Snapshot of a running generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InFlightGeneration {
    pub case_key: CaseKey,
    pub started_at: DateTime<Utc>,
}

struct Slot {
    mutex: Arc<tokio::sync::Mutex<()>>,
    /// Set while a guard for this key is alive.
    held_since: Option<DateTime<Utc>>,
    /// Contenders registered in `acquire()` that do not hold the key yet.
    pending: usize,
}

impl Slot {
    fn is_idle(&self) -> bool {
        self.held_since.is_none() && self.pending == 0
    }
}

type SlotTable = Arc<Mutex<HashMap<CaseKey, Slot>>>;

// ═══════════════════════════════════════════════════════════
// GenerationLocks
// ═══════════════════════════════════════════════════════════

/// Lock manager keyed by case key.
#[derive(Clone, Default)]
pub struct GenerationLocks {
    slots: SlotTable,
}

impl GenerationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free, then hold it until the guard is dropped.
    ///
    /// The guard records whether another holder had the key first, which
    /// tells the caller to re-check the store before generating.
    pub async fn acquire(&self, key: &CaseKey) -> GenerationGuard {
        let ticket = WaitTicket::register(&self.slots, key);

        let (guard, waited) = match Arc::clone(&ticket.mutex).try_lock_owned() {
            Ok(guard) => (guard, false),
            Err(_) => {
                tracing::debug!(case_key = %key, "Waiting for in-flight generation");
                (Arc::clone(&ticket.mutex).lock_owned().await, true)
            }
        };
        ticket.promote();

        GenerationGuard {
            key: key.clone(),
            guard: Some(guard),
            slots: Arc::clone(&self.slots),
            waited,
        }
    }

    /// Is a generation for `key` currently running?
    pub fn is_generating(&self, key: &CaseKey) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.get(key).is_some_and(|s| s.held_since.is_some()))
            .unwrap_or(false)
    }

    /// Every key currently being generated, oldest first.
    pub fn in_flight(&self) -> Vec<InFlightGeneration> {
        let mut running: Vec<InFlightGeneration> = match self.slots.lock() {
            Ok(slots) => slots
                .iter()
                .filter_map(|(key, slot)| {
                    slot.held_since.map(|started_at| InFlightGeneration {
                        case_key: key.clone(),
                        started_at,
                    })
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        running.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        running
    }

    /// Number of keys with a live slot (holder or waiters).
    pub fn tracked_keys(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

// ── WaitTicket ──

/// Registration of one contender between `acquire()` and holding the key.
/// Dropped without `promote()` (the acquiring task was cancelled), it
/// deregisters and removes the slot if nothing else uses it.
struct WaitTicket {
    key: CaseKey,
    slots: SlotTable,
    mutex: Arc<tokio::sync::Mutex<()>>,
    armed: bool,
}

impl WaitTicket {
    fn register(slots: &SlotTable, key: &CaseKey) -> Self {
        let mut table = slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = table.entry(key.clone()).or_insert_with(|| Slot {
            mutex: Arc::new(tokio::sync::Mutex::new(())),
            held_since: None,
            pending: 0,
        });
        slot.pending += 1;
        Self {
            key: key.clone(),
            slots: Arc::clone(slots),
            mutex: Arc::clone(&slot.mutex),
            armed: true,
        }
    }

    /// The contender now holds the key.
    fn promote(mut self) {
        self.armed = false;
        let mut table = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = table.get_mut(&self.key) {
            slot.pending = slot.pending.saturating_sub(1);
            slot.held_since = Some(Utc::now());
        }
    }
}

impl Drop for WaitTicket {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut table = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let remove = match table.get_mut(&self.key) {
            Some(slot) => {
                slot.pending = slot.pending.saturating_sub(1);
                slot.is_idle()
            }
            None => false,
        };
        if remove {
            table.remove(&self.key);
            tracing::debug!(case_key = %self.key, "Cancelled contender released idle slot");
        }
    }
}

// ═══════════════════════════════════════════════════════════
// GenerationGuard: scoped ownership of one key
// ═══════════════════════════════════════════════════════════

/// Exclusive right to generate one case key.
///
/// Dropping the guard releases the key. Waiting contenders wake in
/// FIFO order.
pub struct GenerationGuard {
    key: CaseKey,
    guard: Option<OwnedMutexGuard<()>>,
    slots: SlotTable,
    waited: bool,
}

impl GenerationGuard {
    pub fn key(&self) -> &CaseKey {
        &self.key
    }

    /// Whether another holder had the key when this guard was requested.
    pub fn waited(&self) -> bool {
        self.waited
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        // Release while the table is locked so no new contender can
        // observe a half-released slot.
        drop(self.guard.take());
        let remove = match slots.get_mut(&self.key) {
            Some(slot) => {
                slot.held_since = None;
                slot.is_idle()
            }
            None => false,
        };
        if remove {
            slots.remove(&self.key);
        }
    }
}
