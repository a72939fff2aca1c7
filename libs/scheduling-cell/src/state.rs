// libs/scheduling-cell/src/state.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::SchedulingWindow;

/// Shared router state: configuration plus the per-professional write locks
/// that serialize the read-check-write sequence. The conflict check and the
/// insert are two separate store calls; without serialization two concurrent
/// requests can both pass the check against a stale snapshot and double-book.
pub struct SchedulingState {
    pub config: AppConfig,
    locks: ProfessionalLocks,
}

impl SchedulingState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            locks: ProfessionalLocks::default(),
        }
    }

    pub fn window(&self) -> SchedulingWindow {
        SchedulingWindow {
            day_start: self.config.day_start,
            day_end: self.config.day_end,
            slot_minutes: self.config.slot_minutes,
        }
    }

    /// Lock guarding all writes for one professional's agenda. Locks are
    /// created on first use and kept for the process lifetime; the set of
    /// professionals is small enough that the map is never pruned.
    pub fn professional_lock(&self, professional_id: Uuid) -> Arc<AsyncMutex<()>> {
        self.locks.for_professional(professional_id)
    }
}

#[derive(Default)]
struct ProfessionalLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl ProfessionalLocks {
    fn for_professional(&self, professional_id: Uuid) -> Arc<AsyncMutex<()>> {
        // The guarded map stays consistent even if a holder panicked, so a
        // poisoned lock is still safe to use.
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(professional_id).or_default().clone()
    }
}
