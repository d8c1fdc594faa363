//! In-memory instrument state.
//!
//! Implements [`StateSource`] over a mutex-protected [`InstrumentState`]
//! that the rest of the firmware updates as the pilot changes settings.
//! Also keeps the mask of entries pushed to clients since the last
//! [`reset_sync`](SharedInstrumentState::reset_sync).

use std::sync::{Arc, Mutex};

use crate::app::ports::StateSource;
use crate::app::state::{InstrumentState, StateEntry};

#[derive(Debug, Default)]
struct Inner {
    state: InstrumentState,
    synced: u8,
}

/// Cloneable handle; all clones see the same state.
#[derive(Debug, Clone, Default)]
pub struct SharedInstrumentState(Arc<Mutex<Inner>>);

impl SharedInstrumentState {
    pub fn new(state: InstrumentState) -> Self {
        Self(Arc::new(Mutex::new(Inner { state, synced: 0 })))
    }

    /// Apply a settings change.
    pub fn update(&self, f: impl FnOnce(&mut InstrumentState)) {
        let mut inner = self.0.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut inner.state);
    }

    pub fn is_synced(&self, entry: StateEntry) -> bool {
        let inner = self.0.lock().unwrap_or_else(|p| p.into_inner());
        inner.synced & entry.mask() != 0
    }

    /// Bitmask of synchronised entries (bit `i` = `StateEntry::ORDER[i]`).
    pub fn synced_mask(&self) -> u8 {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).synced
    }

    pub fn reset_sync(&self) {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).synced = 0;
    }
}

impl StateSource for SharedInstrumentState {
    fn snapshot(&self) -> InstrumentState {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).state
    }

    fn mark_synced(&mut self, entry: StateEntry) {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).synced |= entry.mask();
    }
}
