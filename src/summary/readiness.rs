use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    NotLoaded,
    Loaded,
    Unloaded,
}

impl ReadinessState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Loaded,
            2 => Self::Unloaded,
            _ => Self::NotLoaded,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::NotLoaded => 0,
            Self::Loaded => 1,
            Self::Unloaded => 2,
        }
    }
}

/// Shared handle on the model lifecycle.
///
/// Owned by process startup/shutdown and cloned into whoever needs to read
/// it. Transitions only move forward: `NotLoaded -> Loaded -> Unloaded`.
#[derive(Debug, Clone)]
pub struct Readiness {
    state: Arc<AtomicU8>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ReadinessState::NotLoaded.as_u8())),
        }
    }

    pub fn state(&self) -> ReadinessState {
        ReadinessState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == ReadinessState::Loaded
    }

    /// `NotLoaded -> Loaded`. Returns false if the model was already loaded
    /// or the process is already shutting down.
    pub fn mark_loaded(&self) -> bool {
        self.state
            .compare_exchange(
                ReadinessState::NotLoaded.as_u8(),
                ReadinessState::Loaded.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Any state -> `Unloaded`. Terminal.
    pub fn mark_unloaded(&self) {
        self.state
            .store(ReadinessState::Unloaded.as_u8(), Ordering::Release);
    }
}
