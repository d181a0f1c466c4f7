//! Gate lifecycle state.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Lifecycle of a gate. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Open = 0,
    Closing = 1,
    Closed = 2,
}

impl GateState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closing => write!(f, "CLOSING"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Atomic holder for a [`GateState`].
#[derive(Debug)]
pub struct AtomicGateState(AtomicU8);

impl AtomicGateState {
    pub fn new() -> Self {
        Self(AtomicU8::new(GateState::Open as u8))
    }

    pub fn load(&self) -> GateState {
        GateState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Moves to `next` if it is later than the current state.
    ///
    /// Returns the previous state.
    pub fn advance(&self, next: GateState) -> GateState {
        GateState::from_u8(self.0.fetch_max(next as u8, Ordering::SeqCst))
    }
}

impl Default for AtomicGateState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_never_moves_back() {
        let state = AtomicGateState::new();
        assert_eq!(state.load(), GateState::Open);

        assert_eq!(state.advance(GateState::Closing), GateState::Open);
        assert_eq!(state.advance(GateState::Closed), GateState::Closing);
        assert_eq!(state.advance(GateState::Open), GateState::Closed);
        assert_eq!(state.load(), GateState::Closed);
    }
}
