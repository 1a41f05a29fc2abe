// Actor lifecycle states and the cooperative stop flag

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle states every actor moves through
///
/// The engine drives the transitions: `set_up()` moves New to SetUp,
/// `execute()` enters Executing, `wrap_up()` and `clean_up()` finish the
/// actor off. Setting any option drops the actor back to New.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    New,
    Initialized,
    SetUp,
    Executing,
    Paused,
    WrappedUp,
    CleanedUp,
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::New
    }
}

/// Shared cooperative cancellation flag
///
/// `stop_execution()` sets it; long-running `execute()` implementations and
/// algorithms poll it at natural boundaries and bail out. Cancellation is
/// never surfaced as a failure.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check if a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear the flag so the actor can run again
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_token_is_shared() {
        let token = StopToken::new();
        let forwarded = token.clone();

        assert!(!forwarded.is_stopped());
        token.request_stop();
        assert!(forwarded.is_stopped());
        token.clear();
        assert!(!forwarded.is_stopped());
    }

    #[test]
    fn test_default_state_is_new() {
        assert_eq!(LifecycleState::default(), LifecycleState::New);
    }
}
