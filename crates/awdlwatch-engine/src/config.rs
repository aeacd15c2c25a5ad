//! Configuration for the enforcement engine.

use std::time::Duration;

/// Configuration for one engine instance.
///
/// The two historical deployment shapes are configurations of this one
/// struct, not separate engines: the helper-embedded shape uses the
/// defaults (fail open, wait for commands), the standalone daemon runs
/// with `force_down_on_start = true` and no command channel.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The single interface this engine monitors and controls.
    pub interface: String,
    /// Force the interface down immediately at startup instead of
    /// starting in the allow-up state.
    pub force_down_on_start: bool,
    /// On shutdown, put the interface back up with one unconditional
    /// set-up call (explicit cleanup, exempt from the desired-state
    /// check and from the intervention counter).
    pub restore_up_on_exit: bool,
    /// How long `invalidate` waits for the loop thread to exit before
    /// giving up and proceeding.
    pub shutdown_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interface: "awdl0".to_string(),
            force_down_on_start: false,
            restore_up_on_exit: false,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fail_open() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.interface, "awdl0");
        assert!(!cfg.force_down_on_start);
        assert!(!cfg.restore_up_on_exit);
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(5));
    }
}
