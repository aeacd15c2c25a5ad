//! The control surface exposed to host processes.
//!
//! This is the full, closed operation set a host (helper process, IPC
//! endpoint, UI poller) may invoke against a running engine. The transport
//! that carries these calls across a process boundary is out of scope; a
//! transport-side caller must treat a dropped connection as "state
//! unknown", not as "disabled".

use crate::error::WatchResult;

/// Operations a host process can invoke on the engine.
///
/// All operations are cheap and non-blocking with respect to the
/// enforcement loop: `set_enabled` posts a command and returns once the
/// post is delivered; the actual interface write happens on the worker
/// thread a bounded time later.
pub trait ControlSurface {
    /// Whether the interface is currently allowed to be up.
    fn is_enabled(&self) -> bool;

    /// Request the desired state. `true` permits "up" (takes no action),
    /// `false` forces the interface down whenever it is observed up.
    ///
    /// Errors mean the command was NOT delivered and the caller must
    /// retry or surface the failure - a silently dropped Enable/Disable
    /// would leave the interface in the wrong state indefinitely.
    fn set_enabled(&self, enabled: bool) -> WatchResult<()>;

    /// Human-readable flags/diagnostic snapshot.
    fn status(&self) -> String;

    /// Engine version string.
    fn version(&self) -> String;

    /// How many times the engine forced the interface back down.
    fn intervention_count(&self) -> u64;

    /// Reset the intervention counter to zero.
    fn reset_intervention_count(&self);
}
