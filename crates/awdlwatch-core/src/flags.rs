//! Flag control abstraction.
//!
//! A `FlagControl` reads and writes the administrative flags of a named
//! network interface - the privileged "is this interface allowed to be up"
//! bit the whole engine revolves around.
//!
//! # Implementors
//!
//! - `IoctlFlagControl` (default, in `awdlwatch-module`): one AF_INET
//!   datagram socket held for the adapter's lifetime, SIOCGIFFLAGS /
//!   SIOCSIFFLAGS ioctls against it.
//!
//! - `MockFlags` (testing, in `awdlwatch-engine`): records every call,
//!   serves flags from a shared cell.

use crate::error::WatchResult;

/// Reads and writes interface administrative flags.
///
/// **Contract:**
/// - Both calls are blocking, synchronous, privileged operations.
/// - Both calls must only ever be invoked from the one thread that owns the
///   implementation value. The enforcement loop thread is the sole owner of
///   the engine's instance for its entire lifetime. The adapter cannot
///   check this; it is a precondition on the caller.
/// - Failure is not fatal to the engine: the loop logs it and retries on
///   the next relevant event.
pub trait FlagControl: Send {
    /// Read the current administrative flags of `ifname`.
    fn read_flags(&mut self, ifname: &str) -> WatchResult<i32>;

    /// Replace the administrative flags of `ifname` with `flags`.
    ///
    /// On success the interface's state changes as requested.
    fn write_flags(&mut self, ifname: &str, flags: i32) -> WatchResult<()>;
}
