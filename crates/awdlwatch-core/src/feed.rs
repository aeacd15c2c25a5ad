//! Interface change feed abstraction.
//!
//! An `EventFeed` delivers asynchronous kernel notifications about the
//! target interface's administrative state as discrete, already-filtered
//! events.
//!
//! # Implementors
//!
//! - `RouteSocket` (default, in `awdlwatch-module`): non-blocking PF_ROUTE
//!   raw socket; parses RTM_IFINFO messages, drops everything else.
//!
//! - `PipeFeed` (testing, in `awdlwatch-engine`): a plain pipe carrying
//!   fixed-size synthetic event records, so loop tests run on any Unix.

use std::os::unix::io::RawFd;

use crate::error::WatchResult;
use crate::event::InterfaceEvent;

/// A non-blocking source of interface change events.
///
/// **Contract:**
/// - `try_next()` must NEVER block. `Ok(None)` means drained; the caller
///   goes back to waiting on `raw_fd()` for readiness.
/// - Events for interfaces other than the target, and malformed raw
///   messages, are consumed and skipped internally - they never surface.
/// - The read end is exclusively owned by the enforcement loop thread and
///   closed only after that thread has exited.
pub trait EventFeed: Send {
    /// The descriptor the enforcement loop blocks on for readiness.
    fn raw_fd(&self) -> RawFd;

    /// Pull the next pending event, if any.
    ///
    /// Several raw messages may be queued between wakeups; the caller
    /// drains in a loop and keeps only the last relevant event
    /// (last-write-wins within one wakeup).
    fn try_next(&mut self) -> WatchResult<Option<InterfaceEvent>>;
}
