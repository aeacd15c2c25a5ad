//! # awdlwatch-engine — The Enforcement Loop
//!
//! The enforcement loop is the beating heart of awdlwatch. It runs on a
//! dedicated thread and executes this loop:
//!
//! ```text
//! loop {
//!     1. Block on poll() across the change feed and the command
//!        channel, no timeout (zero CPU while idle)
//!     2. Command channel ready → drain FIFO:
//!          Enable/Disable → update desired state, reconcile now
//!          Quit (or channel gone) → shutting down
//!     3. Change feed ready → drain, keep the LAST relevant event
//!     4. Desired "down" + observed "up" → clear IFF_UP, count one
//!        intervention
//!     5. Shutting down → optional restore-up, signal completion, exit
//! }
//! ```
//!
//! The loop is fully generic over the `FlagControl` and `EventFeed`
//! traits: production wires in the ioctl adapter and the PF_ROUTE socket,
//! tests wire in a recording mock and a socketpair-backed feed, and the
//! loop doesn't change.
//!
//! Exactly two kinds of thread exist: caller threads, which only post
//! commands and read the counter, and the single loop thread, which
//! exclusively owns the flag adapter and both read ends. All cross-thread
//! communication is message passing; the desired state itself has exactly
//! one writer.

pub mod config;
pub mod engine;
pub mod standalone;

mod enforce;
mod wait;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::EngineConfig;
pub use engine::Engine;
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
pub use standalone::run_standalone;
pub use standalone::run_standalone_with;
