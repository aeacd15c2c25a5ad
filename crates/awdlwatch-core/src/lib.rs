//! # awdlwatch-core — Trait definitions for the enforcement engine
//!
//! This crate defines the trait boundaries for every OS-facing capability
//! of the watchdog, plus the small value types that cross them. Default
//! implementations against the real kernel interfaces live in
//! `awdlwatch-module`; the loop that drives them lives in
//! `awdlwatch-engine`.
//!
//! Every component depends on traits from this crate, never on concrete
//! types. That is what lets the enforcement loop run against a fake flag
//! adapter and a pipe-backed event feed in tests.
//!
//! ## Modules
//!
//! - `command` - control commands and their single-byte wire form
//! - `event` - interface change events
//! - `counter` - intervention counter
//! - `flags` - flag control trait (read/write administrative flags)
//! - `feed` - interface change feed trait
//! - `surface` - the closed control surface exposed to host processes
//! - `error` - error types
//! - `wlog` - leveled stderr logging macros

pub mod command;
pub mod counter;
pub mod error;
pub mod event;
pub mod feed;
pub mod flags;
pub mod surface;
pub mod wlog;

// Re-exports for convenience
pub use command::Command;
pub use counter::InterventionCounter;
pub use error::{WatchError, WatchResult};
pub use event::{InterfaceEvent, IFF_UP};
pub use feed::EventFeed;
pub use flags::FlagControl;
pub use surface::ControlSurface;
