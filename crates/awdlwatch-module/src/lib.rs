//! # awdlwatch-module — OS-facing default implementations
//!
//! Concrete implementations of the `awdlwatch-core` traits against the
//! real kernel interfaces:
//!
//! - [`ioctl::IoctlFlagControl`] - SIOCGIFFLAGS/SIOCSIFFLAGS over one
//!   AF_INET datagram socket
//! - [`route::RouteSocket`] - non-blocking PF_ROUTE raw socket delivering
//!   RTM_IFINFO interface change messages
//! - [`pipe::command_pair`] - the byte-oriented command channel, a
//!   non-blocking Unix socketpair so the read end participates in the
//!   enforcement loop's readiness wait
//!
//! The routing-message parser and the command channel are portable; the
//! `RouteSocket` itself only exists where the kernel speaks PF_ROUTE
//! (macOS and the BSDs this crate targets).

pub mod errno;
pub mod ioctl;
pub mod pipe;
pub mod route;

pub use errno::last_errno;
pub use ioctl::IoctlFlagControl;
pub use pipe::{command_pair, CommandReceiver, CommandSender};
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
pub use route::RouteSocket;
pub use route::{interface_index, parse_if_message, RawIfInfo};
