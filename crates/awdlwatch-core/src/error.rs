//! Error types for the enforcement engine.

use core::fmt;

/// Result type for engine operations
pub type WatchResult<T> = Result<T, WatchError>;

/// Errors that can occur in engine operations.
///
/// Only two of these ever reach a caller synchronously:
/// `ResourceUnavailable` (construction failed, everything already opened has
/// been released) and `ChannelFull`/`PostFailed` (a posted command could not
/// be delivered). Everything else is logged and absorbed by the loop, whose
/// job is to keep running despite transient OS-level hiccups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// A kernel-facing resource could not be opened at construction.
    ResourceUnavailable { what: &'static str, errno: i32 },

    /// Command channel is full (for post) - back-pressure, not loss.
    ChannelFull,

    /// The peer end of a channel is gone.
    ChannelClosed,

    /// Command write still failing after bounded retries.
    PostFailed(i32),

    /// Reading or writing interface flags failed.
    FlagOp(i32),

    /// The target interface does not resolve by name right now.
    InterfaceNotFound,

    /// Worker did not exit within the shutdown timeout.
    ShutdownTimeout,

    /// Any other OS error with errno.
    Os(i32),
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchError::ResourceUnavailable { what, errno } => {
                write!(f, "failed to open {}: errno {}", what, errno)
            }
            WatchError::ChannelFull => write!(f, "command channel full"),
            WatchError::ChannelClosed => write!(f, "channel closed"),
            WatchError::PostFailed(e) => write!(f, "command post failed: errno {}", e),
            WatchError::FlagOp(e) => write!(f, "interface flag operation failed: errno {}", e),
            WatchError::InterfaceNotFound => write!(f, "target interface not found"),
            WatchError::ShutdownTimeout => write!(f, "worker did not exit within shutdown timeout"),
            WatchError::Os(e) => write!(f, "OS error: errno {}", e),
        }
    }
}

impl std::error::Error for WatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = WatchError::ChannelFull;
        assert_eq!(format!("{}", e), "command channel full");

        let e = WatchError::ResourceUnavailable { what: "route socket", errno: 13 };
        assert_eq!(format!("{}", e), "failed to open route socket: errno 13");

        let e = WatchError::FlagOp(1);
        assert_eq!(format!("{}", e), "interface flag operation failed: errno 1");
    }
}
