//! The readiness wait.
//!
//! One poll(2) call with an infinite timeout across the change feed and
//! (when present) the command channel. This is the source of the
//! zero-CPU-when-idle property: the loop thread is suspended in the
//! kernel until one of the descriptors has data or a signal lands.

use std::os::unix::io::RawFd;

use awdlwatch_core::error::{WatchError, WatchResult};
use awdlwatch_module::last_errno;

/// What the wait woke up for.
pub(crate) struct Readiness {
    pub feed: bool,
    pub commands: bool,
    /// A signal interrupted the wait before anything became ready. The
    /// caller re-checks its exit flag and re-enters the wait.
    pub interrupted: bool,
}

/// Block until `feed_fd` or `command_fd` is readable.
pub(crate) fn wait_readable(
    feed_fd: RawFd,
    command_fd: Option<RawFd>,
) -> WatchResult<Readiness> {
    let mut fds = [
        libc::pollfd { fd: feed_fd, events: libc::POLLIN, revents: 0 },
        libc::pollfd { fd: command_fd.unwrap_or(-1), events: libc::POLLIN, revents: 0 },
    ];
    let nfds = if command_fd.is_some() { 2 } else { 1 };

    let rc = unsafe { libc::poll(fds.as_mut_ptr(), nfds as libc::nfds_t, -1) };
    if rc < 0 {
        let e = last_errno();
        if e == libc::EINTR {
            return Ok(Readiness { feed: false, commands: false, interrupted: true });
        }
        return Err(WatchError::Os(e));
    }

    // A hung-up or errored descriptor still needs a read to observe the
    // condition, so it counts as ready.
    const READY: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR;
    Ok(Readiness {
        feed: fds[0].revents & READY != 0,
        commands: command_fd.is_some() && fds[1].revents & READY != 0,
        interrupted: false,
    })
}
