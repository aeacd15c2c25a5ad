//! The command channel — caller threads to the enforcement loop.
//!
//! A non-blocking Unix socketpair carrying single-byte commands in strict
//! FIFO order. A socketpair rather than an in-memory queue because the
//! loop's readiness wait needs a file descriptor, and rather than a plain
//! pipe because a write after the loop has torn down must come back as an
//! error, not a process-killing SIGPIPE.
//!
//! Capacity is the kernel socket buffer. Back-pressure on `post` is
//! surfaced as `ChannelFull`; a command is never silently dropped.

use awdlwatch_core::command::Command;
use awdlwatch_core::error::{WatchError, WatchResult};

use std::os::unix::io::RawFd;

use crate::errno::last_errno;

/// Bounded attempts when a post is interrupted mid-write.
const POST_ATTEMPTS: u32 = 3;

/// Create the command channel.
///
/// The sender stays with the lifecycle manager and may be used from any
/// caller thread; the receiver moves into the enforcement loop thread,
/// which exclusively owns it until exit.
pub fn command_pair() -> WatchResult<(CommandSender, CommandReceiver)> {
    let mut fds = [0 as RawFd; 2];
    let rc = unsafe {
        libc::socketpair(libc::AF_UNIX, libc::SOCK_STREAM, 0, fds.as_mut_ptr())
    };
    if rc < 0 {
        return Err(WatchError::ResourceUnavailable {
            what: "command socketpair",
            errno: last_errno(),
        });
    }
    for fd in fds {
        let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, libc::O_NONBLOCK) };
        if rc < 0 {
            let errno = last_errno();
            unsafe {
                libc::close(fds[0]);
                libc::close(fds[1]);
            }
            return Err(WatchError::ResourceUnavailable {
                what: "command socketpair (nonblock)",
                errno,
            });
        }
        unsafe {
            libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC);
        }
        set_nosigpipe(fd);
    }
    Ok((CommandSender { fd: fds[0] }, CommandReceiver { fd: fds[1] }))
}

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))] {
        fn set_nosigpipe(fd: RawFd) {
            let one: libc::c_int = 1;
            unsafe {
                libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_NOSIGPIPE,
                    &one as *const libc::c_int as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                );
            }
        }

        const SEND_FLAGS: libc::c_int = 0;
    } else {
        fn set_nosigpipe(_fd: RawFd) {}

        const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
    }
}

/// Write end of the command channel. Callable from any thread.
pub struct CommandSender {
    fd: RawFd,
}

impl CommandSender {
    /// Post a command.
    ///
    /// Retries a bounded number of times when interrupted. Failure means
    /// the command was NOT delivered - the caller must not assume the
    /// engine will act on it.
    pub fn post(&self, cmd: Command) -> WatchResult<()> {
        let byte = [cmd.to_byte()];
        for _ in 0..POST_ATTEMPTS {
            let n = unsafe {
                libc::send(self.fd, byte.as_ptr() as *const libc::c_void, 1, SEND_FLAGS)
            };
            if n == 1 {
                return Ok(());
            }
            if n < 0 {
                match last_errno() {
                    libc::EINTR => continue,
                    libc::EAGAIN => return Err(WatchError::ChannelFull),
                    libc::EPIPE | libc::ECONNRESET => return Err(WatchError::ChannelClosed),
                    e => return Err(WatchError::PostFailed(e)),
                }
            }
        }
        Err(WatchError::PostFailed(libc::EINTR))
    }
}

impl Drop for CommandSender {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe {
                libc::close(self.fd);
            }
            self.fd = -1;
        }
    }
}

/// Read end of the command channel. Exclusively owned by the enforcement
/// loop thread.
pub struct CommandReceiver {
    fd: RawFd,
}

impl CommandReceiver {
    /// The descriptor the enforcement loop includes in its readiness wait.
    pub fn raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Pull the next pending command, in FIFO order.
    ///
    /// `Ok(None)` means drained. `ChannelClosed` means every sender is
    /// gone - the host has torn down, treat as Quit. Bytes that decode to
    /// no command are skipped.
    pub fn try_next(&mut self) -> WatchResult<Option<Command>> {
        loop {
            let mut byte = [0u8; 1];
            let n = unsafe {
                libc::recv(self.fd, byte.as_mut_ptr() as *mut libc::c_void, 1, 0)
            };
            if n == 1 {
                match Command::from_byte(byte[0]) {
                    Some(cmd) => return Ok(Some(cmd)),
                    None => continue,
                }
            }
            if n == 0 {
                return Err(WatchError::ChannelClosed);
            }
            match last_errno() {
                libc::EINTR => continue,
                libc::EAGAIN => return Ok(None),
                e => return Err(WatchError::Os(e)),
            }
        }
    }
}

impl Drop for CommandReceiver {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe {
                libc::close(self.fd);
            }
            self.fd = -1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_and_receive_fifo() {
        let (tx, mut rx) = command_pair().unwrap();

        tx.post(Command::Disable).unwrap();
        tx.post(Command::Enable).unwrap();
        tx.post(Command::Quit).unwrap();

        assert_eq!(rx.try_next().unwrap(), Some(Command::Disable));
        assert_eq!(rx.try_next().unwrap(), Some(Command::Enable));
        assert_eq!(rx.try_next().unwrap(), Some(Command::Quit));
        assert_eq!(rx.try_next().unwrap(), None);
    }

    #[test]
    fn test_empty_channel_is_none() {
        let (_tx, mut rx) = command_pair().unwrap();
        assert_eq!(rx.try_next().unwrap(), None);
    }

    #[test]
    fn test_sender_drop_reads_as_closed() {
        let (tx, mut rx) = command_pair().unwrap();
        tx.post(Command::Disable).unwrap();
        drop(tx);

        // Queued command still drains, then EOF
        assert_eq!(rx.try_next().unwrap(), Some(Command::Disable));
        assert_eq!(rx.try_next().unwrap_err(), WatchError::ChannelClosed);
    }

    #[test]
    fn test_receiver_drop_fails_post() {
        let (tx, rx) = command_pair().unwrap();
        drop(rx);

        let err = tx.post(Command::Enable).unwrap_err();
        assert!(
            matches!(err, WatchError::ChannelClosed | WatchError::PostFailed(_)),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_unknown_byte_skipped() {
        let (tx, mut rx) = command_pair().unwrap();

        let junk = [b'x'];
        let n = unsafe {
            libc::send(tx.fd, junk.as_ptr() as *const libc::c_void, 1, SEND_FLAGS)
        };
        assert_eq!(n, 1);
        tx.post(Command::Quit).unwrap();

        // The junk byte is skipped, the real command comes through
        assert_eq!(rx.try_next().unwrap(), Some(Command::Quit));
    }
}
