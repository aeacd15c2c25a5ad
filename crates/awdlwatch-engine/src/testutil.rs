//! Test doubles for the enforcement loop: a recording flag adapter and a
//! socketpair-backed event feed, so loop tests run on any Unix without a
//! PF_ROUTE socket or privileges.

use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use awdlwatch_core::error::{WatchError, WatchResult};
use awdlwatch_core::event::InterfaceEvent;
use awdlwatch_core::feed::EventFeed;
use awdlwatch_core::flags::FlagControl;
use awdlwatch_module::last_errno;

/// Shared cell behind `MockFlags`, kept by the test for observation.
#[derive(Clone)]
pub(crate) struct MockProbe {
    flags: Arc<Mutex<i32>>,
    writes: Arc<Mutex<Vec<i32>>>,
}

impl MockProbe {
    pub fn current(&self) -> i32 {
        *self.flags.lock().unwrap()
    }

    pub fn writes(&self) -> Vec<i32> {
        self.writes.lock().unwrap().clone()
    }

    /// Flip the simulated interface state out-of-band, like the OS would.
    pub fn set_current(&self, flags: i32) {
        *self.flags.lock().unwrap() = flags;
    }

    /// Spin until `cond` holds or the deadline passes.
    pub fn wait_until<C: Fn(&MockProbe) -> bool>(&self, cond: C) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond(self) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond(self)
    }
}

/// Recording `FlagControl`: serves reads from a shared cell, applies and
/// records writes.
pub(crate) struct MockFlags {
    flags: Arc<Mutex<i32>>,
    writes: Arc<Mutex<Vec<i32>>>,
    fail_writes: bool,
}

impl MockFlags {
    pub fn new(initial: i32) -> (MockFlags, MockProbe) {
        let flags = Arc::new(Mutex::new(initial));
        let writes = Arc::new(Mutex::new(Vec::new()));
        let probe = MockProbe { flags: Arc::clone(&flags), writes: Arc::clone(&writes) };
        (MockFlags { flags, writes, fail_writes: false }, probe)
    }

    /// A variant whose writes always fail with a flag-operation error.
    pub fn failing(initial: i32) -> (MockFlags, MockProbe) {
        let (mut mock, probe) = Self::new(initial);
        mock.fail_writes = true;
        (mock, probe)
    }
}

impl FlagControl for MockFlags {
    fn read_flags(&mut self, _ifname: &str) -> WatchResult<i32> {
        Ok(*self.flags.lock().unwrap())
    }

    fn write_flags(&mut self, _ifname: &str, flags: i32) -> WatchResult<()> {
        if self.fail_writes {
            return Err(WatchError::FlagOp(libc::EPERM));
        }
        self.writes.lock().unwrap().push(flags);
        *self.flags.lock().unwrap() = flags;
        Ok(())
    }
}

/// Byte layout of one synthetic feed record.
const FEED_RECORD: usize = 8;

/// Writer half of the test feed. Pushes synthetic interface events.
pub(crate) struct FeedWriter {
    fd: RawFd,
}

impl FeedWriter {
    pub fn push(&self, index: u32, flags: i32) {
        let mut rec = [0u8; FEED_RECORD];
        rec[..4].copy_from_slice(&index.to_ne_bytes());
        rec[4..].copy_from_slice(&flags.to_ne_bytes());
        let n = unsafe {
            libc::send(self.fd, rec.as_ptr() as *const libc::c_void, FEED_RECORD, 0)
        };
        assert_eq!(n, FEED_RECORD as isize, "feed push failed");
    }
}

impl Drop for FeedWriter {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

/// Reader half: an `EventFeed` over a datagram socketpair, so record
/// boundaries are preserved.
pub(crate) struct PipeFeed {
    fd: RawFd,
}

impl EventFeed for PipeFeed {
    fn raw_fd(&self) -> RawFd {
        self.fd
    }

    fn try_next(&mut self) -> WatchResult<Option<InterfaceEvent>> {
        loop {
            let mut rec = [0u8; FEED_RECORD];
            let n = unsafe {
                libc::recv(self.fd, rec.as_mut_ptr() as *mut libc::c_void, FEED_RECORD, 0)
            };
            if n == FEED_RECORD as isize {
                let index = u32::from_ne_bytes([rec[0], rec[1], rec[2], rec[3]]);
                let flags = i32::from_ne_bytes([rec[4], rec[5], rec[6], rec[7]]);
                return Ok(Some(InterfaceEvent { index, flags }));
            }
            if n == 0 {
                return Ok(None);
            }
            if n < 0 {
                match last_errno() {
                    libc::EINTR => continue,
                    libc::EAGAIN => return Ok(None),
                    e => return Err(WatchError::Os(e)),
                }
            }
            // Short datagram: skip it.
        }
    }
}

impl Drop for PipeFeed {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

/// Create the test feed pair.
pub(crate) fn pipe_feed() -> (FeedWriter, PipeFeed) {
    let mut fds = [0 as RawFd; 2];
    let rc = unsafe {
        libc::socketpair(libc::AF_UNIX, libc::SOCK_DGRAM, 0, fds.as_mut_ptr())
    };
    assert_eq!(rc, 0, "socketpair failed: errno {}", last_errno());
    for fd in fds {
        let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, libc::O_NONBLOCK) };
        assert_eq!(rc, 0, "fcntl failed: errno {}", last_errno());
    }
    (FeedWriter { fd: fds[0] }, PipeFeed { fd: fds[1] })
}
