//! `RouteSocket` — default `EventFeed` implementation.
//!
//! A non-blocking PF_ROUTE raw socket receives a copy of every routing
//! message the kernel emits, system-wide and unsolicited. The only message
//! type this engine cares about is RTM_IFINFO ("interface info changed"),
//! and within those, only messages about the target interface.
//!
//! Message validation is deliberately paranoid: routing messages arrive
//! from the kernel but the parser treats every buffer as untrusted input.
//! A truncated or inconsistent message is skipped, never an error and
//! never a crash.

use awdlwatch_core::event::InterfaceEvent;

use std::ffi::CString;

/// Routing message type for "interface info changed".
pub const RTM_IFINFO: u8 = 0x0e;

/// Fixed if_msghdr prefix the parser requires: msglen, version, type,
/// ifm_addrs, ifm_flags, ifm_index and trailing pad, before if_data.
pub const IFM_HDR_MIN: usize = 16;

// if_msghdr field offsets (identical on every PF_ROUTE platform we target)
const OFF_MSGLEN: usize = 0; // u16
const OFF_TYPE: usize = 3; // u8
const OFF_FLAGS: usize = 8; // i32
const OFF_INDEX: usize = 12; // u16

/// Interface index and flags lifted from one raw RTM_IFINFO message,
/// before target filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawIfInfo {
    pub index: u16,
    pub flags: i32,
}

/// Parse one raw routing message into its interface info.
///
/// Returns `None` (skip) unless the buffer is a complete, self-consistent
/// RTM_IFINFO message: long enough for the fixed header, self-reported
/// length equal to the bytes actually read, and the right message type.
pub fn parse_if_message(buf: &[u8]) -> Option<RawIfInfo> {
    if buf.len() < IFM_HDR_MIN {
        return None;
    }
    let msglen = u16::from_ne_bytes([buf[OFF_MSGLEN], buf[OFF_MSGLEN + 1]]) as usize;
    if msglen != buf.len() {
        return None;
    }
    if buf[OFF_TYPE] != RTM_IFINFO {
        return None;
    }
    let flags = i32::from_ne_bytes([
        buf[OFF_FLAGS],
        buf[OFF_FLAGS + 1],
        buf[OFF_FLAGS + 2],
        buf[OFF_FLAGS + 3],
    ]);
    let index = u16::from_ne_bytes([buf[OFF_INDEX], buf[OFF_INDEX + 1]]);
    Some(RawIfInfo { index, flags })
}

/// Keep the event only if it is about the target interface.
pub fn accept_event(raw: RawIfInfo, target_index: u32) -> Option<InterfaceEvent> {
    if u32::from(raw.index) != target_index {
        return None;
    }
    Some(InterfaceEvent {
        index: u32::from(raw.index),
        flags: raw.flags,
    })
}

/// Resolve an interface name to its current kernel index.
///
/// Returns `None` when the interface does not exist right now - which is
/// legitimate, interfaces come and go.
pub fn interface_index(name: &str) -> Option<u32> {
    let cname = CString::new(name).ok()?;
    let idx = unsafe { libc::if_nametoindex(cname.as_ptr()) };
    if idx == 0 {
        None
    } else {
        Some(idx)
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))] {
        use awdlwatch_core::error::{WatchError, WatchResult};
        use awdlwatch_core::feed::EventFeed;
        use awdlwatch_core::{wdebug, wwarn};

        use std::os::unix::io::RawFd;

        use crate::errno::last_errno;

        /// Consecutive name-lookup failures before the log level escalates.
        const LOOKUP_ESCALATE_AFTER: u32 = 8;

        /// Largest routing message we expect in one read.
        const ROUTE_BUF_LEN: usize = 2048;

        /// The kernel change channel: a non-blocking PF_ROUTE raw socket.
        ///
        /// Exclusively owned by the enforcement loop thread; closed on drop,
        /// which happens only after that thread has exited.
        pub struct RouteSocket {
            fd: RawFd,
            ifname: String,
            lookup_failures: u32,
            buf: [u8; ROUTE_BUF_LEN],
        }

        impl RouteSocket {
            /// Open the routing socket and set it non-blocking.
            pub fn open(ifname: &str) -> WatchResult<RouteSocket> {
                let fd = unsafe { libc::socket(libc::PF_ROUTE, libc::SOCK_RAW, 0) };
                if fd < 0 {
                    return Err(WatchError::ResourceUnavailable {
                        what: "route socket",
                        errno: last_errno(),
                    });
                }
                let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, libc::O_NONBLOCK) };
                if rc < 0 {
                    let errno = last_errno();
                    unsafe { libc::close(fd); }
                    return Err(WatchError::ResourceUnavailable {
                        what: "route socket (nonblock)",
                        errno,
                    });
                }
                unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC); }
                Ok(RouteSocket {
                    fd,
                    ifname: ifname.to_string(),
                    lookup_failures: 0,
                    buf: [0; ROUTE_BUF_LEN],
                })
            }
        }

        impl EventFeed for RouteSocket {
            fn raw_fd(&self) -> RawFd {
                self.fd
            }

            fn try_next(&mut self) -> WatchResult<Option<InterfaceEvent>> {
                loop {
                    let n = unsafe {
                        libc::read(
                            self.fd,
                            self.buf.as_mut_ptr() as *mut libc::c_void,
                            ROUTE_BUF_LEN,
                        )
                    };
                    if n < 0 {
                        match last_errno() {
                            libc::EINTR => continue,
                            libc::EAGAIN => return Ok(None),
                            e => return Err(WatchError::Os(e)),
                        }
                    }
                    if n == 0 {
                        return Ok(None);
                    }

                    let raw = match parse_if_message(&self.buf[..n as usize]) {
                        Some(raw) => raw,
                        None => continue,
                    };

                    // Resolve the target's index per message - the interface
                    // may legitimately be absent at this moment.
                    let target = match interface_index(&self.ifname) {
                        Some(idx) => idx,
                        None => {
                            self.lookup_failures += 1;
                            if self.lookup_failures >= LOOKUP_ESCALATE_AFTER {
                                wwarn!(
                                    "{}: index lookup failed {} times in a row",
                                    self.ifname, self.lookup_failures
                                );
                            } else {
                                wdebug!("{}: index lookup failed, skipping event", self.ifname);
                            }
                            continue;
                        }
                    };
                    self.lookup_failures = 0;

                    match accept_event(raw, target) {
                        Some(ev) => return Ok(Some(ev)),
                        None => continue,
                    }
                }
            }
        }

        impl Drop for RouteSocket {
            fn drop(&mut self) {
                if self.fd >= 0 {
                    unsafe { libc::close(self.fd); }
                    self.fd = -1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a well-formed RTM_IFINFO message.
    fn ifinfo_message(index: u16, flags: i32, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        buf[OFF_MSGLEN..OFF_MSGLEN + 2].copy_from_slice(&(len as u16).to_ne_bytes());
        buf[2] = 5; // RTM_VERSION
        buf[OFF_TYPE] = RTM_IFINFO;
        buf[OFF_FLAGS..OFF_FLAGS + 4].copy_from_slice(&flags.to_ne_bytes());
        buf[OFF_INDEX..OFF_INDEX + 2].copy_from_slice(&index.to_ne_bytes());
        buf
    }

    #[test]
    fn test_parse_good_message() {
        let buf = ifinfo_message(12, 0x8843, 112);
        assert_eq!(
            parse_if_message(&buf),
            Some(RawIfInfo { index: 12, flags: 0x8843 })
        );
    }

    #[test]
    fn test_parse_truncated_message() {
        // 3 bytes is shorter than any routing message header
        assert_eq!(parse_if_message(&[0, 1, 2]), None);
        assert_eq!(parse_if_message(&[]), None);
        assert_eq!(parse_if_message(&[0u8; IFM_HDR_MIN - 1]), None);
    }

    #[test]
    fn test_parse_length_mismatch() {
        // msglen says 112 but only 60 bytes were read
        let mut buf = ifinfo_message(12, 0x8843, 112);
        buf.truncate(60);
        assert_eq!(parse_if_message(&buf), None);
    }

    #[test]
    fn test_parse_wrong_type() {
        let mut buf = ifinfo_message(12, 0x8843, 112);
        buf[OFF_TYPE] = 0x01; // RTM_ADD
        assert_eq!(parse_if_message(&buf), None);
    }

    #[test]
    fn test_accept_event_filters_other_interfaces() {
        let raw = RawIfInfo { index: 99, flags: 0x1 };
        assert_eq!(accept_event(raw, 12), None);

        let raw = RawIfInfo { index: 12, flags: 0x1 };
        let ev = accept_event(raw, 12).unwrap();
        assert_eq!(ev.index, 12);
        assert!(ev.is_up());
    }

    #[test]
    fn test_interface_index_missing_interface() {
        assert_eq!(interface_index("definitely-not-an-interface0"), None);
        assert_eq!(interface_index("bad\0name"), None);
    }
}
