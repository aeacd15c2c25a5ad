//! errno access across libc flavors.

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))] {
        /// The calling thread's current errno value.
        pub fn last_errno() -> i32 {
            unsafe { *libc::__error() }
        }
    } else if #[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))] {
        /// The calling thread's current errno value.
        pub fn last_errno() -> i32 {
            unsafe { *libc::__errno() }
        }
    } else {
        /// The calling thread's current errno value.
        pub fn last_errno() -> i32 {
            unsafe { *libc::__errno_location() }
        }
    }
}
