//! AWDL Monitor Daemon
//!
//! Watches the awdl0 interface through a routing socket and forces it
//! back down the moment the system brings it up. Event-driven: the
//! process spends its life suspended in a readiness wait and uses no CPU
//! while idle.
//!
//! Run as root:
//!
//! ```text
//! awdl-monitord [interface]
//! ```
//!
//! SIGTERM/SIGINT/SIGHUP request a graceful exit; the handler only raises
//! a flag the loop checks between wakeups.

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
mod daemon {
    use std::sync::atomic::{AtomicBool, Ordering};

    use awdlwatch_core::{werror, winfo, wlog};
    use awdlwatch_engine::{run_standalone, EngineConfig};
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

    static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);

    extern "C" fn handle_signal(_signum: libc::c_int) {
        SHOULD_EXIT.store(true, Ordering::SeqCst);
    }

    fn install_signal_handlers() -> nix::Result<()> {
        // No SA_RESTART: the readiness wait must come back with EINTR so
        // the loop re-checks the exit flag.
        let action = SigAction::new(
            SigHandler::Handler(handle_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );
        unsafe {
            signal::sigaction(Signal::SIGTERM, &action)?;
            signal::sigaction(Signal::SIGINT, &action)?;
            signal::sigaction(Signal::SIGHUP, &action)?;
        }
        Ok(())
    }

    pub fn run() -> i32 {
        wlog::init();

        let interface = std::env::args()
            .nth(1)
            .unwrap_or_else(|| "awdl0".to_string());

        if unsafe { libc::getuid() } != 0 {
            werror!("changing interface flags requires root");
            return 1;
        }

        if let Err(e) = install_signal_handlers() {
            werror!("failed to install signal handlers: {}", e);
            return 1;
        }

        winfo!("starting AWDL monitor daemon for {}", interface);

        let config = EngineConfig {
            interface,
            ..EngineConfig::default()
        };
        if let Err(e) = run_standalone(config, &SHOULD_EXIT) {
            werror!("daemon failed: {}", e);
            return 1;
        }

        winfo!("shut down cleanly");
        0
    }
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
fn main() {
    std::process::exit(daemon::run());
}

#[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd")))]
fn main() {
    eprintln!("awdl-monitord needs a PF_ROUTE routing socket (macOS or BSD)");
    std::process::exit(1);
}
