//! The standalone deployment shape: always-on, no command channel.
//!
//! Wraps the same enforcement loop the managed engine runs, but forces
//! the desired state to "down" unconditionally at startup, reconciles
//! once, then runs on the calling thread until an external exit flag
//! (typically set from a signal handler) is observed. There is no managed
//! `invalidate`; the loop notices the flag between readiness-wait wakeups
//! (signal delivery interrupts the wait) and returns, dropping its
//! resources on the way out.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use awdlwatch_core::counter::InterventionCounter;
use awdlwatch_core::error::WatchResult;
use awdlwatch_core::feed::EventFeed;
use awdlwatch_core::flags::FlagControl;

use crate::config::EngineConfig;
use crate::enforce::{enforcement_loop, LoopParams};

/// Run the always-on shape against the real kernel interfaces.
///
/// Blocks the calling thread until `exit_flag` becomes true.
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
pub fn run_standalone(config: EngineConfig, exit_flag: &AtomicBool) -> WatchResult<()> {
    let feed = awdlwatch_module::route::RouteSocket::open(&config.interface)?;
    let flags = awdlwatch_module::ioctl::IoctlFlagControl::open()?;
    run_standalone_with(feed, flags, config, exit_flag)
}

/// Run the always-on shape from explicit parts.
pub fn run_standalone_with<E, F>(
    feed: E,
    flags: F,
    config: EngineConfig,
    exit_flag: &AtomicBool,
) -> WatchResult<()>
where
    E: EventFeed,
    F: FlagControl,
{
    let params = LoopParams {
        ifname: config.interface.clone(),
        // This shape always starts blocking, whatever the config says.
        force_down_on_start: true,
        restore_up_on_exit: config.restore_up_on_exit,
    };
    let counter = Arc::new(InterventionCounter::new());
    let enabled_view = Arc::new(AtomicBool::new(false));

    enforcement_loop(
        params,
        flags,
        feed,
        None,
        counter,
        enabled_view,
        Some(exit_flag),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{pipe_feed, MockFlags};
    use std::sync::atomic::Ordering;

    const UP: i32 = 0x8843;
    const DOWN: i32 = 0x8842;

    #[test]
    fn test_forces_down_at_startup_then_exits_on_flag() {
        let (writer, feed) = pipe_feed();
        let (flags, probe) = MockFlags::new(UP);
        let exit_flag = Arc::new(AtomicBool::new(false));

        let loop_flag = Arc::clone(&exit_flag);
        let handle = std::thread::spawn(move || {
            run_standalone_with(feed, flags, EngineConfig::default(), &loop_flag)
        });

        // Startup reconciliation forces the interface down immediately.
        assert!(probe.wait_until(|p| p.writes() == vec![DOWN]));

        // Raise the flag, then wake the loop with an event.
        exit_flag.store(true, Ordering::SeqCst);
        writer.push(12, UP);

        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_keeps_enforcing_until_exit() {
        let (writer, feed) = pipe_feed();
        let (flags, probe) = MockFlags::new(DOWN);
        let exit_flag = Arc::new(AtomicBool::new(false));

        let loop_flag = Arc::clone(&exit_flag);
        let handle = std::thread::spawn(move || {
            run_standalone_with(feed, flags, EngineConfig::default(), &loop_flag)
        });

        // Already down at startup: no corrective write yet.
        probe.set_current(UP);
        writer.push(12, UP);
        assert!(probe.wait_until(|p| p.writes() == vec![DOWN]));

        exit_flag.store(true, Ordering::SeqCst);
        writer.push(12, DOWN);
        handle.join().unwrap().unwrap();
    }
}
