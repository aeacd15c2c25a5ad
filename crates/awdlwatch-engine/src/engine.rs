//! `Engine` — lifecycle manager for the enforcement loop.
//!
//! Owns construction (open kernel resources, spawn the loop thread) and
//! teardown (post Quit, wait for the thread with a bounded timeout, then
//! release everything). The worker-owned resources travel into the loop
//! thread and drop there, strictly after the loop has stopped using them;
//! if anything fails to open during construction, whatever was already
//! open drops on the way out and no half-built engine ever escapes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use awdlwatch_core::command::Command;
use awdlwatch_core::counter::InterventionCounter;
use awdlwatch_core::error::{WatchError, WatchResult};
use awdlwatch_core::event::IFF_UP;
use awdlwatch_core::feed::EventFeed;
use awdlwatch_core::flags::FlagControl;
use awdlwatch_core::surface::ControlSurface;
use awdlwatch_core::werror;
use awdlwatch_module::ioctl::IoctlFlagControl;
use awdlwatch_module::pipe::{command_pair, CommandSender};

use crate::config::EngineConfig;
use crate::enforce::{enforcement_loop, LoopParams};

/// A running enforcement engine.
///
/// Construct one per target interface. Dropping the engine shuts it down;
/// `invalidate` does the same explicitly and is idempotent.
pub struct Engine {
    config: EngineConfig,
    sender: CommandSender,
    counter: Arc<InterventionCounter>,
    enabled_view: Arc<AtomicBool>,
    // Behind a mutex only so Engine stays Sync; invalidate is the sole
    // reader and takes &mut self.
    done_rx: Mutex<mpsc::Receiver<()>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Engine {
    /// Construct an engine against the real kernel interfaces.
    ///
    /// The engine starts idle: unless `force_down_on_start` is set, the
    /// interface is left alone until the first `set_enabled(false)`.
    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
    pub fn new(config: EngineConfig) -> WatchResult<Engine> {
        let feed = awdlwatch_module::route::RouteSocket::open(&config.interface)?;
        let flags = IoctlFlagControl::open()?;
        Engine::with_parts(feed, flags, config)
    }

    /// Construct an engine from explicit parts.
    ///
    /// This is the seam tests and alternate backends use; `new` is this
    /// plus the default route socket and ioctl adapter.
    pub fn with_parts<E, F>(feed: E, flags: F, config: EngineConfig) -> WatchResult<Engine>
    where
        E: EventFeed + 'static,
        F: FlagControl + 'static,
    {
        let (sender, receiver) = command_pair()?;
        let counter = Arc::new(InterventionCounter::new());
        let enabled_view = Arc::new(AtomicBool::new(!config.force_down_on_start));
        let (done_tx, done_rx) = mpsc::channel();

        let params = LoopParams {
            ifname: config.interface.clone(),
            force_down_on_start: config.force_down_on_start,
            restore_up_on_exit: config.restore_up_on_exit,
        };
        let loop_counter = Arc::clone(&counter);
        let loop_view = Arc::clone(&enabled_view);

        let worker = thread::Builder::new()
            .name("awdl-enforcer".to_string())
            .spawn(move || {
                enforcement_loop(
                    params,
                    flags,
                    feed,
                    Some(receiver),
                    loop_counter,
                    loop_view,
                    None,
                );
                let _ = done_tx.send(());
            })
            .map_err(|e| WatchError::ResourceUnavailable {
                what: "enforcement thread",
                errno: e.raw_os_error().unwrap_or(0),
            })?;

        Ok(Engine {
            config,
            sender,
            counter,
            enabled_view,
            done_rx: Mutex::new(done_rx),
            worker: Some(worker),
        })
    }

    /// The interface this engine watches.
    pub fn interface(&self) -> &str {
        &self.config.interface
    }

    /// Shut the engine down: post Quit, wait for the loop thread within
    /// the configured timeout, reap it.
    ///
    /// Idempotent - a second call returns immediately. On timeout the
    /// thread is abandoned rather than waited on forever: a wedged
    /// privileged thread must not prevent process exit.
    pub fn invalidate(&mut self) {
        let worker = match self.worker.take() {
            Some(w) => w,
            None => return,
        };

        if let Err(e) = self.sender.post(Command::Quit) {
            werror!("{}: failed to post quit: {}", self.config.interface, e);
        }

        let done_rx = match self.done_rx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match done_rx.recv_timeout(self.config.shutdown_timeout) {
            Ok(()) => {
                let _ = worker.join();
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // The loop died without signaling; reap whatever is there.
                if worker.join().is_err() {
                    werror!("{}: enforcement thread panicked", self.config.interface);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                werror!(
                    "{}: {}, abandoning thread",
                    self.config.interface,
                    WatchError::ShutdownTimeout
                );
            }
        }
    }
}

impl ControlSurface for Engine {
    fn is_enabled(&self) -> bool {
        self.enabled_view.load(Ordering::Relaxed)
    }

    fn set_enabled(&self, enabled: bool) -> WatchResult<()> {
        let cmd = if enabled { Command::Enable } else { Command::Disable };
        self.sender.post(cmd)
    }

    fn status(&self) -> String {
        let mode = if self.is_enabled() { "allow-up" } else { "force-down" };
        // A transient adapter for the snapshot; the loop's own adapter is
        // never touched from this thread.
        let observed = IoctlFlagControl::open()
            .and_then(|mut io| io.read_flags(&self.config.interface));
        match observed {
            Ok(flags) => {
                let updown = if flags & IFF_UP != 0 { "up" } else { "down" };
                format!(
                    "{}: flags=0x{:x} ({}) mode={} interventions={}",
                    self.config.interface,
                    flags,
                    updown,
                    mode,
                    self.counter.read()
                )
            }
            Err(e) => format!(
                "{}: flags unavailable ({}) mode={} interventions={}",
                self.config.interface,
                e,
                mode,
                self.counter.read()
            ),
        }
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn intervention_count(&self) -> u64 {
        self.counter.read()
    }

    fn reset_intervention_count(&self) {
        self.counter.reset()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.invalidate();
    }
}
