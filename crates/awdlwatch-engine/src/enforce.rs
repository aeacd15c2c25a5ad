//! The enforcement loop and its reconciliation helpers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use awdlwatch_core::command::Command;
use awdlwatch_core::counter::InterventionCounter;
use awdlwatch_core::event::{InterfaceEvent, IFF_UP};
use awdlwatch_core::feed::EventFeed;
use awdlwatch_core::flags::FlagControl;
use awdlwatch_core::{wdebug, werror, winfo, wwarn};
use awdlwatch_module::pipe::CommandReceiver;

use crate::wait::wait_readable;

/// Static inputs to one run of the loop.
pub(crate) struct LoopParams {
    pub ifname: String,
    pub force_down_on_start: bool,
    pub restore_up_on_exit: bool,
}

/// Run the enforcement loop until Quit (managed shape) or until the exit
/// flag is observed (standalone shape, `commands = None`).
///
/// This function is the sole owner of the flag adapter and both read ends
/// for its whole run; they drop when it returns, on the loop thread.
pub(crate) fn enforcement_loop<F, E>(
    params: LoopParams,
    mut flags: F,
    mut feed: E,
    mut commands: Option<CommandReceiver>,
    counter: Arc<InterventionCounter>,
    enabled_view: Arc<AtomicBool>,
    exit_flag: Option<&AtomicBool>,
) where
    F: FlagControl,
    E: EventFeed,
{
    let ifname = params.ifname.as_str();

    // Desired state: true = interface may be up. Fail open unless told
    // otherwise. This variable has exactly one writer - this thread.
    let mut desired = !params.force_down_on_start;
    enabled_view.store(desired, Ordering::Relaxed);

    if params.force_down_on_start {
        winfo!("{}: bringing interface down on startup", ifname);
        reconcile(&mut flags, ifname, &counter);
    }

    winfo!("{}: entering enforcement loop", ifname);

    let mut shutting_down = false;
    while !shutting_down {
        if let Some(flag) = exit_flag {
            if flag.load(Ordering::SeqCst) {
                winfo!("{}: exit requested, leaving loop", ifname);
                break;
            }
        }

        let ready = match wait_readable(feed.raw_fd(), commands.as_ref().map(|c| c.raw_fd())) {
            Ok(r) => r,
            Err(e) => {
                werror!("{}: readiness wait failed: {}", ifname, e);
                break;
            }
        };
        if ready.interrupted {
            continue;
        }

        if let (true, Some(rx)) = (ready.commands, commands.as_mut()) {
            let mut state_changed = false;
            loop {
                match rx.try_next() {
                    Ok(Some(Command::Enable)) => {
                        desired = true;
                        enabled_view.store(true, Ordering::Relaxed);
                        state_changed = true;
                        winfo!("{}: enforcement off, interface may come up", ifname);
                    }
                    Ok(Some(Command::Disable)) => {
                        desired = false;
                        enabled_view.store(false, Ordering::Relaxed);
                        state_changed = true;
                        winfo!("{}: enforcement on, interface kept down", ifname);
                    }
                    Ok(Some(Command::Quit)) => {
                        shutting_down = true;
                        break;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        // Every sender is gone: the host has torn down.
                        wwarn!("{}: command channel: {}, treating as quit", ifname, e);
                        shutting_down = true;
                        break;
                    }
                }
            }
            // Commands drain as a batch; the last Enable/Disable wins and
            // one reconciliation applies the final state.
            if !shutting_down && state_changed && !desired {
                reconcile(&mut flags, ifname, &counter);
            }
            if shutting_down {
                break;
            }
        }

        if ready.feed {
            if let Some(ev) = drain_feed(&mut feed, ifname) {
                if !desired && ev.is_up() {
                    winfo!("{}: interface came up, forcing it back down", ifname);
                    correct(&mut flags, ifname, ev.flags, &counter);
                }
            }
        }
    }

    if params.restore_up_on_exit {
        restore_up(&mut flags, ifname);
    }
    winfo!("{}: enforcement loop exited", ifname);
}

/// Drain all queued feed messages, keeping only the most recent relevant
/// event. Earlier messages in the same batch are superseded.
fn drain_feed<E: EventFeed>(feed: &mut E, ifname: &str) -> Option<InterfaceEvent> {
    let mut last = None;
    loop {
        match feed.try_next() {
            Ok(Some(ev)) => last = Some(ev),
            Ok(None) => break,
            Err(e) => {
                wwarn!("{}: change feed read failed: {}", ifname, e);
                break;
            }
        }
    }
    last
}

/// Compare desired-down against the interface's actual flags and correct
/// if they diverge. Called when the desired state just changed and no
/// event is in hand.
fn reconcile<F: FlagControl>(flags: &mut F, ifname: &str, counter: &InterventionCounter) {
    match flags.read_flags(ifname) {
        Ok(cur) if cur & IFF_UP != 0 => correct(flags, ifname, cur, counter),
        Ok(_) => wdebug!("{}: already down, nothing to do", ifname),
        Err(e) => wwarn!("{}: flag read failed: {}, will retry on next event", ifname, e),
    }
}

/// One corrective action: clear IFF_UP. Counts as an intervention only on
/// success.
fn correct<F: FlagControl>(
    flags: &mut F,
    ifname: &str,
    observed: i32,
    counter: &InterventionCounter,
) {
    match flags.write_flags(ifname, observed & !IFF_UP) {
        Ok(()) => {
            counter.increment();
            winfo!("{}: brought down (intervention #{})", ifname, counter.read());
        }
        Err(e) => wwarn!("{}: flag write failed: {}, will retry on next event", ifname, e),
    }
}

/// Explicit shutdown cleanup: one unconditional set-up call, exempt from
/// the desired-state check and from the intervention counter.
fn restore_up<F: FlagControl>(flags: &mut F, ifname: &str) {
    match flags.read_flags(ifname) {
        Ok(cur) => {
            if let Err(e) = flags.write_flags(ifname, cur | IFF_UP) {
                wwarn!("{}: restore-up write failed: {}", ifname, e);
            } else {
                winfo!("{}: restored up on exit", ifname);
            }
        }
        Err(e) => wwarn!("{}: restore-up skipped, flag read failed: {}", ifname, e),
    }
}
