//! awdlctl — one-shot interface control.
//!
//! ```text
//! awdlctl up [interface]       set IFF_UP (needs root)
//! awdlctl down [interface]     clear IFF_UP (needs root)
//! awdlctl status [interface]   print flags and up/down state
//! ```
//!
//! The flag ioctls are the same ones the enforcement engine issues; this
//! tool is the manual override for when the watchdog is not running.

use awdlwatch_core::event::IFF_UP;
use awdlwatch_core::flags::FlagControl;
use awdlwatch_module::ioctl::IoctlFlagControl;
use awdlwatch_module::route::interface_index;

fn usage() -> ! {
    eprintln!("usage: awdlctl <up|down|status> [interface]");
    std::process::exit(2);
}

fn main() {
    let mut args = std::env::args().skip(1);
    let verb = match args.next() {
        Some(v) => v,
        None => usage(),
    };
    let interface = args.next().unwrap_or_else(|| "awdl0".to_string());

    let mut io = match IoctlFlagControl::open() {
        Ok(io) => io,
        Err(e) => {
            eprintln!("awdlctl: {}", e);
            std::process::exit(1);
        }
    };

    let result = match verb.as_str() {
        "up" => io
            .read_flags(&interface)
            .and_then(|f| io.write_flags(&interface, f | IFF_UP)),
        "down" => io
            .read_flags(&interface)
            .and_then(|f| io.write_flags(&interface, f & !IFF_UP)),
        "status" => io.read_flags(&interface).map(|f| {
            let updown = if f & IFF_UP != 0 { "up" } else { "down" };
            match interface_index(&interface) {
                Some(idx) => {
                    println!("{} (index {}): flags=0x{:x} {}", interface, idx, f, updown)
                }
                None => println!("{}: flags=0x{:x} {}", interface, f, updown),
            }
        }),
        _ => usage(),
    };

    if let Err(e) = result {
        eprintln!("awdlctl: {}: {}", interface, e);
        std::process::exit(1);
    }
}
