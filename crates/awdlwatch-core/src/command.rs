//! Control commands and their single-byte wire form.
//!
//! Commands travel from caller threads into the enforcement loop through a
//! byte-oriented channel and are applied in strict FIFO order. A later
//! command always overrides the effect of an earlier one still in flight,
//! so the loop drains the channel fully on every wakeup and the last
//! Enable/Disable wins.

/// A command posted into the enforcement loop.
///
/// The wire form is one byte per command, so a post is atomic: a command
/// is either delivered whole or not at all, never interleaved or torn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Allow the interface to be up. Permits "up", does not force it.
    Enable = b'e',
    /// Keep the interface forced down.
    Disable = b'd',
    /// Stop the enforcement loop.
    Quit = b'q',
}

impl Command {
    /// Wire encoding of this command.
    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Decode a wire byte. Unknown bytes return `None` and are skipped by
    /// the reader, never turned into a default command.
    pub fn from_byte(b: u8) -> Option<Command> {
        match b {
            b'e' => Some(Command::Enable),
            b'd' => Some(Command::Disable),
            b'q' => Some(Command::Quit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_round_trip() {
        for cmd in [Command::Enable, Command::Disable, Command::Quit] {
            assert_eq!(Command::from_byte(cmd.to_byte()), Some(cmd));
        }
    }

    #[test]
    fn test_unknown_byte_is_none() {
        assert_eq!(Command::from_byte(0), None);
        assert_eq!(Command::from_byte(b'x'), None);
        assert_eq!(Command::from_byte(0xff), None);
    }
}
