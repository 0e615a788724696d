use super::PickerTerminal;
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::style::{Attribute, SetAttribute};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use nix::sys::termios::{
    ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices, Termios,
    tcgetattr, tcsetattr,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::time::{Duration, Instant};
use tracing::debug;

const TTY_PATH: &str = "/dev/tty";
const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// An idle read blocks for VTIME; one that comes back empty much sooner
/// means the terminal has hung up.
const FAST_EMPTY_READ: Duration = Duration::from_millis(20);
const HANGUP_AFTER: u32 = 10;

/// Tracks consecutive empty reads that returned without waiting.
#[derive(Debug, Default)]
struct HangupDetector {
    fast_empty: u32,
}

impl HangupDetector {
    /// Record an empty read that took `elapsed`. Returns true once the
    /// terminal looks gone.
    fn empty_read(&mut self, elapsed: Duration) -> bool {
        if elapsed < FAST_EMPTY_READ {
            self.fast_empty += 1;
        } else {
            self.fast_empty = 0;
        }
        self.fast_empty >= HANGUP_AFTER
    }

    fn data_read(&mut self) {
        self.fast_empty = 0;
    }
}

/// The controlling terminal in raw mode on the alternate screen.
///
/// Dropping the session restores the saved termios, shows the cursor,
/// resets attributes and leaves the alternate screen.
pub(super) struct TtySession {
    tty: File,
    original: Termios,
    hangup: HangupDetector,
}

fn raw_mode(original: &Termios) -> Termios {
    let mut raw = original.clone();
    raw.local_flags
        .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);
    raw.input_flags.remove(
        InputFlags::BRKINT
            | InputFlags::ICRNL
            | InputFlags::INPCK
            | InputFlags::ISTRIP
            | InputFlags::IXON,
    );
    raw.control_flags.insert(ControlFlags::CS8);
    raw.output_flags.remove(OutputFlags::OPOST);
    // Reads return after at most 100ms, which bounds escape sequences.
    raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
    raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 1;
    raw
}

impl TtySession {
    pub(super) fn open() -> io::Result<Self> {
        let tty = OpenOptions::new().read(true).write(true).open(TTY_PATH)?;
        let fd = tty.as_raw_fd();
        let original = tcgetattr(fd).map_err(io::Error::from)?;
        tcsetattr(fd, SetArg::TCSAFLUSH, &raw_mode(&original)).map_err(io::Error::from)?;

        // From here on, Drop undoes whatever part of the setup succeeded.
        let mut session = TtySession {
            tty,
            original,
            hangup: HangupDetector::default(),
        };
        execute!(
            session.tty,
            EnterAlternateScreen,
            Clear(ClearType::All),
            Hide
        )?;
        Ok(session)
    }
}

impl Drop for TtySession {
    fn drop(&mut self) {
        if let Err(err) = execute!(
            self.tty,
            Show,
            SetAttribute(Attribute::Reset),
            LeaveAlternateScreen
        ) {
            debug!("failed to leave alternate screen: {}", err);
        }
        if let Err(err) = tcsetattr(self.tty.as_raw_fd(), SetArg::TCSADRAIN, &self.original) {
            debug!("failed to restore termios: {}", err);
        }
    }
}

impl Write for TtySession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tty.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tty.flush()
    }
}

impl PickerTerminal for TtySession {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;
        let mut buf = [0u8; 1];
        loop {
            let started = Instant::now();
            match self.tty.read(&mut buf) {
                Ok(0) => {
                    if self.hangup.empty_read(started.elapsed()) {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "terminal hung up",
                        ));
                    }
                    return Ok(None);
                }
                Ok(_) => {
                    self.hangup.data_read();
                    return Ok(Some(buf[0]));
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn size(&self) -> (u16, u16) {
        match crossterm::terminal::size() {
            Ok((cols, rows)) if cols > 0 && rows > 0 => (cols, rows),
            _ => FALLBACK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_instant_empty_reads_mean_hangup() {
        let mut detector = HangupDetector::default();
        for _ in 1..HANGUP_AFTER {
            assert!(!detector.empty_read(Duration::ZERO));
        }
        assert!(detector.empty_read(Duration::ZERO));
    }

    #[test]
    fn timed_out_reads_and_data_reset_the_count() {
        let mut detector = HangupDetector::default();
        for _ in 1..HANGUP_AFTER {
            detector.empty_read(Duration::ZERO);
        }
        assert!(!detector.empty_read(Duration::from_millis(100)));
        for _ in 1..HANGUP_AFTER {
            detector.empty_read(Duration::ZERO);
        }
        detector.data_read();
        assert!(!detector.empty_read(Duration::ZERO));
    }

    #[test]
    fn raw_mode_clears_line_discipline() {
        let tty = match File::open(TTY_PATH) {
            Ok(tty) => tty,
            // No controlling terminal under most test runners.
            Err(_) => return,
        };
        let Ok(original) = tcgetattr(tty.as_raw_fd()) else {
            return;
        };
        let raw = raw_mode(&original);
        assert!(!raw.local_flags.contains(LocalFlags::ECHO));
        assert!(!raw.local_flags.contains(LocalFlags::ICANON));
        assert!(!raw.input_flags.contains(InputFlags::ICRNL));
        assert!(!raw.output_flags.contains(OutputFlags::OPOST));
        assert!(raw.control_flags.contains(ControlFlags::CS8));
        assert_eq!(raw.control_chars[SpecialCharacterIndices::VMIN as usize], 0);
        assert_eq!(raw.control_chars[SpecialCharacterIndices::VTIME as usize], 1);
    }
}
