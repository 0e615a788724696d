//! Full-screen picker over `/dev/tty`.
//!
//! The picker is a small state machine fed one [`Key`] at a time. Input and
//! output go through [`PickerTerminal`], so the same loop drives the real
//! terminal and the scripted terminal used in tests.
//!
//! # Module Structure
//!
//! - `keys` - byte to key decoding, including escape sequences
//! - `render` - frame painting
//! - `terminal` - raw-mode `/dev/tty` session

mod keys;
mod render;
mod terminal;

use crate::items::PickItem;
use anyhow::{Context as _, Result};
use chrono::Local;
use keys::{Key, read_key};
use render::Frame;
use sshtab_types::text::trim_space;
use sshtab_types::validate::contains_control_chars;
use std::io::{self, Write};
use terminal::TtySession;
use tracing::debug;

/// Byte-level terminal access used by the picker loop.
pub trait PickerTerminal: Write {
    /// Next input byte, or `None` when the read timed out.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Current `(columns, rows)`.
    fn size(&self) -> (u16, u16);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerConfig {
    /// `S` / Shift-Tab flips between aliases and full commands.
    pub allow_display_toggle: bool,
    /// Initial display mode.
    pub show_alias: bool,
}

impl Default for PickerConfig {
    fn default() -> Self {
        PickerConfig {
            allow_display_toggle: true,
            show_alias: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Selected(usize),
    Canceled,
}

/// Persists an alias typed in the picker. An empty alias clears it.
pub type AliasUpdate<'a> = Box<dyn FnMut(&PickItem, &str) -> Result<()> + 'a>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browsing,
    /// Raw input bytes; decoded when shown or submitted.
    AliasPrompt { buffer: Vec<u8> },
}

pub struct Picker<'a> {
    items: &'a mut [PickItem],
    title: &'a str,
    config: PickerConfig,
    alias_update: Option<AliasUpdate<'a>>,
    selected: usize,
    offset: usize,
    show_alias: bool,
    mode: Mode,
    status: Option<String>,
}

impl<'a> Picker<'a> {
    /// Alias editing (`n`) is available only when `alias_update` is given.
    pub fn new(
        items: &'a mut [PickItem],
        title: &'a str,
        config: PickerConfig,
        alias_update: Option<AliasUpdate<'a>>,
    ) -> Self {
        Picker {
            items,
            title,
            show_alias: config.show_alias,
            config,
            alias_update,
            selected: 0,
            offset: 0,
            mode: Mode::Browsing,
            status: None,
        }
    }

    /// Drive the picker until a row is chosen or the user cancels.
    pub fn run<T: PickerTerminal + ?Sized>(&mut self, term: &mut T) -> io::Result<PickOutcome> {
        if self.items.is_empty() {
            return Ok(PickOutcome::Canceled);
        }
        self.draw(term)?;
        loop {
            let Some(key) = read_key(term)? else {
                continue;
            };
            let (_, rows) = term.size();
            if let Some(outcome) = self.handle_key(key, rows) {
                return Ok(outcome);
            }
            self.draw(term)?;
        }
    }

    fn handle_key(&mut self, key: Key, rows: u16) -> Option<PickOutcome> {
        if let Mode::AliasPrompt { buffer } = &mut self.mode {
            match key {
                Key::Interrupt | Key::Escape => self.mode = Mode::Browsing,
                Key::Enter => {
                    let input = std::mem::take(buffer);
                    self.mode = Mode::Browsing;
                    self.submit_alias(&String::from_utf8_lossy(&input));
                }
                Key::Backspace => pop_char(buffer),
                Key::Byte(byte) if byte >= 0x20 => buffer.push(byte),
                _ => {}
            }
            return None;
        }

        self.status = None;
        match key {
            Key::Interrupt | Key::Escape => return Some(PickOutcome::Canceled),
            Key::Enter => return Some(PickOutcome::Selected(self.selected)),
            Key::Up => self.selected = self.selected.saturating_sub(1),
            Key::Down => {
                if self.selected + 1 < self.items.len() {
                    self.selected += 1;
                }
            }
            Key::Byte(b'n' | b'N') if self.alias_update.is_some() => {
                self.mode = Mode::AliasPrompt {
                    buffer: self.items[self.selected].alias.clone().into_bytes(),
                };
            }
            Key::Byte(b'S') | Key::BackTab if self.config.allow_display_toggle => {
                self.show_alias = !self.show_alias;
            }
            _ => {}
        }
        self.scroll_into_view(rows);
        None
    }

    fn submit_alias(&mut self, input: &str) {
        let alias = trim_space(input);
        if contains_control_chars(alias) {
            self.status = Some("rejected: control characters".to_string());
            return;
        }
        let Some(update) = self.alias_update.as_mut() else {
            return;
        };
        let item = &mut self.items[self.selected];
        match update(item, alias) {
            Ok(()) => {
                item.alias = alias.to_string();
                let message = if alias.is_empty() {
                    "alias cleared"
                } else {
                    "alias saved"
                };
                self.status = Some(message.to_string());
            }
            Err(err) => {
                debug!("alias update failed: {:#}", err);
                self.status = Some(format!("{err:#}"));
            }
        }
    }

    fn scroll_into_view(&mut self, rows: u16) {
        let visible = render::visible_count(self.items.len(), rows).max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + visible {
            self.offset = self.selected + 1 - visible;
        }
    }

    fn footer(&self) -> (String, String) {
        match &self.mode {
            Mode::AliasPrompt { buffer } => {
                let buffer = String::from_utf8_lossy(buffer);
                (format!("alias: {buffer}"), "Enter save  Esc cancel".to_string())
            }
            Mode::Browsing => {
                let left = match &self.status {
                    Some(status) => status.clone(),
                    None => self.items[self.selected].meta.summary(),
                };
                let right = render::hint_text(
                    self.alias_update.is_some(),
                    self.config.allow_display_toggle,
                    self.show_alias,
                    self.selected,
                    self.items.len(),
                );
                (left, right)
            }
        }
    }

    fn draw<T: PickerTerminal + ?Sized>(&self, term: &mut T) -> io::Result<()> {
        let (cols, rows) = term.size();
        let (footer_left, footer_right) = self.footer();
        let frame = Frame {
            title: self.title,
            items: &*self.items,
            selected: self.selected,
            offset: self.offset,
            show_alias: self.show_alias,
            footer_left: &footer_left,
            footer_right: &footer_right,
            now: Local::now().timestamp(),
        };
        render::draw(term, &frame, cols, rows)
    }
}

/// Drop the last UTF-8 character, continuation bytes included.
fn pop_char(buffer: &mut Vec<u8>) {
    while let Some(byte) = buffer.pop() {
        if byte & 0xc0 != 0x80 {
            break;
        }
    }
}

/// Run the picker on the controlling terminal.
///
/// An empty list is canceled without touching the terminal.
pub fn run_picker<'a>(
    items: &'a mut [PickItem],
    title: &'a str,
    config: PickerConfig,
    alias_update: Option<AliasUpdate<'a>>,
) -> Result<PickOutcome> {
    if items.is_empty() {
        return Ok(PickOutcome::Canceled);
    }
    let mut tty = TtySession::open().context("open /dev/tty failed")?;
    let mut picker = Picker::new(items, title, config, alias_update);
    let outcome = picker.run(&mut tty).context("terminal i/o failed")?;
    debug!("picker outcome {:?}", outcome);
    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays scripted input; `None` entries are read timeouts. Running out
    /// of input is an error so a stuck loop ends the test.
    pub(crate) struct ScriptedTerminal {
        input: VecDeque<Option<u8>>,
        pub(crate) output: Vec<u8>,
        pub(crate) size: (u16, u16),
    }

    impl ScriptedTerminal {
        pub(crate) fn new(input: &[Option<u8>]) -> Self {
            ScriptedTerminal {
                input: input.iter().copied().collect(),
                output: Vec::new(),
                size: (120, 24),
            }
        }

        pub(crate) fn from_bytes(input: &[u8]) -> Self {
            let script: Vec<_> = input.iter().copied().map(Some).collect();
            Self::new(&script)
        }
    }

    impl Write for ScriptedTerminal {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl PickerTerminal for ScriptedTerminal {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            self.input
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
        }

        fn size(&self) -> (u16, u16) {
            self.size
        }
    }

    const UP: &[u8] = b"\x1b[A";
    const DOWN: &[u8] = b"\x1b[B";
    const BACKTAB: &[u8] = b"\x1b[Z";

    fn item(display: &str, alias: &str) -> PickItem {
        PickItem {
            display: display.to_string(),
            alias: alias.to_string(),
            args: display.trim_start_matches("ssh ").to_string(),
            last_used: 1,
            count: 1,
            meta: sshtab_types::SshMeta::from_args(display.trim_start_matches("ssh ")),
        }
    }

    fn items(n: usize) -> Vec<PickItem> {
        (0..n).map(|i| item(&format!("ssh host{i}"), "")).collect()
    }

    fn script(parts: &[&[u8]]) -> ScriptedTerminal {
        ScriptedTerminal::from_bytes(&parts.concat())
    }

    fn run(items: &mut [PickItem], term: &mut ScriptedTerminal) -> PickOutcome {
        Picker::new(items, "sshtab pick", PickerConfig::default(), None)
            .run(term)
            .unwrap()
    }

    #[test]
    fn empty_list_cancels_without_output() {
        let mut term = ScriptedTerminal::from_bytes(b"\r");
        let outcome = run(&mut [], &mut term);
        assert_eq!(outcome, PickOutcome::Canceled);
        assert!(term.output.is_empty());

        assert_eq!(
            run_picker(&mut [], "sshtab pick", PickerConfig::default(), None).unwrap(),
            PickOutcome::Canceled
        );
    }

    #[test]
    fn enter_selects_first_row() {
        let mut term = ScriptedTerminal::from_bytes(b"\r");
        assert_eq!(run(&mut items(3), &mut term), PickOutcome::Selected(0));
        let screen = String::from_utf8_lossy(&term.output);
        assert!(screen.contains("sshtab pick  [3]"));
        assert!(screen.contains("> ssh host0"));
        assert!(screen.contains("host: host0"));
        assert!(screen.contains("1/3"));
    }

    #[test]
    fn ctrl_c_and_escape_cancel() {
        let mut term = ScriptedTerminal::from_bytes(b"\x03");
        assert_eq!(run(&mut items(3), &mut term), PickOutcome::Canceled);

        let mut term = ScriptedTerminal::new(&[Some(0x1b), None]);
        assert_eq!(run(&mut items(3), &mut term), PickOutcome::Canceled);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut term = script(&[UP, DOWN, DOWN, DOWN, DOWN, b"\r"]);
        assert_eq!(run(&mut items(3), &mut term), PickOutcome::Selected(2));

        let mut term = script(&[DOWN, UP, UP, b"\r"]);
        assert_eq!(run(&mut items(3), &mut term), PickOutcome::Selected(0));
    }

    #[test]
    fn timeouts_and_unknown_keys_are_ignored() {
        let mut term = ScriptedTerminal::new(&[None, Some(b'x'), None, Some(b'\r')]);
        assert_eq!(run(&mut items(2), &mut term), PickOutcome::Selected(0));
        let mut term = script(&[b"\x1b[C", DOWN, b"\r"]);
        assert_eq!(run(&mut items(2), &mut term), PickOutcome::Selected(1));
    }

    #[test]
    fn selection_scrolls_viewport() {
        let mut list = items(10);
        let mut picker = Picker::new(&mut list, "t", PickerConfig::default(), None);
        // 7 rows leave 3 list rows.
        for _ in 0..5 {
            picker.handle_key(Key::Down, 7);
        }
        assert_eq!(picker.selected, 5);
        assert_eq!(picker.offset, 3);
        for _ in 0..4 {
            picker.handle_key(Key::Up, 7);
        }
        assert_eq!(picker.selected, 1);
        assert_eq!(picker.offset, 1);
    }

    #[test]
    fn toggle_switches_labels() {
        let mut list = vec![item("ssh db", "database")];
        let mut picker = Picker::new(&mut list, "t", PickerConfig::default(), None);
        assert!(picker.show_alias);
        picker.handle_key(Key::Byte(b'S'), 24);
        assert!(!picker.show_alias);
        picker.handle_key(Key::BackTab, 24);
        assert!(picker.show_alias);

        let mut term = script(&[BACKTAB, b"\r"]);
        let mut list = vec![item("ssh db", "database")];
        run(&mut list, &mut term);
        let screen = String::from_utf8_lossy(&term.output);
        assert!(screen.contains("> database"));
        assert!(screen.contains("> ssh db"));
        assert!(screen.contains("view: addr"));
    }

    #[test]
    fn toggle_can_be_disabled() {
        let mut list = vec![item("ssh db", "database")];
        let config = PickerConfig {
            allow_display_toggle: false,
            show_alias: true,
        };
        let mut picker = Picker::new(&mut list, "t", config, None);
        picker.handle_key(Key::Byte(b'S'), 24);
        assert!(picker.show_alias);
    }

    #[test]
    fn alias_prompt_saves_trimmed_input() {
        let saved = RefCell::new(Vec::new());
        let mut list = items(2);
        let update: AliasUpdate = Box::new(|item, alias| {
            saved.borrow_mut().push((item.args.clone(), alias.to_string()));
            Ok(())
        });
        let mut term = script(&[DOWN, b"n", b" prod ", b"\r", b"\r"]);
        let outcome = Picker::new(&mut list, "t", PickerConfig::default(), Some(update))
            .run(&mut term)
            .unwrap();
        assert_eq!(outcome, PickOutcome::Selected(1));
        assert_eq!(list[1].alias, "prod");
        assert_eq!(
            saved.into_inner(),
            vec![("host1".to_string(), "prod".to_string())]
        );
        let screen = String::from_utf8_lossy(&term.output);
        assert!(screen.contains("alias:  prod"));
        assert!(screen.contains("Enter save  Esc cancel"));
        assert!(screen.contains("alias saved"));
    }

    #[test]
    fn alias_prompt_prefills_and_clears() {
        let mut list = vec![item("ssh db", "db")];
        let update: AliasUpdate = Box::new(|_, _| Ok(()));
        let mut picker = Picker::new(&mut list, "t", PickerConfig::default(), Some(update));
        picker.handle_key(Key::Byte(b'n'), 24);
        assert_eq!(
            picker.mode,
            Mode::AliasPrompt {
                buffer: b"db".to_vec()
            }
        );
        picker.handle_key(Key::Backspace, 24);
        picker.handle_key(Key::Backspace, 24);
        picker.handle_key(Key::Backspace, 24);
        picker.handle_key(Key::Enter, 24);
        assert_eq!(picker.mode, Mode::Browsing);
        assert_eq!(picker.status.as_deref(), Some("alias cleared"));
        // The next browsing key clears the status.
        picker.handle_key(Key::Byte(b'x'), 24);
        assert_eq!(picker.status, None);
        drop(picker);
        assert_eq!(list[0].alias, "");
    }

    #[test]
    fn alias_prompt_backspace_removes_whole_characters() {
        let mut list = vec![item("ssh db", "db\u{e9}")];
        let update: AliasUpdate = Box::new(|_, _| Ok(()));
        let mut picker = Picker::new(&mut list, "t", PickerConfig::default(), Some(update));
        picker.handle_key(Key::Byte(b'N'), 24);
        picker.handle_key(Key::Backspace, 24);
        assert_eq!(
            picker.mode,
            Mode::AliasPrompt {
                buffer: b"db".to_vec()
            }
        );
    }

    #[test]
    fn alias_prompt_cancel_keeps_alias() {
        let mut list = vec![item("ssh db", "db")];
        let update: AliasUpdate = Box::new(|_, _| bail!("should not be called"));
        let mut picker = Picker::new(&mut list, "t", PickerConfig::default(), Some(update));
        picker.handle_key(Key::Byte(b'n'), 24);
        picker.handle_key(Key::Byte(b'x'), 24);
        picker.handle_key(Key::Escape, 24);
        assert_eq!(picker.mode, Mode::Browsing);
        picker.handle_key(Key::Byte(b'n'), 24);
        picker.handle_key(Key::Interrupt, 24);
        assert_eq!(picker.mode, Mode::Browsing);
        // Arrows inside the prompt do nothing.
        picker.handle_key(Key::Byte(b'n'), 24);
        picker.handle_key(Key::Down, 24);
        assert!(matches!(picker.mode, Mode::AliasPrompt { .. }));
        assert_eq!(picker.status, None);
        drop(picker);
        assert_eq!(list[0].alias, "db");
    }

    #[test]
    fn alias_update_failure_is_shown() {
        let mut list = vec![item("ssh db", "")];
        let update: AliasUpdate = Box::new(|_, _| bail!("disk full"));
        let mut picker = Picker::new(&mut list, "t", PickerConfig::default(), Some(update));
        picker.handle_key(Key::Byte(b'n'), 24);
        picker.handle_key(Key::Byte(b'a'), 24);
        picker.handle_key(Key::Enter, 24);
        assert_eq!(picker.status.as_deref(), Some("disk full"));
        drop(picker);
        assert_eq!(list[0].alias, "");
    }

    #[test]
    fn alias_with_control_chars_is_rejected_locally() {
        let mut list = vec![item("ssh db", "")];
        let update: AliasUpdate = Box::new(|_, _| bail!("should not be called"));
        let mut picker = Picker::new(&mut list, "t", PickerConfig::default(), Some(update));
        picker.handle_key(Key::Byte(b'n'), 24);
        picker.mode = Mode::AliasPrompt {
            buffer: b"a\x7fb".to_vec(),
        };
        picker.handle_key(Key::Enter, 24);
        assert_eq!(
            picker.status.as_deref(),
            Some("rejected: control characters")
        );
    }

    #[test]
    fn alias_key_without_callback_is_ignored() {
        let mut list = items(1);
        let mut picker = Picker::new(&mut list, "t", PickerConfig::default(), None);
        picker.handle_key(Key::Byte(b'n'), 24);
        assert_eq!(picker.mode, Mode::Browsing);
    }
}
