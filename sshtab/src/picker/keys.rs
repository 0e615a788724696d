use super::PickerTerminal;
use std::io;

const CTRL_C: u8 = 0x03;
const BACKSPACE: u8 = 0x08;
const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    BackTab,
    Enter,
    Interrupt,
    /// A lone `ESC`, or `ESC` followed by anything other than a CSI.
    Escape,
    Backspace,
    Byte(u8),
    /// A CSI sequence the picker has no binding for.
    Unknown,
}

fn decode_byte(byte: u8) -> Key {
    match byte {
        CTRL_C => Key::Interrupt,
        b'\r' | b'\n' => Key::Enter,
        DEL | BACKSPACE => Key::Backspace,
        other => Key::Byte(other),
    }
}

/// Read one key. `Ok(None)` means the read timed out with no input.
///
/// Escape sequences rely on the terminal's inter-byte timeout: a follow-up
/// byte that does not arrive in time ends the sequence.
pub fn read_key<T: PickerTerminal + ?Sized>(term: &mut T) -> io::Result<Option<Key>> {
    let Some(byte) = term.read_byte()? else {
        return Ok(None);
    };
    if byte != ESC {
        return Ok(Some(decode_byte(byte)));
    }

    match term.read_byte()? {
        Some(b'[') => {}
        _ => return Ok(Some(Key::Escape)),
    }
    let key = match term.read_byte()? {
        Some(b'A') => Key::Up,
        Some(b'B') => Key::Down,
        Some(b'Z') => Key::BackTab,
        Some(_) => Key::Unknown,
        None => Key::Escape,
    };
    Ok(Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picker::tests::ScriptedTerminal;

    fn keys(input: &[Option<u8>]) -> Vec<Option<Key>> {
        let mut term = ScriptedTerminal::new(input);
        let mut out = Vec::new();
        while let Ok(key) = read_key(&mut term) {
            out.push(key);
        }
        out
    }

    #[test]
    fn plain_bytes() {
        assert_eq!(
            keys(&[Some(3), Some(b'\r'), Some(b'\n'), Some(0x7f), Some(8), Some(b'x')]),
            vec![
                Some(Key::Interrupt),
                Some(Key::Enter),
                Some(Key::Enter),
                Some(Key::Backspace),
                Some(Key::Backspace),
                Some(Key::Byte(b'x')),
            ]
        );
    }

    #[test]
    fn csi_sequences() {
        let esc = Some(ESC);
        let csi = Some(b'[');
        assert_eq!(
            keys(&[esc, csi, Some(b'A'), esc, csi, Some(b'B'), esc, csi, Some(b'Z')]),
            vec![Some(Key::Up), Some(Key::Down), Some(Key::BackTab)]
        );
        assert_eq!(keys(&[esc, csi, Some(b'C')]), vec![Some(Key::Unknown)]);
    }

    #[test]
    fn bare_escape() {
        assert_eq!(keys(&[Some(ESC), None]), vec![Some(Key::Escape)]);
        // The byte after ESC is consumed.
        assert_eq!(
            keys(&[Some(ESC), Some(b'q'), Some(b'x')]),
            vec![Some(Key::Escape), Some(Key::Byte(b'x'))]
        );
        assert_eq!(keys(&[Some(ESC), Some(b'['), None]), vec![Some(Key::Escape)]);
    }

    #[test]
    fn timeout_yields_none() {
        assert_eq!(keys(&[None, Some(b'a')]), vec![None, Some(Key::Byte(b'a'))]);
    }
}
