//! Input classification and argv tokenization for `exec`.
//!
//! Tokens produced here go straight into `execvp`, never through a shell,
//! so the grammar is deliberately small: whitespace splitting, single and
//! double quotes, and backslash escapes. Nothing is expanded.

use thiserror::Error;

/// Characters rejected anywhere in an exec string, quoted or not.
pub const FORBIDDEN_METACHARS: [char; 9] = [';', '|', '&', '`', '$', '(', ')', '<', '>'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated quote")]
    UnterminatedQuote,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("rejected control characters")]
    ControlChars,
    #[error("rejected shell metacharacters")]
    Metachars,
    #[error("tokenize failed: {0}")]
    Tokenize(#[from] TokenizeError),
    #[error("{0} is empty")]
    Empty(&'static str),
}

/// True for any byte below 0x20 or DEL.
pub fn contains_control_chars(s: &str) -> bool {
    s.bytes().any(|b| b < 0x20 || b == 0x7f)
}

pub fn contains_forbidden_metachars(s: &str) -> bool {
    s.contains(&FORBIDDEN_METACHARS[..])
}

fn is_token_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Normal,
    Single,
    Double,
}

/// Split `input` into argv-style tokens.
///
/// A backslash takes the next character literally, except inside single
/// quotes. A trailing lone backslash is kept as-is. Empty tokens (`''`) are
/// dropped.
pub fn tokenize_args(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = QuoteState::Normal;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match state {
            QuoteState::Normal => match c {
                '\\' => current.push(chars.next().unwrap_or('\\')),
                '\'' => state = QuoteState::Single,
                '"' => state = QuoteState::Double,
                c if is_token_separator(c) => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
            QuoteState::Single => match c {
                '\'' => state = QuoteState::Normal,
                c => current.push(c),
            },
            QuoteState::Double => match c {
                '"' => state = QuoteState::Normal,
                '\\' => current.push(chars.next().unwrap_or('\\')),
                c => current.push(c),
            },
        }
    }

    if state != QuoteState::Normal {
        return Err(TokenizeError::UnterminatedQuote);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Apply the full execution policy and return the argv tail.
///
/// Control characters, metacharacters and tokenization are checked
/// independently; all three must pass.
pub fn validate_exec_args(input: &str) -> Result<Vec<String>, PolicyError> {
    if contains_control_chars(input) {
        return Err(PolicyError::ControlChars);
    }
    if contains_forbidden_metachars(input) {
        return Err(PolicyError::Metachars);
    }
    let tokens = tokenize_args(input)?;
    if tokens.is_empty() {
        return Err(PolicyError::Empty("args"));
    }
    Ok(tokens)
}
