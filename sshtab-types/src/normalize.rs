//! Canonical forms for recorded commands, argument strings and alias names.

use crate::text::{collapse_spaces, is_space, trim_space};
use crate::validate::{PolicyError, contains_control_chars, contains_forbidden_metachars};

const SSH: &str = "ssh";

fn starts_with_ssh_word(s: &str) -> bool {
    match s.strip_prefix(SSH) {
        Some(rest) => rest.chars().next().is_none_or(is_space),
        None => false,
    }
}

/// Canonicalize a raw `ssh ...` command line.
///
/// Returns `None` unless the first word is exactly `ssh`. One level of
/// matching quotes around the argument part is removed and whitespace is
/// collapsed, so `ssh   'host  -p 22'` becomes `ssh host -p 22`.
pub fn normalize_ssh_command(raw: &str) -> Option<String> {
    let trimmed = trim_space(raw);
    if !starts_with_ssh_word(trimmed) {
        return None;
    }

    let rest = trim_space(&trimmed[SSH.len()..]);
    let unquoted = match rest.as_bytes() {
        [first @ (b'\'' | b'"'), .., last] if first == last && rest.len() >= 2 => {
            &rest[1..rest.len() - 1]
        }
        _ => rest,
    };

    let args = collapse_spaces(unquoted);
    if args.is_empty() {
        Some(SSH.to_string())
    } else {
        Some(format!("{SSH} {args}"))
    }
}

/// The argument part of a normalized `ssh` command, or an empty string.
pub fn extract_args(command: &str) -> &str {
    let trimmed = trim_space(command);
    match trimmed.strip_prefix("ssh ") {
        Some(args) => trim_space(args),
        None => "",
    }
}

/// Accept either a full `ssh ...` command or a bare argument string.
pub fn normalize_args_input(input: &str) -> Result<String, PolicyError> {
    let trimmed = trim_space(input);
    if trimmed.is_empty() {
        return Err(PolicyError::Empty("args"));
    }
    let args = match normalize_ssh_command(trimmed) {
        Some(command) => extract_args(&command).to_string(),
        None => collapse_spaces(trimmed),
    };
    if args.is_empty() {
        return Err(PolicyError::Empty("args"));
    }
    Ok(args)
}

/// Trimmed alias text. An empty result means "clear".
pub fn normalize_alias_name(input: &str) -> Result<String, PolicyError> {
    let trimmed = trim_space(input);
    if contains_control_chars(trimmed) {
        return Err(PolicyError::ControlChars);
    }
    Ok(trimmed.to_string())
}

/// A command given to `add` as a single string.
pub fn normalize_command_raw(input: &str) -> Result<String, PolicyError> {
    let trimmed = trim_space(input);
    if trimmed.is_empty() {
        return Err(PolicyError::Empty("command"));
    }
    check_command_text(trimmed)?;
    Ok(trimmed.to_string())
}

/// A command given to `add` as separate words; words are re-quoted so the
/// stored line tokenizes back to the same argv.
pub fn normalize_command_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<String, PolicyError> {
    if tokens.is_empty() {
        return Err(PolicyError::Empty("command"));
    }
    let mut command = String::new();
    for token in tokens {
        let token = token.as_ref();
        check_command_text(token)?;
        if !command.is_empty() {
            command.push(' ');
        }
        if needs_single_quote(token) {
            command.push_str(&quote_single(token));
        } else {
            command.push_str(token);
        }
    }
    Ok(command)
}

fn check_command_text(s: &str) -> Result<(), PolicyError> {
    if contains_control_chars(s) {
        return Err(PolicyError::ControlChars);
    }
    if contains_forbidden_metachars(s) {
        return Err(PolicyError::Metachars);
    }
    Ok(())
}

fn needs_single_quote(token: &str) -> bool {
    token.is_empty() || token.chars().any(|c| c.is_ascii_whitespace() || c == '\'')
}

/// POSIX single quoting: `it's` becomes `'it'\''s'`.
pub fn quote_single(token: &str) -> String {
    format!("'{}'", token.replace('\'', r"'\''"))
}
