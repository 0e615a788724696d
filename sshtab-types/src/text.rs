//! Line-oriented whitespace helpers.
//!
//! Whitespace here is exactly space, tab, CR and LF.

pub fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

pub fn trim_space(s: &str) -> &str {
    s.trim_matches(is_space)
}

/// Merge whitespace runs into one space and trim both ends.
pub fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split(is_space).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_only_line_whitespace() {
        assert_eq!(trim_space("  ssh host \r\n"), "ssh host");
        assert_eq!(trim_space("\t\t"), "");
        assert_eq!(trim_space("\x0bvt\x0b"), "\x0bvt\x0b");
    }

    #[test]
    fn collapses_runs() {
        assert_eq!(collapse_spaces("  -p  22\t\tuser@host \n"), "-p 22 user@host");
        assert_eq!(collapse_spaces(""), "");
        assert_eq!(collapse_spaces(" \t "), "");
        assert_eq!(collapse_spaces("one"), "one");
    }
}
