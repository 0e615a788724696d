use crate::items::PickItem;
use chrono::{Local, TimeZone};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const HEADER_BG: Color = Color::AnsiValue(235);
const PANEL_BG: Color = Color::AnsiValue(236);
const SELECT_BG: Color = Color::AnsiValue(24);
const TEXT: Color = Color::AnsiValue(250);
const MUTED: Color = Color::AnsiValue(245);
const ACCENT: Color = Color::AnsiValue(75);
const BRIGHT: Color = Color::AnsiValue(231);

/// Rows taken by the header, the two rules and the footer.
const CHROME_ROWS: usize = 4;

#[derive(Debug, Clone, Copy)]
struct Style {
    bg: Color,
    fg: Color,
    bold: bool,
}

const HEADER: Style = Style {
    bg: HEADER_BG,
    fg: ACCENT,
    bold: true,
};
const RULE: Style = Style {
    bg: HEADER_BG,
    fg: MUTED,
    bold: false,
};
const ROW: Style = Style {
    bg: PANEL_BG,
    fg: TEXT,
    bold: false,
};
const SELECTED_ROW: Style = Style {
    bg: SELECT_BG,
    fg: BRIGHT,
    bold: true,
};
const EMPTY_ROW: Style = Style {
    bg: PANEL_BG,
    fg: MUTED,
    bold: false,
};

/// Everything needed to paint one frame.
pub(crate) struct Frame<'a> {
    pub title: &'a str,
    pub items: &'a [PickItem],
    pub selected: usize,
    pub offset: usize,
    pub show_alias: bool,
    pub footer_left: &'a str,
    pub footer_right: &'a str,
    pub now: i64,
}

/// Number of list rows that fit on a terminal with `rows` lines.
pub(crate) fn visible_count(total: usize, rows: u16) -> usize {
    let rows = usize::from(rows);
    let max_visible = if rows > CHROME_ROWS {
        rows - CHROME_ROWS
    } else if rows > 0 {
        1
    } else {
        10
    };
    total.min(max_visible)
}

fn padding(width: usize) -> usize {
    match width {
        w if w >= 4 => 2,
        w if w >= 2 => 1,
        _ => 0,
    }
}

/// Cut `text` to at most `width` columns, marking the cut with `...`.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return take_columns(text, width);
    }
    let mut out = take_columns(text, width - 3);
    out.push_str("...");
    out
}

fn take_columns(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

/// `now`, `5m`, `3h`, `2d`, then a local `YYYY/MM/DD` date.
pub(crate) fn relative_time(last_used: i64, now: i64) -> String {
    if last_used <= 0 || now <= 0 {
        return "?".to_string();
    }
    let diff = (now - last_used).max(0);
    match diff {
        d if d < 60 => "now".to_string(),
        d if d < 3_600 => format!("{}m", d / 60),
        d if d < 86_400 => format!("{}h", d / 3_600),
        d if d < 604_800 => format!("{}d", d / 86_400),
        _ => match Local.timestamp_opt(last_used, 0).single() {
            Some(at) => at.format("%Y/%m/%d").to_string(),
            None => "?".to_string(),
        },
    }
}

pub(crate) fn hint_text(
    alias_edit: bool,
    toggle: bool,
    show_alias: bool,
    selected: usize,
    total: usize,
) -> String {
    let mut hint = String::from("Up/Down move  Enter confirm  Esc cancel");
    if alias_edit {
        hint.push_str("  n alias");
    }
    if toggle {
        hint.push_str("  Shift+Tab/S toggle");
        hint.push_str(if show_alias {
            "  view: alias"
        } else {
            "  view: addr"
        });
    }
    hint.push_str(&format!("  {}/{}", selected + 1, total));
    hint
}

struct Painter {
    buf: Vec<u8>,
    width: usize,
    lines_left: usize,
}

impl Painter {
    fn inner_width(&self) -> usize {
        self.width.saturating_sub(padding(self.width) * 2)
    }

    /// One full-width line: left text, and right text when it fits.
    fn line(&mut self, left: &str, right: &str, style: Style) -> io::Result<()> {
        if self.lines_left == 0 {
            return Ok(());
        }
        self.lines_left -= 1;

        let pad = padding(self.width);
        let inner = self.inner_width();
        let right_width = right.width();
        let (right, gap, left_max) = if !right.is_empty() && right_width + 2 <= inner {
            (right, 2, inner - right_width - 2)
        } else {
            ("", 0, inner)
        };
        let left = truncate(left, left_max);
        let fill = left_max.saturating_sub(left.width());

        queue!(
            self.buf,
            Print("\r"),
            Clear(ClearType::CurrentLine),
            SetBackgroundColor(style.bg),
            SetForegroundColor(style.fg)
        )?;
        if style.bold {
            queue!(self.buf, SetAttribute(Attribute::Bold))?;
        }
        let text = format!(
            "{:pad$}{left}{:fill$}{:gap$}{right}{:pad$}",
            "", "", "", ""
        );
        queue!(self.buf, Print(text), SetAttribute(Attribute::Reset))?;
        if self.lines_left > 0 {
            queue!(self.buf, Print("\r\n"))?;
        }
        Ok(())
    }
}

/// Paint a whole frame for a `cols` x `rows` terminal.
pub(crate) fn draw<W: Write + ?Sized>(
    out: &mut W,
    frame: &Frame<'_>,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    let width = usize::from(cols);
    let visible = visible_count(frame.items.len(), rows);
    let mut painter = Painter {
        buf: Vec::new(),
        width,
        lines_left: visible + CHROME_ROWS,
    };
    queue!(painter.buf, Clear(ClearType::All), MoveTo(0, 0))?;

    let title = if frame.title.is_empty() {
        "sshtab"
    } else {
        frame.title
    };
    painter.line(
        &format!("{title}  [{}]", frame.items.len()),
        "",
        HEADER,
    )?;
    let rule = "-".repeat(painter.inner_width());
    painter.line(&rule, "", RULE)?;

    let inner = painter.inner_width();
    for row in 0..visible {
        let idx = frame.offset + row;
        let Some(item) = frame.items.get(idx) else {
            painter.line("", "", EMPTY_ROW)?;
            continue;
        };
        let is_selected = idx == frame.selected;
        let marker = if is_selected { "> " } else { "  " };
        let label = format!("{marker}{}", item.label(frame.show_alias));
        let when = relative_time(item.last_used, frame.now);
        let mut right = format!("{when}  {}x", item.count);
        if right.width() + 2 > inner {
            right = when;
        }
        let style = if is_selected { SELECTED_ROW } else { ROW };
        painter.line(&label, &right, style)?;
    }

    painter.line(&rule, "", RULE)?;
    painter.line(frame.footer_left, frame.footer_right, RULE)?;

    out.write_all(&painter.buf)?;
    out.flush()
}
