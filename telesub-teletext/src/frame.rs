//! Caption frame formatting.
//!
//! Turns a finished [`PageBuffer`] into a [`CaptionFrame`]: suppresses pages
//! without a boxed area, trims each row to its boxed text, renders spacing
//! attributes and, in colour mode, wraps colour runs in `<font>` tags with
//! HTML-escaped text.

use crate::page::{PageBuffer, PAGE_COLS, PAGE_ROWS};
use telesub_subtitle::{CaptionFrame, Timestamp};

/// Teletext spacing-attribute colours, index 0 (black) to 7 (white).
pub const TELETEXT_COLOURS: [&str; 8] = [
    "#000000", "#ff0000", "#00ff00", "#ffff00", "#0000ff", "#ff00ff", "#00ffff", "#ffffff",
];

/// White, the start-of-row default foreground (ETS 300 706, chapter 12.2).
const FOREGROUND_WHITE: u16 = 0x07;

/// Page-to-frame formatter.
#[derive(Debug, Clone, Copy)]
pub struct FrameFormatter {
    colours: bool,
}

impl FrameFormatter {
    /// Creates a formatter; `colours` enables `<font>` tags and entity
    /// escaping.
    pub fn new(colours: bool) -> Self {
        Self { colours }
    }

    /// Formats a page into a caption frame.
    ///
    /// Returns `None` for pages with no start-box mark anywhere in their
    /// text rows; such pages carry no caption.
    pub fn format(&self, page: &PageBuffer) -> Option<CaptionFrame> {
        if !page.has_start_box() {
            return None;
        }

        let show = page.show_ms;
        let hide = page.hide_ms.max(show);

        let mut rows = Vec::new();
        for row in 1..PAGE_ROWS {
            if let Some(line) = self.format_row(&page.text[row]) {
                rows.push(line);
            }
        }

        Some(CaptionFrame::new(
            Timestamp::from_millis(show),
            Timestamp::from_millis(hide),
            rows,
        ))
    }

    /// Formats one row, or `None` when the row has no boxed text.
    fn format_row(&self, cells: &[u16; PAGE_COLS]) -> Option<String> {
        // The last start-box mark anchors the boxed area.
        let mut col_start = cells.iter().rposition(|&v| v == 0x0B)?;

        // Advance col_start to the first displayable cell and find the last
        // one, stopping at an end-box mark.
        let mut col_stop = PAGE_COLS;
        for col in col_start + 1..PAGE_COLS {
            let v = cells[col];
            if v > 0x20 {
                if col_stop == PAGE_COLS {
                    col_start = col;
                }
                col_stop = col;
            }
            if v == 0x0A {
                break;
            }
        }
        if col_stop == PAGE_COLS {
            return None;
        }

        // Start-of-row default condition is Alpha White; spacing attributes
        // before the boxed area set the colour the box opens with.
        let mut foreground = FOREGROUND_WHITE;
        let mut tag_open = false;
        let mut line = String::new();

        for col in 0..=col_stop {
            let mut v = cells[col];

            if col < col_start && v <= 0x07 {
                foreground = v;
            }

            if col == col_start && self.colours && foreground != FOREGROUND_WHITE {
                line.push_str(&format!(
                    "<font color=\"{}\">",
                    TELETEXT_COLOURS[foreground as usize]
                ));
                tag_open = true;
            }

            if col < col_start {
                continue;
            }

            if v <= 0x07 {
                // Each character space occupied by a spacing attribute is
                // displayed as a space (ETS 300 706, chapter 12.2).
                if self.colours {
                    if tag_open {
                        line.push_str("</font> ");
                        tag_open = false;
                    }
                    // Black is treated as white; tags open only when needed.
                    if v > 0x00 && v < 0x07 {
                        line.push_str(&format!(
                            "<font color=\"{}\">",
                            TELETEXT_COLOURS[v as usize]
                        ));
                        tag_open = true;
                    }
                } else {
                    v = 0x20;
                }
            }

            if v >= 0x20 {
                if self.colours {
                    match v {
                        0x3C => {
                            line.push_str("&lt;");
                            continue;
                        }
                        0x3E => {
                            line.push_str("&gt;");
                            continue;
                        }
                        0x26 => {
                            line.push_str("&amp;");
                            continue;
                        }
                        _ => {}
                    }
                }
                line.push(char::from_u32(v as u32).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }

        if self.colours && tag_open {
            line.push_str("</font>");
        }

        Some(line)
    }
}
