use crate::error::HabitError;
use serde::Serialize;

pub struct Styler {
    color_enabled: bool,
}

impl Styler {
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    fn wrap(&self, code: &str, s: &str) -> String {
        if !self.color_enabled {
            return s.to_string();
        }
        format!("{}{}\u{001b}[0m", code, s)
    }

    pub fn green(&self, s: &str) -> String {
        self.wrap("\u{001b}[32m", s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.wrap("\u{001b}[33m", s)
    }

    pub fn gray(&self, s: &str) -> String {
        self.wrap("\u{001b}[90m", s)
    }
}

/// Pretty JSON with object keys in sorted order.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, HabitError> {
    let v = serde_json::to_value(value)
        .map_err(|e| HabitError::usage(format!("JSON encode error: {}", e)))?;
    serde_json::to_string_pretty(&v)
        .map_err(|e| HabitError::usage(format!("JSON encode error: {}", e)))
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\u{001b}' {
            for n in chars.by_ref() {
                if n == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn is_wide_char(c: char) -> bool {
    let cp = c as u32;
    (0x1100..=0x115F).contains(&cp)
        || (0x2E80..=0xA4CF).contains(&cp)
        || (0xAC00..=0xD7A3).contains(&cp)
        || (0xF900..=0xFAFF).contains(&cp)
        || (0xFF00..=0xFF60).contains(&cp)
        || (0x1F300..=0x1FAFF).contains(&cp)
        || (0x20000..=0x3FFFD).contains(&cp)
}

/// Terminal columns taken by `s`, ignoring colour codes.
pub fn display_width(s: &str) -> usize {
    strip_ansi(s)
        .chars()
        .map(|c| if is_wide_char(c) { 2 } else { 1 })
        .sum()
}

fn pad_right(s: &str, width: usize) -> String {
    let dw = display_width(s);
    if dw >= width {
        return s.to_string();
    }
    format!("{}{}", s, " ".repeat(width - dw))
}

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let w = display_width(cell);
            match widths.get_mut(i) {
                Some(cur) => *cur = (*cur).max(w),
                None => widths.push(w),
            }
        }
    }

    let render_line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| pad_right(c, widths[i]))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_line(headers.to_vec())];
    for row in rows {
        lines.push(render_line(row.iter().map(|c| c.as_str()).collect()));
    }
    lines.join("\n")
}

/// Fixed-width bar for a fraction in `[0, 1]`.
pub fn render_progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ignores_color_and_counts_wide_chars() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width("\u{001b}[32mok\u{001b}[0m"), 2);
        assert_eq!(display_width("\u{4e2d}\u{6587}"), 4);
        assert_eq!(display_width("run \u{1F3C3}"), 6);
    }

    #[test]
    fn table_columns_align() {
        let rows = vec![
            vec!["Read".to_string(), "3".to_string()],
            vec!["Stretch".to_string(), "12".to_string()],
        ];
        let table = render_table(&["name", "streak"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "name     streak");
        assert_eq!(lines[1], "Read     3");
        assert_eq!(lines[2], "Stretch  12");
    }

    #[test]
    fn colors_can_be_disabled() {
        assert_eq!(Styler::new(false).green("done"), "done");
        assert!(Styler::new(true).green("done").starts_with('\u{001b}'));
    }

    #[test]
    fn progress_bar_bounds() {
        assert_eq!(render_progress_bar(0.5, 4), "[##--]");
        assert_eq!(render_progress_bar(2.0, 4), "[####]");
        assert_eq!(render_progress_bar(-1.0, 2), "[--]");
    }

    #[test]
    fn json_keys_are_sorted() {
        #[derive(Serialize)]
        struct Row {
            zeta: u32,
            alpha: u32,
        }
        let s = to_json_pretty(&Row { zeta: 1, alpha: 2 }).unwrap();
        assert!(s.find("alpha").unwrap() < s.find("zeta").unwrap());
    }
}
