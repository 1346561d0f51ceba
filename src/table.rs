// Plain-text tables for human output. Column widths are measured with
// `unicode-width` so Polish diacritics and emoji line up.

use std::io;

use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const SEPARATOR: &str = "  ";
/// Widest a single column may get before its cells are cut.
const MAX_COLUMN_WIDTH: usize = 60;

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Table {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_to(&self, w: &mut impl io::Write) -> io::Result<()> {
        let cells: Vec<Vec<String>> = std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .map(|row| {
                (0..self.headers.len())
                    .map(|i| {
                        let cell = row.get(i).map(String::as_str).unwrap_or_default();
                        fit(&single_line(cell), MAX_COLUMN_WIDTH)
                    })
                    .collect()
            })
            .collect();
        let widths = column_widths(&cells);

        if !self.title.is_empty() {
            writeln!(w, "{}", self.title)?;
        }
        for (i, row) in cells.iter().enumerate() {
            write_row(w, row, &widths)?;
            if i == 0 {
                let rule: Vec<String> = widths.iter().map(|n| "-".repeat(*n)).collect();
                write_row(w, &rule, &widths)?;
            }
        }
        Ok(())
    }
}

fn write_row(w: &mut impl io::Write, row: &[String], widths: &[usize]) -> io::Result<()> {
    let last = row.len().saturating_sub(1);
    let mut line = String::new();
    for (i, (cell, width)) in row.iter().zip(widths).enumerate() {
        line.push_str(cell);
        if i < last {
            line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
            line.push_str(SEPARATOR);
        }
    }
    writeln!(w, "{}", line.trim_end())
}

fn column_widths(cells: &[Vec<String>]) -> Vec<usize> {
    let mut widths = vec![0; cells.first().map_or(0, Vec::len)];
    for row in cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }
    widths
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max` display columns, ending in `...` when cut.
fn fit(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let room = max.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > room {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Cut `text` to `max` characters, ending in `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Text for one JSON scalar: strings as-is, `null` empty, booleans yes/no.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => yes_no(*b).to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// `name surname` of an object that has them, trimmed.
pub fn full_name(value: &Value) -> String {
    let part = |key: &str| value.get(key).map(cell).unwrap_or_default();
    format!("{} {}", part("name"), part("surname")).trim().to_string()
}

/// Flatten nested JSON into `path = value` rows for detail views. Lists of
/// scalars are joined, lists of objects are indexed.
pub fn key_values(title: impl Into<String>, value: &Value) -> Table {
    let mut table = Table::new(title, &["Field", "Value"]);
    let mut rows = Vec::new();
    flatten("", value, &mut rows);
    for (key, value) in rows {
        table.push(vec![key, value]);
    }
    table
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&join(key), child, out);
            }
        }
        Value::Array(items) if items.iter().all(|i| !i.is_object() && !i.is_array()) => {
            let joined: Vec<String> = items.iter().map(cell).collect();
            out.push((prefix.to_string(), joined.join(", ")));
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(&join(&i.to_string()), item, out);
            }
        }
        scalar => out.push((prefix.to_string(), cell(scalar))),
    }
}
