// Weblog Tail - core/log_table.rs
//
// The rendered log: rows newest-first, in arrival order.
//
// Rows are never re-sorted by event time; an event delivered late shows up
// above events with later timestamps. Rows leave the table only through
// `clear` or, when a cap is configured, by falling off the bottom.

use crate::core::model::{BaseTime, LogEvent, LogRow, Prefix, Severity};
use crate::util::constants::{MISSING_LEVEL_TEXT, MISSING_MESSAGE_TEXT};
use std::collections::VecDeque;

/// Build the display row for `event` relative to `base`.
pub fn render_row(event: LogEvent, base: &BaseTime, seq: u64) -> LogRow {
    let offset_secs = base.offset_secs(event.time);
    let prefix = match event.prefix() {
        Some(p) => Prefix::Present(p.to_string()),
        None => Prefix::Missing,
    };
    let (severity, level) = match event.level {
        Some(level) => (Severity::from_level(&level), level),
        None => (Severity::Unknown, MISSING_LEVEL_TEXT.to_string()),
    };
    let message = match event.message {
        Some(mut m) => {
            let trimmed = m.trim_end_matches(['\r', '\n']).len();
            m.truncate(trimmed);
            m
        }
        None => MISSING_MESSAGE_TEXT.to_string(),
    };

    LogRow {
        seq,
        offset_secs,
        severity,
        level,
        prefix,
        message,
        time: event.time,
        fields: event.fields,
    }
}

/// Newest-first row store.
#[derive(Debug, Default)]
pub struct LogTable {
    rows: VecDeque<LogRow>,
    /// `None` = unlimited.
    max_rows: Option<usize>,
    next_seq: u64,
}

impl LogTable {
    /// `max_rows` of 0 means unlimited.
    pub fn new(max_rows: usize) -> Self {
        Self {
            rows: VecDeque::new(),
            max_rows: (max_rows > 0).then_some(max_rows),
            next_seq: 0,
        }
    }

    /// Render `event` and insert it as the new first row.
    pub fn prepend(&mut self, event: LogEvent, base: &BaseTime) -> &LogRow {
        let row = render_row(event, base, self.next_seq);
        self.next_seq += 1;
        self.rows.push_front(row);
        if let Some(max) = self.max_rows {
            if self.rows.len() > max {
                self.rows.truncate(max);
            }
        }
        &self.rows[0]
    }

    /// Remove every row. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in display order (newest first).
    pub fn rows(&self) -> impl Iterator<Item = &LogRow> {
        self.rows.iter()
    }

    /// Row at display position `index` (0 = top).
    pub fn get(&self, index: usize) -> Option<&LogRow> {
        self.rows.get(index)
    }

    /// Total rows ever appended, including cleared ones.
    pub fn total_received(&self) -> u64 {
        self.next_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timestamp::parse_str;
    use std::collections::BTreeMap;

    fn event(time: &str, level: Option<&str>, message: Option<&str>, prefix: Option<&str>) -> LogEvent {
        let mut fields = BTreeMap::new();
        if let Some(p) = prefix {
            fields.insert("prefix".to_string(), p.to_string());
        }
        LogEvent {
            time: parse_str(time).unwrap(),
            level: level.map(str::to_string),
            message: message.map(str::to_string),
            fields,
        }
    }

    fn base() -> BaseTime {
        BaseTime::at(parse_str("2024-01-01T00:00:00Z").unwrap())
    }

    #[test]
    fn test_render_row_columns() {
        let row = render_row(
            event("2024-01-01T00:00:05Z", Some("info"), Some("hello"), None),
            &base(),
            0,
        );
        assert_eq!(row.offset_label(), "[5]");
        assert_eq!(row.level, "info");
        assert_eq!(row.severity, Severity::Info);
        assert!(row.prefix.is_missing());
        assert_eq!(row.prefix.text(), "[none]");
        assert_eq!(row.message, "hello");
    }

    #[test]
    fn test_render_row_prefix_present() {
        let row = render_row(
            event("2024-01-01T00:00:00Z", Some("error"), Some("x"), Some("undefined")),
            &base(),
            0,
        );
        // A literal "undefined" prefix is data, not absence.
        assert_eq!(row.prefix, Prefix::Present("undefined".to_string()));
        assert_eq!(row.prefix.text(), "undefined");
    }

    #[test]
    fn test_render_row_missing_level_and_message() {
        let row = render_row(event("2024-01-01T00:00:00Z", None, None, None), &base(), 0);
        assert_eq!(row.level, MISSING_LEVEL_TEXT);
        assert_eq!(row.severity, Severity::Unknown);
        assert_eq!(row.message, MISSING_MESSAGE_TEXT);
    }

    #[test]
    fn test_render_row_strips_trailing_newline_only() {
        let row = render_row(
            event("2024-01-01T00:00:00Z", Some("info"), Some("  two\nlines\r\n"), None),
            &base(),
            0,
        );
        assert_eq!(row.message, "  two\nlines");
    }

    #[test]
    fn test_prepend_puts_newest_first_in_arrival_order() {
        let mut table = LogTable::new(0);
        table.prepend(event("2024-01-01T00:00:09Z", Some("info"), Some("A"), None), &base());
        // B carries an earlier timestamp but arrives later: it still goes on top.
        table.prepend(event("2024-01-01T00:00:01Z", Some("info"), Some("B"), None), &base());
        let messages: Vec<_> = table.rows().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["B", "A"]);
        assert_eq!(table.get(0).unwrap().seq, 1);
    }

    #[test]
    fn test_clear_empties_regardless_of_size() {
        let mut table = LogTable::new(0);
        assert_eq!(table.clear(), 0);
        for _ in 0..25 {
            table.prepend(event("2024-01-01T00:00:00Z", Some("info"), Some("m"), None), &base());
        }
        assert_eq!(table.clear(), 25);
        assert!(table.is_empty());
        assert_eq!(table.total_received(), 25);
    }

    #[test]
    fn test_row_cap_drops_oldest() {
        let mut table = LogTable::new(2);
        for msg in ["1", "2", "3"] {
            table.prepend(event("2024-01-01T00:00:00Z", Some("info"), Some(msg), None), &base());
        }
        let messages: Vec<_> = table.rows().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["3", "2"]);
    }
}
