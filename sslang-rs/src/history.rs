//! Result history of one script run.
//!
//! Every call statement appends its result.  Scripts address entries from
//! the newest end: `$0` is the latest result, `$1` the one before, and so on.
//! The buffer is append-only.

use crate::script::value::Value;

#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    /// Oldest first.
    entries: Vec<Value>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` as the most recent result.
    pub fn push(&mut self, value: Value) {
        self.entries.push(value);
    }

    /// The result `back` steps before the latest (`0` = latest).
    pub fn recent(&self, back: usize) -> Option<&Value> {
        let idx = self.entries.len().checked_sub(back)?.checked_sub(1)?;
        self.entries.get(idx)
    }

    /// The latest result.
    pub fn last(&self) -> Option<&Value> {
        self.entries.last()
    }

    /// All results, oldest first.
    pub fn as_slice(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> HistoryBuffer {
        let mut h = HistoryBuffer::new();
        for s in ["A", "B", "C"] {
            h.push(Value::from(s));
        }
        h
    }

    #[test]
    fn recent_counts_back() {
        let h = abc();
        assert_eq!(h.recent(0), Some(&Value::from("C")));
        assert_eq!(h.recent(1), Some(&Value::from("B")));
        assert_eq!(h.recent(2), Some(&Value::from("A")));
        assert_eq!(h.recent(3), None);
        assert_eq!(h.recent(usize::MAX), None);
    }

    #[test]
    fn empty_history() {
        let h = HistoryBuffer::new();
        assert!(h.is_empty());
        assert_eq!(h.recent(0), None);
        assert_eq!(h.last(), None);
    }

    #[test]
    fn order_is_oldest_first() {
        let h = abc();
        assert_eq!(h.len(), 3);
        assert_eq!(h.as_slice()[0], Value::from("A"));
        assert_eq!(h.last(), Some(&Value::from("C")));
    }
}
