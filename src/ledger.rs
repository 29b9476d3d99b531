use std::fmt;

use crate::error::LedgerError;

/// Ordered set of event-type names stored on an element as a comma-joined
/// attribute value.
///
/// The attribute format has no escaping, so names containing a comma or
/// whitespace are rejected on insert instead of being split apart later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    events: Vec<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an attribute value. Empty segments are skipped, segments are
    /// trimmed and duplicates keep their first position.
    pub fn from_attribute(raw: &str) -> Self {
        let mut ledger = Self::new();
        for segment in raw.split(',') {
            let name = segment.trim();
            if name.is_empty() || ledger.contains(name) {
                continue;
            }
            ledger.events.push(name.to_string());
        }
        ledger
    }

    pub fn validate(event_type: &str) -> Result<(), LedgerError> {
        if event_type.is_empty() {
            return Err(LedgerError::Empty);
        }
        if event_type
            .chars()
            .any(|ch| ch == ',' || ch.is_whitespace())
        {
            return Err(LedgerError::Unrepresentable(event_type.to_string()));
        }
        Ok(())
    }

    /// Append `event_type` if absent. Returns whether the ledger changed.
    pub fn insert(&mut self, event_type: &str) -> Result<bool, LedgerError> {
        Self::validate(event_type)?;
        if self.contains(event_type) {
            return Ok(false);
        }
        self.events.push(event_type.to_string());
        Ok(true)
    }

    pub fn remove(&mut self, event_type: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|existing| existing != event_type);
        self.events.len() != before
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.events.iter().any(|existing| existing == event_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.events.join(","))
    }
}
