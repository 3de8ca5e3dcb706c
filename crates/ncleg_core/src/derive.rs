//! Status flags computed from page text rather than dedicated fields.

const RATIFIED_KEYWORD: &str = "RATIFIED";
const LAW_MARKER: &str = "Law";
const THIRD_READING: &str = "Passed 3rd Reading";

/// True iff `RATIFIED` is one of the bill keywords.
pub fn is_ratified(keywords: &[String]) -> bool {
    keywords.iter().any(|k| k == RATIFIED_KEYWORD)
}

/// True iff any history entry mentions `Law` (case-sensitive).
pub fn is_law(entries: &[String]) -> bool {
    entries.iter().any(|entry| entry.contains(LAW_MARKER))
}

/// Chamber-pass flags accumulated over the action history table.
///
/// Flags only ever go from false to true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassageFlags {
    pub house: bool,
    pub senate: bool,
}

impl PassageFlags {
    /// Folds in one history row: `action` is the action cell, `location`
    /// the cell naming where it happened.
    pub fn observe(&mut self, action: &str, location: &str) {
        if !action.contains(THIRD_READING) {
            return;
        }
        if location.contains("House") {
            self.house = true;
        }
        if location.contains("Senate") {
            self.senate = true;
        }
    }
}
