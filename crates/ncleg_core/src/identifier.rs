use std::fmt;

use crate::Chamber;

/// A bill to look up. `number` is kept as the verbatim token so that
/// explicit lists reach the endpoint exactly as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BillIdentifier {
    chamber: Chamber,
    session: String,
    number: String,
}

impl BillIdentifier {
    pub fn new(chamber: Chamber, session: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            chamber,
            session: session.into(),
            number: number.into(),
        }
    }

    pub fn numbered(chamber: Chamber, session: impl Into<String>, number: u32) -> Self {
        Self::new(chamber, session, number.to_string())
    }

    pub fn chamber(&self) -> Chamber {
        self.chamber
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    /// `BillID` query value, e.g. `H42`.
    pub fn lookup_key(&self) -> String {
        format!("{}{}", self.chamber.symbol(), self.number)
    }
}

impl fmt::Display for BillIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} ({})", self.chamber.symbol(), self.number, self.session)
    }
}

/// Parses the comma-separated bill number argument.
///
/// Whitespace is removed before splitting. Entries are not validated as
/// integers. Returns `None` when nothing is left, which means unbounded
/// enumeration.
pub fn parse_bill_numbers(raw: &str) -> Option<Vec<String>> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    Some(compact.split(',').map(ToOwned::to_owned).collect())
}
