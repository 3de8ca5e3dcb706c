use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two legislative bodies. Each numbers its bills independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Chamber {
    #[serde(rename = "H")]
    House,
    #[serde(rename = "S")]
    Senate,
}

impl Chamber {
    pub const ALL: [Chamber; 2] = [Chamber::House, Chamber::Senate];

    pub fn symbol(self) -> &'static str {
        match self {
            Chamber::House => "H",
            Chamber::Senate => "S",
        }
    }

    /// Exact, case-sensitive match on the chamber symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.symbol() == symbol)
    }

    /// Chambers selected by a user-supplied token. Anything that is not a
    /// recognized symbol (including the empty string) selects both.
    pub fn scope(selector: &str) -> Vec<Chamber> {
        match Self::from_symbol(selector) {
            Some(chamber) => vec![chamber],
            None => Self::ALL.to_vec(),
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
