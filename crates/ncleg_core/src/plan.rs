use crate::{Chamber, ChamberEnumeration};

/// Session whose pages carry hyperlinked sponsor names.
pub const MODERN_SESSION: &str = "2017";

pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// What to harvest: chambers in scope, the session, and optionally an
/// explicit list of bill numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestPlan {
    pub chambers: Vec<Chamber>,
    pub session: String,
    pub numbers: Option<Vec<String>>,
}

impl HarvestPlan {
    pub fn new(selector: &str, session: impl Into<String>, numbers: Option<Vec<String>>) -> Self {
        Self {
            chambers: Chamber::scope(selector),
            session: session.into(),
            numbers: numbers.filter(|list| !list.is_empty()),
        }
    }

    /// One independent enumeration per chamber in scope.
    pub fn enumerations(&self, max_consecutive_failures: u32) -> Vec<ChamberEnumeration> {
        self.chambers
            .iter()
            .map(|&chamber| match &self.numbers {
                Some(numbers) => {
                    ChamberEnumeration::explicit(chamber, self.session.clone(), numbers.clone())
                }
                None => ChamberEnumeration::unbounded(chamber, self.session.clone())
                    .with_failure_budget(max_consecutive_failures),
            })
            .collect()
    }
}

impl Default for HarvestPlan {
    fn default() -> Self {
        Self::new("", MODERN_SESSION, None)
    }
}
