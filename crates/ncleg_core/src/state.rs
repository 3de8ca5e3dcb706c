use crate::{BillIdentifier, Chamber, DEFAULT_MAX_CONSECUTIVE_FAILURES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationMode {
    /// Probe 1, 2, 3, ... until the not-found sentinel.
    Unbounded,
    /// Look up exactly these numbers, in order.
    Explicit(Vec<String>),
}

/// Enumeration state for one chamber. Owned by that chamber's pipeline and
/// dropped once it has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChamberEnumeration {
    chamber: Chamber,
    session: String,
    mode: EnumerationMode,
    next_number: u32,
    started: bool,
    terminated: bool,
    /// Listed numbers still awaiting a result; duplicates kept.
    pending: Vec<String>,
    consecutive_failures: u32,
    max_consecutive_failures: u32,
}

impl ChamberEnumeration {
    pub fn unbounded(chamber: Chamber, session: impl Into<String>) -> Self {
        Self::with_mode(chamber, session.into(), EnumerationMode::Unbounded)
    }

    /// Unbounded enumeration starting at `first` instead of 1.
    pub fn unbounded_from(chamber: Chamber, session: impl Into<String>, first: u32) -> Self {
        Self {
            next_number: first,
            ..Self::unbounded(chamber, session)
        }
    }

    pub fn explicit(chamber: Chamber, session: impl Into<String>, numbers: Vec<String>) -> Self {
        Self::with_mode(chamber, session.into(), EnumerationMode::Explicit(numbers))
    }

    fn with_mode(chamber: Chamber, session: String, mode: EnumerationMode) -> Self {
        Self {
            chamber,
            session,
            mode,
            next_number: 1,
            started: false,
            terminated: false,
            pending: Vec::new(),
            consecutive_failures: 0,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }

    /// Consecutive transport failures tolerated in unbounded mode. Zero is
    /// treated as one.
    pub fn with_failure_budget(mut self, max_consecutive_failures: u32) -> Self {
        self.max_consecutive_failures = max_consecutive_failures.max(1);
        self
    }

    pub fn chamber(&self) -> Chamber {
        self.chamber
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn mode(&self) -> &EnumerationMode {
        &self.mode
    }

    pub fn is_unbounded(&self) -> bool {
        self.mode == EnumerationMode::Unbounded
    }

    /// The number currently awaited in unbounded mode.
    pub fn next_number(&self) -> u32 {
        self.next_number
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn start(&mut self) {
        self.started = true;
    }

    pub(crate) fn terminate(&mut self) {
        self.terminated = true;
    }

    pub(crate) fn current_identifier(&self) -> BillIdentifier {
        BillIdentifier::numbered(self.chamber, self.session.clone(), self.next_number)
    }

    pub(crate) fn listed_identifiers(&self) -> Vec<BillIdentifier> {
        match &self.mode {
            EnumerationMode::Explicit(numbers) => numbers
                .iter()
                .map(|n| BillIdentifier::new(self.chamber, self.session.clone(), n.clone()))
                .collect(),
            EnumerationMode::Unbounded => Vec::new(),
        }
    }

    pub(crate) fn set_pending(&mut self, identifiers: &[BillIdentifier]) {
        self.pending = identifiers.iter().map(|id| id.number().to_string()).collect();
    }

    /// Marks one pending lookup of `identifier` as resolved. Returns the
    /// number still pending, or `None` if it was not pending at all.
    pub(crate) fn resolve_one(&mut self, identifier: &BillIdentifier) -> Option<usize> {
        if identifier.chamber() != self.chamber || identifier.session() != self.session {
            return None;
        }
        let index = self.pending.iter().position(|n| n == identifier.number())?;
        self.pending.swap_remove(index);
        Some(self.pending.len())
    }

    /// Moves to the next number; false once the number space is used up.
    pub(crate) fn advance(&mut self) -> bool {
        match self.next_number.checked_add(1) {
            Some(next) => {
                self.next_number = next;
                true
            }
            None => false,
        }
    }

    pub(crate) fn reset_failures(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Records a transport failure; true when the budget is spent.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;
        self.consecutive_failures >= self.max_consecutive_failures
    }

    /// True if `identifier` is the lookup this state is waiting on.
    pub(crate) fn awaits(&self, identifier: &BillIdentifier) -> bool {
        identifier.chamber() == self.chamber
            && identifier.session() == self.session
            && identifier.number() == self.next_number.to_string()
    }
}
