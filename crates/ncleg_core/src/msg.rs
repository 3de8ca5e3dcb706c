use crate::BillIdentifier;

/// How a single lookup ended, as far as enumeration cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A record was parsed.
    Found,
    /// The page exists but could not be parsed into a record.
    Malformed,
    /// The page carries the not-found sentinel.
    NotFound,
    /// The transport gave up on this identifier.
    TransportFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin enumerating the chamber.
    Start,
    /// A previously requested lookup finished.
    Resolved {
        identifier: BillIdentifier,
        outcome: FetchOutcome,
    },
}
