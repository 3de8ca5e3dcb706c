use serde::Serialize;

use crate::{BillIdentifier, Chamber};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch(BillIdentifier),
    Finished { chamber: Chamber, reason: FinishReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Unbounded enumeration reached the not-found sentinel.
    NotFound,
    /// Every explicitly listed number was resolved.
    ListExhausted,
    /// Too many consecutive transport failures.
    TransportGaveUp,
    /// Unbounded enumeration ran past the largest bill number.
    NumbersExhausted,
}
