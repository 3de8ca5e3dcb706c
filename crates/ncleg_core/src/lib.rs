//! Harvester core: bill identifiers, records, derived status flags and the
//! pure per-chamber enumeration state machine.
mod chamber;
mod derive;
mod effect;
mod identifier;
mod msg;
mod plan;
mod record;
mod state;
mod update;

pub use chamber::Chamber;
pub use derive::{is_law, is_ratified, PassageFlags};
pub use effect::{Effect, FinishReason};
pub use identifier::{parse_bill_numbers, BillIdentifier};
pub use msg::{FetchOutcome, Msg};
pub use plan::{HarvestPlan, DEFAULT_MAX_CONSECUTIVE_FAILURES, MODERN_SESSION};
pub use record::BillRecord;
pub use state::{ChamberEnumeration, EnumerationMode};
pub use update::update;
