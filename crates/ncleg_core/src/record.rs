use serde::{Deserialize, Serialize};

/// One parsed bill detail page.
///
/// `number` and `chamber` are read back from the page itself and act as a
/// consistency check against the identifier that was requested.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillRecord {
    pub number: u32,
    pub chamber: String,
    pub session: Option<String>,
    pub title: String,
    pub counties: Vec<String>,
    pub statutes: Vec<String>,
    pub keywords: Vec<String>,
    pub passed_house: bool,
    pub passed_senate: bool,
    pub is_ratified: bool,
    pub is_law: bool,
    pub sponsors: Vec<String>,
    /// `None` when the page does not say which sponsors are primary.
    pub primary_sponsors: Option<Vec<String>>,
    pub sponsors_ids: Vec<String>,
    pub primary_sponsors_ids: Vec<String>,
}
