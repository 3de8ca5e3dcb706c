//! Bill detail page parser.

use ncleg_core::{is_law, is_ratified, BillIdentifier, BillRecord, PassageFlags, MODERN_SESSION};
use ncleg_logging::ncleg_trace;
use scraper::ElementRef;

use crate::dom::{digit_runs, own_text, own_texts, select_from, Document, Step};
use crate::sponsors::extractor_for_session;

const NOT_FOUND_MARKER: &str = "Not Found";
const KEYWORD_DELIMITER: &str = ", ";
/// Rows 1 and 2 of the history table are its caption and column headers.
const FIRST_HISTORY_ROW: usize = 3;

/// `//div[@id = "title"]`
const TITLE: &[Step] = &[Step::descendant("div").with_id("title")];

/// `//div/table/tr/td/table/tr/td[2]`: the "House Bill 2" heading cell.
const HEADING_CELL: &[Step] = &[
    Step::descendant("div"),
    Step::child("table"),
    Step::child("tr"),
    Step::child("td"),
    Step::child("table"),
    Step::child("tr"),
    Step::child("td").at(2),
];

/// `/html/body/div/table/tr/td[1]`: main content column.
const MAIN_COLUMN: &[Step] = &[
    Step::child("html"),
    Step::child("body"),
    Step::child("div"),
    Step::child("table"),
    Step::child("tr"),
    Step::child("td").at(1),
];

/// Relative to the main column: the sponsor/county/statute/keyword table.
const INFO_TABLE: &[Step] = &[
    Step::child("table").at(2),
    Step::child("tr"),
    Step::child("td").at(3),
    Step::child("table"),
];

/// Relative to the main column: the action history table.
const HISTORY_TABLE: &[Step] = &[Step::child("center"), Step::child("table")];

/// `/html/body/div/table/tr/td/table[2]/tr/td[1]/table/tr//td[1]//a`:
/// links in the date column of the chaptering table.
const LAW_LINKS: &[Step] = &[
    Step::child("html"),
    Step::child("body"),
    Step::child("div"),
    Step::child("table"),
    Step::child("tr"),
    Step::child("td"),
    Step::child("table").at(2),
    Step::child("tr"),
    Step::child("td").at(1),
    Step::child("table"),
    Step::child("tr"),
    Step::descendant("td").at(1),
    Step::descendant("a"),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("missing {field}")]
    MissingField { field: &'static str },
    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Non-fatal oddities found while parsing a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// Plain-text sponsor list without a `Primary` marker; nobody is
    /// reported as primary.
    AmbiguousSponsorLayout,
    /// The page describes a different bill number than was requested.
    NumberMismatch { requested: String, found: u32 },
    /// The page had bytes invalid in its encoding; they were replaced.
    LossyDecoding { encoding: &'static str },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::AmbiguousSponsorLayout => {
                write!(f, "sponsor list has no primary marker")
            }
            ParseWarning::NumberMismatch { requested, found } => {
                write!(f, "requested bill {requested} but page shows {found}")
            }
            ParseWarning::LossyDecoding { encoding } => {
                write!(f, "page is not valid {encoding}; invalid bytes replaced")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBill {
    pub record: BillRecord,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The lookup endpoint has no bill under this identifier.
    NotFound,
    Found(ParsedBill),
}

/// One row of the action history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub index: usize,
    /// Second column: the chamber the action happened in.
    pub location: String,
    /// Third column: the action itself.
    pub action: String,
}

/// Rows of the history table from row 3 on. Ends at the first row whose
/// action cell has no text, whatever follows it.
pub struct HistoryRows<'a> {
    tables: Vec<ElementRef<'a>>,
    index: usize,
    exhausted: bool,
}

impl<'a> HistoryRows<'a> {
    pub fn new(tables: Vec<ElementRef<'a>>) -> Self {
        Self {
            tables,
            index: FIRST_HISTORY_ROW,
            exhausted: false,
        }
    }

    fn cell_text(&self, column: usize) -> Vec<String> {
        own_texts(&select_from(
            &self.tables,
            &[Step::child("tr").at(self.index), Step::child("td").at(column)],
        ))
    }
}

impl Iterator for HistoryRows<'_> {
    type Item = HistoryRow;

    fn next(&mut self) -> Option<HistoryRow> {
        if self.exhausted {
            return None;
        }
        let Some(action) = self.cell_text(3).into_iter().next() else {
            self.exhausted = true;
            return None;
        };
        let location = self.cell_text(2).into_iter().next().unwrap_or_default();
        let row = HistoryRow {
            index: self.index,
            location,
            action,
        };
        self.index += 1;
        Some(row)
    }
}

impl std::iter::FusedIterator for HistoryRows<'_> {}

#[derive(Debug, Clone)]
pub struct BillPageParser {
    modern_session: String,
}

impl Default for BillPageParser {
    fn default() -> Self {
        Self::new(MODERN_SESSION)
    }
}

impl BillPageParser {
    pub fn new(modern_session: impl Into<String>) -> Self {
        Self {
            modern_session: modern_session.into(),
        }
    }

    /// Parses one fetched page. The identifier's session picks the sponsor
    /// layout; its number is only compared against the page.
    pub fn parse(&self, html: &str, identifier: &BillIdentifier) -> Result<PageOutcome, ParseError> {
        let doc = Document::parse(html);

        if is_not_found(&doc) {
            return Ok(PageOutcome::NotFound);
        }

        let mut warnings = Vec::new();

        let heading = doc.select(HEADING_CELL);
        let number = parse_number(&heading)?;
        let chamber = parse_chamber(&heading)?;
        if identifier.number() != number.to_string() {
            warnings.push(ParseWarning::NumberMismatch {
                requested: identifier.number().to_string(),
                found: number,
            });
        }

        let session = doc
            .select_css(".titleSub")
            .first()
            .and_then(|element| own_text(*element).into_iter().next())
            .map(|text| text.trim().to_string());
        let title = own_texts(&doc.select(&[TITLE[0], Step::child("a")]))
            .into_iter()
            .next()
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        let main = doc.select(MAIN_COLUMN);
        let info = select_from(&main, INFO_TABLE);
        let info_row = |row: usize, tail: &[Step]| {
            let mut path = vec![Step::child("tr").at(row), Step::child("td")];
            path.extend_from_slice(tail);
            select_from(&info, &path)
        };

        let counties = split_list(&own_texts(&info_row(4, &[])));
        let statutes = split_list(&own_texts(&info_row(5, &[Step::child("div")])));
        let keywords: Vec<String> = own_texts(&info_row(6, &[Step::child("div")]))
            .into_iter()
            .next()
            .ok_or(ParseError::MissingField { field: "keywords" })?
            .split(KEYWORD_DELIMITER)
            .map(ToOwned::to_owned)
            .collect();

        let mut passage = PassageFlags::default();
        for row in HistoryRows::new(select_from(&main, HISTORY_TABLE)) {
            ncleg_trace!("{identifier} history row {}: {} / {}", row.index, row.location, row.action);
            passage.observe(&row.action, &row.location);
        }

        let law_entries = own_texts(&doc.select(LAW_LINKS));

        let extraction = extractor_for_session(identifier.session(), &self.modern_session)
            .extract(&info_row(2, &[]));
        warnings.extend(extraction.warnings);
        let sponsors = extraction.sponsors;

        let record = BillRecord {
            number,
            chamber,
            session,
            title,
            counties,
            statutes,
            is_ratified: is_ratified(&keywords),
            keywords,
            passed_house: passage.house,
            passed_senate: passage.senate,
            is_law: is_law(&law_entries),
            sponsors: sponsors.sponsors,
            primary_sponsors: sponsors.primary_sponsors,
            sponsors_ids: sponsors.sponsors_ids,
            primary_sponsors_ids: sponsors.primary_sponsors_ids,
        };

        Ok(PageOutcome::Found(ParsedBill { record, warnings }))
    }
}

fn is_not_found(doc: &Document) -> bool {
    own_texts(&doc.select(TITLE))
        .iter()
        .any(|text| text.contains(NOT_FOUND_MARKER))
}

/// The bill number is the second digit run in the heading cell markup; the
/// first belongs to the cell's width attribute.
fn parse_number(heading: &[ElementRef<'_>]) -> Result<u32, ParseError> {
    let markup: String = heading.iter().map(|cell| cell.html()).collect();
    let run = digit_runs(&markup)
        .get(1)
        .copied()
        .ok_or(ParseError::MissingField { field: "bill number" })?;
    run.parse().map_err(|_| ParseError::InvalidField {
        field: "bill number",
        value: run.to_string(),
    })
}

/// First word of the heading cell text, e.g. `House`.
fn parse_chamber(heading: &[ElementRef<'_>]) -> Result<String, ParseError> {
    own_texts(heading)
        .iter()
        .flat_map(|text| text.split(|c: char| !(c.is_alphanumeric() || c == '_')))
        .find(|word| !word.is_empty())
        .map(ToOwned::to_owned)
        .ok_or(ParseError::MissingField { field: "chamber" })
}

/// Comma-separated text nodes to trimmed, non-empty entries.
fn split_list(texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .flat_map(|text| text.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
