use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::dom::{attribute_values, children_before, digit_runs, own_text, own_texts, select_from, Step};
use crate::parse::ParseWarning;

/// Marker that separates primary sponsors from co-sponsors in plain-text
/// sponsor lists.
const PRIMARY_MARKER: &str = "Primary";

/// A name: a word, optional period, optional space, optional hyphen or
/// apostrophe, and a second word ("J. Smith", "Jones", "Lee-Ann").
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\.? ?-?'?\w+").expect("sponsor name pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sponsors {
    pub sponsors: Vec<String>,
    pub primary_sponsors: Option<Vec<String>>,
    pub sponsors_ids: Vec<String>,
    pub primary_sponsors_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SponsorExtraction {
    pub sponsors: Sponsors,
    pub warnings: Vec<ParseWarning>,
}

/// Reads sponsors out of the sponsor cell(s) of a bill page.
pub trait SponsorExtractor: Send + Sync {
    fn extract(&self, cells: &[ElementRef<'_>]) -> SponsorExtraction;
}

/// Picks the layout for a session: the modern session links every sponsor
/// to a member page, older sessions list names as plain text.
pub fn extractor_for_session(session: &str, modern_session: &str) -> &'static dyn SponsorExtractor {
    if session == modern_session {
        &LinkedSponsors
    } else {
        &PlainTextSponsors
    }
}

/// Sponsors as `<a href="...nUserID=123">Name</a>` links. Primary sponsors
/// are the links before the first `<br>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedSponsors;

impl SponsorExtractor for LinkedSponsors {
    fn extract(&self, cells: &[ElementRef<'_>]) -> SponsorExtraction {
        let anchors = select_from(cells, &[Step::child("a")]);
        let primary: Vec<ElementRef<'_>> = cells
            .iter()
            .flat_map(|cell| children_before(*cell, "a", "br"))
            .collect();

        let sponsors = Sponsors {
            sponsors: split_names(&own_texts(&anchors)),
            sponsors_ids: link_ids(&anchors),
            primary_sponsors: Some(
                primary
                    .iter()
                    .map(|anchor| own_text(*anchor).concat().trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect(),
            ),
            primary_sponsors_ids: link_ids(&primary),
        };
        SponsorExtraction {
            sponsors,
            warnings: Vec::new(),
        }
    }
}

/// Sponsors as plain text, with a `Primary` marker after the primary
/// sponsors.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextSponsors;

impl SponsorExtractor for PlainTextSponsors {
    fn extract(&self, cells: &[ElementRef<'_>]) -> SponsorExtraction {
        let tokens: Vec<String> = own_texts(cells)
            .iter()
            .flat_map(|text| NAME_PATTERN.find_iter(text).map(|m| m.as_str().to_string()))
            .collect();

        let mut warnings = Vec::new();
        let primary_sponsors = match tokens.iter().position(|token| token == PRIMARY_MARKER) {
            Some(marker) => Some(tokens[..marker].to_vec()),
            None => {
                warnings.push(ParseWarning::AmbiguousSponsorLayout);
                None
            }
        };
        let sponsors = tokens
            .into_iter()
            .filter(|token| token != PRIMARY_MARKER)
            .collect();

        SponsorExtraction {
            sponsors: Sponsors {
                sponsors,
                primary_sponsors,
                ..Sponsors::default()
            },
            warnings,
        }
    }
}

fn split_names(texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .flat_map(|text| text.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn link_ids(anchors: &[ElementRef<'_>]) -> Vec<String> {
    attribute_values(anchors, "href")
        .iter()
        .flat_map(|href| digit_runs(href).into_iter().map(ToOwned::to_owned).collect::<Vec<_>>())
        .collect()
}
