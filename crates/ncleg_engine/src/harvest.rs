//! Drives enumeration, fetching and parsing for every chamber in a plan.

use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use futures_util::{stream, StreamExt};
use ncleg_core::{
    update, BillIdentifier, BillRecord, Chamber, ChamberEnumeration, Effect, FetchOutcome,
    FinishReason, HarvestPlan, Msg, DEFAULT_MAX_CONSECUTIVE_FAILURES, MODERN_SESSION,
};
use ncleg_logging::{ncleg_debug, ncleg_error, ncleg_info, ncleg_warn};
use serde::Serialize;
use url::Url;

use crate::decode::decode_page;
use crate::fetch::Fetcher;
use crate::output::RecordSink;
use crate::parse::{BillPageParser, PageOutcome, ParseWarning};

pub const DEFAULT_LOOKUP_URL: &str = "https://www.ncleg.net/gascripts/BillLookUp/BillLookUp.pl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    /// Lookup endpoint; `BillID` and `Session` are appended as query
    /// parameters.
    pub lookup_url: String,
    /// Session whose pages use linked sponsors.
    pub modern_session: String,
    /// Parallel lookups per chamber when bill numbers are listed explicitly.
    pub explicit_concurrency: usize,
    /// Transport failures in a row before an unbounded chamber gives up.
    pub max_consecutive_failures: u32,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            modern_session: MODERN_SESSION.to_string(),
            explicit_concurrency: 4,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

impl HarvestSettings {
    pub fn check_lookup_url(&self) -> Result<(), url::ParseError> {
        Url::parse(&self.lookup_url).map(|_| ())
    }

    pub fn lookup_url(&self, identifier: &BillIdentifier) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.lookup_url,
            &[
                ("BillID", identifier.lookup_key().as_str()),
                ("Session", identifier.session()),
            ],
        )
    }
}

/// A lookup that did not produce a record, other than not-found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub bill: String,
    pub outcome: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChamberSummary {
    pub chamber: Chamber,
    pub requested: usize,
    pub found: usize,
    pub not_found: usize,
    pub malformed: usize,
    pub transport_failures: usize,
    pub finish_reason: Option<FinishReason>,
    pub failures: Vec<RecordFailure>,
}

impl ChamberSummary {
    fn new(chamber: Chamber) -> Self {
        Self {
            chamber,
            requested: 0,
            found: 0,
            not_found: 0,
            malformed: 0,
            transport_failures: 0,
            finish_reason: None,
            failures: Vec::new(),
        }
    }

    fn observe(&mut self, resolution: &Resolution) {
        self.requested += 1;
        match resolution.outcome {
            FetchOutcome::Found => self.found += 1,
            FetchOutcome::NotFound => self.not_found += 1,
            FetchOutcome::Malformed => self.malformed += 1,
            FetchOutcome::TransportFailed => self.transport_failures += 1,
        }
        if let Some(reason) = &resolution.failure {
            self.failures.push(RecordFailure {
                bill: resolution.identifier.lookup_key(),
                outcome: match resolution.outcome {
                    FetchOutcome::TransportFailed => "transport",
                    _ => "malformed",
                },
                reason: reason.clone(),
            });
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub chambers: Vec<ChamberSummary>,
}

impl RunSummary {
    pub fn records(&self) -> usize {
        self.chambers.iter().map(|c| c.found).sum()
    }

    pub fn failures(&self) -> usize {
        self.chambers
            .iter()
            .map(|c| c.malformed + c.transport_failures)
            .sum()
    }
}

struct Resolution {
    identifier: BillIdentifier,
    outcome: FetchOutcome,
    record: Option<BillRecord>,
    failure: Option<String>,
}

impl Resolution {
    fn new(identifier: BillIdentifier, outcome: FetchOutcome) -> Self {
        Self {
            identifier,
            outcome,
            record: None,
            failure: None,
        }
    }

    fn failed(identifier: BillIdentifier, outcome: FetchOutcome, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(identifier, outcome)
        }
    }
}

pub struct Harvester {
    fetcher: Arc<dyn Fetcher>,
    parser: BillPageParser,
    settings: HarvestSettings,
}

impl Harvester {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: HarvestSettings) -> Self {
        Self {
            fetcher,
            parser: BillPageParser::new(settings.modern_session.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    /// Harvests every chamber of `plan` concurrently and hands each record
    /// to `sink`. Per-bill failures are counted, never fatal.
    pub async fn run<S: RecordSink>(&self, plan: &HarvestPlan, sink: &Mutex<S>) -> RunSummary {
        let enumerations = plan.enumerations(self.settings.max_consecutive_failures);
        ncleg_info!(
            "Harvesting session {} for {:?} ({})",
            plan.session,
            plan.chambers,
            match &plan.numbers {
                Some(numbers) => format!("{} listed bills", numbers.len()),
                None => "until not found".to_string(),
            }
        );

        let chambers = join_all(
            enumerations
                .into_iter()
                .map(|enumeration| self.run_chamber(enumeration, sink)),
        )
        .await;

        RunSummary { chambers }
    }

    async fn run_chamber<S: RecordSink>(
        &self,
        enumeration: ChamberEnumeration,
        sink: &Mutex<S>,
    ) -> ChamberSummary {
        let chamber = enumeration.chamber();
        let mut summary = ChamberSummary::new(chamber);
        let (mut state, mut effects) = update(enumeration, Msg::Start);
        let concurrency = self.settings.explicit_concurrency.max(1);

        loop {
            let mut pending = Vec::new();
            for effect in effects.drain(..) {
                match effect {
                    Effect::Fetch(identifier) => pending.push(identifier),
                    Effect::Finished { reason, .. } => {
                        ncleg_info!("Chamber {chamber} finished: {reason:?}");
                        summary.finish_reason = Some(reason);
                    }
                }
            }
            if pending.is_empty() {
                break;
            }

            // Unbounded enumeration only ever has one lookup pending.
            let resolutions: Vec<Resolution> = stream::iter(pending)
                .map(|identifier| self.resolve(identifier))
                .buffered(concurrency)
                .collect()
                .await;

            for resolution in resolutions {
                summary.observe(&resolution);
                if let Some(record) = &resolution.record {
                    deliver(sink, record);
                }
                let (next, more) = update(
                    state,
                    Msg::Resolved {
                        identifier: resolution.identifier,
                        outcome: resolution.outcome,
                    },
                );
                state = next;
                effects.extend(more);
            }
        }

        summary
    }

    async fn resolve(&self, identifier: BillIdentifier) -> Resolution {
        let url = match self.settings.lookup_url(&identifier) {
            Ok(url) => url,
            Err(err) => {
                ncleg_error!("{identifier}: cannot build lookup url: {err}");
                return Resolution::failed(identifier, FetchOutcome::TransportFailed, err.to_string());
            }
        };

        let output = match self.fetcher.fetch(url.as_str()).await {
            Ok(output) => output,
            Err(err) => {
                ncleg_warn!("{identifier}: fetch failed: {err}");
                return Resolution::failed(identifier, FetchOutcome::TransportFailed, err.to_string());
            }
        };

        let page = decode_page(&output.bytes, output.metadata.content_type.as_deref());

        match self.parser.parse(&page.html, &identifier) {
            Ok(PageOutcome::NotFound) => {
                ncleg_debug!("{identifier}: not found");
                Resolution::new(identifier, FetchOutcome::NotFound)
            }
            Ok(PageOutcome::Found(mut parsed)) => {
                if page.lossy {
                    parsed.warnings.push(ParseWarning::LossyDecoding {
                        encoding: page.encoding,
                    });
                }
                for warning in &parsed.warnings {
                    ncleg_warn!("{identifier}: {warning}");
                }
                ncleg_debug!("{identifier}: parsed {:?}", parsed.record.title);
                Resolution {
                    record: Some(parsed.record),
                    ..Resolution::new(identifier, FetchOutcome::Found)
                }
            }
            Err(err) => {
                ncleg_warn!("{identifier}: malformed record: {err}");
                Resolution::failed(identifier, FetchOutcome::Malformed, err.to_string())
            }
        }
    }
}

fn deliver<S: RecordSink>(sink: &Mutex<S>, record: &BillRecord) {
    let mut sink = match sink.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Err(err) = sink.accept(record) {
        ncleg_error!("Failed to write record {}{}: {err}", record.chamber, record.number);
    }
}

#[cfg(test)]
mod tests {
    use super::HarvestSettings;
    use ncleg_core::{BillIdentifier, Chamber};

    #[test]
    fn lookup_url_carries_bill_id_and_session() {
        let settings = HarvestSettings::default();
        let url = settings
            .lookup_url(&BillIdentifier::numbered(Chamber::House, "2017", 2))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.ncleg.net/gascripts/BillLookUp/BillLookUp.pl?BillID=H2&Session=2017"
        );
    }

    #[test]
    fn explicit_numbers_are_encoded_verbatim() {
        let settings = HarvestSettings::default();
        let url = settings
            .lookup_url(&BillIdentifier::new(Chamber::Senate, "2015", "4&x"))
            .unwrap();
        assert_eq!(url.query(), Some("BillID=S4%26x&Session=2015"));
    }
}
