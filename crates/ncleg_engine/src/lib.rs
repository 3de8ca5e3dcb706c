//! Harvester engine: fetching, decoding and parsing bill pages, and the
//! per-chamber harvest loop.
mod decode;
pub mod dom;
mod fetch;
mod harvest;
mod output;
mod parse;
mod persist;
mod sponsors;
mod types;

pub use decode::{decode_page, DecodedPage};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use harvest::{
    ChamberSummary, HarvestSettings, Harvester, RecordFailure, RunSummary, DEFAULT_LOOKUP_URL,
};
pub use output::{
    JsonFileSink, JsonLinesSink, MemorySink, OutputError, RecordSink, DEFAULT_MANIFEST_FILENAME,
    DEFAULT_RECORDS_FILENAME,
};
pub use parse::{
    BillPageParser, HistoryRow, HistoryRows, PageOutcome, ParseError, ParseWarning, ParsedBill,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use sponsors::{
    extractor_for_session, LinkedSponsors, PlainTextSponsors, SponsorExtraction, SponsorExtractor,
    Sponsors,
};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
