use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use ncleg_core::{parse_bill_numbers, Chamber, FinishReason, HarvestPlan};
use ncleg_engine::{
    FetchSettings, HarvestSettings, Harvester, MemorySink, ReqwestFetcher, RunSummary,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOOKUP_PATH: &str = "/gascripts/BillLookUp/BillLookUp.pl";
const MODERN: &str = include_str!("fixtures/modern_bill.html");
const NOT_FOUND: &str = include_str!("fixtures/not_found.html");
const MISSING_KEYWORDS: &str = include_str!("fixtures/missing_keywords.html");

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ncleg_logging::initialize_for_tests);
}

fn bill_page(chamber: &str, number: u32) -> String {
    MODERN.replace("House Bill 2", &format!("{chamber} Bill {number}"))
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

async fn serve_bill(server: &MockServer, bill_id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(LOOKUP_PATH))
        .and(query_param("BillID", bill_id))
        .respond_with(html(body))
        .with_priority(1)
        .mount(server)
        .await;
}

async fn serve_not_found_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(LOOKUP_PATH))
        .respond_with(html(NOT_FOUND))
        .with_priority(10)
        .mount(server)
        .await;
}

fn harvester(server: &MockServer, fetch: FetchSettings, settings: HarvestSettings) -> Harvester {
    let settings = HarvestSettings {
        lookup_url: format!("{}{}", server.uri(), LOOKUP_PATH),
        ..settings
    };
    Harvester::new(Arc::new(ReqwestFetcher::new(fetch)), settings)
}

async fn requested_ids(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "BillID")
                .map(|(_, value)| value.into_owned())
        })
        .collect()
}

fn chamber_summary(summary: &RunSummary, chamber: Chamber) -> &ncleg_engine::ChamberSummary {
    summary
        .chambers
        .iter()
        .find(|c| c.chamber == chamber)
        .expect("chamber summarized")
}

#[tokio::test]
async fn unbounded_enumeration_stops_at_first_not_found() {
    init_logging();
    let server = MockServer::start().await;
    serve_bill(&server, "H1", bill_page("House", 1)).await;
    serve_bill(&server, "H2", bill_page("House", 2)).await;
    // Never reached: H3 is the sentinel.
    serve_bill(&server, "H4", bill_page("House", 4)).await;
    serve_not_found_fallback(&server).await;

    let harvester = harvester(&server, FetchSettings::default(), HarvestSettings::default());
    let plan = HarvestPlan::new("H", "2017", None);
    let sink = Mutex::new(MemorySink::default());

    let summary = harvester.run(&plan, &sink).await;

    assert_eq!(requested_ids(&server).await, vec!["H1", "H2", "H3"]);
    let numbers: Vec<u32> = sink.lock().unwrap().records.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1, 2]);

    let house = chamber_summary(&summary, Chamber::House);
    assert_eq!(house.requested, 3);
    assert_eq!(house.found, 2);
    assert_eq!(house.not_found, 1);
    assert_eq!(house.finish_reason, Some(FinishReason::NotFound));
    assert_eq!(summary.records(), 2);
}

#[tokio::test]
async fn chambers_terminate_independently() {
    init_logging();
    let server = MockServer::start().await;
    serve_bill(&server, "H1", bill_page("House", 1)).await;
    serve_bill(&server, "S1", bill_page("Senate", 1)).await;
    serve_bill(&server, "S2", bill_page("Senate", 2)).await;
    serve_bill(&server, "S3", bill_page("Senate", 3)).await;
    serve_not_found_fallback(&server).await;

    let harvester = harvester(&server, FetchSettings::default(), HarvestSettings::default());
    let plan = HarvestPlan::new("", "2017", None);
    let sink = Mutex::new(MemorySink::default());

    let summary = harvester.run(&plan, &sink).await;

    assert_eq!(chamber_summary(&summary, Chamber::House).found, 1);
    assert_eq!(chamber_summary(&summary, Chamber::Senate).found, 3);
    assert_eq!(chamber_summary(&summary, Chamber::Senate).requested, 4);

    let mut ids = requested_ids(&server).await;
    ids.sort();
    assert_eq!(ids, vec!["H1", "H2", "S1", "S2", "S3", "S4"]);
}

#[tokio::test]
async fn explicit_list_is_exhausted_regardless_of_outcomes() {
    init_logging();
    let server = MockServer::start().await;
    serve_bill(&server, "S3", MISSING_KEYWORDS.to_string()).await;
    serve_bill(&server, "S1", bill_page("Senate", 1)).await;
    serve_bill(&server, "S7", bill_page("Senate", 7)).await;
    serve_not_found_fallback(&server).await;

    let harvester = harvester(&server, FetchSettings::default(), HarvestSettings::default());
    let plan = HarvestPlan::new("S", "2017", parse_bill_numbers("3, abc,7 ,1"));
    let sink = Mutex::new(MemorySink::default());

    let summary = harvester.run(&plan, &sink).await;

    let mut ids = requested_ids(&server).await;
    ids.sort();
    assert_eq!(ids, vec!["S1", "S3", "S7", "Sabc"]);

    // Records come out in list order even though lookups overlap.
    let numbers: Vec<u32> = sink.lock().unwrap().records.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![7, 1]);

    let senate = chamber_summary(&summary, Chamber::Senate);
    assert_eq!(senate.requested, 4);
    assert_eq!(senate.found, 2);
    assert_eq!(senate.malformed, 1);
    assert_eq!(senate.not_found, 1);
    assert_eq!(senate.finish_reason, Some(FinishReason::ListExhausted));
    assert_eq!(senate.failures.len(), 1);
    assert_eq!(senate.failures[0].bill, "S3");
    assert_eq!(senate.failures[0].reason, "missing keywords");
}

#[tokio::test]
async fn malformed_page_does_not_stop_unbounded_enumeration() {
    init_logging();
    let server = MockServer::start().await;
    serve_bill(&server, "H1", MISSING_KEYWORDS.to_string()).await;
    serve_bill(&server, "H2", bill_page("House", 2)).await;
    serve_not_found_fallback(&server).await;

    let harvester = harvester(&server, FetchSettings::default(), HarvestSettings::default());
    let plan = HarvestPlan::new("H", "2017", None);
    let sink = Mutex::new(MemorySink::default());

    let summary = harvester.run(&plan, &sink).await;

    assert_eq!(requested_ids(&server).await, vec!["H1", "H2", "H3"]);
    let house = chamber_summary(&summary, Chamber::House);
    assert_eq!((house.found, house.malformed, house.not_found), (1, 1, 1));
    assert_eq!(summary.failures(), 1);
}

#[tokio::test]
async fn unreachable_server_gives_up_after_failure_budget() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOOKUP_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let fetch = FetchSettings {
        max_retries: 1,
        base_backoff: Duration::from_millis(1),
        ..FetchSettings::default()
    };
    let settings = HarvestSettings {
        max_consecutive_failures: 2,
        ..HarvestSettings::default()
    };
    let harvester = harvester(&server, fetch, settings);
    let plan = HarvestPlan::new("H", "2017", None);
    let sink = Mutex::new(MemorySink::default());

    let summary = harvester.run(&plan, &sink).await;

    // Two bills, two attempts each.
    assert_eq!(requested_ids(&server).await, vec!["H1", "H1", "H2", "H2"]);
    let house = chamber_summary(&summary, Chamber::House);
    assert_eq!(house.transport_failures, 2);
    assert_eq!(house.finish_reason, Some(FinishReason::TransportGaveUp));
    assert_eq!(house.failures[0].outcome, "transport");
    assert!(sink.lock().unwrap().records.is_empty());
}

#[tokio::test]
async fn invalid_bytes_in_a_found_page_keep_the_record() {
    init_logging();
    let server = MockServer::start().await;
    let body = MODERN
        .replace("House Bill 2", "House Bill 1")
        .replace("Repeal HB2.", "Repeal @HB2.")
        .into_bytes()
        .into_iter()
        .map(|byte| if byte == b'@' { 0xFF } else { byte })
        .collect::<Vec<u8>>();
    Mock::given(method("GET"))
        .and(path(LOOKUP_PATH))
        .and(query_param("BillID", "H1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .with_priority(1)
        .mount(&server)
        .await;
    serve_not_found_fallback(&server).await;

    let harvester = harvester(&server, FetchSettings::default(), HarvestSettings::default());
    let plan = HarvestPlan::new("H", "2017", None);
    let sink = Mutex::new(MemorySink::default());

    let summary = harvester.run(&plan, &sink).await;

    let house = chamber_summary(&summary, Chamber::House);
    assert_eq!((house.found, house.malformed, house.not_found), (1, 0, 1));
    let records = &sink.lock().unwrap().records;
    assert_eq!(records[0].title, "Repeal \u{FFFD}HB2.");
    assert_eq!(records[0].sponsors_ids, vec!["610", "651", "702", "720"]);
}
