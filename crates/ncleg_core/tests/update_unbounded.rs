use std::sync::Once;

use ncleg_core::{
    update, BillIdentifier, Chamber, ChamberEnumeration, Effect, FetchOutcome, FinishReason, Msg,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ncleg_logging::initialize_for_tests);
}

fn resolved(chamber: Chamber, number: u32, outcome: FetchOutcome) -> Msg {
    Msg::Resolved {
        identifier: BillIdentifier::numbered(chamber, "2017", number),
        outcome,
    }
}

fn fetched(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Fetch(id) => Some(id.lookup_key()),
            Effect::Finished { .. } => None,
        })
        .collect()
}

#[test]
fn start_requests_bill_one() {
    init_logging();
    let state = ChamberEnumeration::unbounded(Chamber::House, "2017");
    let (state, effects) = update(state, Msg::Start);

    assert_eq!(
        effects,
        vec![Effect::Fetch(BillIdentifier::numbered(Chamber::House, "2017", 1))]
    );
    assert_eq!(state.next_number(), 1);
    assert!(!state.is_terminated());
}

#[test]
fn issues_increasing_numbers_until_not_found() {
    init_logging();
    let (mut state, effects) = update(ChamberEnumeration::unbounded(Chamber::Senate, "2017"), Msg::Start);
    let mut issued = fetched(&effects);

    for number in 1..=3 {
        let outcome = if number == 2 {
            FetchOutcome::Malformed
        } else {
            FetchOutcome::Found
        };
        let (next, effects) = update(state, resolved(Chamber::Senate, number, outcome));
        issued.extend(fetched(&effects));
        state = next;
    }

    let (state, effects) = update(state, resolved(Chamber::Senate, 4, FetchOutcome::NotFound));
    assert_eq!(issued, vec!["S1", "S2", "S3", "S4"]);
    assert_eq!(
        effects,
        vec![Effect::Finished {
            chamber: Chamber::Senate,
            reason: FinishReason::NotFound,
        }]
    );
    assert!(state.is_terminated());

    let (_, effects) = update(state, resolved(Chamber::Senate, 5, FetchOutcome::Found));
    assert!(effects.is_empty());
}

#[test]
fn stale_and_foreign_results_are_ignored() {
    init_logging();
    let (state, _) = update(ChamberEnumeration::unbounded(Chamber::House, "2017"), Msg::Start);

    let (state, effects) = update(state, resolved(Chamber::House, 7, FetchOutcome::NotFound));
    assert!(effects.is_empty());
    assert!(!state.is_terminated());

    let (state, effects) = update(state, resolved(Chamber::Senate, 1, FetchOutcome::NotFound));
    assert!(effects.is_empty());
    assert!(!state.is_terminated());
    assert_eq!(state.next_number(), 1);
}

#[test]
fn start_is_idempotent() {
    let (state, _) = update(ChamberEnumeration::unbounded(Chamber::House, "2017"), Msg::Start);
    let (_, effects) = update(state, Msg::Start);
    assert!(effects.is_empty());
}

#[test]
fn transport_failures_skip_ahead_until_budget_is_spent() {
    init_logging();
    let state = ChamberEnumeration::unbounded(Chamber::House, "2017").with_failure_budget(2);
    let (state, _) = update(state, Msg::Start);

    let (state, effects) = update(state, resolved(Chamber::House, 1, FetchOutcome::TransportFailed));
    assert_eq!(fetched(&effects), vec!["H2"]);

    // A success in between resets the budget.
    let (state, effects) = update(state, resolved(Chamber::House, 2, FetchOutcome::Found));
    assert_eq!(fetched(&effects), vec!["H3"]);

    let (state, effects) = update(state, resolved(Chamber::House, 3, FetchOutcome::TransportFailed));
    assert_eq!(fetched(&effects), vec!["H4"]);

    let (state, effects) = update(state, resolved(Chamber::House, 4, FetchOutcome::TransportFailed));
    assert_eq!(
        effects,
        vec![Effect::Finished {
            chamber: Chamber::House,
            reason: FinishReason::TransportGaveUp,
        }]
    );
    assert!(state.is_terminated());
}

#[test]
fn finishes_after_the_largest_bill_number() {
    init_logging();
    let state = ChamberEnumeration::unbounded_from(Chamber::House, "2017", u32::MAX - 1);
    let (state, effects) = update(state, Msg::Start);
    assert_eq!(fetched(&effects), vec![format!("H{}", u32::MAX - 1)]);

    let (state, effects) = update(
        state,
        resolved(Chamber::House, u32::MAX - 1, FetchOutcome::Found),
    );
    assert_eq!(fetched(&effects), vec![format!("H{}", u32::MAX)]);

    let (state, effects) = update(state, resolved(Chamber::House, u32::MAX, FetchOutcome::Found));
    assert_eq!(
        effects,
        vec![Effect::Finished {
            chamber: Chamber::House,
            reason: FinishReason::NumbersExhausted,
        }]
    );
    assert!(state.is_terminated());

    let (_, effects) = update(state, resolved(Chamber::House, u32::MAX, FetchOutcome::Found));
    assert!(effects.is_empty());
}
