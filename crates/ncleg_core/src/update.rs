use crate::{ChamberEnumeration, Effect, EnumerationMode, FetchOutcome, FinishReason, Msg};

/// Pure update function: applies a message to one chamber's enumeration and
/// returns the lookups to issue next.
///
/// Once a chamber has finished, every further message is ignored.
pub fn update(mut state: ChamberEnumeration, msg: Msg) -> (ChamberEnumeration, Vec<Effect>) {
    if state.is_terminated() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Start => {
            if state.is_started() {
                return (state, Vec::new());
            }
            state.start();
            match state.mode() {
                EnumerationMode::Unbounded => vec![Effect::Fetch(state.current_identifier())],
                EnumerationMode::Explicit(_) => {
                    let identifiers = state.listed_identifiers();
                    if identifiers.is_empty() {
                        state.terminate();
                        return finished(state, FinishReason::ListExhausted);
                    }
                    state.set_pending(&identifiers);
                    identifiers.into_iter().map(Effect::Fetch).collect()
                }
            }
        }
        Msg::Resolved {
            identifier,
            outcome,
        } => {
            if !state.is_started() || identifier.chamber() != state.chamber() {
                return (state, Vec::new());
            }
            if !state.is_unbounded() {
                // Outcomes never cut an explicit list short.
                return match state.resolve_one(&identifier) {
                    Some(0) => {
                        state.terminate();
                        finished(state, FinishReason::ListExhausted)
                    }
                    _ => (state, Vec::new()),
                };
            }
            if !state.awaits(&identifier) {
                return (state, Vec::new());
            }
            match outcome {
                FetchOutcome::NotFound => {
                    state.terminate();
                    return finished(state, FinishReason::NotFound);
                }
                FetchOutcome::TransportFailed => {
                    if state.record_failure() {
                        state.terminate();
                        return finished(state, FinishReason::TransportGaveUp);
                    }
                }
                FetchOutcome::Found | FetchOutcome::Malformed => state.reset_failures(),
            }
            if !state.advance() {
                state.terminate();
                return finished(state, FinishReason::NumbersExhausted);
            }
            vec![Effect::Fetch(state.current_identifier())]
        }
    };

    (state, effects)
}

fn finished(state: ChamberEnumeration, reason: FinishReason) -> (ChamberEnumeration, Vec<Effect>) {
    let chamber = state.chamber();
    (state, vec![Effect::Finished { chamber, reason }])
}
