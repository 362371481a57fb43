//! C7 — the human-readable rate-change / completion event stream.
//!
//! Grounded in `ideal_ct.cc::log_rates` and
//! `remove_flows_that_have_finished`, re-expressed over `tracing`
//! instead of raw `std::cout`/`std::cerr`, in the style of
//! `strata-agent::main`'s structured `tracing::info!` calls. The textual
//! shape of each message (`RATE_CHANGE fid t rate`, `DONE n fid1 fid2 …`)
//! is unchanged, so tests that capture the log can still match on it.

use crate::types::Fid;

/// Emits one `RATE_CHANGE` line for a single flow's current rate.
pub fn rate_change(fid: Fid, t: f64, rate: f64) {
    tracing::info!(target: "flowsim::eventlog", fid, t, rate, "RATE_CHANGE {fid} {t} {rate}");
}

/// Emits one `DONE` line listing the flows a sweep removed, followed by
/// a terminal `RATE_CHANGE ... 0` for each of them (§4.7).
pub fn done(t: f64, fids: &[Fid]) {
    let ids = fids
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(target: "flowsim::eventlog", t, n = fids.len(), fids = %ids, "DONE {} {}", fids.len(), ids);
    for &fid in fids {
        rate_change(fid, t, 0.0);
    }
}

/// Logged once the event loop stops, summarizing the run. Not part of
/// the distilled spec's C7 contract, but ambient observability the full
/// build carries regardless (see SPEC_FULL.md §4.7).
pub fn simulation_summary(completed: usize, remaining: usize, events: u64) {
    tracing::info!(completed, remaining, events, "simulation finished");
}
