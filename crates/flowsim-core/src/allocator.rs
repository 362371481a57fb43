//! C3 — the weighted max-min waterfilling allocator.
//!
//! Ported from `weighted_waterfilling.cc`'s pseudo-flow model: a flow of
//! weight `w` is treated as `w` identical weight-1 pseudo-flows sharing
//! its path. Each round finds the unsaturated link with the smallest
//! remaining-capacity-per-unsaturated-pseudo-flow ("fair share"),
//! freezes every flow on it, and repeats until every flow is frozen.
//!
//! The rate this module returns per flow is the **pseudo-flow rate**:
//! the caller (the scheduler) is responsible for multiplying by
//! `weight(f)` wherever link capacity or drained bytes are concerned
//! (§4.3's pseudo-flow model). This differs from the original C++,
//! which folds the weight multiplication into its own return value —
//! see DESIGN.md for why this implementation keeps the multiplication
//! at the call sites instead.

use crate::error::AllocatorError;
use crate::topology::Topology;
use crate::types::{Fid, Link, Weight};
use std::collections::{HashMap, HashSet};

/// Per-flow pseudo-flow rate, in Gb/s.
pub type RateMap = HashMap<Fid, f64>;

/// Computes weighted max-min fair rates for a set of active flows.
#[derive(Debug)]
pub struct Allocator<'a> {
    topology: &'a Topology,
}

impl<'a> Allocator<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        Self { topology }
    }

    /// Runs the waterfilling algorithm to completion and returns the
    /// pseudo-flow rate of every flow named in `flow_to_path`.
    ///
    /// `flow_to_path` and `flow_to_weight` must have the same key set;
    /// every link in every path must exist in the topology this
    /// allocator was built from.
    pub fn allocate(
        &self,
        flow_to_path: &HashMap<Fid, Vec<Link>>,
        flow_to_weight: &HashMap<Fid, Weight>,
    ) -> Result<RateMap, AllocatorError> {
        let mut state = WaterfillingState::new(self.topology, flow_to_path, flow_to_weight)?;
        while !state.unsat_flows.is_empty() {
            self.do_one_round(&mut state)?;
        }
        Ok(state.rate_per_flow)
    }

    fn do_one_round(&self, state: &mut WaterfillingState) -> Result<(), AllocatorError> {
        let mut fair_share_values = Vec::new();
        let mut fair_share_links = Vec::new();

        for &link in &state.unsat_links {
            let total_flow = *state
                .total_flow_per_link
                .get(&link)
                .ok_or(AllocatorError::MissingBookkeeping { link })?;
            let num_unsat = *state
                .num_unsat_per_link
                .get(&link)
                .ok_or(AllocatorError::MissingBookkeeping { link })?;
            if num_unsat > 0 {
                let capacity = self
                    .topology
                    .capacity(&link)
                    .ok_or(AllocatorError::MissingBookkeeping { link })?;
                let rem_cap = capacity - total_flow;
                let fair_share = rem_cap / num_unsat as f64;
                fair_share_values.push(fair_share);
                fair_share_links.push(link);
            }
        }

        if fair_share_values.is_empty() {
            return Err(AllocatorError::NoFairShare { round: state.round });
        }

        let (arg_min, &min_fair_share) = fair_share_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).expect("fair share is never NaN"))
            .expect("fair_share_values is non-empty");
        let saturated_link = fair_share_links[arg_min];

        let increment = min_fair_share.max(0.0);
        state.rate_increments.push(increment);
        let pseudo_rate = crate::kahan::kahan_sum(&state.rate_increments);
        for &f in &state.unsat_flows {
            *state.rate_per_flow.get_mut(&f).expect("every unsat flow has a rate entry") = pseudo_rate;
        }

        let expected_unsat = *state
            .num_unsat_per_link
            .get(&saturated_link)
            .ok_or(AllocatorError::MissingBookkeeping { link: saturated_link })?;
        let active_on_link = state
            .active_flows_per_link
            .get(&saturated_link)
            .ok_or(AllocatorError::MissingBookkeeping { link: saturated_link })?
            .clone();

        let mut removed_weight = 0u32;
        for f in active_on_link {
            if state.unsat_flows.remove(&f) {
                removed_weight += state.flow_to_weight[&f];
                state.flow_saturated_in_round.insert(f, state.round);
            }
        }
        if removed_weight != expected_unsat {
            return Err(AllocatorError::SaturationMismatch {
                link: saturated_link,
                expected: expected_unsat,
                removed: removed_weight,
            });
        }

        state.unsat_links.remove(&saturated_link);
        state.link_saturated_in_round.insert(saturated_link, state.round);

        for &link in &state.unsat_links {
            let active = state
                .active_flows_per_link
                .get(&link)
                .ok_or(AllocatorError::MissingBookkeeping { link })?;
            let flow_rates: Vec<f64> = active
                .iter()
                .map(|f| state.flow_to_weight[f] as f64 * state.rate_per_flow[f])
                .collect();
            *state.total_flow_per_link.get_mut(&link).expect("link was just validated") =
                crate::kahan::kahan_sum(&flow_rates);
        }

        state.num_unsat_per_link.clear();
        for &link in &state.unsat_links {
            let active = state
                .active_flows_per_link
                .get(&link)
                .ok_or(AllocatorError::MissingBookkeeping { link })?;
            let num_unsat: u32 = active
                .iter()
                .filter(|f| state.unsat_flows.contains(f))
                .map(|f| state.flow_to_weight[f])
                .sum();
            state.num_unsat_per_link.insert(link, num_unsat);
        }

        state.round += 1;
        Ok(())
    }
}

/// Mutable state carried across waterfilling rounds for one `allocate` call.
struct WaterfillingState {
    round: u32,
    unsat_links: HashSet<Link>,
    unsat_flows: HashSet<Fid>,
    num_unsat_per_link: HashMap<Link, u32>,
    total_flow_per_link: HashMap<Link, f64>,
    active_flows_per_link: HashMap<Link, Vec<Fid>>,
    rate_per_flow: HashMap<Fid, f64>,
    flow_to_weight: HashMap<Fid, Weight>,
    rate_increments: Vec<f64>,
    flow_saturated_in_round: HashMap<Fid, u32>,
    link_saturated_in_round: HashMap<Link, u32>,
}

impl WaterfillingState {
    fn new(
        topology: &Topology,
        flow_to_path: &HashMap<Fid, Vec<Link>>,
        flow_to_weight: &HashMap<Fid, Weight>,
    ) -> Result<Self, AllocatorError> {
        let mut unsat_links = HashSet::new();
        let mut unsat_flows = HashSet::new();
        let mut num_unsat_per_link: HashMap<Link, u32> = HashMap::new();
        let mut total_flow_per_link: HashMap<Link, f64> = HashMap::new();
        let mut active_flows_per_link: HashMap<Link, Vec<Fid>> = HashMap::new();
        let mut rate_per_flow = HashMap::new();

        for (&fid, path) in flow_to_path {
            unsat_flows.insert(fid);
            let weight = flow_to_weight[&fid];
            rate_per_flow.insert(fid, 0.0);
            for &link in path {
                if !topology.contains(&link) {
                    return Err(AllocatorError::UnknownLink { fid, link });
                }
                if unsat_links.insert(link) {
                    num_unsat_per_link.insert(link, 0);
                    total_flow_per_link.insert(link, 0.0);
                }
                *num_unsat_per_link.get_mut(&link).unwrap() += weight;
                active_flows_per_link.entry(link).or_default().push(fid);
            }
        }

        Ok(Self {
            round: 0,
            unsat_links,
            unsat_flows,
            num_unsat_per_link,
            total_flow_per_link,
            active_flows_per_link,
            rate_per_flow,
            flow_to_weight: flow_to_weight.clone(),
            rate_increments: Vec::new(),
            flow_saturated_in_round: HashMap::new(),
            link_saturated_in_round: HashMap::new(),
        })
    }
}
