//! C4 — the flow table: state for active flows.

use crate::types::{Fid, Link, Weight};
use std::collections::{BTreeMap, HashMap};

/// Byte counts below this threshold are treated as "drained" (§3).
pub const COMPLETION_EPSILON: f64 = 1e-3;

/// An active flow: path, backlog, weight, and birth time.
#[derive(Debug, Clone)]
pub struct Flow {
    pub fid: Fid,
    pub path: Vec<Link>,
    pub original_bytes: f64,
    pub remaining_bytes: f64,
    pub weight: Weight,
    pub start_time: f64,
}

impl Flow {
    pub fn new(fid: Fid, path: Vec<Link>, original_bytes: f64, weight: Weight, start_time: f64) -> Self {
        Self {
            fid,
            path,
            original_bytes,
            remaining_bytes: original_bytes,
            weight,
            start_time,
        }
    }

    /// `true` once this flow's backlog has drained below the completion
    /// threshold (natural completion) or been forced to zero (explicit
    /// termination).
    pub fn is_complete(&self) -> bool {
        self.remaining_bytes < COMPLETION_EPSILON
    }

    pub fn src(&self) -> crate::types::NodeId {
        self.path.first().expect("flow path is non-empty").0
    }

    pub fn dst(&self) -> crate::types::NodeId {
        self.path.last().expect("flow path is non-empty").1
    }
}

/// Associative store of active flows, keyed by `fid`.
///
/// Keyed on `BTreeMap` rather than `HashMap` so iteration — and thus the
/// order completion records and rate-change log lines are emitted in
/// when several flows complete or change rate at the same instant — is
/// by ascending `fid`, deterministic across runs (P5), matching the
/// original's `std::map`-keyed flow table.
#[derive(Debug, Default)]
pub struct FlowTable {
    flows: BTreeMap<Fid, Flow>,
}

impl FlowTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flow: Flow) {
        self.flows.insert(flow.fid, flow);
    }

    pub fn get(&self, fid: Fid) -> Option<&Flow> {
        self.flows.get(&fid)
    }

    pub fn get_mut(&mut self, fid: Fid) -> Option<&mut Flow> {
        self.flows.get_mut(&fid)
    }

    pub fn remove(&mut self, fid: Fid) -> Option<Flow> {
        self.flows.remove(&fid)
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Fid, &Flow)> {
        self.flows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Flow> {
        self.flows.values_mut()
    }

    /// Snapshot of `fid -> path`, as the allocator needs it.
    pub fn paths(&self) -> HashMap<Fid, Vec<Link>> {
        self.flows.iter().map(|(&fid, f)| (fid, f.path.clone())).collect()
    }

    /// Snapshot of `fid -> weight`, as the allocator needs it.
    pub fn weights(&self) -> HashMap<Fid, Weight> {
        self.flows.iter().map(|(&fid, f)| (fid, f.weight)).collect()
    }

    /// All flows currently at or below the completion threshold.
    pub fn completed_fids(&self) -> Vec<Fid> {
        self.flows
            .values()
            .filter(|f| f.is_complete())
            .map(|f| f.fid)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_threshold() {
        let mut f = Flow::new(1, vec![(0, 1)], 100.0, 1, 0.0);
        assert!(!f.is_complete());
        f.remaining_bytes = 0.0005;
        assert!(f.is_complete());
    }

    #[test]
    fn src_dst_from_path_endpoints() {
        let f = Flow::new(1, vec![(0, 1), (1, 2), (2, 3)], 100.0, 1, 0.0);
        assert_eq!(f.src(), 0);
        assert_eq!(f.dst(), 3);
    }
}
