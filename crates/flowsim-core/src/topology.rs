//! C1 — the immutable link-capacity map.

use crate::types::{Link, NodeId};
use std::collections::HashMap;
use std::io::BufRead;

/// Immutable mapping from directed link to capacity (Gb/s).
///
/// Built once at simulation startup and shared by reference with the
/// allocator for the lifetime of the run.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    capacities: HashMap<Link, f64>,
}

impl Topology {
    /// Builds a topology from `(u, v, capacity)` triples.
    pub fn from_triples(triples: impl IntoIterator<Item = (NodeId, NodeId, f64)>) -> Self {
        let capacities = triples.into_iter().map(|(u, v, cap)| ((u, v), cap)).collect();
        Self { capacities }
    }

    /// Parses the topology file format: one `u v capacity` line per link,
    /// whitespace-separated. Lines that fail to parse are logged and
    /// skipped rather than treated as fatal — a bad topology line just
    /// means one fewer link, not an unusable simulation.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut capacities = HashMap::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_link_line(trimmed) {
                Some((u, v, cap)) if cap > 0.0 => {
                    capacities.insert((u, v), cap);
                }
                Some((u, v, cap)) => {
                    tracing::warn!(line_no, u, v, cap, "skipping link with non-positive capacity");
                }
                None => {
                    tracing::warn!(line_no, line = trimmed, "skipping unparseable topology line");
                }
            }
        }
        tracing::info!(links = capacities.len(), "loaded topology");
        Ok(Self { capacities })
    }

    /// Capacity of `link`, if it exists in the topology.
    pub fn capacity(&self, link: &Link) -> Option<f64> {
        self.capacities.get(link).copied()
    }

    /// Whether `link` is a valid edge in this topology.
    pub fn contains(&self, link: &Link) -> bool {
        self.capacities.contains_key(link)
    }

    pub fn len(&self) -> usize {
        self.capacities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capacities.is_empty()
    }
}

fn parse_link_line(line: &str) -> Option<(NodeId, NodeId, f64)> {
    let mut parts = line.split_whitespace();
    let u: NodeId = parts.next()?.parse().ok()?;
    let v: NodeId = parts.next()?.parse().ok()?;
    let cap: f64 = parts.next()?.parse().ok()?;
    Some((u, v, cap))
}
