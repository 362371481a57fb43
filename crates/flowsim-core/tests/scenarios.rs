//! End-to-end scenario tests driving the scheduler, not just the allocator.
//!
//! Covers S1–S6 from the worked scenarios and the universal properties
//! that are naturally exercised by running a full simulation (P1, P4,
//! P5, P6). P2/P3/P7 are covered by `allocator`'s own unit tests, which
//! operate at the granularity those properties are stated at.

use flowsim_core::scheduler::{Scheduler, SimConfig, DEFAULT_MAX_EVENTS};
use flowsim_core::topology::Topology;
use flowsim_core::trace::TraceReader;
use flowsim_core::output::OutputSink;
use std::io::Cursor;

fn config(min_bytes_for_priority: f64, priority_weight: u32, max_sim_time: f64) -> SimConfig {
    SimConfig {
        min_bytes_for_priority,
        priority_weight,
        max_sim_time,
        max_events: DEFAULT_MAX_EVENTS,
    }
}

/// Parses a completion line's `field name` into its value, panicking if
/// the field is absent — keeps scenario assertions readable.
fn field<'a>(line: &'a str, name: &str) -> &'a str {
    let marker = format!("{name} ");
    let start = line.find(&marker).unwrap_or_else(|| panic!("missing field {name} in {line}")) + marker.len();
    line[start..].split_whitespace().next().unwrap()
}

fn run_with_buf(topology: Topology, trace: &str, cfg: SimConfig) -> String {
    let reader = TraceReader::new(Cursor::new(trace)).unwrap();
    let output = OutputSink::new(Vec::new());
    let mut sched = Scheduler::new(topology, reader, output, cfg).unwrap();
    sched.run().unwrap();
    String::from_utf8(sched.output().get_ref().clone()).unwrap()
}

/// S1 — single bottleneck, equal weights: all three flows finish together.
#[test]
fn s1_single_bottleneck_equal_weights() {
    let topo = Topology::from_triples([(0, 1, 10.0)]);
    let trace = "1 1000000000 0 0 1\n2 1000000000 0 0 1\n3 1000000000 0 0 1\n";
    let text = run_with_buf(topo, trace, config(0.0, 1, 100.0));

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "expected 3 completion records, got:\n{text}");
    for line in &lines {
        assert!(field(line, "end_time").starts_with("2.4"));
        assert_eq!(field(line, "gid"), "0-1");
    }
}

/// S2 — two bottlenecks in cascade. The allocator gives f1 (which
/// crosses both links) 4 Gb/s and f2 (single-hop) 6 Gb/s. With equal
/// byte counts that means f2 — the *faster* flow — drains first, at
/// 10⁹·8/6·10⁹ ≈ 1.333s; f1's rate never changes afterward (it's still
/// alone on its own bottleneck), so it finishes at exactly 1e9·8/4e9 = 2.0s
/// regardless of f2's completion. (DESIGN.md records this: the distilled
/// spec's prose assumed the opposite completion order for this scenario.)
#[test]
fn s2_two_bottlenecks_cascade() {
    let topo = Topology::from_triples([(0, 1, 10.0), (1, 2, 4.0)]);
    let trace = "1 1000000000 0 0 1 2\n2 1000000000 0 0 1\n";
    let text = run_with_buf(topo, trace, config(0.0, 1, 100.0));

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let f1 = lines.iter().find(|l| l.starts_with("fid 1 ")).unwrap();
    let f2 = lines.iter().find(|l| l.starts_with("fid 2 ")).unwrap();
    assert!(field(f1, "end_time").starts_with("2.00000000000"));
    let t2: f64 = field(f2, "end_time").parse().unwrap();
    assert!((t2 - 8.0 / 6.0).abs() < 1e-6, "f2 end_time was {t2}");
    assert!(t2 < 2.0, "f2 should complete before f1");
}

// S3 (weighted share, same byte count but different per-flow weight) is
// exercised at the allocator level in `allocator::tests::weighted_share`,
// since the scheduler only ever derives weight from the priority
// threshold (S4) rather than accepting a weight directly.

/// S4 — priority threshold: the small flow (weight 10) finishes well
/// before the large one (weight 1).
#[test]
fn s4_priority_threshold() {
    let topo = Topology::from_triples([(0, 1, 10.0)]);
    let trace = "1 500000 0 0 1\n2 1000000000 0 0 1\n";
    let text = run_with_buf(topo, trace, config(1e6, 10, 100.0));

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let f1 = lines.iter().find(|l| l.starts_with("fid 1 ")).unwrap();
    let f2 = lines.iter().find(|l| l.starts_with("fid 2 ")).unwrap();
    let t1: f64 = field(f1, "end_time").parse().unwrap();
    let t2: f64 = field(f2, "end_time").parse().unwrap();
    assert!(t1 < t2, "priority flow should finish first: {t1} vs {t2}");
}

/// S5 — explicit termination before natural completion.
#[test]
fn s5_explicit_termination() {
    let topo = Topology::from_triples([(0, 1, 10.0)]);
    let trace = "1 1000000000000 0 0 1\n1 -1 1\n";
    let text = run_with_buf(topo, trace, config(0.0, 1, 100.0));

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(field(lines[0], "end_time"), "1.00000000000");
}

/// S6 — coincident arrivals share the link fairly rather than one flow
/// transiently getting the whole link.
#[test]
fn s6_coincident_arrivals_share_fairly() {
    let topo = Topology::from_triples([(0, 1, 10.0)]);
    let trace = "1 1000000000 0 0 1\n2 1000000000 0 0 1\n";
    let text = run_with_buf(topo, trace, config(0.0, 1, 100.0));

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert!(field(line, "end_time").starts_with("1.6"));
    }
}

/// P6 — completion records are emitted in non-decreasing end_time order.
#[test]
fn p6_completions_are_time_ordered() {
    let topo = Topology::from_triples([(0, 1, 10.0), (1, 2, 4.0)]);
    let trace = "1 1000000000 0 0 1 2\n2 1000000000 0 0 1\n3 2000000000 0.5 1 2\n";
    let text = run_with_buf(topo, trace, config(0.0, 1, 100.0));

    let mut last = f64::NEG_INFINITY;
    for line in text.lines() {
        let t: f64 = field(line, "end_time").parse().unwrap();
        assert!(t >= last, "end_time went backwards: {t} after {last}");
        last = t;
    }
}

/// P5 — determinism: identical inputs produce a bit-identical output
/// stream across two independent runs.
#[test]
fn p5_determinism() {
    let trace = "1 1000000000 0 0 1 2\n2 1000000000 0 0 1\n3 2000000000 0.5 1 2\n4 -1 1.0\n";
    let topo_a = Topology::from_triples([(0, 1, 10.0), (1, 2, 4.0)]);
    let topo_b = Topology::from_triples([(0, 1, 10.0), (1, 2, 4.0)]);

    let out_a = run_with_buf(topo_a, trace, config(0.0, 1, 100.0));
    let out_b = run_with_buf(topo_b, trace, config(0.0, 1, 100.0));
    assert_eq!(out_a, out_b);
}

/// P4 — conservation: every flow's completion record accounts for
/// exactly its original byte count, up to the 1460/1500 wire-to-payload
/// conversion the output format applies.
#[test]
fn p4_conservation_single_flow() {
    let topo = Topology::from_triples([(0, 1, 10.0)]);
    let trace = "1 1000000000 0 0 1\n";
    let text = run_with_buf(topo, trace, config(0.0, 1, 100.0));

    let line = text.lines().next().unwrap();
    let num_bytes: f64 = field(line, "num_bytes").parse().unwrap();
    let expected = 1_000_000_000.0 * 1460.0 / 1500.0;
    assert!((num_bytes - expected).abs() / expected < 1e-3);
}
