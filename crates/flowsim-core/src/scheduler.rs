//! C5 — the event-driven simulation loop.
//!
//! Ported from `ideal_ct.cc::run`: selects the earliest of {arrival,
//! termination, natural completion}, drains active flows up to that
//! instant, applies the event, and — unless another trace event is
//! pending at the same instant (§4.5's deferral rule) — sweeps
//! completed flows and re-invokes the allocator.

use crate::allocator::{Allocator, RateMap};
use crate::error::SimError;
use crate::eventlog;
use crate::flow::{Flow, FlowTable};
use crate::output::{CompletionRecord, OutputSink};
use crate::topology::Topology;
use crate::trace::TraceReader;
use crate::types::{Fid, Weight};
use std::io::{BufRead, Write};

/// Safety bound on event iterations (§4.5); a large finite value to
/// guard against pathological traces. Exceeding it is a non-fatal early
/// stop, not an error.
pub const DEFAULT_MAX_EVENTS: u64 = 500_000;

/// Fixed simulation parameters, supplied on the command line (§6).
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub min_bytes_for_priority: f64,
    pub priority_weight: Weight,
    pub max_sim_time: f64,
    pub max_events: u64,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.max_sim_time <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "max_sim_time must be strictly positive, got {}",
                self.max_sim_time
            )));
        }
        if self.priority_weight == 0 {
            return Err(SimError::InvalidConfig(
                "priority_weight must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

enum EventKind {
    Arrival,
    Termination,
    NaturalCompletion,
}

/// The event loop itself, owning the flow table, the current rate
/// snapshot, and the output/trace resources for one simulation run.
pub struct Scheduler<R, W: Write> {
    topology: Topology,
    trace: TraceReader<R>,
    flows: FlowTable,
    output: OutputSink<W>,
    rates: RateMap,
    time: Option<f64>,
    next_finish: Option<(f64, Fid)>,
    config: SimConfig,
}

impl<R: BufRead, W: Write> Scheduler<R, W> {
    pub fn new(
        topology: Topology,
        trace: TraceReader<R>,
        output: OutputSink<W>,
        config: SimConfig,
    ) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            topology,
            trace,
            flows: FlowTable::new(),
            output,
            rates: RateMap::new(),
            time: None,
            next_finish: None,
            config,
        })
    }

    /// Runs the simulation to completion. Returns `Ok(())` on any of the
    /// three stop conditions (§4.5/§5); genuine failures are returned as
    /// `Err`.
    pub fn run(&mut self) -> Result<(), SimError> {
        let mut events_processed: u64 = 0;

        loop {
            if events_processed >= self.config.max_events {
                tracing::warn!(events_processed, "hit iteration safety bound, stopping early");
                break;
            }

            let trace_time = self.trace.next_record().map(|r| r.time);
            let finish_time = self.next_finish.map(|(t, _)| t);

            let (event_time, kind) = match (trace_time, finish_time) {
                (None, None) => break,
                (Some(tt), None) => (tt, self.kind_of_next_trace_record()),
                (None, Some(ft)) => (ft, EventKind::NaturalCompletion),
                (Some(tt), Some(ft)) => {
                    if tt <= ft {
                        (tt, self.kind_of_next_trace_record())
                    } else {
                        (ft, EventKind::NaturalCompletion)
                    }
                }
            };

            events_processed += 1;
            self.drain_until(event_time)?;
            self.time = Some(event_time);

            match kind {
                EventKind::Arrival => self.apply_arrival(event_time)?,
                EventKind::Termination => self.apply_termination(event_time)?,
                EventKind::NaturalCompletion => self.sweep_and_reallocate(event_time)?,
            }

            if event_time >= self.config.max_sim_time {
                tracing::info!(event_time, max_sim_time = self.config.max_sim_time, "reached max_sim_time");
                break;
            }

            if self.trace.next_record().is_none() && self.flows.is_empty() {
                break;
            }
        }

        eventlog::simulation_summary(0, self.flows.len(), events_processed);
        self.output.flush()?;
        Ok(())
    }

    /// Borrows the output sink, for callers that need to inspect or
    /// flush what has been written without taking the scheduler apart.
    pub fn output(&self) -> &OutputSink<W> {
        &self.output
    }

    fn kind_of_next_trace_record(&self) -> EventKind {
        match self.trace.next_record() {
            Some(r) if r.is_arrival() => EventKind::Arrival,
            _ => EventKind::Termination,
        }
    }

    /// Drains every active flow up to `event_time` at the current rates
    /// (§4.5 step 1 / §3 I3). Small negative drift is clamped per §7;
    /// larger drift is fatal.
    fn drain_until(&mut self, event_time: f64) -> Result<(), SimError> {
        let Some(now) = self.time else {
            return Ok(());
        };
        let dur = event_time - now;
        if dur <= 0.0 {
            if dur < -1e-6 {
                return Err(SimError::InvalidConfig(format!(
                    "event time {event_time} precedes current time {now}"
                )));
            }
            return Ok(());
        }
        drain_flows(&mut self.flows, &self.rates, dur)
    }

    fn applied_record_weight(&self, num_bytes: f64) -> Weight {
        if num_bytes < self.config.min_bytes_for_priority {
            self.config.priority_weight
        } else {
            1
        }
    }

    fn apply_arrival(&mut self, t: f64) -> Result<(), SimError> {
        // The deferral decision hinges on the record *after* the one
        // about to be applied, so it must be read before `advance`
        // shifts the lookahead window.
        let defer = self.peek_is_coincident_with(t);
        let record = self.trace.advance()?.expect("caller confirmed a trace record is pending");
        let path = record.path.clone().expect("arrival record carries a path");
        let weight = self.applied_record_weight(record.num_bytes);
        let flow = Flow::new(record.fid, path, record.num_bytes, weight, t);
        self.flows.insert(flow);

        if !defer {
            self.sweep_and_reallocate(t)?;
        }
        Ok(())
    }

    fn apply_termination(&mut self, t: f64) -> Result<(), SimError> {
        let defer = self.peek_is_coincident_with(t);
        let record = self.trace.advance()?.expect("caller confirmed a trace record is pending");

        if let Some(flow) = self.flows.get_mut(record.fid) {
            flow.remaining_bytes = 0.0;
        } else {
            tracing::warn!(fid = record.fid, t, "termination for unknown or already-completed flow");
        }

        if !defer {
            self.sweep_and_reallocate(t)?;
        }
        Ok(())
    }

    /// `true` when the buffered peek record shares `t`'s trace instant,
    /// meaning the sweep must be deferred until all coincident trace
    /// events are applied (§4.5 / I4).
    fn peek_is_coincident_with(&self, t: f64) -> bool {
        matches!(self.trace.peek_record(), Some(r) if r.time == t)
    }

    /// Removes completed flows, emits their completion records and the
    /// `DONE` log line, re-invokes the allocator if any flows remain,
    /// and recomputes the next natural-completion time (§4.5 step 3).
    fn sweep_and_reallocate(&mut self, t: f64) -> Result<(), SimError> {
        let completed = self.flows.completed_fids();
        for fid in &completed {
            let flow = self.flows.remove(*fid).expect("fid came from completed_fids");
            let record = CompletionRecord {
                fid: flow.fid,
                end_time: t,
                start_time: flow.start_time,
                fldur: t - flow.start_time,
                wire_bytes: flow.original_bytes,
                src: flow.src(),
                dst: flow.dst(),
            };
            self.output.write_completion(&record)?;
        }
        eventlog::done(t, &completed);

        self.rates.clear();
        if !self.flows.is_empty() {
            let paths = self.flows.paths();
            let weights = self.flows.weights();
            let allocator = Allocator::new(&self.topology);
            self.rates = allocator.allocate(&paths, &weights)?;
        }

        for (fid, flow) in self.flows.iter() {
            let pseudo_rate = self.rates.get(fid).copied().unwrap_or(0.0);
            eventlog::rate_change(*fid, t, pseudo_rate * flow.weight as f64);
        }

        self.next_finish = compute_next_finish(&self.flows, &self.rates, t);
        Ok(())
    }
}

/// Reduces every active flow's backlog by `rate(f) · weight(f) · 1e9 · dur / 8`.
fn drain_flows(flows: &mut FlowTable, rates: &RateMap, dur: f64) -> Result<(), SimError> {
    for flow in flows.iter_mut() {
        let pseudo_rate = rates.get(&flow.fid).copied().unwrap_or(0.0);
        if pseudo_rate <= 0.0 {
            tracing::warn!(fid = flow.fid, "draining flow with non-positive rate");
        }
        let throughput = pseudo_rate * flow.weight as f64;
        let drained = throughput * 1e9 * dur / 8.0;
        let new_bytes = flow.remaining_bytes - drained;
        if new_bytes < -1.0 {
            return Err(SimError::InvalidConfig(format!(
                "flow {} drained to {new_bytes} bytes (below -1 byte tolerance)",
                flow.fid
            )));
        } else if new_bytes < 0.0 {
            tracing::warn!(fid = flow.fid, new_bytes, "clamping negative remaining_bytes to zero");
            flow.remaining_bytes = 0.0;
        } else {
            flow.remaining_bytes = new_bytes;
        }
    }
    Ok(())
}

/// Earliest absolute time at which some active flow's backlog would
/// drain to zero at its current rate, and which flow that is.
fn compute_next_finish(flows: &FlowTable, rates: &RateMap, now: f64) -> Option<(f64, Fid)> {
    let mut best: Option<(f64, Fid)> = None;
    for (fid, flow) in flows.iter() {
        let pseudo_rate = match rates.get(fid) {
            Some(&r) if r > 0.0 => r,
            _ => continue,
        };
        let throughput = pseudo_rate * flow.weight as f64;
        let dur = flow.remaining_bytes * 8.0 / (throughput * 1e9);
        if dur <= 0.0 {
            continue;
        }
        match best {
            Some((best_dur, _)) if dur >= best_dur => {}
            _ => best = Some((dur, *fid)),
        }
    }
    best.map(|(dur, fid)| (now + dur, fid))
}
