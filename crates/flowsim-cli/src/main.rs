//! flowsim — discrete-event, fluid-model network-flow simulator.
//!
//! Reads a topology and an arrival/termination trace, runs weighted
//! max-min waterfilling on every membership change, and writes one
//! completion record per flow.

use std::fs::File;
use std::io::{BufReader, BufWriter};

use clap::Parser;
use flowsim_core::{OutputSink, Scheduler, SimConfig, TraceReader};
use tracing_subscriber::EnvFilter;

/// Discrete-event network-flow simulator.
#[derive(Parser, Debug)]
#[command(name = "flowsim", about = "Fluid-model network-flow simulator")]
struct Cli {
    /// Path to the arrival/termination trace.
    flow_file: String,

    /// Path to write completion records to.
    out_file: String,

    /// Path to the topology (link capacity) file.
    link_file: String,

    /// Flows smaller than this byte count get `priority_weight`.
    min_bytes_for_priority: f64,

    /// Pseudo-flow weight applied to priority flows; rounded toward
    /// zero when truncated to an integer weight.
    priority_weight: f64,

    /// Simulation stops once an event's time reaches this value.
    max_sim_time: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    tracing::info!(
        flow_file = %cli.flow_file,
        out_file = %cli.out_file,
        link_file = %cli.link_file,
        max_sim_time = cli.max_sim_time,
        "flowsim starting"
    );

    let priority_weight = cli.priority_weight.trunc();
    if priority_weight < 1.0 {
        anyhow::bail!("priority_weight must round to at least 1, got {}", cli.priority_weight);
    }

    let link_reader = BufReader::new(File::open(&cli.link_file)?);
    let topology = flowsim_core::Topology::from_reader(link_reader)?;

    let flow_reader = BufReader::new(File::open(&cli.flow_file)?);
    let trace = TraceReader::new(flow_reader)?;

    let out_writer = BufWriter::new(File::create(&cli.out_file)?);
    let output = OutputSink::new(out_writer);

    let config = SimConfig {
        min_bytes_for_priority: cli.min_bytes_for_priority,
        priority_weight: priority_weight as u32,
        max_sim_time: cli.max_sim_time,
        max_events: flowsim_core::DEFAULT_MAX_EVENTS,
    };

    let mut scheduler = Scheduler::new(topology, trace, output, config)?;
    scheduler.run()?;

    tracing::info!("flowsim finished");
    Ok(())
}
