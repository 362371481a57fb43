//! Discrete-event, fluid-model network-flow simulator.
//!
//! This crate contains:
//! - **Topology** (`topology`) — the static link-capacity map
//! - **Trace** (`trace`) — the lazy, one-record-lookahead trace reader
//! - **Allocator** (`allocator`) — weighted max-min fair waterfilling
//! - **Flow table** (`flow`) — per-flow backlog and weight bookkeeping
//! - **Scheduler** (`scheduler`) — the event loop tying the above together
//! - **Output** (`output`) — the completion-record sink
//! - **Event log** (`eventlog`) — `RATE_CHANGE` / `DONE` structured logging

pub mod allocator;
pub mod error;
pub mod eventlog;
pub mod flow;
pub mod kahan;
pub mod output;
pub mod scheduler;
pub mod topology;
pub mod trace;
pub mod types;

pub use error::{AllocatorError, SimError, TraceError};
pub use flow::{Flow, FlowTable};
pub use output::{CompletionRecord, OutputSink};
pub use scheduler::{Scheduler, SimConfig, DEFAULT_MAX_EVENTS};
pub use topology::Topology;
pub use trace::{TraceReader, TraceRecord};
pub use types::{Fid, Link, NodeId, Weight};
