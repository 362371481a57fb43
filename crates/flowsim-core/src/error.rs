//! Error types for the flow simulator.
//!
//! Mirrors the split used elsewhere in the workspace: small `thiserror`
//! enums per fallible subsystem, collected into one umbrella error that
//! the CLI entry point turns into a process exit code.

use crate::types::{Fid, Link};
use thiserror::Error;

/// Failures raised by the weighted waterfilling allocator.
///
/// Each variant corresponds to one of the original algorithm's fatal
/// `exit(1)` conditions — all three indicate a bookkeeping inconsistency
/// that should never occur if the caller only ever passes paths that
/// resolve against the topology.
#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error("flow {fid} references unknown link {:?}-{:?}", link.0, link.1)]
    UnknownLink { fid: Fid, link: Link },

    #[error("link {:?}-{:?} is unsaturated but has no bookkeeping entry", link.0, link.1)]
    MissingBookkeeping { link: Link },

    #[error("no unsaturated link carries an unsaturated flow (round {round})")]
    NoFairShare { round: u32 },

    #[error("link {:?}-{:?} saturated with {expected} unsat pseudo-flows but only removed {removed}", link.0, link.1)]
    SaturationMismatch {
        link: Link,
        expected: u32,
        removed: u32,
    },
}

/// Failures raised while reading the trace file.
///
/// Topology lines that fail to parse are logged and skipped (§7); trace
/// lines that fail to parse are fatal, since a malformed trace leaves the
/// simulation with no well-defined continuation.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line_no}: couldn't parse flow id: {raw:?}")]
    MissingFid { line_no: usize, raw: String },

    #[error("line {line_no}: couldn't parse num_bytes: {raw:?}")]
    MissingNumBytes { line_no: usize, raw: String },

    #[error("line {line_no}: couldn't parse time: {raw:?}")]
    MissingTime { line_no: usize, raw: String },

    #[error("line {line_no}: arrival has no path: {raw:?}")]
    MissingPath { line_no: usize, raw: String },

    #[error("I/O error reading trace file: {0}")]
    Io(#[from] std::io::Error),
}

/// Umbrella error returned by the scheduler's event loop; the
/// process-terminating `exit(1)` calls of the original have been turned
/// into `Result` propagation, with `flowsim-cli::main` the sole place
/// that chooses an exit code.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Allocator(#[from] AllocatorError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
