//! Shared scalar types for the flow simulator.

/// A node identifier, as it appears in the topology and trace files.
pub type NodeId = i64;

/// A flow identifier, unique within one simulation run.
pub type Fid = i64;

/// A directed edge `(u, v)`. Links are keys into the topology's capacity
/// map and into every per-link bookkeeping table the allocator maintains.
pub type Link = (NodeId, NodeId);

/// A flow of weight `w` is `w` identical pseudo-flows sharing one path;
/// the allocator computes one rate per pseudo-flow and the caller scales
/// by `weight` wherever link capacity or drained bytes are concerned.
pub type Weight = u32;
