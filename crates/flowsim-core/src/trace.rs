//! C2 — the lazy trace reader with one-record lookahead.
//!
//! Mirrors `ideal_ct.cc::get_next_flow`: the reader always exposes both
//! the record to be consumed next (`next`) and the one after it
//! (`peek`), so the scheduler can tell whether a just-applied event is
//! the last of its instant before re-invoking the allocator (§4.5).
//! Forward-only and non-restartable, as Design Note "Non-restartable
//! lookahead iterator" specifies.

use crate::error::TraceError;
use crate::types::{Fid, Link, NodeId};
use std::io::BufRead;

/// One parsed line of the trace file: an arrival (`num_bytes > 0`, with
/// a path) or a termination (`num_bytes <= 0`, path absent).
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub fid: Fid,
    pub num_bytes: f64,
    pub time: f64,
    pub path: Option<Vec<Link>>,
}

impl TraceRecord {
    pub fn is_arrival(&self) -> bool {
        self.num_bytes > 0.0
    }
}

/// Forward-only trace source with one record of lookahead.
pub struct TraceReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
    next: Option<TraceRecord>,
    peek: Option<TraceRecord>,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Result<Self, TraceError> {
        let mut reader = Self {
            lines: reader.lines(),
            line_no: 0,
            next: None,
            peek: None,
        };
        reader.next = reader.read_one()?;
        reader.peek = reader.read_one()?;
        Ok(reader)
    }

    /// The record the scheduler will consume on the next `advance` call.
    pub fn next_record(&self) -> Option<&TraceRecord> {
        self.next.as_ref()
    }

    /// The record after `next_record`, if any.
    pub fn peek_record(&self) -> Option<&TraceRecord> {
        self.peek.as_ref()
    }

    /// Consumes `next_record`, promotes `peek_record` into its place,
    /// and draws a fresh record into `peek_record`.
    pub fn advance(&mut self) -> Result<Option<TraceRecord>, TraceError> {
        let consumed = self.next.take();
        self.next = self.peek.take();
        self.peek = self.read_one()?;
        Ok(consumed)
    }

    fn read_one(&mut self) -> Result<Option<TraceRecord>, TraceError> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            self.line_no += 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(parse_trace_line(trimmed, self.line_no)?));
        }
    }
}

fn parse_trace_line(line: &str, line_no: usize) -> Result<TraceRecord, TraceError> {
    let mut parts = line.split_whitespace();

    let fid: Fid = parts
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| TraceError::MissingFid {
            line_no,
            raw: line.to_string(),
        })?;

    let num_bytes: f64 = parts
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| TraceError::MissingNumBytes {
            line_no,
            raw: line.to_string(),
        })?;

    let time: f64 = parts
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| TraceError::MissingTime {
            line_no,
            raw: line.to_string(),
        })?;

    if num_bytes <= 0.0 {
        // Termination: no path follows.
        return Ok(TraceRecord {
            fid,
            num_bytes,
            time,
            path: None,
        });
    }

    let nodes: Vec<NodeId> = parts.filter_map(|t| t.parse().ok()).collect();
    if nodes.len() < 2 {
        return Err(TraceError::MissingPath {
            line_no,
            raw: line.to_string(),
        });
    }
    let path: Vec<Link> = nodes.windows(2).map(|w| (w[0], w[1])).collect();

    Ok(TraceRecord {
        fid,
        num_bytes,
        time,
        path: Some(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn lookahead_shifts_on_advance() {
        let data = "1 1000 0.0 0 1\n2 1000 0.5 0 1\n3 -1 1.0\n";
        let mut r = TraceReader::new(Cursor::new(data)).unwrap();

        assert_eq!(r.next_record().unwrap().fid, 1);
        assert_eq!(r.peek_record().unwrap().fid, 2);

        let consumed = r.advance().unwrap().unwrap();
        assert_eq!(consumed.fid, 1);
        assert_eq!(r.next_record().unwrap().fid, 2);
        assert_eq!(r.peek_record().unwrap().fid, 3);

        r.advance().unwrap();
        assert_eq!(r.next_record().unwrap().fid, 3);
        assert!(r.peek_record().is_none());

        let last = r.advance().unwrap().unwrap();
        assert_eq!(last.fid, 3);
        assert!(r.next_record().is_none());
    }

    #[test]
    fn arrival_path_from_node_sequence() {
        let data = "7 2000 1.5 0 1 2 3\n";
        let r = TraceReader::new(Cursor::new(data)).unwrap();
        let rec = r.next_record().unwrap();
        assert!(rec.is_arrival());
        assert_eq!(rec.path.as_ref().unwrap(), &vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn termination_has_no_path() {
        let data = "7 -1 2.0\n";
        let r = TraceReader::new(Cursor::new(data)).unwrap();
        let rec = r.next_record().unwrap();
        assert!(!rec.is_arrival());
        assert!(rec.path.is_none());
    }

    #[test]
    fn malformed_arrival_is_fatal() {
        let data = "7 2000 1.5 0\n"; // only one node, no edges
        let err = TraceReader::new(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, TraceError::MissingPath { line_no: 1, .. }));
    }

    #[test]
    fn garbage_line_is_fatal() {
        let data = "not a trace line\n";
        let err = TraceReader::new(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, TraceError::MissingNumBytes { line_no: 1, .. }));
    }
}
