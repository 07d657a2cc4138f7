//! Bulk seed/dump of a FIB's RIB content as a simple line-oriented text
//! format: `"<addr>/<depth> <next_hop>"` per line. Parsed the way
//! `mrt_ingester`'s record readers consume a stream — `BufRead`, one
//! `Result` per record, stop cleanly at EOF — except that the record here
//! is a text line rather than a binary MRT header. This is not a routing
//! protocol wire format; it exists purely to seed/inspect a FIB in tests
//! and tooling.

use crate::error::{SnapshotError, SnapshotResult};
use crate::fib::{Fib, Op};
use std::io::{BufRead, Write};

impl Fib {
    /// Applies one `ADD` per non-blank line of `reader`. Returns the number
    /// of entries loaded. Stops at the first malformed line or rejected
    /// `modify` call, leaving every entry parsed so far installed.
    pub fn load_rib(&mut self, reader: impl BufRead) -> SnapshotResult<usize> {
        let mut count = 0;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (prefix_part, nh_part) = line.split_once(' ').ok_or_else(|| SnapshotError::Malformed {
                line: lineno + 1,
                reason: "expected \"<addr>/<depth> <next_hop>\"".into(),
            })?;
            let (addr_part, depth_part) = prefix_part.split_once('/').ok_or_else(|| SnapshotError::Malformed {
                line: lineno + 1,
                reason: "missing '/' in prefix".into(),
            })?;
            let addr = addr_part.parse().map_err(|_| SnapshotError::Malformed {
                line: lineno + 1,
                reason: format!("invalid address {addr_part:?}"),
            })?;
            let depth = depth_part.parse().map_err(|_| SnapshotError::Malformed {
                line: lineno + 1,
                reason: format!("invalid depth {depth_part:?}"),
            })?;
            let next_hop = nh_part.trim().parse().map_err(|_| SnapshotError::Malformed {
                line: lineno + 1,
                reason: format!("invalid next_hop {nh_part:?}"),
            })?;
            self.modify(addr, depth, next_hop, Op::Add)?;
            count += 1;
        }
        Ok(count)
    }

    /// Writes every present RIB entry, one `"<addr>/<depth> <next_hop>"`
    /// line each, in the RIB's own ordered cover-iteration order.
    pub fn dump_rib(&self, mut writer: impl Write) -> SnapshotResult<()> {
        for (prefix, next_hop) in self.rib_iter() {
            writeln!(writer, "{}/{} {next_hop}", prefix.addr, prefix.depth)?;
        }
        Ok(())
    }
}
