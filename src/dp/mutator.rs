//! Transactional range expansion: given a prefix, its next-hop, and the
//! ordered list of prefixes strictly more specific than it (already present
//! in the RIB), rewrites exactly the dataplane addresses the prefix now
//! owns — leaving every more-specific sub-range untouched.
//!
//! The classic "common root / left edge / middle fill / right edge" shape
//! from the design falls out naturally here as recursion: `fill_recursive`
//! descends one byte at a time, and as long as the left and right edges of
//! a sub-range agree on the next byte it just keeps descending — that *is*
//! the common root, without needing to precompute its length up front.

use crate::dp::table::{DpTable, EntryRef};
use crate::error::Result;
use crate::prefix::{range_end, Prefix};

impl DpTable {
    /// Rewrites the dataplane so that every address covered by `base` but
    /// not by any prefix in `covers` resolves to `new_nh`. `covers` must be
    /// the RIB's cover list for `base`, captured before any mutation that
    /// would prune `base`'s scaffolding (this matters for DEL, where the
    /// RIB node is removed before the dataplane rewrite runs).
    pub fn rewrite_range(&mut self, base: Prefix, covers: &[Prefix], new_nh: u64) -> Result<()> {
        let base_start = base.bits();
        let base_end = range_end(base_start, base.depth);
        let mut next_owned_start = base_start;

        for cover in covers {
            let cover_start = cover.bits();
            if cover_start < next_owned_start {
                // Nested inside a hole already subtracted by an earlier,
                // less-specific cover entry; its range is already excluded.
                continue;
            }
            if cover_start > next_owned_start {
                self.install_subrange(next_owned_start, cover_start - 1, new_nh)?;
            }
            let cover_end = range_end(cover_start, cover.depth);
            match cover_end.checked_add(1) {
                Some(next) => next_owned_start = next,
                None => return Ok(()), // cover_end == u128::MAX: nothing left to own
            }
            if next_owned_start > base_end {
                return Ok(());
            }
        }

        if next_owned_start <= base_end {
            self.install_subrange(next_owned_start, base_end, new_nh)?;
        }
        Ok(())
    }

    /// Installs `new_nh` across the contiguous address range `[ledge, redge]`.
    /// `TBL24` is a flat 2^24-entry table indexed by the address's first
    /// three bytes at once (no further byte-at-a-time structure of its
    /// own), so a range that spans more than one `TBL24` bucket is handled
    /// as: partially-covered left bucket, partially-covered right bucket,
    /// and fully-covered buckets in between written directly.
    fn install_subrange(&mut self, ledge: u128, redge: u128, new_nh: u64) -> Result<()> {
        let lb = ledge.to_be_bytes();
        let rb = redge.to_be_bytes();
        let x = u32::from_be_bytes([0, lb[0], lb[1], lb[2]]);
        let y = u32::from_be_bytes([0, rb[0], rb[1], rb[2]]);

        if x == y {
            self.fill_under_tbl24(x, &lb[3..16], &rb[3..16], new_nh)?;
        } else {
            self.fill_under_tbl24(x, &lb[3..16], &[0xFFu8; 13], new_nh)?;
            self.fill_under_tbl24(y, &[0u8; 13], &rb[3..16], new_nh)?;
            for idx in (x + 1)..y {
                self.set_terminal(EntryRef::Tbl24(idx), new_nh);
            }
        }
        Ok(())
    }

    fn fill_under_tbl24(
        &mut self,
        x: u32,
        ledge_tail: &[u8],
        redge_tail: &[u8],
        new_nh: u64,
    ) -> Result<()> {
        if fully_covers(ledge_tail, redge_tail) {
            self.set_terminal(EntryRef::Tbl24(x), new_nh);
            return Ok(());
        }
        let group = self.ensure_continuation(EntryRef::Tbl24(x))?;
        self.fill_recursive(group, ledge_tail, redge_tail, new_nh)?;
        self.try_recycle(EntryRef::Tbl24(x), group);
        Ok(())
    }

    fn fill_under_tbl8(
        &mut self,
        group: u32,
        byte: u8,
        ledge_tail: &[u8],
        redge_tail: &[u8],
        new_nh: u64,
    ) -> Result<()> {
        if fully_covers(ledge_tail, redge_tail) {
            self.set_terminal(EntryRef::Tbl8(group, byte), new_nh);
            return Ok(());
        }
        let child = self.ensure_continuation(EntryRef::Tbl8(group, byte))?;
        self.fill_recursive(child, ledge_tail, redge_tail, new_nh)?;
        self.try_recycle(EntryRef::Tbl8(group, byte), child);
        Ok(())
    }

    /// One `TBL8` level: `ledge_tail[0]`/`redge_tail[0]` select the byte
    /// within `group`; the remaining tail recurses one level deeper (or, if
    /// empty, writes a terminal directly — this is the leaf/`/128` case).
    fn fill_recursive(
        &mut self,
        group: u32,
        ledge_tail: &[u8],
        redge_tail: &[u8],
        new_nh: u64,
    ) -> Result<()> {
        let lb = ledge_tail[0];
        let rb = redge_tail[0];
        let rest = ledge_tail.len() - 1;

        if lb == rb {
            if rest == 0 {
                self.set_terminal(EntryRef::Tbl8(group, lb), new_nh);
            } else {
                self.fill_under_tbl8(group, lb, &ledge_tail[1..], &redge_tail[1..], new_nh)?;
            }
            return Ok(());
        }

        if rest == 0 {
            self.set_terminal(EntryRef::Tbl8(group, lb), new_nh);
            self.set_terminal(EntryRef::Tbl8(group, rb), new_nh);
        } else {
            let all_ff = vec![0xFFu8; rest];
            let all_00 = vec![0u8; rest];
            self.fill_under_tbl8(group, lb, &ledge_tail[1..], &all_ff, new_nh)?;
            self.fill_under_tbl8(group, rb, &all_00, &redge_tail[1..], new_nh)?;
        }
        for idx in (lb as u16 + 1)..(rb as u16) {
            self.set_terminal(EntryRef::Tbl8(group, idx as u8), new_nh);
        }
        Ok(())
    }
}

fn fully_covers(ledge_tail: &[u8], redge_tail: &[u8]) -> bool {
    ledge_tail.iter().all(|&b| b == 0) && redge_tail.iter().all(|&b| b == 0xFF)
}
