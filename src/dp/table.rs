//! DIR-24-8 dataplane storage: the fixed `TBL24` root table plus the
//! `TBL8` continuation arena, both backed by a flat `Vec<Entry>`.
//!
//! Every entry is stored internally as a tagged `u64` regardless of the
//! configured next-hop width (see `NhWidth` in `crate::fib`) — this avoids
//! duplicating the table/mutator/lookup code per integer width at the cost
//! of using 8 bytes per slot even for a 2-byte-configured FIB. `TBL24` is
//! always the full `2^24` entries per the DIR-24-8 design; `TBL8` grows to
//! exactly `num_tbl8` groups of 256 entries, with group `0` reserved.

use crate::dp::pool::Tbl8Pool;
use crate::error::{FibError, Result};

pub const TBL8_GROUP_LEN: usize = 256;
pub const TBL24_LEN: usize = 1 << 24;

/// One dataplane slot: either a terminal next-hop value or a continuation
/// pointing at a `TBL8` group, distinguished by the low (EXT) bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry(u64);

impl Entry {
    #[inline]
    pub fn terminal(next_hop: u64) -> Self {
        Entry(next_hop << 1)
    }

    #[inline]
    pub fn continuation(group: u32) -> Self {
        Entry(((group as u64) << 1) | 1)
    }

    #[inline]
    pub fn is_ext(self) -> bool {
        self.0 & 1 == 1
    }

    #[inline]
    pub fn group(self) -> u32 {
        (self.0 >> 1) as u32
    }

    #[inline]
    pub fn next_hop(self) -> u64 {
        self.0 >> 1
    }
}

/// Identifies one dataplane slot: a `TBL24` index, or a `(group, byte)`
/// pair inside `TBL8`. Used to thread "the entry I'm about to convert from
/// terminal to continuation, or collapse back" through the mutator without
/// juggling raw indices at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRef {
    Tbl24(u32),
    Tbl8(u32, u8),
}

#[derive(Debug)]
pub struct DpTable {
    tbl24: Vec<Entry>,
    tbl8: Vec<Entry>,
    pub(crate) pool: Tbl8Pool,
    default_nh: u64,
}

impl DpTable {
    /// Allocates `TBL24` (always `2^24` entries) and a `TBL8` arena sized
    /// for `num_tbl8` groups (plus the reserved group 0), all initialized
    /// to resolve to `default_nh`.
    pub fn new(default_nh: u64, num_tbl8: u32) -> Result<Self> {
        let tbl8_len = (num_tbl8 as usize + 1)
            .checked_mul(TBL8_GROUP_LEN)
            .ok_or(FibError::AllocFailed)?;

        let mut tbl24 = Vec::new();
        tbl24.try_reserve_exact(TBL24_LEN).map_err(|_| FibError::AllocFailed)?;
        tbl24.resize(TBL24_LEN, Entry::terminal(default_nh));

        let mut tbl8 = Vec::new();
        tbl8.try_reserve_exact(tbl8_len).map_err(|_| FibError::AllocFailed)?;
        tbl8.resize(tbl8_len, Entry::terminal(default_nh));

        Ok(DpTable { tbl24, tbl8, pool: Tbl8Pool::new(num_tbl8), default_nh })
    }

    pub fn default_nh(&self) -> u64 {
        self.default_nh
    }

    pub fn pool_available(&self) -> usize {
        self.pool.available()
    }

    /// Counts `TBL8` groups reachable from `TBL24`. Continuations form a
    /// tree (materializing one always allocates a fresh group, never
    /// shares an existing one), so this is a plain recursive count with no
    /// need to deduplicate. A diagnostic, not part of the lookup path —
    /// used by tests to check that pool bookkeeping matches the actual
    /// reachable dataplane structure.
    pub fn count_reachable_groups(&self) -> u32 {
        let mut count = 0;
        for entry in &self.tbl24 {
            if entry.is_ext() {
                count += 1 + self.count_reachable_from(entry.group());
            }
        }
        count
    }

    fn count_reachable_from(&self, group: u32) -> u32 {
        let mut count = 0;
        for &entry in self.group_slice(group) {
            if entry.is_ext() {
                count += 1 + self.count_reachable_from(entry.group());
            }
        }
        count
    }

    /// `true` if some reachable `TBL8` group holds 256 identical terminal
    /// entries — i.e. `try_recycle` should have collapsed it but didn't.
    /// A diagnostic for recycle-completeness tests, not part of the lookup
    /// path.
    pub fn has_recyclable_group(&self) -> bool {
        fn uniform_terminal(slice: &[Entry]) -> bool {
            let first = slice[0];
            !first.is_ext() && slice.iter().all(|&e| e == first)
        }
        fn walk(dp: &DpTable, group: u32) -> bool {
            let slice = dp.group_slice(group);
            if uniform_terminal(slice) {
                return true;
            }
            slice.iter().any(|&e| e.is_ext() && walk(dp, e.group()))
        }
        self.tbl24.iter().any(|&e| e.is_ext() && walk(self, e.group()))
    }

    #[inline]
    pub(crate) fn get_entry(&self, r: EntryRef) -> Entry {
        match r {
            EntryRef::Tbl24(i) => self.tbl24[i as usize],
            EntryRef::Tbl8(g, b) => self.tbl8[g as usize * TBL8_GROUP_LEN + b as usize],
        }
    }

    #[inline]
    pub(crate) fn set_entry(&mut self, r: EntryRef, e: Entry) {
        match r {
            EntryRef::Tbl24(i) => self.tbl24[i as usize] = e,
            EntryRef::Tbl8(g, b) => self.tbl8[g as usize * TBL8_GROUP_LEN + b as usize] = e,
        }
    }

    pub(crate) fn group_slice(&self, group: u32) -> &[Entry] {
        let start = group as usize * TBL8_GROUP_LEN;
        &self.tbl8[start..start + TBL8_GROUP_LEN]
    }

    pub(crate) fn group_slice_mut(&mut self, group: u32) -> &mut [Entry] {
        let start = group as usize * TBL8_GROUP_LEN;
        &mut self.tbl8[start..start + TBL8_GROUP_LEN]
    }

    #[inline]
    pub(crate) fn tbl24_entry(&self, idx: u32) -> Entry {
        self.tbl24[idx as usize]
    }

    #[inline]
    pub(crate) fn tbl8_entry(&self, group: u32, byte: u8) -> Entry {
        self.tbl8[group as usize * TBL8_GROUP_LEN + byte as usize]
    }

    /// Sets `r` to a terminal entry for `next_hop`, first freeing (and
    /// returning to the pool) any `TBL8` subtree that entry used to point
    /// at. Every direct terminal write in the mutator goes through here so
    /// that no continuation group is ever leaked.
    pub(crate) fn set_terminal(&mut self, r: EntryRef, next_hop: u64) {
        let old = self.get_entry(r);
        if old.is_ext() {
            self.free_subtree(old.group());
        }
        self.set_entry(r, Entry::terminal(next_hop));
    }

    fn free_subtree(&mut self, group: u32) {
        for b in 0..TBL8_GROUP_LEN {
            let e = self.tbl8[group as usize * TBL8_GROUP_LEN + b];
            if e.is_ext() {
                self.free_subtree(e.group());
            }
        }
        self.pool.put(group);
    }

    /// Ensures `r` is a continuation, materializing a fresh `TBL8` group
    /// (all 256 entries seeded with the old terminal value) if it wasn't
    /// one already. Returns the group id either way.
    pub(crate) fn ensure_continuation(&mut self, r: EntryRef) -> Result<u32> {
        let old = self.get_entry(r);
        if old.is_ext() {
            return Ok(old.group());
        }
        let group = self.pool.get()?;
        let seed = Entry::terminal(old.next_hop());
        self.group_slice_mut(group).fill(seed);
        self.set_entry(r, Entry::continuation(group));
        Ok(group)
    }

    /// If `group` (pointed to by `r`) has collapsed to 256 identical
    /// terminal entries, rewrites `r` as that terminal and returns the
    /// group to the pool.
    pub(crate) fn try_recycle(&mut self, r: EntryRef, group: u32) {
        let slice = self.group_slice(group);
        let first = slice[0];
        if first.is_ext() || !slice.iter().all(|&e| e == first) {
            return;
        }
        self.pool.put(group);
        self.set_entry(r, first);
        log::trace!("tbl8 group {group} recycled, collapsed to next_hop={}", first.next_hop());
    }
}
