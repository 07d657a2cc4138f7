//! TBL8 group pool: a LIFO free-list over the fixed arena of `num_tbl8`
//! groups. Group `0` is reserved (the "no continuation" sentinel is never a
//! valid group id), so usable ids run `1..=num_tbl8`.

use crate::error::{FibError, Result};

#[derive(Debug)]
pub struct Tbl8Pool {
    /// `pool[0..pos]` are in use; `pool[pos..]` are free, popped from the end.
    pool: Vec<u32>,
    pos: usize,
}

impl Tbl8Pool {
    pub fn new(num_tbl8: u32) -> Self {
        Tbl8Pool { pool: (1..=num_tbl8).collect(), pos: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    pub fn available(&self) -> usize {
        self.pool.len() - self.pos
    }

    /// Pops one free group id. `NO_SPACE` once the pool is exhausted.
    pub fn get(&mut self) -> Result<u32> {
        if self.pos == self.pool.len() {
            return Err(FibError::NoSpace);
        }
        let idx = self.pool[self.pos];
        self.pos += 1;
        Ok(idx)
    }

    /// Returns a group id to the pool. Order of returned ids is
    /// unspecified, matching the allocator's own contract.
    pub fn put(&mut self, group: u32) {
        debug_assert!(self.pos > 0, "put() without a matching get()");
        self.pos -= 1;
        self.pool[self.pos] = group;
    }
}
