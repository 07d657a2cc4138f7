//! The lookup kernel: `TBL24` indexed by the address's first three bytes,
//! then zero or more `TBL8` hops of one byte each while the entry is a
//! continuation. No allocation, no branch on anything but the EXT bit, and
//! — deliberately — no logging call on this path (see `crate::fib`'s
//! module docs on where logging does and doesn't belong).

use crate::dp::table::DpTable;
use std::net::Ipv6Addr;

impl DpTable {
    #[inline]
    pub fn lookup_one(&self, addr: Ipv6Addr) -> u64 {
        let bytes = addr.octets();
        let idx = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32;
        let mut entry = self.tbl24_entry(idx);
        let mut i = 3usize;
        while entry.is_ext() {
            entry = self.tbl8_entry(entry.group(), bytes[i]);
            i += 1;
        }
        entry.next_hop()
    }

    /// Fills `out[i]` with the resolved next-hop for `addrs[i]`, for every
    /// index the two slices have in common.
    pub fn lookup_bulk_scalar(&self, addrs: &[Ipv6Addr], out: &mut [u64]) {
        for (addr, slot) in addrs.iter().zip(out.iter_mut()) {
            *slot = self.lookup_one(*addr);
        }
    }

    /// A batched variant processing four addresses per iteration. It
    /// performs the identical per-address descent as [`DpTable::lookup_one`]
    /// (no real SIMD gather/intrinsics — this crate does not carry
    /// architecture-specific `unsafe` code), so its output is bitwise
    /// identical to the scalar kernel for every address and dataplane
    /// state; it exists as the seam `Fib::lookup_fn(Vector)` resolves to
    /// when the `simd` feature is enabled, matching how a real vector
    /// kernel would be wired in without committing this crate to one.
    #[cfg(feature = "simd")]
    pub fn lookup_bulk_vector(&self, addrs: &[Ipv6Addr], out: &mut [u64]) {
        let n = addrs.len().min(out.len());
        let mut i = 0;
        while i + 4 <= n {
            for lane in 0..4 {
                out[i + lane] = self.lookup_one(addrs[i + lane]);
            }
            i += 4;
        }
        while i < n {
            out[i] = self.lookup_one(addrs[i]);
            i += 1;
        }
    }
}
