//! The FIB facade: ties the RIB and the dataplane together behind
//! `create`/`modify`/`lookup_fn`, enforcing the admission-control and
//! skip-if-unchanged policies that keep the two structures consistent.

use crate::dp::DpTable;
use crate::error::{FibError, Result};
use crate::prefix::{mask_to_depth, Prefix};
use crate::rib::Rib;
use std::net::Ipv6Addr;

/// Width of the configured next-hop value, in bytes. The dataplane stores
/// every entry as `u64` regardless (see `crate::dp::table`); this only
/// bounds the values `modify` will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NhWidth {
    Two,
    Four,
    Eight,
}

impl NhWidth {
    pub fn bytes(self) -> u32 {
        match self {
            NhWidth::Two => 2,
            NhWidth::Four => 4,
            NhWidth::Eight => 8,
        }
    }

    /// Largest next-hop value this width can store, per spec.md §3's
    /// `(1 << (8w)) - 1` ceiling, shifted right by one bit to make room for
    /// the EXT tag in the same-width dataplane slot.
    pub fn max_nh(self) -> u64 {
        let full = 1u128 << (8 * self.bytes());
        ((full - 1) >> 1) as u64
    }
}

/// Construction-time tuning knobs — the `conf` argument to `Fib::create`.
/// A plain struct built by the caller, not a parsed config file: this
/// crate's scope is a programmatic core with no CLI surface.
#[derive(Debug, Clone, Copy)]
pub struct FibConfig {
    pub default_nh: u64,
    pub nh_sz: NhWidth,
    pub num_tbl8: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Del,
}

/// Which lookup kernel `Fib::lookup_fn` should hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Scalar,
    Vector,
    /// Vector if available, scalar otherwise.
    Default,
}

pub type LookupFn<'a> = Box<dyn Fn(&[Ipv6Addr], &mut [u64]) + 'a>;

#[derive(Debug, Clone, Copy)]
pub struct FibStats {
    pub rib_len: usize,
    pub rsvd_tbl8s: u32,
    pub num_tbl8: u32,
    pub tbl8_available: usize,
}

pub struct Fib {
    name: String,
    rib: Rib,
    dp: DpTable,
    config: FibConfig,
    rsvd_tbl8s: u32,
}

impl Fib {
    pub fn create(name: &str, config: FibConfig) -> Result<Self> {
        if config.num_tbl8 == 0 {
            return Err(FibError::Invalid("num_tbl8 must be nonzero".into()));
        }
        if (config.num_tbl8 as u64) > config.nh_sz.max_nh() {
            return Err(FibError::Invalid("num_tbl8 exceeds configured width".into()));
        }
        if config.default_nh > config.nh_sz.max_nh() {
            return Err(FibError::Invalid("default_nh exceeds configured width".into()));
        }
        let dp = DpTable::new(config.default_nh, config.num_tbl8)?;
        Ok(Fib { name: name.to_string(), rib: Rib::new(), dp, config, rsvd_tbl8s: 0 })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> FibStats {
        FibStats {
            rib_len: self.rib.len(),
            rsvd_tbl8s: self.rsvd_tbl8s,
            num_tbl8: self.config.num_tbl8,
            tbl8_available: self.dp.pool_available(),
        }
    }

    /// `ADD` installs or updates `(ip/depth, next_hop)`; `DEL` removes it,
    /// handing its range back to the nearest covering prefix (or the
    /// configured default).
    pub fn modify(&mut self, ip: Ipv6Addr, depth: u8, next_hop: u64, op: Op) -> Result<()> {
        if depth > 128 {
            return Err(FibError::Invalid("depth exceeds 128".into()));
        }
        if next_hop > self.config.nh_sz.max_nh() {
            return Err(FibError::Invalid("next_hop exceeds configured width".into()));
        }
        let prefix = Prefix::new(mask_to_depth(ip, depth), depth);
        match op {
            Op::Add => self.modify_add(prefix, next_hop),
            Op::Del => self.modify_del(prefix),
        }
    }

    fn modify_add(&mut self, prefix: Prefix, next_hop: u64) -> Result<()> {
        if let Some(node) = self.rib.lookup_exact(prefix) {
            if self.rib.next_hop(node) == next_hop {
                log::debug!("ADD {}/{} nh={next_hop}: already present, no-op", prefix.addr, prefix.depth);
                return Ok(());
            }
            let covers = self.rib.cover_prefixes(prefix);
            self.dp.rewrite_range(prefix, &covers, next_hop)?;
            self.rib.set_nh(node, next_hop);
            log::debug!("ADD {}/{} nh={next_hop}: next-hop updated", prefix.addr, prefix.depth);
            return Ok(());
        }

        let depth_diff = self.depth_diff_for(prefix);
        if depth_diff as usize > self.dp.pool_available() {
            log::warn!(
                "ADD {}/{} rejected: NO_SPACE (needs {depth_diff} tbl8 groups, {} available)",
                prefix.addr,
                prefix.depth,
                self.dp.pool_available()
            );
            return Err(FibError::NoSpace);
        }

        let parent_nh = self.rib.nearest_covering_nh(prefix);
        let skip = parent_nh == Some(next_hop);

        let node = self.rib.insert(prefix);
        self.rib.set_nh(node, next_hop);

        if skip {
            log::debug!(
                "ADD {}/{} nh={next_hop}: matches parent, dataplane rewrite skipped",
                prefix.addr,
                prefix.depth
            );
        } else {
            let covers = self.rib.cover_prefixes(prefix);
            self.dp.rewrite_range(prefix, &covers, next_hop)?;
            self.rsvd_tbl8s += depth_diff;
            log::debug!("ADD {}/{} nh={next_hop}: inserted", prefix.addr, prefix.depth);
        }
        Ok(())
    }

    fn modify_del(&mut self, prefix: Prefix) -> Result<()> {
        let node = self.rib.lookup_exact(prefix).ok_or(FibError::NotFound)?;
        let covers = self.rib.cover_prefixes(prefix);
        let depth_diff = self.depth_diff_for(prefix);
        let parent_nh = self
            .rib
            .lookup_parent(node)
            .map(|p| self.rib.next_hop(p))
            .unwrap_or(self.config.default_nh);

        self.rib.remove(prefix);
        self.dp.rewrite_range(prefix, &covers, parent_nh)?;
        self.rsvd_tbl8s = self.rsvd_tbl8s.saturating_sub(depth_diff);
        log::debug!("DEL {}/{}: now resolves via next-hop {parent_nh}", prefix.addr, prefix.depth);
        Ok(())
    }

    /// `ceil(depth/8) - ceil(max(parent_depth, 24)/8)`: an over-approximation
    /// of the number of `TBL8` groups a prefix at this depth needs beyond
    /// what its nearest present ancestor (or plain `TBL24`, for a fresh
    /// branch) already accounts for. Used only for admission control and
    /// for `rsvd_tbl8s` bookkeeping, not as an exact allocation count.
    fn depth_diff_for(&self, prefix: Prefix) -> u32 {
        if prefix.depth <= 24 {
            return 0;
        }
        let baseline = self.rib.nearest_covering_depth(prefix).unwrap_or(24).max(24);
        let ceil8 = |d: u32| d.div_ceil(8);
        ceil8(prefix.depth as u32).saturating_sub(ceil8(baseline as u32))
    }

    /// Hands back a lookup kernel bound to this FIB's current dataplane
    /// state. `None` when the requested kind is unavailable (`Vector`
    /// without the `simd` feature).
    pub fn lookup_fn(&self, kind: LookupKind) -> Option<LookupFn<'_>> {
        match kind {
            LookupKind::Scalar => {
                Some(Box::new(move |addrs: &[Ipv6Addr], out: &mut [u64]| {
                    self.dp.lookup_bulk_scalar(addrs, out)
                }))
            }
            #[cfg(feature = "simd")]
            LookupKind::Vector => {
                Some(Box::new(move |addrs: &[Ipv6Addr], out: &mut [u64]| {
                    self.dp.lookup_bulk_vector(addrs, out)
                }))
            }
            #[cfg(not(feature = "simd"))]
            LookupKind::Vector => None,
            LookupKind::Default => {
                self.lookup_fn(LookupKind::Vector).or_else(|| self.lookup_fn(LookupKind::Scalar))
            }
        }
    }

    /// Single-address convenience wrapper around the scalar kernel.
    pub fn lookup(&self, ip: Ipv6Addr) -> u64 {
        self.dp.lookup_one(ip)
    }

    pub fn rib_iter(&self) -> impl Iterator<Item = (Prefix, u64)> + '_ {
        self.rib.iter()
    }

    /// Number of `TBL8` groups actually reachable from `TBL24` right now.
    /// A diagnostic for tests checking pool bookkeeping, not part of the
    /// lookup path.
    pub fn dp_reachable_tbl8_groups(&self) -> u32 {
        self.dp.count_reachable_groups()
    }

    /// `true` if some reachable `TBL8` group should have been collapsed by
    /// `try_recycle` but wasn't. A diagnostic for recycle-completeness
    /// tests, not part of the lookup path.
    pub fn dp_has_recyclable_group(&self) -> bool {
        self.dp.has_recyclable_group()
    }
}
