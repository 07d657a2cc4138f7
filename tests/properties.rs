//! Property-based tests checking the FIB's invariants across randomly
//! generated `ADD`/`DEL` sequences, rather than fixed scenarios.

use ipv6_fib::prefix::mask_to_depth;
use ipv6_fib::{Fib, FibConfig, NhWidth, Op};
use proptest::prelude::*;
use std::net::Ipv6Addr;

const DEFAULT_NH: u64 = 1;
const NUM_TBL8: u32 = 128;

/// A handful of prefixes at varying depths, deliberately overlapping (and
/// two at depth 128), so random sequences exercise nesting and exact-match
/// deletion rather than just disjoint inserts.
const CATALOG: &[(&str, u8)] = &[
    ("::", 0),
    ("2001:db8::", 32),
    ("2001:db8:1::", 48),
    ("2001:db8:1:1::", 64),
    ("2001:db9::", 32),
    ("2001:db8:2::", 40),
    ("2001:db8::1", 128),
    ("2001:db8:1::1", 128),
];

/// A few sample addresses to probe on every step: the catalog prefixes
/// themselves, plus a couple of addresses covered by none of them.
fn sample_addrs() -> Vec<Ipv6Addr> {
    let mut v: Vec<Ipv6Addr> = CATALOG.iter().map(|(a, _)| a.parse().unwrap()).collect();
    v.push("2001:db8:1::1:1".parse().unwrap());
    v.push("::1".parse().unwrap());
    v.push("ffff::1".parse().unwrap());
    v
}

fn new_fib() -> Fib {
    Fib::create("prop", FibConfig { default_nh: DEFAULT_NH, nh_sz: NhWidth::Four, num_tbl8: NUM_TBL8 })
        .unwrap()
}

/// The dictionary a `Fib` is supposed to agree with: `(masked addr, depth)
/// -> next_hop`, queried by picking the deepest entry that covers a given
/// address.
#[derive(Default)]
struct Reference {
    entries: Vec<(u128, u8, u64)>,
}

impl Reference {
    fn add(&mut self, addr: u128, depth: u8, nh: u64) {
        if let Some(e) = self.entries.iter_mut().find(|(a, d, _)| *a == addr && *d == depth) {
            e.2 = nh;
        } else {
            self.entries.push((addr, depth, nh));
        }
    }

    fn del(&mut self, addr: u128, depth: u8) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(a, d, _)| !(*a == addr && *d == depth));
        self.entries.len() != before
    }

    fn contains(&self, addr: u128, depth: u8) -> bool {
        self.entries.iter().any(|(a, d, _)| *a == addr && *d == depth)
    }

    fn best_match(&self, query: u128, default_nh: u64) -> u64 {
        self.entries
            .iter()
            .filter(|(a, d, _)| covers(*a, *d, query))
            .max_by_key(|(_, d, _)| *d)
            .map(|(_, _, nh)| *nh)
            .unwrap_or(default_nh)
    }
}

fn covers(prefix_addr: u128, depth: u8, query: u128) -> bool {
    if depth == 0 {
        return true;
    }
    let mask = u128::MAX << (128 - depth as u32);
    prefix_addr & mask == query & mask
}

fn catalog_entry(idx: usize) -> (u128, u8) {
    let (addr, depth) = CATALOG[idx % CATALOG.len()];
    let masked = mask_to_depth(addr.parse().unwrap(), depth);
    (u128::from(masked), depth)
}

proptest! {
    /// P1 / P2: after every step of a random ADD/DEL sequence, every sample
    /// address resolves through the FIB exactly as the reference dictionary
    /// says it should — covering both "lookups reflect installed prefixes"
    /// and "deleting one restores whatever it had shadowed".
    #[test]
    fn lookup_matches_reference_after_every_step(
        ops in prop::collection::vec((0..CATALOG.len(), any::<bool>(), any::<u16>()), 1..40)
    ) {
        let mut fib = new_fib();
        let mut reference = Reference::default();
        let samples = sample_addrs();

        for (idx, is_add, nh) in ops {
            let (addr, depth) = catalog_entry(idx);
            let nh = nh as u64;
            if is_add {
                match fib.modify(Ipv6Addr::from(addr), depth, nh, Op::Add) {
                    Ok(()) => reference.add(addr, depth, nh),
                    Err(ipv6_fib::FibError::NoSpace) => {}
                    Err(e) => prop_assert!(false, "unexpected ADD error: {e:?}"),
                }
            } else {
                match fib.modify(Ipv6Addr::from(addr), depth, 0, Op::Del) {
                    Ok(()) => {
                        prop_assert!(reference.del(addr, depth));
                    }
                    Err(ipv6_fib::FibError::NotFound) => {
                        prop_assert!(!reference.contains(addr, depth));
                    }
                    Err(e) => prop_assert!(false, "unexpected DEL error: {e:?}"),
                }
            }

            for &sample in &samples {
                let expected = reference.best_match(u128::from(sample), DEFAULT_NH);
                prop_assert_eq!(fib.lookup(sample), expected);
            }
        }
    }

    /// P3: re-adding a prefix with the next-hop it already has is a no-op —
    /// the RIB, dataplane and pool accounting are untouched.
    #[test]
    fn duplicate_add_is_a_no_op(
        ops in prop::collection::vec((0..CATALOG.len(), any::<u16>()), 0..15),
        idx in 0..CATALOG.len(),
        nh in any::<u16>(),
    ) {
        let mut fib = new_fib();
        for (i, n) in ops {
            let (addr, depth) = catalog_entry(i);
            let _ = fib.modify(Ipv6Addr::from(addr), depth, n as u64, Op::Add);
        }

        let (addr, depth) = catalog_entry(idx);
        let nh = nh as u64;
        if fib.modify(Ipv6Addr::from(addr), depth, nh, Op::Add).is_ok() {
            let before = (fib.stats().rib_len, fib.stats().rsvd_tbl8s, fib.stats().tbl8_available);
            fib.modify(Ipv6Addr::from(addr), depth, nh, Op::Add).unwrap();
            let after = (fib.stats().rib_len, fib.stats().rsvd_tbl8s, fib.stats().tbl8_available);
            prop_assert_eq!(before, after);
        }
    }

    /// P4: deleting a prefix that was never added reports `NotFound` and
    /// touches neither the RIB nor the dataplane.
    #[test]
    fn delete_of_absent_prefix_is_rejected_and_inert(
        ops in prop::collection::vec((0..CATALOG.len(), any::<u16>()), 0..15),
        idx in 0..CATALOG.len(),
    ) {
        let mut fib = new_fib();
        for (i, n) in ops {
            let (addr, depth) = catalog_entry(i);
            let _ = fib.modify(Ipv6Addr::from(addr), depth, n as u64, Op::Add);
        }

        let (addr, depth) = catalog_entry(idx);
        // Make sure it is genuinely absent before probing.
        let _ = fib.modify(Ipv6Addr::from(addr), depth, 0, Op::Del);

        let before = (fib.stats().rib_len, fib.stats().rsvd_tbl8s, fib.stats().tbl8_available);
        let result = fib.modify(Ipv6Addr::from(addr), depth, 0, Op::Del);
        let after = (fib.stats().rib_len, fib.stats().rsvd_tbl8s, fib.stats().tbl8_available);

        prop_assert_eq!(result, Err(ipv6_fib::FibError::NotFound));
        prop_assert_eq!(before, after);
    }

    /// P5: the pool's accounting of groups handed out always matches the
    /// number of `TBL8` groups actually reachable from `TBL24` — the
    /// heuristic `rsvd_tbl8s` counter may over-approximate (it is admission
    /// control, not an exact tally), but `num_tbl8 - tbl8_available` is the
    /// pool's own ledger and must equal the live structure exactly.
    #[test]
    fn pool_accounting_matches_reachable_groups(
        ops in prop::collection::vec((0..CATALOG.len(), any::<bool>(), any::<u16>()), 1..40)
    ) {
        let mut fib = new_fib();
        for (idx, is_add, nh) in ops {
            let (addr, depth) = catalog_entry(idx);
            if is_add {
                let _ = fib.modify(Ipv6Addr::from(addr), depth, nh as u64, Op::Add);
            } else {
                let _ = fib.modify(Ipv6Addr::from(addr), depth, 0, Op::Del);
            }
            let stats = fib.stats();
            let handed_out = stats.num_tbl8 - stats.tbl8_available as u32;
            prop_assert_eq!(handed_out, fib.dp_reachable_tbl8_groups());
        }
    }

    /// P7: no reachable `TBL8` group is left in a collapsible (256 identical
    /// terminal entries) state — `try_recycle` runs to completion on every
    /// mutation.
    #[test]
    fn no_collapsible_group_survives_a_mutation(
        ops in prop::collection::vec((0..CATALOG.len(), any::<bool>(), any::<u16>()), 1..40)
    ) {
        let mut fib = new_fib();
        for (idx, is_add, nh) in ops {
            let (addr, depth) = catalog_entry(idx);
            if is_add {
                let _ = fib.modify(Ipv6Addr::from(addr), depth, nh as u64, Op::Add);
            } else {
                let _ = fib.modify(Ipv6Addr::from(addr), depth, 0, Op::Del);
            }
            prop_assert!(!fib.dp_has_recyclable_group());
        }
    }
}
