//! Benchmarks for lookup throughput and `modify` latency.
//!
//! Run with `cargo bench`. Profile a specific benchmark with the `pprof`
//! flamegraph integration, e.g.:
//!
//! ```text
//! cargo bench --bench fib_benchmark -- --profile-time 10
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use ipv6_fib::{Fib, FibConfig, LookupKind, NhWidth, Op};
use pprof::criterion::{Output, PProfProfiler};
use std::net::Ipv6Addr;

fn seeded_fib(num_prefixes: u32, num_tbl8: u32) -> Fib {
    let mut fib = Fib::create(
        "bench",
        FibConfig { default_nh: 1, nh_sz: NhWidth::Four, num_tbl8 },
    )
    .expect("fib creation");
    for i in 0..num_prefixes {
        let addr = Ipv6Addr::new(0x2001, 0x0db8, (i >> 16) as u16, i as u16, 0, 0, 0, 0);
        fib.modify(addr, 48, (i % 1000 + 2) as u64, Op::Add).expect("seed add");
    }
    fib
}

fn benchmark_lookup_bulk_scalar(c: &mut Criterion) {
    let fib = seeded_fib(2000, 8192);
    let lookup = fib.lookup_fn(LookupKind::Scalar).expect("scalar kernel always available");
    let addrs: Vec<Ipv6Addr> = (0..1024u32)
        .map(|i| Ipv6Addr::new(0x2001, 0x0db8, (i >> 16) as u16, i as u16, 0, 0, 0, 1))
        .collect();
    let mut out = vec![0u64; addrs.len()];

    c.bench_function("lookup_bulk_scalar_1024", |b| {
        b.iter(|| lookup(&addrs, &mut out));
    });
}

fn benchmark_modify_add(c: &mut Criterion) {
    c.bench_function("modify_add_48", |b| {
        b.iter_batched(
            || seeded_fib(500, 8192),
            |mut fib| {
                fib.modify("2001:db8:ffff:ffff::".parse().unwrap(), 48, 999, Op::Add).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_modify_del(c: &mut Criterion) {
    c.bench_function("modify_del_48", |b| {
        b.iter_batched(
            || {
                let mut fib = seeded_fib(500, 8192);
                fib.modify("2001:db8:ffff:ffff::".parse().unwrap(), 48, 999, Op::Add).unwrap();
                fib
            },
            |mut fib| {
                fib.modify("2001:db8:ffff:ffff::".parse().unwrap(), 48, 999, Op::Del).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = benchmark_lookup_bulk_scalar, benchmark_modify_add, benchmark_modify_del
}
criterion_main!(benches);
