//! An IPv6 forwarding information base: a radix-tree RIB kept in sync with
//! a DIR-24-8-style `TBL24`/`TBL8` dataplane trie.
//!
//! The RIB ([`rib::Rib`]) is the authoritative `(prefix, depth) -> next_hop`
//! dictionary; the dataplane ([`dp::DpTable`]) is a flattened, branch-light
//! structure built for longest-prefix-match lookup at line rate. [`fib::Fib`]
//! is the facade that keeps the two consistent across `ADD`/`DEL` and hands
//! out lookup closures bound to the dataplane's current state.

pub mod dp;
pub mod error;
pub mod fib;
pub mod prefix;
pub mod rib;
pub mod snapshot;

pub use error::{FibError, SnapshotError};
pub use fib::{Fib, FibConfig, FibStats, LookupKind, NhWidth, Op};
pub use prefix::Prefix;
