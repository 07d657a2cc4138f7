//! The dataplane: fixed-size `TBL24`/`TBL8` storage (`table`), the `TBL8`
//! group allocator (`pool`), the transactional range-rewrite algorithm that
//! keeps the dataplane in sync with the RIB (`mutator`), and the read-only
//! lookup kernel (`lookup`).

pub mod lookup;
pub mod mutator;
pub mod pool;
pub mod table;

pub use table::{DpTable, Entry, EntryRef, TBL24_LEN, TBL8_GROUP_LEN};
