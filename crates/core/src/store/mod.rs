//! Ledger stores.
//!
//! A store owns the persisted state and runs each engine operation as one
//! unit of work. [`MemoryLedger`] keeps everything in process; the database
//! store lives in `daftar-db`.

mod memory;

pub use memory::{MemoryLedger, SYSTEM_USER};
