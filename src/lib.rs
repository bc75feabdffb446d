//! Inclusive two-level cache hierarchy simulator: the same memory-reference
//! stream is replayed through independent L1/L2 hierarchies, one per L2
//! replacement policy (LRU, SRRIP, NRU), so their statistics are directly
//! comparable.

pub mod cache;
pub mod config;
pub mod replace;
pub mod stats;
pub mod trace;
