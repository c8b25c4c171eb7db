//! Test helpers for ledger testing
//!
//! Isolated chains in temporary directories, funded identities and an
//! in-memory stand-in for peers.

pub mod test_utils;

pub use test_utils::*;
