//! Data storage and persistence
//!
//! This module manages the pool of pending transactions and the on-disk
//! snapshot of the chain.

pub mod chain_store;
pub mod memory_pool;

pub use chain_store::ChainStore;
pub use memory_pool::MemoryPool;
