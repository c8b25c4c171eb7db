//! Configuration management
//!
//! This module handles the node settings: where the chain is stored, the
//! fee rate, the genesis seed phrase and how peers are reached.

pub mod settings;

pub use settings::{Config, Settings, GLOBAL_CONFIG};
