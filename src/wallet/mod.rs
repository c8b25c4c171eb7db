//! Identity management and cryptographic operations
//!
//! This module handles keypair creation, address derivation and signing.

#[allow(clippy::module_inception)]
pub mod wallet;

pub use wallet::{decode_address, Identity, IdentityExport, PUBLIC_KEY_LEN};
