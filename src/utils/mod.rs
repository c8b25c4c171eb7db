//! Utility functions and helpers
//!
//! This module contains cryptographic utilities, encoding functions,
//! and the JSON helpers used for hashing, signing and storage.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    current_timestamp, ecdsa_p384_sha384_sign, ecdsa_p384_sha384_verify, hex_decode, hex_encode,
    load_key_pair, new_key_pair, sha256_digest, sha256_hex,
};

pub use serialization::{from_json, to_canonical_json, to_pretty_json};
