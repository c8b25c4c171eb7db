//! Core ledger functionality
//!
//! This module contains the fundamental ledger components including
//! blocks, transactions, the puzzle oracle and the engine that forges
//! and mints new blocks.

pub mod accounts;
pub mod block;
pub mod blockchain;
pub mod cipher;
pub mod fees;
pub mod monetary;
pub mod oracle;
pub mod solver;
pub mod transaction;

pub use accounts::AddressData;
pub use block::{Block, BlockPayload};
pub use blockchain::{Blockchain, Resolution, SharedBlockchain, GENESIS_SEED_PHRASE};
pub use cipher::CipherKind;
pub use fees::FeePolicy;
pub use monetary::{Amount, Balance, BASE_MINT_REWARD, DEFAULT_FEE_RATE, UNITS_PER_TOKEN};
pub use oracle::{Puzzle, PuzzleOracle};
pub use transaction::{
    is_reserved_sender, sign_payload, SignedPayload, Transaction, MINT_REWARD, NETWORK_FEES,
};
