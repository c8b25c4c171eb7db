//! # Hunt Chain - The Ledger Behind the Puzzle Hunt
//!
//! This is the ledger that backs the token hunt. When I come back to this
//! code, here's what I need to remember:
//!
//! ## What I Built
//! - **Hash-linked chain**: blocks carry either the next puzzle or a settlement marker
//! - **Signed transfers**: ECDSA P-384 signatures over a canonical JSON form
//! - **Amnesiac oracle**: puzzles publish a hash of the answer, never the answer
//! - **Two ways to grow**: forging collects fees, minting rewards a puzzle solver
//! - **Longest chain wins**: peers are read over plain HTTP and a strictly longer chain replaces ours
//!
//! ## How I Organized My Code
//! - `core/`: blocks, transactions, the oracle, accounting and the engine itself
//! - `wallet/`: identities and address decoding
//! - `network/`: peer registry, the peer client and the `/chain` endpoint
//! - `storage/`: the pending pool and the JSON chain snapshot
//! - `config/`: node settings from file and environment
//! - `utils/`: hashing, signing, hex and JSON helpers
//! - `cli/`: command-line interface for every caller-facing operation
//!
//! ## Key Design Decisions I Made
//! - Amounts are integer units (1 token = 1,000,000 units) so fees stay exact
//! - Balances are replayed from the chain instead of being indexed
//! - The snapshot is written to a temp file and renamed over the old one
//! - Peer chains are trusted as they arrive; `verify` audits after the fact
//!
//! ## When I Need to Understand Something
//! 1. Start with `main.rs` to see the CLI commands
//! 2. Look at `core/blockchain.rs` for submit, forge, mint and resolution
//! 3. Check `core/oracle.rs` for how puzzles are generated and checked
//! 4. Review `core/transaction.rs` for the signing contract

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use core::{
    AddressData, Block, BlockPayload, Blockchain, FeePolicy, Puzzle, PuzzleOracle, Resolution,
    SharedBlockchain, Transaction,
};
pub use error::{LedgerError, Result};
pub use network::{ChainServer, HttpPeerClient, Node, Nodes, PeerChain, PeerClient};
pub use storage::{ChainStore, MemoryPool};
pub use utils::{current_timestamp, sha256_digest, sha256_hex};
pub use wallet::{Identity, IdentityExport};
