//! Error handling for the ledger
//!
//! Every fallible operation in the crate returns [`LedgerError`]. Validation
//! failures and consensus rejections are ordinary values here: callers get
//! them back synchronously and can retry, nothing in the engine treats them
//! as fatal.

use crate::core::monetary::{Amount, Balance};
use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types for ledger operations
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Malformed transaction or a signature that does not verify
    InvalidTransaction(String),
    /// Puzzle seed that is not a hex string
    InvalidSeed(String),
    /// Address that cannot be used as a public key
    InvalidAddress(String),
    /// Block index outside the chain
    BlockNotFound(u64),
    /// Block whose hash or link does not check out
    InvalidBlock(String),
    /// Sender cannot cover amount plus fee
    InsufficientFunds { required: Amount, available: Balance },
    /// Forging requires at least one pending transaction
    EmptyPool,
    /// Minting requires the latest block to carry a puzzle
    NotArtifactBlock { index: u64 },
    /// The proposed puzzle solution was wrong
    IncorrectSolution,
    /// The same puzzle was already published, and solved, earlier in the chain
    PuzzleAlreadySolved,
    /// Cryptographic operation errors
    Crypto(String),
    /// Peer communication errors
    Network(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
}

impl LedgerError {
    /// Consensus rejections: non-fatal, leave state untouched, safe to retry.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientFunds { .. }
                | LedgerError::EmptyPool
                | LedgerError::NotArtifactBlock { .. }
                | LedgerError::IncorrectSolution
                | LedgerError::PuzzleAlreadySolved
        )
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            LedgerError::InvalidSeed(seed) => write!(f, "Invalid puzzle seed: {seed}"),
            LedgerError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            LedgerError::BlockNotFound(index) => write!(f, "Block not found: {index}"),
            LedgerError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            LedgerError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            LedgerError::EmptyPool => write!(f, "No pending transactions to forge"),
            LedgerError::NotArtifactBlock { index } => write!(
                f,
                "Block #{index} is a settlement block and carries no puzzle"
            ),
            LedgerError::IncorrectSolution => write!(f, "Incorrect puzzle solution"),
            LedgerError::PuzzleAlreadySolved => write!(f, "This puzzle has already been solved"),
            LedgerError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            LedgerError::Network(msg) => write!(f, "Network error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

impl From<tempfile::PersistError> for LedgerError {
    fn from(err: tempfile::PersistError) -> Self {
        LedgerError::Io(err.error.to_string())
    }
}
