use crate::core::oracle::Puzzle;
use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{current_timestamp, sha256_hex, to_canonical_json};
use log::info;
use serde::{Deserialize, Serialize};

/// Hash-link marker carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Genesis is timestamped at the start of the hunt so every node derives the same block
pub const GENESIS_TIMESTAMP: f64 = 1750723200.0;

/// What a block carries besides its transactions.
///
/// An artifact block publishes the next puzzle; a settlement block records
/// who forged it. Only an artifact tip can be minted against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockPayload {
    Artifact { puzzle: Puzzle },
    Settlement { forger: String },
}

impl BlockPayload {
    pub fn is_artifact(&self) -> bool {
        matches!(self, BlockPayload::Artifact { .. })
    }

    pub fn get_puzzle(&self) -> Option<&Puzzle> {
        match self {
            BlockPayload::Artifact { puzzle } => Some(puzzle),
            BlockPayload::Settlement { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    index: u64,
    transactions: Vec<Transaction>,
    timestamp: f64,
    previous_hash: String,
    // Records written by other nodes may carry `"data": null`
    #[serde(default)]
    data: Option<BlockPayload>,
    nonce: u64,
    hash: String,
}

impl Block {
    /// Seal a new block on top of `previous_hash`, stamped with the current time.
    pub fn new_block(
        index: u64,
        transactions: Vec<Transaction>,
        previous_hash: &str,
        data: BlockPayload,
    ) -> Result<Block> {
        Self::with_timestamp(index, transactions, current_timestamp()?, previous_hash, data)
    }

    pub fn with_timestamp(
        index: u64,
        transactions: Vec<Transaction>,
        timestamp: f64,
        previous_hash: &str,
        data: BlockPayload,
    ) -> Result<Block> {
        let mut block = Block {
            index,
            transactions,
            timestamp,
            previous_hash: previous_hash.to_string(),
            data: Some(data),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash()?;
        info!(
            "Sealed block #{} with {} transactions: {}",
            block.index,
            block.transactions.len(),
            block.hash
        );
        Ok(block)
    }

    /// The genesis block carries the first puzzle and no transactions
    pub fn generate_genesis_block(first_puzzle: Puzzle) -> Result<Block> {
        Self::with_timestamp(
            0,
            Vec::new(),
            GENESIS_TIMESTAMP,
            GENESIS_PREVIOUS_HASH,
            BlockPayload::Artifact {
                puzzle: first_puzzle,
            },
        )
    }

    /// SHA-256 over index, transactions, timestamp, previous hash, payload and nonce, concatenated.
    pub fn calculate_hash(&self) -> Result<String> {
        let preimage = format!(
            "{}{}{}{}{}{}",
            self.index,
            to_canonical_json(&self.transactions)?,
            to_canonical_json(&self.timestamp)?,
            self.previous_hash,
            to_canonical_json(&self.data)?,
            self.nonce
        );
        Ok(sha256_hex(preimage.as_bytes()))
    }

    /// Stored hash matches the recomputed one
    pub fn has_valid_hash(&self) -> bool {
        matches!(self.calculate_hash(), Ok(hash) if hash == self.hash)
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    /// `None` for an untyped record, which is neither an artifact nor a settlement
    pub fn get_data(&self) -> Option<&BlockPayload> {
        self.data.as_ref()
    }

    pub fn is_artifact(&self) -> bool {
        self.data.as_ref().is_some_and(BlockPayload::is_artifact)
    }

    pub fn get_puzzle(&self) -> Option<&Puzzle> {
        self.data.as_ref().and_then(BlockPayload::get_puzzle)
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    /// Overwrite the transactions without resealing (for testing only)
    #[cfg(test)]
    pub fn tamper_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }
}
