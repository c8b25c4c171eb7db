//! Test utilities for ledger testing

use crate::core::fees::FeePolicy;
use crate::core::solver::solve;
use crate::core::{Block, Blockchain, Transaction};
use crate::error::{LedgerError, Result};
use crate::network::{PeerChain, PeerClient};
use crate::storage::ChainStore;
use crate::wallet::Identity;
use serde_json::Map;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Address that receives mint rewards in tests
pub const TEST_SOLVER: &str = "test-solver";

/// Create a temporary directory for testing
pub fn create_temp_dir() -> Result<TempDir> {
    tempfile::tempdir().map_err(LedgerError::from)
}

/// Create a test ledger with temporary storage
pub fn create_test_blockchain() -> Result<(Blockchain, TempDir)> {
    let temp_dir = create_temp_dir()?;
    let store = ChainStore::new(temp_dir.path().join("chain.json"));
    let blockchain = Blockchain::open(store, FeePolicy::default())?;
    Ok((blockchain, temp_dir))
}

/// A signed transfer from `identity`
pub fn signed_transfer(identity: &Identity, recipient: &str, amount: u64) -> Transaction {
    Transaction::signed(identity, recipient, amount, Map::new())
        .expect("signing with a fresh identity")
}

/// Credit `address` by slipping a reward into the pool and minting the current puzzle.
///
/// The tip stays an artifact block, so the chain can still be minted afterwards.
pub fn fund_address(blockchain: &mut Blockchain, address: &str, amount: u64) -> Block {
    let credit = Transaction::new_mint_reward(address, amount).expect("clock available");
    blockchain
        .submit_transaction(credit)
        .expect("reserved senders are accepted");
    let puzzle = blockchain
        .current_puzzle()
        .expect("funding needs an artifact tip");
    let answer = solve(puzzle, 0).expect("cipher puzzles solve from their clue");
    blockchain
        .attempt_mint(TEST_SOLVER, &answer)
        .expect("mint with the right answer")
}

/// Peers served from memory. Unknown endpoints behave like unreachable hosts.
#[derive(Default)]
pub struct FakePeers {
    chains: HashMap<String, Vec<Block>>,
    requests: AtomicUsize,
}

impl FakePeers {
    pub fn insert(&mut self, peer: &str, chain: Vec<Block>) {
        self.chains.insert(peer.to_string(), chain);
    }

    /// How many reads have been made across all peers
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PeerClient for FakePeers {
    fn fetch_chain(&self, peer: &str) -> Result<PeerChain> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.chains.get(peer) {
            Some(chain) => Ok(PeerChain {
                length: chain.len(),
                chain: chain.clone(),
            }),
            None => Err(LedgerError::Network(format!("Connection refused: {peer}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_blockchain() {
        let (blockchain, _temp_dir) = create_test_blockchain().unwrap();
        assert_eq!(blockchain.len(), 1);
        assert!(blockchain.current_puzzle().is_some());
    }

    #[test]
    fn test_fund_address() {
        let (mut blockchain, _temp_dir) = create_test_blockchain().unwrap();
        let block = fund_address(&mut blockchain, "alice", 42);

        assert_eq!(blockchain.balance("alice"), 42);
        assert!(block.is_artifact());
        assert!(blockchain.current_puzzle().is_some());
    }

    #[test]
    fn test_fake_peers() {
        let mut peers = FakePeers::default();
        peers.insert("http://a", vec![]);

        assert_eq!(peers.fetch_chain("http://a").unwrap().length, 0);
        assert!(peers.fetch_chain("http://b").is_err());
        assert_eq!(peers.requests(), 2);
    }
}
