// This is the ledger engine - every state change in the hunt goes through here
// I keep the whole chain in memory and write it out as a single JSON snapshot after each change
// Balances are replayed from the chain, and new blocks come from either forging (collecting fees)
// or minting (solving the puzzle the latest block published)

use crate::core::accounts::{self, AddressData};
use crate::core::block::{Block, BlockPayload, GENESIS_PREVIOUS_HASH};
use crate::core::fees::FeePolicy;
use crate::core::monetary::Balance;
use crate::core::oracle::{Puzzle, PuzzleOracle};
use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::network::{Node, Nodes, PeerClient};
use crate::storage::{ChainStore, MemoryPool};
use crate::utils::sha256_hex;
use log::{error, info, warn};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Phrase the very first puzzle is derived from
pub const GENESIS_SEED_PHRASE: &str = "The Hunt Begins 2025-06-24";

/// Difficulty of the puzzle published in genesis
const GENESIS_DIFFICULTY: u64 = 1;

/// Outcome of a conflict resolution round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A strictly longer peer chain was adopted
    Replaced,
    /// No peer offered anything longer; the local chain stands
    Authoritative,
}

pub struct Blockchain {
    chain: Vec<Block>,
    pending: MemoryPool,
    peers: Nodes,
    fees: FeePolicy,
    store: ChainStore,
}

impl Blockchain {
    // When I start a node: load the snapshot, or fall back to a fresh genesis
    pub fn open(store: ChainStore, fees: FeePolicy) -> Result<Blockchain> {
        Self::open_with_seed_phrase(store, fees, GENESIS_SEED_PHRASE)
    }

    pub fn open_with_seed_phrase(
        store: ChainStore,
        fees: FeePolicy,
        seed_phrase: &str,
    ) -> Result<Blockchain> {
        let (chain, fresh) = match store.load() {
            Some(chain) => (chain, false),
            None => {
                info!("Creating genesis block from seed phrase {seed_phrase:?}");
                (vec![Self::genesis_block(seed_phrase)?], true)
            }
        };

        if let Err(e) = Self::verify_chain(&chain) {
            warn!("Loaded chain does not verify: {e}");
        }

        let blockchain = Blockchain {
            chain,
            pending: MemoryPool::new(),
            peers: Nodes::new(),
            fees,
            store,
        };
        if fresh {
            blockchain.persist();
        }
        Ok(blockchain)
    }

    /// Genesis depends only on the seed phrase, so every fresh node agrees on it
    pub fn genesis_block(seed_phrase: &str) -> Result<Block> {
        let seed = sha256_hex(seed_phrase.as_bytes());
        let first_puzzle = PuzzleOracle::create_puzzle(GENESIS_DIFFICULTY, &seed)?;
        Block::generate_genesis_block(first_puzzle)
    }

    // Persistence failures are logged and the in-memory state is kept as is
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.chain) {
            error!(
                "Failed to persist chain to {}: {e}",
                self.store.get_path().display()
            );
        }
    }

    // When someone submits a transfer: signature first, then funds
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<()> {
        tx.check_well_formed()?;
        if !tx.is_valid() {
            return Err(LedgerError::InvalidTransaction(
                "Signature verification failed".to_string(),
            ));
        }

        if !tx.is_reward() {
            let required = self.fees.required_for(tx.get_amount());
            let available = self.available_balance(tx.get_sender());
            if available < Balance::try_from(required).unwrap_or(Balance::MAX) {
                return Err(LedgerError::InsufficientFunds {
                    required,
                    available,
                });
            }
        }

        info!(
            "Accepted transaction of {} units into the pool ({} pending)",
            tx.get_amount(),
            self.pending.len() + 1
        );
        self.pending.add(tx);
        Ok(())
    }

    // When a forger wants the fees of everything waiting in the pool
    pub fn forge_block(&mut self, forger: &str) -> Result<Block> {
        if self.pending.is_empty() {
            return Err(LedgerError::EmptyPool);
        }

        let total_fees = self.fees.calculate_forge_reward(self.pending.len());
        let fee_tx = Transaction::new_fee_reward(forger, total_fees)?;

        let mut transactions = Vec::with_capacity(self.pending.len() + 1);
        transactions.push(fee_tx);
        transactions.extend(self.pending.iter().cloned());

        let block = Block::new_block(
            self.chain.len() as u64,
            transactions,
            self.latest_block()?.get_hash(),
            BlockPayload::Settlement {
                forger: forger.to_string(),
            },
        )?;

        self.append(block.clone());
        info!(
            "Forged block #{} collecting {total_fees} units in fees",
            block.get_index()
        );
        Ok(block)
    }

    // When a solver claims the puzzle on the latest block
    // Everything that can fail happens before I touch the chain or the pool
    pub fn attempt_mint(&mut self, solver: &str, solution: &str) -> Result<Block> {
        let latest = self.latest_block()?;
        let Some(puzzle) = latest.get_puzzle() else {
            return Err(LedgerError::NotArtifactBlock {
                index: latest.get_index(),
            });
        };

        if !puzzle.verify(solution) {
            info!("Rejected mint attempt on block #{}", latest.get_index());
            return Err(LedgerError::IncorrectSolution);
        }

        let already_solved = self.chain[..self.chain.len() - 1]
            .iter()
            .any(|block| block.get_puzzle() == Some(puzzle));
        if already_solved {
            return Err(LedgerError::PuzzleAlreadySolved);
        }

        let next_difficulty = self.artifact_count() as u64 + 1;
        let next_puzzle = PuzzleOracle::create_puzzle(next_difficulty, latest.get_hash())?;
        let reward = self.fees.calculate_mint_reward(self.pending.len());
        let mint_tx = Transaction::new_mint_reward(solver, reward)?;

        let mut transactions = Vec::with_capacity(self.pending.len() + 1);
        transactions.push(mint_tx);
        transactions.extend(self.pending.iter().cloned());

        let block = Block::new_block(
            self.chain.len() as u64,
            transactions,
            latest.get_hash(),
            BlockPayload::Artifact {
                puzzle: next_puzzle,
            },
        )?;

        self.append(block.clone());
        info!(
            "Minted block #{} for {} units, next difficulty {next_difficulty}",
            block.get_index(),
            reward
        );
        Ok(block)
    }

    fn append(&mut self, block: Block) {
        self.chain.push(block);
        self.pending.clear();
        self.persist();
    }

    // When I sync with peers - the longest chain wins, but only if it is strictly longer
    pub fn resolve_conflicts(&mut self, client: &dyn PeerClient) -> Resolution {
        let peers = self.peers.get_nodes();
        match Self::longest_peer_chain(client, &peers, self.chain.len()) {
            Some(chain) => {
                self.replace_chain(chain);
                Resolution::Replaced
            }
            None => {
                info!("Our chain is authoritative");
                Resolution::Authoritative
            }
        }
    }

    /// Read every peer once and keep the longest chain that beats `current_length`.
    ///
    /// Unreachable or malformed peers are skipped. The winning chain is not
    /// verified; callers wanting that run [`Blockchain::verify_chain`].
    pub fn longest_peer_chain(
        client: &dyn PeerClient,
        peers: &[Node],
        current_length: usize,
    ) -> Option<Vec<Block>> {
        let mut best: Option<Vec<Block>> = None;
        let mut max_length = current_length;

        for peer in peers {
            let peer_chain = match client.fetch_chain(peer.get_addr()) {
                Ok(peer_chain) => peer_chain,
                Err(e) => {
                    warn!("Could not read chain from {}: {e}", peer.get_addr());
                    continue;
                }
            };

            let length = peer_chain.chain.len();
            if peer_chain.length != length {
                warn!(
                    "Peer {} reported length {} but sent {length} blocks",
                    peer.get_addr(),
                    peer_chain.length
                );
            }
            if length > max_length {
                max_length = length;
                best = Some(peer_chain.chain);
            }
        }
        best
    }

    fn replace_chain(&mut self, chain: Vec<Block>) {
        info!(
            "Replacing chain of {} blocks with a longer one of {}",
            self.chain.len(),
            chain.len()
        );
        self.chain = chain;
        self.persist();
    }

    /// Audit hashes, links and signatures of a chain
    pub fn verify_chain(chain: &[Block]) -> Result<()> {
        let Some(genesis) = chain.first() else {
            return Err(LedgerError::InvalidBlock("Chain is empty".to_string()));
        };
        if genesis.get_previous_hash() != GENESIS_PREVIOUS_HASH {
            return Err(LedgerError::InvalidBlock(
                "Genesis block does not start the chain".to_string(),
            ));
        }

        for (position, block) in chain.iter().enumerate() {
            if block.get_index() != position as u64 {
                return Err(LedgerError::InvalidBlock(format!(
                    "Block at position {position} claims index {}",
                    block.get_index()
                )));
            }
            if !block.has_valid_hash() {
                return Err(LedgerError::InvalidBlock(format!(
                    "Block #{position} hash does not match its contents"
                )));
            }
            if position > 0 && block.get_previous_hash() != chain[position - 1].get_hash() {
                return Err(LedgerError::InvalidBlock(format!(
                    "Block #{position} does not link to its predecessor"
                )));
            }
            if let Some(tx) = block.get_transactions().iter().find(|tx| !tx.is_valid()) {
                return Err(LedgerError::InvalidBlock(format!(
                    "Block #{position} carries an invalid transaction from {}",
                    tx.get_sender()
                )));
            }
        }
        Ok(())
    }

    pub fn register_peer(&mut self, endpoint: &str) -> bool {
        let added = self.peers.add_node(endpoint);
        if added {
            info!("Registered peer {}", endpoint.trim_end_matches('/'));
        }
        added
    }

    pub fn get_peers(&self) -> Vec<Node> {
        self.peers.get_nodes()
    }

    pub fn balance(&self, address: &str) -> Balance {
        accounts::balance_of(&self.chain, address, self.fees.fee_rate())
    }

    /// Confirmed balance minus what the address has already committed in the pool
    pub fn available_balance(&self, address: &str) -> Balance {
        let committed =
            accounts::pending_outflow(self.pending.iter(), address, self.fees.fee_rate());
        self.balance(address)
            .saturating_sub(Balance::try_from(committed).unwrap_or(Balance::MAX))
    }

    pub fn address_data(&self, address: &str) -> AddressData {
        accounts::address_data(&self.chain, address, self.fees.fee_rate())
    }

    pub fn get_chain(&self) -> &[Block] {
        self.chain.as_slice()
    }

    pub fn get_block(&self, index: u64) -> Result<&Block> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.chain.get(i))
            .ok_or(LedgerError::BlockNotFound(index))
    }

    pub fn latest_block(&self) -> Result<&Block> {
        self.chain
            .last()
            .ok_or_else(|| LedgerError::InvalidBlock("Chain is empty".to_string()))
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        self.pending.get_all()
    }

    /// Puzzle published by the latest block, if it is an artifact block
    pub fn current_puzzle(&self) -> Option<&Puzzle> {
        self.chain.last().and_then(Block::get_puzzle)
    }

    pub fn artifact_count(&self) -> usize {
        self.chain
            .iter()
            .filter(|block| block.is_artifact())
            .count()
    }

    pub fn get_store(&self) -> &ChainStore {
        &self.store
    }
}

/// The engine behind one lock: mutations take the write side for their whole
/// validate, append and persist sequence, queries share the read side.
#[derive(Clone)]
pub struct SharedBlockchain {
    inner: Arc<RwLock<Blockchain>>,
}

impl SharedBlockchain {
    pub fn new(blockchain: Blockchain) -> SharedBlockchain {
        SharedBlockchain {
            inner: Arc::new(RwLock::new(blockchain)),
        }
    }

    // Poisoned locks are recovered; every mutation lands as a single push or swap
    pub fn read(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Blockchain> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn submit_transaction(&self, tx: Transaction) -> Result<()> {
        self.write().submit_transaction(tx)
    }

    pub fn forge_block(&self, forger: &str) -> Result<Block> {
        self.write().forge_block(forger)
    }

    pub fn attempt_mint(&self, solver: &str, solution: &str) -> Result<Block> {
        self.write().attempt_mint(solver, solution)
    }

    pub fn register_peer(&self, endpoint: &str) -> bool {
        self.write().register_peer(endpoint)
    }

    /// Peers are read with no lock held; the length check is repeated under the write lock.
    pub fn resolve_conflicts(&self, client: &dyn PeerClient) -> Resolution {
        let (peers, current_length) = {
            let guard = self.read();
            (guard.get_peers(), guard.len())
        };

        let Some(chain) = Blockchain::longest_peer_chain(client, &peers, current_length) else {
            info!("Our chain is authoritative");
            return Resolution::Authoritative;
        };

        let mut guard = self.write();
        if chain.len() > guard.len() {
            guard.replace_chain(chain);
            Resolution::Replaced
        } else {
            info!("Local chain grew while peers were read; keeping it");
            Resolution::Authoritative
        }
    }

    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.read().get_chain().to_vec()
    }
}
