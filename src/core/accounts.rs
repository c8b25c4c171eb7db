// Balances are never stored anywhere. I replay the confirmed chain every time,
// the same way a full node rebuilds its view from genesis.

use crate::core::monetary::{Amount, Balance};
use crate::core::{is_reserved_sender, Block, Transaction};
use serde::Serialize;

/// Balance and history of one address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressData {
    pub address: String,
    pub balance: Balance,
    pub transactions: Vec<Transaction>,
    pub count: usize,
}

fn signed(amount: Amount) -> Balance {
    Balance::try_from(amount).unwrap_or(Balance::MAX)
}

/// Effect of a single transaction on `address`
fn delta(tx: &Transaction, address: &str, fee_rate: Amount) -> Balance {
    let mut delta: Balance = 0;
    if tx.get_recipient() == address {
        delta = delta.saturating_add(signed(tx.get_amount()));
    }
    if tx.get_sender() == address {
        delta = delta.saturating_sub(signed(tx.get_amount()));
        if !is_reserved_sender(tx.get_sender()) {
            delta = delta.saturating_sub(signed(fee_rate));
        }
    }
    delta
}

/// Confirmed balance: received minus sent minus one fee per sent transaction
pub fn balance_of(chain: &[Block], address: &str, fee_rate: Amount) -> Balance {
    chain
        .iter()
        .flat_map(|block| block.get_transactions())
        .fold(0, |balance: Balance, tx| {
            balance.saturating_add(delta(tx, address, fee_rate))
        })
}

/// Balance plus every confirmed transaction touching `address`, in chain order
pub fn address_data(chain: &[Block], address: &str, fee_rate: Amount) -> AddressData {
    let mut balance: Balance = 0;
    let mut transactions = Vec::new();

    for tx in chain.iter().flat_map(|block| block.get_transactions()) {
        if tx.get_sender() == address || tx.get_recipient() == address {
            balance = balance.saturating_add(delta(tx, address, fee_rate));
            transactions.push(tx.clone());
        }
    }

    AddressData {
        address: address.to_string(),
        balance,
        count: transactions.len(),
        transactions,
    }
}

/// What `sender` has already committed in pooled transactions, fees included
pub fn pending_outflow<'a, I>(pending: I, sender: &str, fee_rate: Amount) -> Amount
where
    I: IntoIterator<Item = &'a Transaction>,
{
    pending
        .into_iter()
        .filter(|tx| tx.get_sender() == sender)
        .fold(0, |total: Amount, tx| {
            total
                .saturating_add(tx.get_amount())
                .saturating_add(fee_rate)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::BlockPayload;
    use crate::core::{MINT_REWARD, NETWORK_FEES};
    use serde_json::Map;

    fn tx(sender: &str, recipient: &str, amount: Amount) -> Transaction {
        Transaction::new(sender, recipient, amount, 1.0, Map::new())
    }

    fn block(index: u64, transactions: Vec<Transaction>) -> Block {
        Block::with_timestamp(
            index,
            transactions,
            index as f64,
            "prev",
            BlockPayload::Settlement {
                forger: "forger".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_balance_replay() {
        let chain = vec![
            block(0, vec![tx(MINT_REWARD, "alice", 5_000_000)]),
            block(
                1,
                vec![tx(NETWORK_FEES, "forger", 1_000), tx("alice", "bob", 2_000_000)],
            ),
        ];

        assert_eq!(balance_of(&chain, "alice", 1_000), 2_999_000);
        assert_eq!(balance_of(&chain, "bob", 1_000), 2_000_000);
        assert_eq!(balance_of(&chain, "forger", 1_000), 1_000);
        assert_eq!(balance_of(&chain, "nobody", 1_000), 0);
    }

    #[test]
    fn test_reserved_senders_pay_no_fee() {
        let chain = vec![block(0, vec![tx(MINT_REWARD, "alice", 10)])];
        assert_eq!(balance_of(&chain, MINT_REWARD, 1_000), -10);
    }

    #[test]
    fn test_foreign_chain_can_go_negative() {
        let chain = vec![block(0, vec![tx("alice", "bob", 500)])];
        assert_eq!(balance_of(&chain, "alice", 1_000), -1_500);
    }

    #[test]
    fn test_address_data_lists_each_transaction_once() {
        let chain = vec![
            block(0, vec![tx(MINT_REWARD, "alice", 3_000)]),
            block(1, vec![tx("alice", "alice", 1_000), tx("bob", "carol", 1)]),
        ];

        let data = address_data(&chain, "alice", 100);
        assert_eq!(data.count, 2);
        assert_eq!(data.transactions.len(), 2);
        // Self transfer: +1000 -1000 -100
        assert_eq!(data.balance, 2_900);
        assert_eq!(data.balance, balance_of(&chain, "alice", 100));
    }

    #[test]
    fn test_pending_outflow() {
        let pending = vec![tx("alice", "bob", 4_000_000), tx("bob", "carol", 7)];
        assert_eq!(pending_outflow(&pending, "alice", 1_000), 4_001_000);
        assert_eq!(pending_outflow(&pending, "carol", 1_000), 0);
    }
}
