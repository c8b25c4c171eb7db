use crate::core::monetary::{Amount, BASE_MINT_REWARD, DEFAULT_FEE_RATE};
use log::info;

/// Flat fee policy: every transaction costs the same, regardless of size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    /// Fee charged per transaction, in units
    pub fee_rate: Amount,
    /// Base reward paid to a puzzle solver
    pub mint_reward: Amount,
}

impl FeePolicy {
    pub fn new(fee_rate: Amount) -> Self {
        Self {
            fee_rate,
            mint_reward: BASE_MINT_REWARD,
        }
    }

    pub fn fee_rate(&self) -> Amount {
        self.fee_rate
    }

    /// Fees collected by a block confirming `transaction_count` transactions
    pub fn calculate_total_fees(&self, transaction_count: usize) -> Amount {
        self.fee_rate.saturating_mul(transaction_count as Amount)
    }

    /// What a sender must hold to move `amount`
    pub fn required_for(&self, amount: Amount) -> Amount {
        amount.saturating_add(self.fee_rate)
    }

    /// Reward for a forger: only the fees
    pub fn calculate_forge_reward(&self, transaction_count: usize) -> Amount {
        self.calculate_total_fees(transaction_count)
    }

    /// Reward for a puzzle solver: the base reward plus the fees
    pub fn calculate_mint_reward(&self, transaction_count: usize) -> Amount {
        let total_fees = self.calculate_total_fees(transaction_count);
        info!(
            "Mint reward: {} base + {} fees from {} transactions",
            self.mint_reward, total_fees, transaction_count
        );
        self.mint_reward.saturating_add(total_fees)
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_RATE)
    }
}
