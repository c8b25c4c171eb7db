/// Hunt token monetary system
///
/// Amounts are integers of the smallest unit so fee arithmetic stays exact.
///
/// ## Monetary Units
/// - **Unit**: the smallest indivisible amount
/// - **Token**: 1,000,000 units
/// - **Mint reward**: 1 token plus the fees of the transactions it confirms
/// - **Fee rate**: 1,000 units (0.001 tokens) per transaction
///
/// Amount carried by a transaction, in units
pub type Amount = u64;

/// Signed balance in units; a replayed peer chain can leave an address negative
pub type Balance = i64;

/// Number of units in one token
pub const UNITS_PER_TOKEN: Amount = 1_000_000;

/// Base reward for solving a puzzle (1 token)
pub const BASE_MINT_REWARD: Amount = UNITS_PER_TOKEN;

/// Default flat fee charged per transaction (0.001 tokens)
pub const DEFAULT_FEE_RATE: Amount = 1_000;

/// Utility functions for monetary conversions
pub mod conversions {
    use super::*;

    /// Convert tokens to units, rounding to the nearest unit
    ///
    /// # Examples
    /// ```
    /// use hunt_chain::core::monetary::conversions::tokens_to_units;
    /// assert_eq!(tokens_to_units(1.0), 1_000_000);
    /// assert_eq!(tokens_to_units(0.001), 1_000);
    /// ```
    pub fn tokens_to_units(tokens: f64) -> Amount {
        if tokens <= 0.0 {
            return 0;
        }
        (tokens * UNITS_PER_TOKEN as f64).round() as Amount
    }

    /// Format a signed balance as a human-readable string
    ///
    /// # Examples
    /// ```
    /// use hunt_chain::core::monetary::conversions::format_balance;
    /// assert_eq!(format_balance(1_000_000), "1.000000 tokens");
    /// assert_eq!(format_balance(-1_000), "-0.001000 tokens");
    /// ```
    pub fn format_balance(balance: Balance) -> String {
        let sign = if balance < 0 { "-" } else { "" };
        let magnitude = balance.unsigned_abs();
        format!(
            "{sign}{}.{:06} tokens",
            magnitude / UNITS_PER_TOKEN,
            magnitude % UNITS_PER_TOKEN
        )
    }

    /// Parse a decimal token string ("4.999") into units without going through floats
    pub fn parse_tokens(text: &str) -> Option<Amount> {
        let text = text.trim();
        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if fraction.len() > 6 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let whole: Amount = if whole.is_empty() {
            0
        } else {
            whole.parse().ok()?
        };
        let fraction_units: Amount = if fraction.is_empty() {
            0
        } else {
            format!("{fraction:0<6}").parse().ok()?
        };
        whole
            .checked_mul(UNITS_PER_TOKEN)?
            .checked_add(fraction_units)
    }
}
