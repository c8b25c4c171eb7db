// Value transfers between addresses
// A transaction is signed over its canonical JSON form with the signature itself left out,
// and the two reserved senders are how the engine pays out rewards without a key

use crate::core::monetary::Amount;
use crate::error::{LedgerError, Result};
use crate::utils::{current_timestamp, ecdsa_p384_sha384_verify, hex_decode, to_canonical_json};
use crate::wallet::{decode_address, Identity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sender of the reward paid to a puzzle solver
pub const MINT_REWARD: &str = "MINT_REWARD";
/// Sender of the fee payout to a forger
pub const NETWORK_FEES: &str = "NETWORK_FEES";

pub fn is_reserved_sender(sender: &str) -> bool {
    sender == MINT_REWARD || sender == NETWORK_FEES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    sender: String,
    recipient: String,
    amount: Amount,
    timestamp: f64,
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    data: Map<String, Value>,
}

// Keys in sorted order; this is exactly what gets signed
#[derive(Serialize)]
struct SigningPayload<'a> {
    amount: Amount,
    data: &'a Map<String, Value>,
    recipient: &'a str,
    sender: &'a str,
    timestamp: f64,
}

/// Output of the convenience signer: the signature and the timestamp it covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedPayload {
    pub signature: String,
    pub timestamp: f64,
}

impl Transaction {
    /// An unsigned transfer; `sign` or `with_signature` completes it.
    pub fn new(
        sender: &str,
        recipient: &str,
        amount: Amount,
        timestamp: f64,
        data: Map<String, Value>,
    ) -> Transaction {
        Transaction {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
            timestamp,
            signature: None,
            data,
        }
    }

    /// Build and sign a transfer from `identity` stamped with the current time.
    pub fn signed(
        identity: &Identity,
        recipient: &str,
        amount: Amount,
        data: Map<String, Value>,
    ) -> Result<Transaction> {
        let mut tx = Transaction::new(
            &identity.get_address(),
            recipient,
            amount,
            current_timestamp()?,
            data,
        );
        tx.sign(identity)?;
        Ok(tx)
    }

    /// Reward paid by the engine to a puzzle solver
    pub fn new_mint_reward(to: &str, reward: Amount) -> Result<Transaction> {
        Ok(Transaction::new(
            MINT_REWARD,
            to,
            reward,
            current_timestamp()?,
            Map::new(),
        ))
    }

    /// Fees paid by the engine to a forger
    pub fn new_fee_reward(to: &str, fees: Amount) -> Result<Transaction> {
        Ok(Transaction::new(
            NETWORK_FEES,
            to,
            fees,
            current_timestamp()?,
            Map::new(),
        ))
    }

    pub fn with_signature(mut self, signature: Option<String>) -> Transaction {
        self.signature = signature;
        self
    }

    /// The signed representation: every field except the signature.
    pub fn canonicalize(&self) -> Result<String> {
        to_canonical_json(&SigningPayload {
            amount: self.amount,
            data: &self.data,
            recipient: &self.recipient,
            sender: &self.sender,
            timestamp: self.timestamp,
        })
    }

    pub fn sign(&mut self, identity: &Identity) -> Result<()> {
        if identity.get_address() != self.sender {
            return Err(LedgerError::InvalidTransaction(
                "Signing identity does not match the sender".to_string(),
            ));
        }
        let message = self.canonicalize()?;
        self.signature = Some(identity.sign(message.as_bytes())?);
        Ok(())
    }

    /// Signature check. Any decode failure counts as invalid.
    pub fn is_valid(&self) -> bool {
        if is_reserved_sender(&self.sender) {
            return true;
        }

        let Some(signature) = self.signature.as_deref() else {
            log::debug!("Transaction from {} carries no signature", self.short_sender());
            return false;
        };

        let public_key = match decode_address(&self.sender) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let signature = match hex_decode(signature) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let message = match self.canonicalize() {
            Ok(message) => message,
            Err(_) => return false,
        };

        ecdsa_p384_sha384_verify(&public_key, &signature, message.as_bytes())
    }

    /// Field checks that do not involve cryptography.
    pub fn check_well_formed(&self) -> Result<()> {
        if self.sender.is_empty() || self.recipient.is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "Sender and recipient are required".to_string(),
            ));
        }
        if !self.timestamp.is_finite() || self.timestamp < 0.0 {
            return Err(LedgerError::InvalidTransaction(format!(
                "Timestamp must be a non-negative number, got {}",
                self.timestamp
            )));
        }
        Ok(())
    }

    pub fn is_reward(&self) -> bool {
        is_reserved_sender(&self.sender)
    }

    pub fn get_sender(&self) -> &str {
        self.sender.as_str()
    }

    pub fn get_recipient(&self) -> &str {
        self.recipient.as_str()
    }

    pub fn get_amount(&self) -> Amount {
        self.amount
    }

    pub fn get_timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn get_signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn get_data(&self) -> &Map<String, Value> {
        &self.data
    }

    fn short_sender(&self) -> &str {
        self.sender.get(..10).unwrap_or(&self.sender)
    }
}

/// Sign a transfer on a caller's behalf.
///
/// This takes a private key over whatever channel the caller used, which is
/// only acceptable for demos. When `timestamp` is `None` the current time is
/// used and returned so the caller can submit the exact payload that was
/// signed.
pub fn sign_payload(
    private_key: &str,
    sender: &str,
    recipient: &str,
    amount: Amount,
    timestamp: Option<f64>,
    data: Map<String, Value>,
) -> Result<SignedPayload> {
    let identity = Identity::from_private_key_hex(private_key)?;
    let timestamp = match timestamp {
        Some(timestamp) => timestamp,
        None => current_timestamp()?,
    };
    let tx = Transaction::new(sender, recipient, amount, timestamp, data);
    let signature = identity.sign(tx.canonicalize()?.as_bytes())?;
    Ok(SignedPayload {
        signature,
        timestamp,
    })
}
