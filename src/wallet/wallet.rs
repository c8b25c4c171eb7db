use crate::error::{LedgerError, Result};
use crate::utils::{ecdsa_p384_sha384_sign, hex_decode, hex_encode, load_key_pair, new_key_pair};
use ring::signature::KeyPair;
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Uncompressed SEC1 P-384 point: 0x04 || X || Y
pub const PUBLIC_KEY_LEN: usize = 97;

/// A P-384 keypair and the address derived from it.
///
/// The address is the hex of the public key, so anyone holding an address
/// can check signatures without a lookup.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Identity {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

/// What `createIdentity` hands back to a caller.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityExport {
    pub address: String,
    pub private_key: String,
}

impl Identity {
    pub fn generate() -> Result<Identity> {
        let pkcs8 = new_key_pair()?;
        Self::from_pkcs8(pkcs8)
    }

    /// Restore an identity from the hex PKCS#8 document `export` produced.
    pub fn from_private_key_hex(private_key: &str) -> Result<Identity> {
        let pkcs8 = hex_decode(private_key.trim())?;
        Self::from_pkcs8(pkcs8)
    }

    fn from_pkcs8(pkcs8: Vec<u8>) -> Result<Identity> {
        let key_pair = load_key_pair(&pkcs8)?;
        let public_key = key_pair.public_key().as_ref().to_vec();
        Ok(Identity { pkcs8, public_key })
    }

    pub fn get_address(&self) -> String {
        hex_encode(&self.public_key)
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn private_key_hex(&self) -> String {
        hex_encode(&self.pkcs8)
    }

    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let signature = ecdsa_p384_sha384_sign(&self.pkcs8, message)?;
        Ok(hex_encode(&signature))
    }

    pub fn export(&self) -> IdentityExport {
        IdentityExport {
            address: self.get_address(),
            private_key: self.private_key_hex(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.get_address())
            .finish_non_exhaustive()
    }
}

/// Decode an address back into public key bytes.
pub fn decode_address(address: &str) -> Result<Vec<u8>> {
    let bytes =
        hex_decode(address).map_err(|_| LedgerError::InvalidAddress(address.to_string()))?;
    if bytes.len() != PUBLIC_KEY_LEN || bytes[0] != 0x04 {
        return Err(LedgerError::InvalidAddress(address.to_string()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ecdsa_p384_sha384_verify;

    #[test]
    fn test_generate_identity() {
        let identity = Identity::generate().unwrap();
        let address = identity.get_address();

        assert_eq!(address.len(), PUBLIC_KEY_LEN * 2);
        assert_eq!(decode_address(&address).unwrap(), identity.get_public_key());
    }

    #[test]
    fn test_identities_are_distinct() {
        let first = Identity::generate().unwrap();
        let second = Identity::generate().unwrap();
        assert_ne!(first.get_address(), second.get_address());
    }

    #[test]
    fn test_restore_from_private_key() {
        let identity = Identity::generate().unwrap();
        let restored = Identity::from_private_key_hex(&identity.private_key_hex()).unwrap();
        assert_eq!(identity.get_address(), restored.get_address());

        let signature = restored.sign(b"payload").unwrap();
        let signature = hex_decode(&signature).unwrap();
        assert!(ecdsa_p384_sha384_verify(
            identity.get_public_key(),
            &signature,
            b"payload"
        ));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(decode_address("MINT_REWARD").is_err());
        assert!(decode_address("04abcd").is_err());
        assert!(decode_address(&"05".repeat(PUBLIC_KEY_LEN)).is_err());
        assert!(Identity::from_private_key_hex("deadbeef").is_err());
    }
}
