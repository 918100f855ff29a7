//! Signing credential and address derivation.
//!
//! # Security
//! - The private key is passed in explicitly; nothing here reads the environment
//! - Keys are never logged or serialized
//!
//! Nano signs with Ed25519 where every internal SHA-512 is replaced by
//! Blake2b-512, so the key is expanded and used through the `hazmat` API.

use blake2::{Blake2b512, Digest};
use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Signature, VerifyingKey};

use crate::blockchain::address::{NanoAddress, PublicKey};
use crate::blockchain::types::{LedgerError, LedgerResult};

/// A signing credential for one account.
#[derive(Clone)]
pub struct Wallet {
    secret: [u8; 32],
    verifying_key: VerifyingKey,
    address: NanoAddress,
}

impl Wallet {
    /// Create a wallet from a 64-character hex private key (not a seed).
    pub fn from_private_key(private_key_hex: &str) -> LedgerResult<Self> {
        if private_key_hex.len() != 64 {
            return Err(LedgerError::InvalidKey(
                "NANO_PRIVATE_KEY is not valid".to_string(),
            ));
        }
        let mut secret = [0u8; 32];
        hex::decode_to_slice(private_key_hex, &mut secret)
            .map_err(|_| LedgerError::InvalidKey("NANO_PRIVATE_KEY is not valid".to_string()))?;

        let verifying_key = VerifyingKey::from(&expand(&secret));
        let address = NanoAddress::from_public_key(PublicKey(verifying_key.to_bytes()));

        tracing::debug!(address = %address, "Wallet initialized");

        Ok(Self {
            secret,
            verifying_key,
            address,
        })
    }

    /// The account this wallet signs for.
    pub fn address(&self) -> NanoAddress {
        self.address
    }

    pub fn public_key(&self) -> PublicKey {
        *self.address.public_key()
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Sign a message (a block hash, in practice).
    pub fn sign(&self, message: &[u8]) -> Signature {
        raw_sign::<Blake2b512>(&expand(&self.secret), message, &self.verifying_key)
    }
}

fn expand(secret: &[u8; 32]) -> ExpandedSecretKey {
    let digest = Blake2b512::digest(secret);
    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&digest);
    ExpandedSecretKey::from_bytes(&bytes)
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive the account address controlled by `private_key_hex`.
pub fn derive_address(private_key_hex: &str) -> LedgerResult<NanoAddress> {
    Wallet::from_private_key(private_key_hex).map(|w| w.address())
}
