//! State block construction and signing.
//!
//! # Responsibilities
//! - Assemble the next block of an account chain from already-validated parts
//! - Compute the canonical block hash and sign it
//! - Render the node's JSON block form for `process`
//!
//! No network access happens here.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};

use crate::blockchain::address::NanoAddress;
use crate::blockchain::amount::RawAmount;
use crate::blockchain::types::{BlockHash, LedgerError, LedgerResult};
use crate::blockchain::wallet::Wallet;
use crate::blockchain::work::WorkValue;

/// Hash preamble identifying a state block.
const STATE_BLOCK_PREAMBLE: [u8; 32] = {
    let mut preamble = [0u8; 32];
    preamble[31] = 6;
    preamble
};

/// Hash of a state block's contents (everything except work and signature).
pub fn state_block_hash(
    account: &NanoAddress,
    previous: &BlockHash,
    representative: &NanoAddress,
    balance: &RawAmount,
    link: &[u8; 32],
) -> LedgerResult<BlockHash> {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(STATE_BLOCK_PREAMBLE);
    hasher.update(account.public_key().as_bytes());
    hasher.update(previous.as_bytes());
    hasher.update(representative.public_key().as_bytes());
    hasher.update(balance.to_be_bytes_128()?);
    hasher.update(link);

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    Ok(BlockHash(hash))
}

/// A signed send state block. Immutable once built.
#[derive(Debug, Clone)]
pub struct StateBlock {
    hash: BlockHash,
    account: NanoAddress,
    previous: BlockHash,
    representative: NanoAddress,
    balance: RawAmount,
    destination: NanoAddress,
    work: WorkValue,
    signature: Signature,
}

impl StateBlock {
    pub fn hash(&self) -> BlockHash {
        self.hash
    }

    pub fn account(&self) -> NanoAddress {
        self.account
    }

    pub fn previous(&self) -> BlockHash {
        self.previous
    }

    pub fn representative(&self) -> NanoAddress {
        self.representative
    }

    pub fn balance(&self) -> RawAmount {
        self.balance
    }

    pub fn destination(&self) -> NanoAddress {
        self.destination
    }

    pub fn work(&self) -> WorkValue {
        self.work
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The node's JSON block form.
    pub fn to_json(&self) -> JsonBlock {
        JsonBlock {
            block_type: "state".to_string(),
            account: self.account.to_string(),
            previous: self.previous.to_string(),
            representative: self.representative.to_string(),
            balance: self.balance.to_string(),
            link: hex::encode_upper(self.destination.public_key().as_bytes()),
            link_as_account: self.destination.to_string(),
            signature: hex::encode_upper(self.signature.to_bytes()),
            work: self.work.to_string(),
        }
    }
}

/// Wire form of a state block (`json_block = true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub account: String,
    pub previous: String,
    pub representative: String,
    pub balance: String,
    pub link: String,
    pub link_as_account: String,
    pub signature: String,
    pub work: String,
}

/// Builder for the next send block of an account.
#[derive(Debug, Clone, Default)]
pub struct StateBlockBuilder {
    account: Option<NanoAddress>,
    previous: Option<BlockHash>,
    representative: Option<NanoAddress>,
    balance: Option<RawAmount>,
    destination: Option<NanoAddress>,
    work: Option<WorkValue>,
}

impl StateBlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account the block extends; defaults to the signing wallet's account.
    pub fn with_account(mut self, account: NanoAddress) -> Self {
        self.account = Some(account);
        self
    }

    pub fn with_previous(mut self, previous: BlockHash) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn with_representative(mut self, representative: NanoAddress) -> Self {
        self.representative = Some(representative);
        self
    }

    /// Balance remaining after the send.
    pub fn with_balance(mut self, balance: RawAmount) -> Self {
        self.balance = Some(balance);
        self
    }

    /// Destination account, stored as the block's link.
    pub fn with_destination(mut self, destination: NanoAddress) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_work(mut self, work: WorkValue) -> Self {
        self.work = Some(work);
        self
    }

    /// Hash and sign the block with `wallet`.
    pub fn sign(self, wallet: &Wallet) -> LedgerResult<StateBlock> {
        let missing = |field: &str| LedgerError::InvalidInput(format!("state block is missing {}", field));

        let account = self.account.unwrap_or_else(|| wallet.address());
        if account != wallet.address() {
            return Err(LedgerError::InvalidKey(format!(
                "private key does not control account {}",
                account
            )));
        }
        let previous = self.previous.ok_or_else(|| missing("previous"))?;
        let representative = self.representative.ok_or_else(|| missing("representative"))?;
        let balance = self.balance.ok_or_else(|| missing("balance"))?;
        let destination = self.destination.ok_or_else(|| missing("link"))?;
        let work = self.work.ok_or_else(|| missing("work"))?;

        let hash = state_block_hash(
            &account,
            &previous,
            &representative,
            &balance,
            destination.public_key().as_bytes(),
        )?;
        let signature = wallet.sign(hash.as_bytes());

        Ok(StateBlock {
            hash,
            account,
            previous,
            representative,
            balance,
            destination,
            work,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::address::PublicKey;
    use blake2::Blake2b512;
    use ed25519_dalek::hazmat::raw_verify;

    const TEST_PRIVATE_KEY: &str = "9F0E444C69F77A49BD0BE89DB92C38FE713E0963165CCA12FAF5712D7657120F";

    fn wallet() -> Wallet {
        Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap()
    }

    fn builder() -> StateBlockBuilder {
        StateBlockBuilder::new()
            .with_previous(BlockHash([0xAB; 32]))
            .with_representative(NanoAddress::from_public_key(PublicKey([0x01; 32])))
            .with_balance(RawAmount::from_u128(4_999_000_000_000_000_000_000_000_000_000))
            .with_destination(NanoAddress::from_public_key(PublicKey([0x02; 32])))
            .with_work(WorkValue(0x2bf29ef00786a6bc))
    }

    #[test]
    fn test_signature_covers_hash() {
        let wallet = wallet();
        let block = builder().sign(&wallet).unwrap();
        assert!(raw_verify::<Blake2b512>(wallet.verifying_key(), block.hash().as_bytes(), block.signature()).is_ok());
        assert_eq!(block.account(), wallet.address());
    }

    /// Node `block_create` reference block (key 0x..02).
    #[test]
    fn test_reference_block_hash_and_signature() {
        let wallet =
            Wallet::from_private_key("0000000000000000000000000000000000000000000000000000000000000002").unwrap();
        assert_eq!(
            wallet.address().to_string(),
            "nano_3qgmh14nwztqw4wmcdzy4xpqeejey68chx6nciczwn9abji7ihhum9qtpmdr"
        );

        let block = StateBlockBuilder::new()
            .with_previous("F47B23107E5F34B2CE06F562B5C435DF72A533251CB414C51B2B62A8F63A00E4".parse().unwrap())
            .with_representative(
                "nano_1hza3f7wiiqa7ig3jczyxj5yo86yegcmqk3criaz838j91sxcckpfhbhhra1"
                    .parse()
                    .unwrap(),
            )
            .with_balance(RawAmount::from_raw_str("1000000000000000000000").unwrap())
            .with_destination(
                "nano_18gmu6engqhgtjnppqam181o5nfhj4sdtgyhy36dan3jr9spt84rzwmktafc"
                    .parse()
                    .unwrap(),
            )
            .with_work(WorkValue(0xcab7404f0b5449d0))
            .sign(&wallet)
            .unwrap();

        assert_eq!(
            block.hash().to_string(),
            "FF0144381CFF0B2C079A115E7ADA7E96F43FD219446E7524C48D1CC9900C4F17"
        );
        let json = block.to_json();
        assert_eq!(json.link, "19D3D919475DEED4696B5D13018151D1AF88B2BD3BCFF048B45031C1F36D1858");
        assert_eq!(
            json.signature,
            "3BFBA64A775550E6D49DF1EB8EEC2136DCD74F090E2ED658FBD9E80F17CB1C9F\
             9F7BDE2B93D95558EC2F277FFF15FD11E6E2162A1714731B743D1E941FA4560A"
        );
    }

    #[test]
    fn test_deterministic() {
        let wallet = wallet();
        let a = builder().sign(&wallet).unwrap();
        let b = builder().sign(&wallet).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.to_json(), b.to_json());
    }

    #[test]
    fn test_hash_depends_on_balance_and_link_not_work() {
        let wallet = wallet();
        let base = builder().sign(&wallet).unwrap();
        let other_balance = builder().with_balance(RawAmount::from_u128(1)).sign(&wallet).unwrap();
        let other_link = builder()
            .with_destination(NanoAddress::from_public_key(PublicKey([0x03; 32])))
            .sign(&wallet)
            .unwrap();
        let other_work = builder().with_work(WorkValue(1)).sign(&wallet).unwrap();
        assert_ne!(base.hash(), other_balance.hash());
        assert_ne!(base.hash(), other_link.hash());
        assert_eq!(base.hash(), other_work.hash());
    }

    #[test]
    fn test_json_block_shape() {
        let block = builder().sign(&wallet()).unwrap();
        let json = serde_json::to_value(block.to_json()).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["previous"], "AB".repeat(32));
        assert_eq!(json["balance"], "4999000000000000000000000000000");
        assert_eq!(json["link"], "02".repeat(32));
        assert_eq!(json["link_as_account"], block.destination().to_string());
        assert_eq!(json["work"], "2bf29ef00786a6bc");
        assert_eq!(json["signature"].as_str().unwrap().len(), 128);
    }

    #[test]
    fn test_missing_fields() {
        let err = StateBlockBuilder::new()
            .with_previous(BlockHash([0; 32]))
            .sign(&wallet())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert!(err.to_string().contains("representative"));
    }

    #[test]
    fn test_foreign_account_rejected() {
        let err = builder()
            .with_account(NanoAddress::from_public_key(PublicKey([0x09; 32])))
            .sign(&wallet())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidKey(_)));
    }

    #[test]
    fn test_balance_wider_than_128_bits() {
        let huge = RawAmount::from_raw_str("340282366920938463463374607431768211456").unwrap();
        let err = builder().with_balance(huge).sign(&wallet()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }
}
