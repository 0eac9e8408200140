//! EIP-1559 transaction types.
//!
//! Feegate holds already-signed transactions, so the central type here is
//! [`SignedTransaction`]: the decoded EIP-1559 payload plus its signature and
//! cached hash. Sender recovery is performed lazily through
//! [`SignedTransaction::sender`] because a malformed signature must surface
//! per-call during classification, not at decode time.

use crate::{Address, Error, Result, H256};
use bytes::Bytes;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Transaction type identifier (EIP-2718).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TxType {
    /// Legacy transaction (pre-EIP-2718)
    Legacy = 0x00,
    /// EIP-2930 access list transaction
    AccessList = 0x01,
    /// EIP-1559 dynamic fee transaction (the only type feegate decodes)
    #[default]
    DynamicFee = 0x02,
}

impl TxType {
    /// Returns the transaction type byte.
    pub const fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Creates a `TxType` from a byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Self::Legacy),
            0x01 => Ok(Self::AccessList),
            0x02 => Ok(Self::DynamicFee),
            _ => Err(Error::InvalidTransaction(format!(
                "unknown transaction type: 0x{byte:02x}"
            ))),
        }
    }
}

/// An access list entry for EIP-1559 transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AccessListItem {
    /// The address being accessed
    pub address: Address,
    /// Storage keys being accessed
    pub storage_keys: Vec<H256>,
}

impl Encodable for AccessListItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.address);
        s.begin_list(self.storage_keys.len());
        for key in &self.storage_keys {
            s.append(key);
        }
    }
}

impl Decodable for AccessListItem {
    fn decode(rlp: &Rlp<'_>) -> std::result::Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            address: rlp.val_at(0)?,
            storage_keys: rlp.list_at(1)?,
        })
    }
}

/// ECDSA signature components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    /// Parity / recovery value (0 or 1 for EIP-1559; legacy encodings accepted)
    pub v: u64,
    /// R component
    pub r: H256,
    /// S component
    pub s: H256,
}

impl Signature {
    /// Creates a new signature from components.
    pub const fn new(v: u64, r: H256, s: H256) -> Self {
        Self { v, r, s }
    }

    /// Normalizes `v` into a recovery id, if it encodes one.
    ///
    /// Accepts the EIP-1559 parity values (0/1), legacy 27/28, and EIP-155
    /// `chain_id * 2 + 35 + parity`.
    pub fn recovery_id(&self) -> Option<RecoveryId> {
        let parity = match self.v {
            0 | 1 => self.v as u8,
            27 | 28 => (self.v - 27) as u8,
            v if v >= 35 => ((v - 35) % 2) as u8,
            _ => return None,
        };
        RecoveryId::from_byte(parity)
    }
}

/// An EIP-1559 transaction payload, before or without its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Chain ID (scopes the signature; replay protection)
    pub chain_id: u64,
    /// Sender nonce
    pub nonce: u64,
    /// Maximum priority fee per gas (tip cap)
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee per gas (fee cap)
    pub max_fee_per_gas: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Value transferred in wei
    pub value: u128,
    /// Calldata or init code
    pub data: Bytes,
    /// Access list
    pub access_list: Vec<AccessListItem>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 0,
            max_fee_per_gas: 0,
            gas_limit: 21_000,
            to: None,
            value: 0,
            data: Bytes::new(),
            access_list: Vec::new(),
        }
    }
}

impl Transaction {
    /// Creates a new EIP-1559 transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: u64,
        nonce: u64,
        max_priority_fee_per_gas: u128,
        max_fee_per_gas: u128,
        gas_limit: u64,
        to: Option<Address>,
        value: u128,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to,
            value,
            data: data.into(),
            access_list: Vec::new(),
        }
    }

    /// Creates a simple transfer transaction.
    pub fn transfer(chain_id: u64, nonce: u64, to: Address, value: u128) -> Self {
        Self::new(chain_id, nonce, 0, 0, 21_000, Some(to), value, Bytes::new())
    }

    /// Sets the gas fees.
    pub fn with_fees(mut self, max_fee: u128, priority_fee: u128) -> Self {
        self.max_fee_per_gas = max_fee;
        self.max_priority_fee_per_gas = priority_fee;
        self
    }

    /// Checks if this is a contract creation transaction.
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Returns `max_fee_per_gas + max_priority_fee_per_gas`, the threshold
    /// compared against the network gas price before broadcast.
    pub fn fee_cap_total(&self) -> u128 {
        self.max_fee_per_gas
            .saturating_add(self.max_priority_fee_per_gas)
    }

    /// Appends the nine unsigned payload fields to an already-open RLP list.
    fn append_payload(&self, s: &mut RlpStream) {
        s.append(&self.chain_id);
        s.append(&self.nonce);
        s.append(&self.max_priority_fee_per_gas);
        s.append(&self.max_fee_per_gas);
        s.append(&self.gas_limit);

        match &self.to {
            Some(addr) => s.append(addr),
            None => s.append_empty_data(),
        };

        s.append(&self.value);
        s.append(&self.data.as_ref());

        s.begin_list(self.access_list.len());
        for item in &self.access_list {
            s.append(item);
        }
    }

    /// Returns the EIP-1559 signing hash: `keccak256(0x02 || rlp(payload))`.
    pub fn signing_hash(&self) -> H256 {
        let mut stream = RlpStream::new_list(9);
        self.append_payload(&mut stream);

        let mut hasher = Keccak256::new();
        hasher.update([TxType::DynamicFee.as_byte()]);
        hasher.update(stream.out());

        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        H256::new(bytes)
    }

    /// Signs the transaction with the given private key.
    pub fn sign(self, signing_key: &SigningKey) -> Result<SignedTransaction> {
        let digest = self.signing_hash();

        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| Error::Signature(e.to_string()))?;

        let sig_bytes = signature.to_bytes();
        let signature = Signature {
            v: recovery_id.to_byte() as u64,
            r: H256::from_slice(&sig_bytes[0..32])?,
            s: H256::from_slice(&sig_bytes[32..64])?,
        };

        Ok(SignedTransaction::new(self, signature))
    }
}

/// A signed transaction with its cached hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// The transaction payload
    pub transaction: Transaction,
    /// The signature
    pub signature: Signature,
    hash: H256,
}

impl SignedTransaction {
    /// Wraps a payload and signature, computing the transaction hash.
    pub fn new(transaction: Transaction, signature: Signature) -> Self {
        let mut tx = Self {
            transaction,
            signature,
            hash: H256::ZERO,
        };
        tx.hash = H256::keccak256(&tx.encode());
        tx
    }

    /// Encodes the signed transaction as EIP-2718 typed bytes:
    /// `0x02 || rlp(payload fields, v, r, s)`.
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(12);
        self.transaction.append_payload(&mut stream);
        stream.append(&self.signature.v);
        stream.append(&self.signature.r);
        stream.append(&self.signature.s);

        let payload = stream.out();
        let mut out = Vec::with_capacity(1 + payload.len());
        out.push(TxType::DynamicFee.as_byte());
        out.extend_from_slice(&payload);
        out
    }

    /// Decodes a signed transaction from EIP-2718 typed bytes.
    ///
    /// Only dynamic fee (type `0x02`) transactions are supported.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (first, rest) = data
            .split_first()
            .ok_or_else(|| Error::InvalidTransaction("empty transaction data".into()))?;

        let tx_type = TxType::from_byte(*first)?;
        if tx_type != TxType::DynamicFee {
            return Err(Error::InvalidTransaction(format!(
                "unsupported transaction type: {tx_type:?}"
            )));
        }

        let rlp = Rlp::new(rest);
        if rlp.item_count()? != 12 {
            return Err(Error::InvalidTransaction(
                "invalid RLP item count".into(),
            ));
        }

        let to_bytes: Vec<u8> = rlp.val_at(5)?;
        let to = if to_bytes.is_empty() {
            None
        } else {
            Some(Address::from_slice(&to_bytes)?)
        };

        let data_bytes: Vec<u8> = rlp.val_at(7)?;

        let transaction = Transaction {
            chain_id: rlp.val_at(0)?,
            nonce: rlp.val_at(1)?,
            max_priority_fee_per_gas: rlp.val_at(2)?,
            max_fee_per_gas: rlp.val_at(3)?,
            gas_limit: rlp.val_at(4)?,
            to,
            value: rlp.val_at(6)?,
            data: Bytes::from(data_bytes),
            access_list: rlp.list_at(8)?,
        };

        let signature = Signature {
            v: rlp.val_at(9)?,
            r: rlp.val_at(10)?,
            s: rlp.val_at(11)?,
        };

        Ok(Self::new(transaction, signature))
    }

    /// Returns the transaction hash.
    pub fn hash(&self) -> H256 {
        self.hash
    }

    /// Recovers the sender address from the signature.
    ///
    /// The signing hash covers the declared chain id, so recovery is scoped
    /// to it. Fails if `v` does not encode a recovery id or the signature is
    /// not recoverable.
    pub fn sender(&self) -> Result<Address> {
        let digest = self.transaction.signing_hash();

        let mut sig_bytes = [0u8; 64];
        sig_bytes[0..32].copy_from_slice(self.signature.r.as_bytes());
        sig_bytes[32..64].copy_from_slice(self.signature.s.as_bytes());

        let signature = EcdsaSignature::from_bytes((&sig_bytes).into())
            .map_err(|e| Error::Signature(e.to_string()))?;

        let recovery_id = self
            .signature
            .recovery_id()
            .ok_or_else(|| Error::Signature(format!("invalid recovery value: {}", self.signature.v)))?;

        let verifying_key =
            VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
                .map_err(|e| Error::Signature(e.to_string()))?;

        // Uncompressed point is 0x04 || x || y; the address hashes x || y.
        let point = verifying_key.to_encoded_point(false);
        Ok(Address::from_public_key(&point.as_bytes()[1..]))
    }

    /// Returns the transaction nonce.
    pub fn nonce(&self) -> u64 {
        self.transaction.nonce
    }

    /// Returns the recipient address, if any.
    pub fn to(&self) -> Option<Address> {
        self.transaction.to
    }

    /// Returns the value transferred in wei.
    pub fn value(&self) -> u128 {
        self.transaction.value
    }

    /// Returns the max fee per gas.
    pub fn max_fee_per_gas(&self) -> u128 {
        self.transaction.max_fee_per_gas
    }

    /// Returns the max priority fee per gas.
    pub fn max_priority_fee_per_gas(&self) -> u128 {
        self.transaction.max_priority_fee_per_gas
    }

    /// Returns the summed fee caps (see [`Transaction::fee_cap_total`]).
    pub fn fee_cap_total(&self) -> u128 {
        self.transaction.fee_cap_total()
    }

    /// Returns the chain ID.
    pub fn chain_id(&self) -> u64 {
        self.transaction.chain_id
    }

    /// Returns the transaction data.
    pub fn data(&self) -> &Bytes {
        &self.transaction.data
    }
}

impl fmt::Display for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tx {{ hash: {}, nonce: {}, to: {}, value: {} }}",
            self.hash,
            self.transaction.nonce,
            self.transaction
                .to
                .map(|a| a.to_string())
                .unwrap_or_else(|| "CREATE".to_string()),
            self.transaction.value
        )
    }
}
