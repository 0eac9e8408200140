//! Tests for transaction encoding, decoding, and sender recovery.

use bytes::Bytes;
use feegate_types::transaction::{Signature, SignedTransaction, Transaction};
use feegate_types::{Address, H256};
use k256::ecdsa::SigningKey;

fn test_signing_key() -> SigningKey {
    // A fixed test private key (do not use outside tests)
    let key_bytes = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
        0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e,
        0x1f, 0x20,
    ];
    SigningKey::from_bytes((&key_bytes).into()).unwrap()
}

fn key_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    Address::from_public_key(&point.as_bytes()[1..])
}

#[test]
fn sign_recovers_the_signing_address() {
    let key = test_signing_key();
    let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1").unwrap();

    let signed = Transaction::transfer(1, 7, to, 1_000_000_000_000_000_000)
        .with_fees(2_000_000_000, 1_000_000_000)
        .sign(&key)
        .unwrap();

    assert_eq!(signed.sender().unwrap(), key_address(&key));
}

#[test]
fn encode_decode_round_trip() {
    let key = test_signing_key();
    let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1").unwrap();

    let signed = Transaction::new(
        5,
        42,
        1_000_000_000,
        3_000_000_000,
        60_000,
        Some(to),
        12_345,
        Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
    )
    .sign(&key)
    .unwrap();

    let encoded = signed.encode();
    let decoded = SignedTransaction::decode(&encoded).unwrap();

    assert_eq!(decoded.hash(), signed.hash());
    assert_eq!(decoded.chain_id(), 5);
    assert_eq!(decoded.nonce(), 42);
    assert_eq!(decoded.to(), Some(to));
    assert_eq!(decoded.value(), 12_345);
    assert_eq!(decoded.data().as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(decoded.sender().unwrap(), signed.sender().unwrap());

    // Re-encoding must reproduce the original bytes so the raw hex a wallet
    // submitted stays broadcastable.
    assert_eq!(decoded.encode(), encoded);
}

#[test]
fn decode_rejects_non_dynamic_fee_payloads() {
    // Legacy type byte
    assert!(SignedTransaction::decode(&[0x00, 0xc0]).is_err());
    // Unknown type byte
    assert!(SignedTransaction::decode(&[0x7f, 0xc0]).is_err());
    // Empty input
    assert!(SignedTransaction::decode(&[]).is_err());
    // Truncated RLP
    assert!(SignedTransaction::decode(&[0x02, 0xf8]).is_err());
}

#[test]
fn sender_fails_for_invalid_recovery_value() {
    let key = test_signing_key();
    let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1").unwrap();
    let mut signed = Transaction::transfer(1, 0, to, 1).sign(&key).unwrap();

    signed.signature = Signature::new(5, signed.signature.r, signed.signature.s);
    assert!(signed.sender().is_err());
}

#[test]
fn distinct_transactions_have_distinct_hashes() {
    let key = test_signing_key();
    let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1").unwrap();

    let a = Transaction::transfer(1, 0, to, 1).sign(&key).unwrap();
    let b = Transaction::transfer(1, 1, to, 1).sign(&key).unwrap();

    assert_ne!(a.hash(), b.hash());
    assert_ne!(a.hash(), H256::ZERO);
}
