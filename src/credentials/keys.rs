// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! secp256k1 key generation and address derivation.

use alloy::primitives::{keccak256, Address};
use alloy::signers::local::PrivateKeySigner;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::OsRng;
use zeroize::Zeroizing;

/// Raw 32-byte secret key, wiped on drop.
pub type SecretBytes = Zeroizing<[u8; 32]>;

/// Generate a fresh secret key and the address it controls.
pub fn generate() -> (SecretBytes, Address) {
    let signing_key = SigningKey::random(&mut OsRng);

    let mut secret = Zeroizing::new([0u8; 32]);
    secret.copy_from_slice(&signing_key.to_bytes());

    (secret, address_of(&signing_key))
}

/// Address of a signing key: last 20 bytes of keccak256 over the uncompressed
/// public key (without the 0x04 prefix).
pub fn address_of(signing_key: &SigningKey) -> Address {
    let public_key = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&public_key.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Build a transaction signer from raw key bytes.
pub fn signer_from_bytes(secret: &[u8]) -> Result<PrivateKeySigner, String> {
    PrivateKeySigner::from_slice(secret).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_address_matches_signer_address() {
        let (secret, address) = generate();
        let signer = signer_from_bytes(secret.as_ref()).unwrap();
        assert_eq!(signer.address(), address);
    }

    #[test]
    fn generated_keys_are_unique() {
        let (a, addr_a) = generate();
        let (b, addr_b) = generate();
        assert_ne!(a.as_ref(), b.as_ref());
        assert_ne!(addr_a, addr_b);
    }

    #[test]
    fn known_key_derives_known_address() {
        // Well-known development key (Hardhat/Anvil account #0)
        let secret =
            alloy::hex::decode("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
                .unwrap();
        let signing_key = SigningKey::from_slice(&secret).unwrap();
        assert_eq!(
            address_of(&signing_key).to_checksum(None),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn invalid_key_bytes_are_rejected() {
        assert!(signer_from_bytes(&[0u8; 32]).is_err());
        assert!(signer_from_bytes(&[1u8; 5]).is_err());
    }
}
