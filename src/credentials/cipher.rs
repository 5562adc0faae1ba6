// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password-based sealing of secret keys.
//!
//! - Password normalized to NFKC before use
//! - Argon2id for password-based key derivation (random 32-byte salt)
//! - AES-256-GCM for the secret itself (random 96-bit nonce), with the
//!   owner's address bound in as associated data
//!
//! GCM authentication means a wrong password, a different address, or any
//! modified byte of the blob fails with [`CipherError::Authentication`] instead
//! of returning garbage that merely looks like a key.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Argon2id cost parameters, stored alongside each blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub m_cost_kib: u32,
    /// Time cost (iterations)
    pub t_cost: u32,
    /// Parallelism
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP minimum recommendation for Argon2id.
        Self {
            m_cost_kib: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    /// Reject costs Argon2 cannot run with.
    pub fn validate(&self) -> Result<(), CipherError> {
        self.argon2_params().map(|_| ())
    }

    fn argon2_params(&self) -> Result<Params, CipherError> {
        Params::new(self.m_cost_kib, self.t_cost, self.p_cost, Some(KEY_LEN))
            .map_err(|e| CipherError::Kdf(e.to_string()))
    }
}

/// A secret sealed under a password. All binary fields are base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    pub kdf: KdfParams,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("encryption failed")]
    Encrypt,

    #[error("invalid password or corrupted data")]
    Authentication,

    #[error("malformed blob: {0}")]
    Malformed(String),
}

/// Encrypt `secret` under `password`, binding `aad` into the authentication tag.
pub fn seal(
    secret: &[u8],
    password: &str,
    aad: &[u8],
    params: KdfParams,
) -> Result<EncryptedBlob, CipherError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let key = derive_key(password, &salt, &params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_ref()).map_err(|_| CipherError::Encrypt)?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: secret, aad })
        .map_err(|_| CipherError::Encrypt)?;

    Ok(EncryptedBlob {
        kdf: params,
        salt: Base64::encode_string(&salt),
        nonce: Base64::encode_string(nonce.as_slice()),
        ciphertext: Base64::encode_string(&ciphertext),
    })
}

/// Decrypt a blob. Fails unless both `password` and `aad` match the sealing call.
pub fn open(
    blob: &EncryptedBlob,
    password: &str,
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    let salt = decode_field("salt", &blob.salt)?;
    let nonce_bytes = decode_field("nonce", &blob.nonce)?;
    let ciphertext = decode_field("ciphertext", &blob.ciphertext)?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(CipherError::Malformed(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            nonce_bytes.len()
        )));
    }

    let key = derive_key(password, &salt, &blob.kdf)?;
    let cipher =
        Aes256Gcm::new_from_slice(key.as_ref()).map_err(|_| CipherError::Authentication)?;

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: &ciphertext,
                aad,
            },
        )
        .map_err(|_| CipherError::Authentication)?;

    Ok(Zeroizing::new(plaintext))
}

fn derive_key(
    password: &str,
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, CipherError> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.argon2_params()?);

    let normalized: Zeroizing<String> = Zeroizing::new(password.nfkc().collect());

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(normalized.as_bytes(), salt, key.as_mut())
        .map_err(|e| CipherError::Kdf(e.to_string()))?;
    Ok(key)
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, CipherError> {
    Base64::decode_vec(value).map_err(|e| CipherError::Malformed(format!("{name}: {e}")))
}
