//! Payload codec: AES-256-CFB with hex framing.
//!
//! The per-record cipher key is derived from the 32-byte service key and
//! the optional user password by overwriting the key prefix with the
//! password bytes. The derivation is intentionally reversible given the
//! password; confidentiality rests on the secrecy of both inputs.
//!
//! CFB carries no integrity tag, so decrypting with a wrong password
//! yields garbage rather than an error. Handlers gate decryption behind
//! the password verifier, which keeps this mode out of reach.

use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CodecError;

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

/// AES block size; also the length of the prepended IV.
const BLOCK_SIZE: usize = 16;

/// Derive the cipher key for one record.
///
/// Empty password: the service key is used as-is. Otherwise the first
/// `min(len(password), len(service_key))` bytes are replaced by the
/// password's UTF-8 bytes, the rest keep the service key's bytes at the
/// same indices. Existing records depend on this exact rule.
pub(crate) fn cipher_key(service_key: &[u8], password: &str) -> Zeroizing<Vec<u8>> {
    if password.is_empty() {
        return Zeroizing::new(service_key.to_vec());
    }
    let p = password.as_bytes();
    Zeroizing::new(
        service_key
            .iter()
            .enumerate()
            .map(|(i, &b)| if i < p.len() { p[i] } else { b })
            .collect(),
    )
}

/// Encrypt `plaintext`, returning lowercase hex of `IV ‖ ciphertext`.
/// A fresh 16-byte IV is sampled from the OS RNG on every call.
pub fn encrypt(plaintext: &str, service_key: &[u8], password: &str) -> Result<String, CodecError> {
    if plaintext.is_empty() {
        return Err(CodecError::InvalidInput("empty plaintext"));
    }
    if service_key.is_empty() {
        return Err(CodecError::InvalidInput("empty service key"));
    }
    let key = cipher_key(service_key, password);

    let mut buf = vec![0u8; BLOCK_SIZE + plaintext.len()];
    OsRng
        .try_fill_bytes(&mut buf[..BLOCK_SIZE])
        .map_err(|_| CodecError::RandFailure)?;
    buf[BLOCK_SIZE..].copy_from_slice(plaintext.as_bytes());

    let (iv, body) = buf.split_at_mut(BLOCK_SIZE);
    let enc = Aes256CfbEnc::new_from_slices(&key, iv).map_err(|_| CodecError::CipherInit)?;
    enc.encrypt(body);

    Ok(hex::encode(&buf))
}

/// Decrypt a hex-framed `IV ‖ ciphertext` produced by [`encrypt`].
pub fn decrypt(cipher_hex: &str, service_key: &[u8], password: &str) -> Result<String, CodecError> {
    if cipher_hex.is_empty() {
        return Err(CodecError::InvalidInput("empty ciphertext"));
    }
    if service_key.is_empty() {
        return Err(CodecError::InvalidInput("empty service key"));
    }
    let mut data = hex::decode(cipher_hex).map_err(|_| CodecError::InvalidInput("malformed hex"))?;
    if data.len() < BLOCK_SIZE {
        return Err(CodecError::InvalidInput("ciphertext shorter than one block"));
    }
    let key = cipher_key(service_key, password);

    let mut body = data.split_off(BLOCK_SIZE);
    let dec = Aes256CfbDec::new_from_slices(&key, &data).map_err(|_| CodecError::CipherInit)?;
    dec.decrypt(&mut body);

    String::from_utf8(body).map_err(|_| CodecError::InvalidInput("plaintext is not valid utf-8"))
}
