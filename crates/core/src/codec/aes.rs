//! AES-CBC helpers for PDF encryption.
//!
//! Raw block operations (no padding) for the key-unwrapping steps of R5/R6, plus the
//! IV-prefixed, PKCS#7-padded payload format used by AESV2/AESV3 strings and streams.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};

use crate::{PdfError, Result};

type Aes128CbcDec = Decryptor<aes::Aes128>;
type Aes256CbcDec = Decryptor<aes::Aes256>;
type Aes128CbcEnc = Encryptor<aes::Aes128>;
type Aes256CbcEnc = Encryptor<aes::Aes256>;

/// AES block size in bytes. Also the IV length.
pub const AES_BLOCK: usize = 16;

/// Decrypt data using AES-CBC with a 128 or 256 bit key and no padding.
///
/// Data length must be a multiple of 16 bytes.
pub fn aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() % AES_BLOCK != 0 {
        return Err(PdfError::DecodeError(format!(
            "AES input length {} is not a multiple of {AES_BLOCK}",
            data.len()
        )));
    }
    let mut buf = data.to_vec();
    let bad_len = |_| PdfError::DecodeError("invalid AES key or IV length".into());
    match key.len() {
        16 => {
            Aes128CbcDec::new_from_slices(key, iv)
                .map_err(bad_len)?
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(|_| PdfError::DecodeError("AES-CBC decryption failed".into()))?;
        }
        32 => {
            Aes256CbcDec::new_from_slices(key, iv)
                .map_err(bad_len)?
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(|_| PdfError::DecodeError("AES-CBC decryption failed".into()))?;
        }
        n => {
            return Err(PdfError::DecodeError(format!(
                "AES key must be 16 or 32 bytes, got {n}"
            )));
        }
    }
    Ok(buf)
}

/// Encrypt data using AES-CBC with a 128 or 256 bit key and no padding.
///
/// Data length must be a multiple of 16 bytes.
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() % AES_BLOCK != 0 {
        return Err(PdfError::DecodeError(format!(
            "AES input length {} is not a multiple of {AES_BLOCK}",
            data.len()
        )));
    }
    let mut buf = data.to_vec();
    let len = buf.len();
    let bad_len = |_| PdfError::DecodeError("invalid AES key or IV length".into());
    match key.len() {
        16 => {
            Aes128CbcEnc::new_from_slices(key, iv)
                .map_err(bad_len)?
                .encrypt_padded_mut::<NoPadding>(&mut buf, len)
                .map_err(|_| PdfError::DecodeError("AES-CBC encryption failed".into()))?;
        }
        32 => {
            Aes256CbcEnc::new_from_slices(key, iv)
                .map_err(bad_len)?
                .encrypt_padded_mut::<NoPadding>(&mut buf, len)
                .map_err(|_| PdfError::DecodeError("AES-CBC encryption failed".into()))?;
        }
        n => {
            return Err(PdfError::DecodeError(format!(
                "AES key must be 16 or 32 bytes, got {n}"
            )));
        }
    }
    Ok(buf)
}

/// Remove PKCS#7 padding from AES-decrypted data.
///
/// Returns data unchanged if padding is invalid:
/// - Padding byte value is 0 or > 16
/// - Not enough bytes for claimed padding
/// - Padding bytes are not all equal to the padding length
pub fn unpad_aes(data: &[u8]) -> &[u8] {
    let Some(&last) = data.last() else {
        return data;
    };
    let pad_len = last as usize;

    if pad_len == 0 || pad_len > AES_BLOCK || pad_len > data.len() {
        return data;
    }

    let start = data.len() - pad_len;
    if data[start..].iter().any(|&byte| byte as usize != pad_len) {
        return data;
    }

    &data[..start]
}

/// Decrypt an AESV2/AESV3 payload: a 16-byte IV followed by CBC ciphertext with
/// PKCS#7 padding.
///
/// Payloads shorter than one block cannot carry an IV and are returned unchanged.
/// A trailing partial block is dropped.
pub fn decrypt_aes_payload(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < AES_BLOCK {
        tracing::warn!(len = data.len(), "AES payload shorter than its IV, left as-is");
        return Ok(data.to_vec());
    }

    let (iv, ciphertext) = data.split_at(AES_BLOCK);
    let whole = ciphertext.len() - ciphertext.len() % AES_BLOCK;
    if whole != ciphertext.len() {
        tracing::warn!(
            len = ciphertext.len(),
            "AES ciphertext is not block aligned, dropping the partial block"
        );
    }
    if whole == 0 {
        return Ok(Vec::new());
    }

    let plaintext = aes_cbc_decrypt(key, iv, &ciphertext[..whole])?;
    Ok(unpad_aes(&plaintext).to_vec())
}

/// Encrypt whole blocks in place with AES-128-CBC. A trailing partial block is left
/// untouched.
pub fn aes128_cbc_encrypt_blocks(key: &[u8; 16], iv: &[u8; 16], data: &mut [u8]) {
    let mut encryptor = Aes128CbcEnc::new(&(*key).into(), &(*iv).into());
    for block in data.chunks_exact_mut(AES_BLOCK) {
        encryptor.encrypt_block_mut(block.into());
    }
}
