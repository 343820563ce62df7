//! Cipher modules used by the security handler.
//!
//! This module contains:
//! - `aes`: AES-CBC decryption/encryption and payload unpadding
//! - `arcfour`: RC4 encryption

pub mod aes;
pub mod arcfour;

pub use aes::{
    aes_cbc_decrypt, aes_cbc_encrypt, aes128_cbc_encrypt_blocks, decrypt_aes_payload, unpad_aes,
};
pub use arcfour::Arcfour;
