//! AES-CBC helpers: raw blocks, PKCS#7 unpadding and IV-prefixed payloads.

use pdfsec_core::PdfError;
use pdfsec_core::codec::aes::{
    aes_cbc_decrypt, aes_cbc_encrypt, aes128_cbc_encrypt_blocks, decrypt_aes_payload, unpad_aes,
};

#[test]
fn test_unpad_full_block_of_padding() {
    assert_eq!(unpad_aes(&[0x10; 16]), b"");
}

#[test]
fn test_unpad_short_padding() {
    assert_eq!(unpad_aes(b"0123456789abc\x03\x03\x03"), b"0123456789abc");
}

#[test]
fn test_unpad_keeps_padding_lookalikes_in_data() {
    assert_eq!(
        unpad_aes(b"foo\x01bar\x01bazquux\x01"),
        b"foo\x01bar\x01bazquux"
    );
}

#[test]
fn test_unpad_inconsistent_padding_is_preserved() {
    let data = b"0123456789abc\x02\x03\x04";
    assert_eq!(unpad_aes(data), data);
}

#[test]
fn test_unpad_overlong_padding_is_preserved() {
    let data = b"0123456789abc\x05\x05\x05";
    assert_eq!(unpad_aes(data), data);
    assert_eq!(unpad_aes(&[0x11; 17]), &[0x11; 17]);
}

#[test]
fn test_unpad_empty() {
    assert_eq!(unpad_aes(b""), b"");
}

#[test]
fn test_aes128_zero_key_vector() {
    let ciphertext = hex::decode("66e94bd4ef8a2c3b884cfa59ca342b2e").unwrap();
    let plaintext = aes_cbc_decrypt(&[0u8; 16], &[0u8; 16], &ciphertext).unwrap();
    assert_eq!(plaintext, vec![0u8; 16]);
}

#[test]
fn test_aes256_zero_key_vector() {
    let ciphertext = hex::decode("dc95c078a2408989ad48a21492842087").unwrap();
    let plaintext = aes_cbc_decrypt(&[0u8; 32], &[0u8; 16], &ciphertext).unwrap();
    assert_eq!(plaintext, vec![0u8; 16]);
}

#[test]
fn test_cbc_rejects_bad_lengths() {
    assert!(matches!(
        aes_cbc_decrypt(&[0u8; 16], &[0u8; 16], &[0u8; 15]),
        Err(PdfError::DecodeError(_))
    ));
    assert!(matches!(
        aes_cbc_decrypt(&[0u8; 24], &[0u8; 16], &[0u8; 16]),
        Err(PdfError::DecodeError(_))
    ));
}

#[test]
fn test_block_encryptor_matches_cbc_encrypt() {
    let key = [7u8; 16];
    let iv = [9u8; 16];
    let mut data = vec![0x42u8; 48];
    let expected = aes_cbc_encrypt(&key, &iv, &data).unwrap();
    aes128_cbc_encrypt_blocks(&key, &iv, &mut data);
    assert_eq!(data, expected);
}

fn make_payload(key: &[u8], iv: [u8; 16], plaintext: &[u8]) -> Vec<u8> {
    let pad = 16 - plaintext.len() % 16;
    let mut padded = plaintext.to_vec();
    padded.extend(std::iter::repeat_n(pad as u8, pad));
    let mut payload = iv.to_vec();
    payload.extend(aes_cbc_encrypt(key, &iv, &padded).unwrap());
    payload
}

#[test]
fn test_payload_with_iv_prefix() {
    let key = [3u8; 32];
    let payload = make_payload(&key, [5u8; 16], b"secret text");
    assert_eq!(decrypt_aes_payload(&key, &payload).unwrap(), b"secret text");
}

#[test]
fn test_payload_shorter_than_iv_is_returned_as_is() {
    let short = b"short".to_vec();
    assert_eq!(decrypt_aes_payload(&[0u8; 16], &short).unwrap(), short);
}

#[test]
fn test_payload_with_only_iv_is_empty() {
    assert!(decrypt_aes_payload(&[0u8; 16], &[1u8; 16]).unwrap().is_empty());
}

#[test]
fn test_payload_partial_block_is_dropped() {
    let key = [1u8; 16];
    let mut payload = make_payload(&key, [2u8; 16], b"0123456789abcdef");
    let expected = decrypt_aes_payload(&key, &payload).unwrap();
    payload.extend_from_slice(&[0xAA; 5]);
    assert_eq!(decrypt_aes_payload(&key, &payload).unwrap(), expected);
}
