//! Writer-side builders for encryption dictionaries with known passwords.
#![allow(dead_code)]

use std::collections::HashMap;

use pdfsec_core::codec::aes::aes_cbc_encrypt;
use pdfsec_core::codec::arcfour::Arcfour;
use pdfsec_core::security::keys::{
    compute_file_key_r2_r4, compute_owner_key, hardened_hash_r6, pad_password, password_hash,
};
use pdfsec_core::security::verify::{compute_u_r2, compute_u_r3_r4, xor_key};
use pdfsec_core::security::{EncryptDescriptor, FileKey, Revision};
use pdfsec_core::{PDFDict, PDFObject};

pub const DOC_ID: [u8; 16] = *b"0123456789ABCDEF";

/// Parameters for an R2-R4 dictionary.
pub struct Md5Params<'a> {
    pub v: i64,
    pub r: i64,
    pub length: Option<i64>,
    pub p: i64,
    pub user: &'a [u8],
    pub owner: &'a [u8],
    pub encrypt_metadata: Option<bool>,
    /// `(StmF method, StrF method)` as /CFM names for V4.
    pub crypt_filters: Option<(&'a str, &'a str)>,
}

impl Default for Md5Params<'_> {
    fn default() -> Self {
        Self {
            v: 1,
            r: 2,
            length: None,
            p: -3904,
            user: b"",
            owner: b"",
            encrypt_metadata: None,
            crypt_filters: None,
        }
    }
}

pub fn name(n: &str) -> PDFObject {
    PDFObject::Name(n.to_string())
}

pub fn string(bytes: &[u8]) -> PDFObject {
    PDFObject::String(bytes.to_vec())
}

pub fn trailer_with_id(id0: &[u8]) -> PDFDict {
    HashMap::from([(
        "ID".to_string(),
        PDFObject::Array(vec![string(id0), string(id0)]),
    )])
}

/// `/CF` with one filter per distinct method, plus `/StmF` and `/StrF`.
fn insert_crypt_filters(dict: &mut PDFDict, stm: &str, str_: &str) {
    let mut cf = PDFDict::new();
    let mut filter_name = |cfm: &str| -> String {
        if cfm == "Identity" {
            return "Identity".to_string();
        }
        let key = format!("F{cfm}");
        cf.insert(
            key.clone(),
            PDFObject::Dict(HashMap::from([("CFM".to_string(), name(cfm))])),
        );
        key
    };
    let stm_f = filter_name(stm);
    let str_f = filter_name(str_);
    dict.insert("CF".into(), PDFObject::Dict(cf));
    dict.insert("StmF".into(), name(&stm_f));
    dict.insert("StrF".into(), name(&str_f));
}

/// Build an R2-R4 `/Encrypt` dictionary the way a writer would.
pub fn md5_encrypt_dict(params: &Md5Params<'_>, id0: &[u8]) -> PDFDict {
    let mut dict = PDFDict::new();
    dict.insert("Filter".into(), name("Standard"));
    dict.insert("V".into(), PDFObject::Int(params.v));
    dict.insert("R".into(), PDFObject::Int(params.r));
    dict.insert("P".into(), PDFObject::Int(params.p));
    if let Some(length) = params.length {
        dict.insert("Length".into(), PDFObject::Int(length));
    }
    if let Some(flag) = params.encrypt_metadata {
        dict.insert("EncryptMetadata".into(), PDFObject::Bool(flag));
    }
    if let Some((stm, str_)) = params.crypt_filters {
        insert_crypt_filters(&mut dict, stm, str_);
    }
    dict.insert("O".into(), string(&[0u8; 32]));
    dict.insert("U".into(), string(&[0u8; 32]));

    let mut descriptor = EncryptDescriptor::classify(&dict).expect("valid test dictionary");

    // Algorithm 3: /O wraps the padded user password.
    let owner_key = compute_owner_key(params.owner, &descriptor);
    let mut o = Arcfour::apply(&owner_key, &pad_password(params.user));
    if descriptor.revision >= Revision::R3 {
        for round in 1..=19u8 {
            o = Arcfour::apply(&xor_key(&owner_key, round), &o);
        }
    }
    descriptor.o = o.clone();

    // Algorithms 4 and 5.
    let file_key = compute_file_key_r2_r4(params.user, &descriptor, id0);
    let u = match descriptor.revision {
        Revision::R2 => compute_u_r2(&file_key),
        _ => {
            let mut u = compute_u_r3_r4(&file_key, id0);
            u.extend_from_slice(&[0xA5; 16]);
            u
        }
    };

    dict.insert("O".into(), string(&o));
    dict.insert("U".into(), string(&u));
    dict
}

/// Parameters for an R5/R6 dictionary.
pub struct AesParams<'a> {
    pub r: i64,
    pub p: i64,
    pub user: &'a [u8],
    pub owner: &'a [u8],
    pub file_key: [u8; 32],
    pub encrypt_metadata: bool,
    pub with_perms: bool,
}

impl Default for AesParams<'_> {
    fn default() -> Self {
        Self {
            r: 6,
            p: -1028,
            user: b"user",
            owner: b"owner",
            file_key: [0x5C; 32],
            encrypt_metadata: true,
            with_perms: true,
        }
    }
}

fn revision_of(r: i64) -> Revision {
    if r == 6 { Revision::R6 } else { Revision::R5 }
}

fn hash(r: i64, password: &[u8], salt: &[u8], extra: &[u8]) -> [u8; 32] {
    password_hash(revision_of(r), hardened_hash_r6, password, salt, extra)
}

fn wrap_key(kek: &[u8; 32], file_key: &[u8; 32]) -> Vec<u8> {
    aes_cbc_encrypt(kek, &[0u8; 16], file_key).expect("two whole blocks")
}

/// The 16-byte `/Perms` block for `file_key`.
pub fn perms_block(file_key: &[u8; 32], p: i64, encrypt_metadata: bool) -> Vec<u8> {
    let mut block = [0u8; 16];
    block[..4].copy_from_slice(&(p as u32).to_le_bytes());
    block[4..8].copy_from_slice(&[0xFF; 4]);
    block[8] = if encrypt_metadata { b'T' } else { b'F' };
    block[9..12].copy_from_slice(b"adb");
    block[12..].copy_from_slice(b"rand");
    aes_cbc_encrypt(file_key, &[0u8; 16], &block).expect("one whole block")
}

/// Build an R5/R6 `/Encrypt` dictionary with AESV3 crypt filters.
pub fn aes256_encrypt_dict(params: &AesParams<'_>) -> PDFDict {
    let uvs = *b"uvsalt01";
    let uks = *b"ukssalt1";
    let ovs = *b"ovsalt01";
    let oks = *b"okssalt1";

    let mut u = hash(params.r, params.user, &uvs, &[]).to_vec();
    u.extend_from_slice(&uvs);
    u.extend_from_slice(&uks);
    let ue = wrap_key(&hash(params.r, params.user, &uks, &[]), &params.file_key);

    let mut o = hash(params.r, params.owner, &ovs, &u).to_vec();
    o.extend_from_slice(&ovs);
    o.extend_from_slice(&oks);
    let oe = wrap_key(&hash(params.r, params.owner, &oks, &u), &params.file_key);

    let stdcf = HashMap::from([
        ("CFM".to_string(), name("AESV3")),
        ("AuthEvent".to_string(), name("DocOpen")),
        ("Length".to_string(), PDFObject::Int(32)),
    ]);

    let mut dict = PDFDict::new();
    dict.insert("Filter".into(), name("Standard"));
    dict.insert("V".into(), PDFObject::Int(5));
    dict.insert("R".into(), PDFObject::Int(params.r));
    dict.insert("Length".into(), PDFObject::Int(256));
    dict.insert("P".into(), PDFObject::Int(params.p));
    dict.insert("O".into(), string(&o));
    dict.insert("U".into(), string(&u));
    dict.insert("OE".into(), string(&oe));
    dict.insert("UE".into(), string(&ue));
    dict.insert(
        "CF".into(),
        PDFObject::Dict(HashMap::from([("StdCF".to_string(), PDFObject::Dict(stdcf))])),
    );
    dict.insert("StmF".into(), name("StdCF"));
    dict.insert("StrF".into(), name("StdCF"));
    if !params.encrypt_metadata {
        dict.insert("EncryptMetadata".into(), PDFObject::Bool(false));
    }
    if params.with_perms {
        dict.insert(
            "Perms".into(),
            string(&perms_block(&params.file_key, params.p, params.encrypt_metadata)),
        );
    }
    dict
}

pub fn file_key(bytes: &[u8; 32]) -> FileKey {
    FileKey::new(bytes.to_vec())
}
