//! Per-object decryption decisions.
//!
//! Decides, for each string and stream met during object resolution, whether it is
//! encrypted and with which key. Stream decisions are returned next to the resolved
//! object as an [`ObjectDecryption`]; the stream dictionary itself is never modified.

use super::descriptor::{CryptMethod, EncryptDescriptor, Revision};
use super::keys::FileKey;
use super::object_key::{ObjectKey, derive_object_key};
use crate::codec::aes::decrypt_aes_payload;
use crate::codec::arcfour::Arcfour;
use crate::model::objects::{PDFDict, PDFObject, dict_type};
use crate::Result;

/// How a stream's data must be treated before its decode filters run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectDecryption {
    /// Stored in the clear.
    NotEncrypted,
    /// Decrypt with this key first.
    Decrypt(ObjectKey),
}

impl ObjectDecryption {
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Decrypt(_))
    }
}

/// A resolved object with its strings decrypted.
///
/// `decryption` is set for streams only and tells the stream-open step how to
/// treat the raw data.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObject {
    pub object: PDFObject,
    pub decryption: Option<ObjectDecryption>,
}

/// Byte-level decryption stage at the head of a stream pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptDecoder {
    Rc4(Vec<u8>),
    Aes(Vec<u8>),
}

impl CryptDecoder {
    fn from_key(key: &ObjectKey) -> Option<Self> {
        match key.method {
            CryptMethod::Rc4 => Some(Self::Rc4(key.key.clone())),
            CryptMethod::AesV2 | CryptMethod::AesV3 => Some(Self::Aes(key.key.clone())),
            CryptMethod::Identity => None,
        }
    }

    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Rc4(key) => Ok(Arcfour::apply(key, data)),
            Self::Aes(key) => decrypt_aes_payload(key, data),
        }
    }
}

/// One step of a stream decode pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStage {
    Decrypt(CryptDecoder),
    /// A `/Filter` name, handled by the stream decoder.
    Filter(String),
}

const CRYPT_FILTER: &str = "Crypt";

/// `/Filter` as a list of names.
fn filter_names(attrs: &PDFDict) -> Vec<String> {
    match attrs.get("Filter") {
        Some(PDFObject::Name(name)) => vec![name.clone()],
        Some(PDFObject::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Name of the crypt filter selected by a leading `/Crypt` entry in `/Filter`.
///
/// Returns `None` when the stream has no `/Crypt` filter. The name comes from the
/// first `/DecodeParms` entry and defaults to `Identity`.
fn stream_crypt_filter(attrs: &PDFDict) -> Option<String> {
    if filter_names(attrs).first().map(String::as_str) != Some(CRYPT_FILTER) {
        return None;
    }
    let parms = match attrs.get("DecodeParms") {
        Some(PDFObject::Array(items)) => items.first(),
        other => other,
    };
    let name = parms
        .and_then(|p| p.as_dict().ok())
        .and_then(|d| d.get("Name"))
        .and_then(|n| n.as_name().ok())
        .unwrap_or("Identity");
    Some(name.to_string())
}

/// Decide how a stream's raw data is stored.
pub fn classify_stream(
    descriptor: &EncryptDescriptor,
    file_key: &FileKey,
    objid: u32,
    genno: u16,
    attrs: &PDFDict,
) -> ObjectDecryption {
    let decision = classify_stream_inner(descriptor, file_key, objid, genno, attrs);
    tracing::trace!(
        objid,
        genno,
        encrypted = decision.is_encrypted(),
        "stream decryption decision"
    );
    decision
}

fn classify_stream_inner(
    descriptor: &EncryptDescriptor,
    file_key: &FileKey,
    objid: u32,
    genno: u16,
    attrs: &PDFDict,
) -> ObjectDecryption {
    let stream_type = dict_type(attrs);
    if stream_type == Some("XRef") {
        return ObjectDecryption::NotEncrypted;
    }

    // R2 and R3 use RC4 for every stream; R3 ignores /EncryptMetadata.
    if descriptor.revision < Revision::R4 {
        return ObjectDecryption::Decrypt(derive_object_key(
            file_key,
            objid,
            genno,
            CryptMethod::Rc4,
            descriptor.version,
        ));
    }

    if stream_type == Some("Metadata") && !descriptor.encrypt_metadata {
        return ObjectDecryption::NotEncrypted;
    }

    let method = match stream_crypt_filter(attrs) {
        Some(name) => match descriptor.method_for(&name) {
            Ok(method) => method,
            Err(e) => {
                tracing::warn!(
                    objid,
                    genno,
                    error = %e,
                    "unknown stream crypt filter, using /StmF"
                );
                descriptor.stm_method
            }
        },
        None => descriptor.stm_method,
    };

    match method {
        CryptMethod::Identity => ObjectDecryption::NotEncrypted,
        method => ObjectDecryption::Decrypt(derive_object_key(
            file_key,
            objid,
            genno,
            method,
            descriptor.version,
        )),
    }
}

/// Method used for string literals.
pub fn string_method(descriptor: &EncryptDescriptor) -> CryptMethod {
    if descriptor.revision < Revision::R4 {
        CryptMethod::Rc4
    } else {
        descriptor.str_method
    }
}

/// Decrypt a string literal belonging to object `objid`/`genno`.
pub fn decrypt_string(
    descriptor: &EncryptDescriptor,
    file_key: &FileKey,
    data: &[u8],
    objid: u32,
    genno: u16,
) -> Result<Vec<u8>> {
    let method = string_method(descriptor);
    if method == CryptMethod::Identity {
        return Ok(data.to_vec());
    }
    let key = derive_object_key(file_key, objid, genno, method, descriptor.version);
    match CryptDecoder::from_key(&key) {
        Some(decoder) => decoder.decode(data),
        None => Ok(data.to_vec()),
    }
}

/// Build the decode pipeline for a stream: the decryption stage, if any, followed
/// by its `/Filter` entries. A leading `/Crypt` entry is consumed by the
/// decryption stage.
pub fn decode_pipeline(decision: &ObjectDecryption, attrs: &PDFDict) -> Vec<DecodeStage> {
    let mut names = filter_names(attrs);
    if names.first().map(String::as_str) == Some(CRYPT_FILTER) {
        names.remove(0);
    }

    let mut stages = Vec::with_capacity(names.len() + 1);
    if let ObjectDecryption::Decrypt(key) = decision
        && let Some(decoder) = CryptDecoder::from_key(key)
    {
        stages.push(DecodeStage::Decrypt(decoder));
    }
    stages.extend(names.into_iter().map(DecodeStage::Filter));
    stages
}

/// Decrypt every string literal inside `obj`.
pub fn decrypt_object(
    descriptor: &EncryptDescriptor,
    file_key: &FileKey,
    obj: PDFObject,
    objid: u32,
    genno: u16,
) -> Result<ResolvedObject> {
    match obj {
        PDFObject::Stream(mut stream) => {
            // Cross-reference stream dictionaries are stored in the clear.
            if dict_type(&stream.attrs) != Some("XRef") {
                let attrs = std::mem::take(&mut stream.attrs);
                stream.attrs = decrypt_dict(descriptor, file_key, attrs, objid, genno)?;
            }
            let decision = classify_stream(descriptor, file_key, objid, genno, &stream.attrs);
            Ok(ResolvedObject {
                object: PDFObject::Stream(stream),
                decryption: Some(decision),
            })
        }
        other => Ok(ResolvedObject {
            object: decrypt_value(descriptor, file_key, other, objid, genno)?,
            decryption: None,
        }),
    }
}

fn decrypt_value(
    descriptor: &EncryptDescriptor,
    file_key: &FileKey,
    obj: PDFObject,
    objid: u32,
    genno: u16,
) -> Result<PDFObject> {
    Ok(match obj {
        PDFObject::String(data) => {
            PDFObject::String(decrypt_string(descriptor, file_key, &data, objid, genno)?)
        }
        PDFObject::Array(items) => PDFObject::Array(
            items
                .into_iter()
                .map(|item| decrypt_value(descriptor, file_key, item, objid, genno))
                .collect::<Result<_>>()?,
        ),
        PDFObject::Dict(dict) => {
            PDFObject::Dict(decrypt_dict(descriptor, file_key, dict, objid, genno)?)
        }
        PDFObject::Stream(stream) => {
            decrypt_object(descriptor, file_key, PDFObject::Stream(stream), objid, genno)?.object
        }
        other => other,
    })
}

fn decrypt_dict(
    descriptor: &EncryptDescriptor,
    file_key: &FileKey,
    dict: PDFDict,
    objid: u32,
    genno: u16,
) -> Result<PDFDict> {
    dict.into_iter()
        .map(|(k, v)| Ok((k, decrypt_value(descriptor, file_key, v, objid, genno)?)))
        .collect()
}

