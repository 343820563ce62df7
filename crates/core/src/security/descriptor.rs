//! Encrypt-dictionary inspection.
//!
//! Parses the trailer's `/Encrypt` dictionary into an [`EncryptDescriptor`] once per
//! document. Every later decision matches on the closed enums produced here instead of
//! comparing names again.

use std::collections::HashMap;

use crate::model::objects::{PDFDict, PDFObject};
use crate::{PdfError, Result};

/// Security handler algorithm version (`/V`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    /// 40-bit RC4.
    V1 = 1,
    /// Variable-length RC4.
    V2 = 2,
    /// Crypt filters (RC4 or AES-128).
    V4 = 4,
    /// Crypt filters with AES-256 and a file key used verbatim.
    V5 = 5,
}

impl Version {
    fn from_int(v: i64) -> Result<Self> {
        match v {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            4 => Ok(Self::V4),
            5 => Ok(Self::V5),
            other => Err(PdfError::ConfigError(format!("unsupported /V {other}"))),
        }
    }

    pub const fn number(self) -> i64 {
        self as i64
    }
}

/// Standard security handler revision (`/R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Revision {
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
}

impl Revision {
    fn from_int(r: i64) -> Result<Self> {
        match r {
            2 => Ok(Self::R2),
            3 => Ok(Self::R3),
            4 => Ok(Self::R4),
            5 => Ok(Self::R5),
            6 => Ok(Self::R6),
            other => Err(PdfError::ConfigError(format!("unsupported /R {other}"))),
        }
    }

    pub const fn number(self) -> i64 {
        self as i64
    }

    /// True for the MD5/RC4 revisions (2, 3 and 4).
    pub const fn is_md5_era(self) -> bool {
        matches!(self, Self::R2 | Self::R3 | Self::R4)
    }
}

/// Crypt filter method (`/CFM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CryptMethod {
    /// `/V2`: RC4 with a per-object key.
    Rc4,
    /// `/AESV2`: AES-128-CBC with a salted per-object key.
    AesV2,
    /// `/AESV3`: AES-256-CBC with the file key.
    AesV3,
    /// `/None`, `/Identity` or no filter: data is stored in the clear.
    Identity,
}

impl CryptMethod {
    fn from_cfm(name: &str) -> Result<Self> {
        match name {
            "V2" => Ok(Self::Rc4),
            "AESV2" => Ok(Self::AesV2),
            "AESV3" => Ok(Self::AesV3),
            "None" | "Identity" => Ok(Self::Identity),
            other => Err(PdfError::ConfigError(format!(
                "unknown crypt filter method /{other}"
            ))),
        }
    }
}

/// When a crypt filter's key is needed (`/AuthEvent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthEvent {
    DocOpen,
    EFOpen,
}

/// One entry of the `/CF` dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptFilter {
    pub method: CryptMethod,
    pub auth_event: Option<AuthEvent>,
    /// `/Length` as written; writers disagree on bits vs bytes.
    pub length: Option<i64>,
}

/// The name a stream or string crypt filter is registered under by default.
pub const STD_CF: &str = "StdCF";

/// Typed view of a `/Filter /Standard` encryption dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptDescriptor {
    pub filter: String,
    pub version: Version,
    pub revision: Revision,
    pub o: Vec<u8>,
    pub u: Vec<u8>,
    pub oe: Option<Vec<u8>>,
    pub ue: Option<Vec<u8>>,
    pub perms: Option<Vec<u8>>,
    /// Permission flags, reinterpreted as unsigned.
    pub p: u32,
    /// File key length in bits.
    pub length: usize,
    /// `/CF`, empty for V < 4.
    pub crypt_filters: HashMap<String, CryptFilter>,
    pub stm_f: String,
    pub str_f: String,
    pub stm_method: CryptMethod,
    pub str_method: CryptMethod,
    pub encrypt_metadata: bool,
}

impl EncryptDescriptor {
    /// Classify an `/Encrypt` dictionary.
    ///
    /// # Errors
    /// * `ConfigError` for a non-Standard `/Filter`, unknown `/V`, `/R` or `/CFM`.
    /// * `FormatError` for missing or mistyped entries.
    pub fn classify(dict: &PDFDict) -> Result<Self> {
        let filter = match dict.get("Filter") {
            Some(obj) => obj
                .as_name()
                .map_err(|_| format_error("/Filter is not a name"))?
                .to_string(),
            None => return Err(PdfError::ConfigError("missing /Filter".into())),
        };
        if filter != "Standard" {
            return Err(PdfError::ConfigError(format!(
                "unsupported security handler /{filter}"
            )));
        }

        let version = Version::from_int(get_int(dict, "V").unwrap_or(0))?;
        let revision = Revision::from_int(get_int(dict, "R")?)?;
        if (version == Version::V5) == revision.is_md5_era() {
            return Err(PdfError::ConfigError(format!(
                "inconsistent /V {} with /R {}",
                version.number(),
                revision.number()
            )));
        }

        let o = get_bytes(dict, "O")?;
        let u = get_bytes(dict, "U")?;
        // P is a signed 32-bit integer in the file; keep the bit pattern.
        let p = get_int(dict, "P")? as u32;

        let (oe, ue, perms) = if revision.is_md5_era() {
            if o.len() < 32 || u.len() < 32 {
                return Err(format_error(&format!(
                    "/O and /U must be at least 32 bytes, got {} and {}",
                    o.len(),
                    u.len()
                )));
            }
            (None, None, get_bytes(dict, "Perms").ok())
        } else {
            if o.len() < 48 || u.len() < 48 {
                return Err(format_error(&format!(
                    "/O and /U must be at least 48 bytes for R{}, got {} and {}",
                    revision.number(),
                    o.len(),
                    u.len()
                )));
            }
            let oe = get_bytes(dict, "OE")?;
            let ue = get_bytes(dict, "UE")?;
            if oe.len() < 32 || ue.len() < 32 {
                return Err(format_error("/OE and /UE must be 32 bytes"));
            }
            let perms = match get_bytes(dict, "Perms") {
                Ok(perms) if perms.len() >= 16 => Some(perms),
                Ok(perms) => {
                    return Err(format_error(&format!(
                        "/Perms must be 16 bytes, got {}",
                        perms.len()
                    )));
                }
                Err(_) if revision == Revision::R6 => {
                    return Err(format_error("/Perms is required for R6"));
                }
                Err(_) => None,
            };
            (Some(oe), Some(ue), perms)
        };

        let encrypt_metadata = match dict.get("EncryptMetadata") {
            Some(obj) => obj
                .as_bool()
                .map_err(|_| format_error("/EncryptMetadata is not a boolean"))?,
            None => true,
        };

        let crypt_filters = if version >= Version::V4 {
            parse_crypt_filters(dict)?
        } else {
            if dict.contains_key("CF") {
                tracing::debug!(v = version.number(), "ignoring /CF below V4");
            }
            HashMap::new()
        };

        let (stm_f, str_f, stm_method, str_method) = if version >= Version::V4 {
            let stm_f = get_name_default(dict, "StmF")?;
            let str_f = get_name_default(dict, "StrF")?;
            let stm_method = resolve_method(&crypt_filters, &stm_f)?;
            let str_method = resolve_method(&crypt_filters, &str_f)?;
            (stm_f, str_f, stm_method, str_method)
        } else {
            // Implicit RC4 with the derived key length.
            (
                STD_CF.to_string(),
                STD_CF.to_string(),
                CryptMethod::Rc4,
                CryptMethod::Rc4,
            )
        };

        let length = key_length_bits(dict, version, &crypt_filters, &stm_f)?;

        tracing::debug!(
            v = version.number(),
            r = revision.number(),
            length,
            ?stm_method,
            ?str_method,
            encrypt_metadata,
            "classified /Encrypt dictionary"
        );

        Ok(Self {
            filter,
            version,
            revision,
            o,
            u,
            oe,
            ue,
            perms,
            p,
            length,
            crypt_filters,
            stm_f,
            str_f,
            stm_method,
            str_method,
            encrypt_metadata,
        })
    }

    /// File key length in bytes (5 for V1).
    pub const fn key_length(&self) -> usize {
        self.length / 8
    }

    /// The `/StdCF` entry, if any.
    pub fn std_cf(&self) -> Option<&CryptFilter> {
        self.crypt_filters.get(STD_CF)
    }

    /// Resolve a crypt filter name through `/CF`. Used for streams carrying their own
    /// `/Crypt` filter.
    pub fn method_for(&self, name: &str) -> Result<CryptMethod> {
        resolve_method(&self.crypt_filters, name)
    }
}

/// First element of the trailer `/ID` array.
///
/// A missing or malformed `/ID` is tolerated: key derivation proceeds with an
/// empty contribution.
pub fn doc_id_from_trailer(trailer: &PDFDict) -> Vec<u8> {
    let Some(id) = trailer.get("ID") else {
        tracing::warn!("trailer has no /ID, deriving keys with an empty document id");
        return Vec::new();
    };
    match id.as_array().map(|arr| arr.first().map(PDFObject::as_string)) {
        Ok(Some(Ok(first))) => first.to_vec(),
        _ => {
            tracing::warn!(
                got = id.type_name(),
                "malformed trailer /ID, using an empty document id"
            );
            Vec::new()
        }
    }
}

fn format_error(msg: &str) -> PdfError {
    PdfError::FormatError(msg.to_string())
}

fn parse_crypt_filters(dict: &PDFDict) -> Result<HashMap<String, CryptFilter>> {
    let Some(cf) = dict.get("CF") else {
        return Ok(HashMap::new());
    };
    let cf = cf.as_dict().map_err(|_| format_error("/CF is not a dictionary"))?;

    let mut filters = HashMap::with_capacity(cf.len());
    for (name, entry) in cf {
        let entry = entry
            .as_dict()
            .map_err(|_| format_error(&format!("/CF /{name} is not a dictionary")))?;

        let method = match entry.get("CFM") {
            Some(cfm) => CryptMethod::from_cfm(
                cfm.as_name()
                    .map_err(|_| format_error(&format!("/CF /{name} /CFM is not a name")))?,
            )?,
            None => CryptMethod::Identity,
        };

        let auth_event = match entry.get("AuthEvent") {
            Some(event) => match event.as_name() {
                Ok("DocOpen") => Some(AuthEvent::DocOpen),
                Ok("EFOpen") => Some(AuthEvent::EFOpen),
                Ok(other) => {
                    return Err(format_error(&format!("unknown /AuthEvent /{other}")));
                }
                Err(_) => return Err(format_error("/AuthEvent is not a name")),
            },
            None => None,
        };

        let length = entry.get("Length").and_then(|l| l.as_num().ok()).map(|l| l as i64);

        filters.insert(
            name.clone(),
            CryptFilter {
                method,
                auth_event,
                length,
            },
        );
    }
    Ok(filters)
}

fn resolve_method(filters: &HashMap<String, CryptFilter>, name: &str) -> Result<CryptMethod> {
    if name == "Identity" {
        return Ok(CryptMethod::Identity);
    }
    filters
        .get(name)
        .map(|f| f.method)
        .ok_or_else(|| format_error(&format!("crypt filter /{name} not found in /CF")))
}

fn key_length_bits(
    dict: &PDFDict,
    version: Version,
    filters: &HashMap<String, CryptFilter>,
    stm_f: &str,
) -> Result<usize> {
    let declared = match dict.get("Length") {
        Some(obj) => Some(
            obj.as_num()
                .map_err(|_| format_error("/Length is not a number"))? as i64,
        ),
        None => None,
    };

    let bits = match version {
        Version::V1 => 40,
        Version::V2 => declared.unwrap_or(40).clamp(40, 128) / 8 * 8,
        Version::V4 => {
            let filter_len = filters
                .get(stm_f)
                .or_else(|| filters.get(STD_CF))
                .and_then(|f| f.length);
            match declared.or(filter_len) {
                // Some writers put bytes here.
                Some(n) if n > 0 && n <= 32 => (n * 8).clamp(40, 128),
                Some(n) if n > 32 => n.clamp(40, 128) / 8 * 8,
                _ => 128,
            }
        }
        Version::V5 => 256,
    };
    Ok(bits as usize)
}

fn get_int(dict: &PDFDict, key: &str) -> Result<i64> {
    dict.get(key)
        .ok_or_else(|| format_error(&format!("missing /{key}")))?
        .as_int()
        .map_err(|_| format_error(&format!("/{key} is not an integer")))
}

fn get_bytes(dict: &PDFDict, key: &str) -> Result<Vec<u8>> {
    dict.get(key)
        .ok_or_else(|| format_error(&format!("missing /{key}")))?
        .as_string()
        .map(<[u8]>::to_vec)
        .map_err(|_| format_error(&format!("/{key} is not a string")))
}

fn get_name_default(dict: &PDFDict, key: &str) -> Result<String> {
    match dict.get(key) {
        Some(obj) => obj
            .as_name()
            .map(str::to_string)
            .map_err(|_| format_error(&format!("/{key} is not a name"))),
        None => Ok("Identity".to_string()),
    }
}
