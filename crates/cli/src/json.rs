//! JSON to PDF object conversion for `pdfauth` input files.
//!
//! Integers, reals, booleans and null map directly. Strings starting with `/` are
//! names, strings wrapped in `<...>` are hex byte strings, and any other string is
//! taken as literal bytes.

use anyhow::{Context, Result, bail};
use pdfsec_core::{PDFDict, PDFObject};
use serde_json::Value;

pub fn to_pdf_object(value: &Value) -> Result<PDFObject> {
    Ok(match value {
        Value::Null => PDFObject::Null,
        Value::Bool(b) => PDFObject::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => PDFObject::Int(i),
            None => PDFObject::Real(n.as_f64().context("number out of range")?),
        },
        Value::String(s) => string_object(s)?,
        Value::Array(items) => PDFObject::Array(
            items
                .iter()
                .map(to_pdf_object)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Object(map) => PDFObject::Dict(to_pdf_dict(map)?),
    })
}

pub fn to_pdf_dict(map: &serde_json::Map<String, Value>) -> Result<PDFDict> {
    map.iter()
        .map(|(k, v)| {
            let key = k.strip_prefix('/').unwrap_or(k).to_string();
            let value = to_pdf_object(v).with_context(|| format!("in /{key}"))?;
            Ok((key, value))
        })
        .collect()
}

fn string_object(s: &str) -> Result<PDFObject> {
    if let Some(name) = s.strip_prefix('/') {
        return Ok(PDFObject::Name(name.to_string()));
    }
    if let Some(inner) = s.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
        let digits: String = inner.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = hex::decode(&digits).with_context(|| format!("bad hex string <{inner}>"))?;
        return Ok(PDFObject::String(bytes));
    }
    Ok(PDFObject::String(s.as_bytes().to_vec()))
}

/// Split a document file into its `/Encrypt` dictionary and a trailer holding `/ID`.
pub fn parse_document(value: &Value) -> Result<(PDFDict, PDFDict)> {
    let Some(root) = value.as_object() else {
        bail!("input must be a JSON object");
    };
    let encrypt = match root.get("encrypt") {
        Some(Value::Object(map)) => to_pdf_dict(map).context("in \"encrypt\"")?,
        Some(_) => bail!("\"encrypt\" must be an object"),
        None => bail!("missing \"encrypt\""),
    };
    let mut trailer = PDFDict::new();
    if let Some(id) = root.get("id") {
        trailer.insert("ID".into(), to_pdf_object(id).context("in \"id\"")?);
    }
    Ok((encrypt, trailer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_names_hex_and_literals() {
        assert_eq!(
            to_pdf_object(&json!("/Standard")).unwrap(),
            PDFObject::Name("Standard".into())
        );
        assert_eq!(
            to_pdf_object(&json!("<00ff 10>")).unwrap(),
            PDFObject::String(vec![0x00, 0xff, 0x10])
        );
        assert_eq!(
            to_pdf_object(&json!("abc")).unwrap(),
            PDFObject::String(b"abc".to_vec())
        );
        assert_eq!(to_pdf_object(&json!(-4)).unwrap(), PDFObject::Int(-4));
        assert_eq!(to_pdf_object(&json!(1.5)).unwrap(), PDFObject::Real(1.5));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(to_pdf_object(&json!("<zz>")).is_err());
    }

    #[test]
    fn dict_keys_may_carry_a_slash() {
        let dict = to_pdf_dict(json!({"/V": 1, "R": 2}).as_object().unwrap()).unwrap();
        assert_eq!(dict.get("V"), Some(&PDFObject::Int(1)));
        assert_eq!(dict.get("R"), Some(&PDFObject::Int(2)));
    }

    #[test]
    fn parse_document_builds_trailer() {
        let doc = json!({"encrypt": {"Filter": "/Standard"}, "id": ["<0102>", "<0304>"]});
        let (encrypt, trailer) = parse_document(&doc).unwrap();
        assert_eq!(encrypt.get("Filter"), Some(&PDFObject::Name("Standard".into())));
        assert_eq!(
            trailer.get("ID"),
            Some(&PDFObject::Array(vec![
                PDFObject::String(vec![1, 2]),
                PDFObject::String(vec![3, 4]),
            ]))
        );
        assert!(parse_document(&json!({"id": []})).is_err());
    }
}
