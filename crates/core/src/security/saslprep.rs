//! SASLprep (RFC 4013) for R6 passwords.
//!
//! Passwords are prepared with the "query" profile: unassigned code points pass
//! through, since a document written by a newer Unicode version must still open.
//! Bidi categories come from `unicode-bidi` rather than the frozen RFC 3454 D tables.

use unicode_bidi::{BidiClass, bidi_class};
use unicode_normalization::UnicodeNormalization;

use crate::{PdfError, Result};

/// Characters mapped to nothing (RFC 3454 B.1).
fn maps_to_nothing(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{034F}'
            | '\u{1806}'
            | '\u{180B}'..='\u{180D}'
            | '\u{200B}'..='\u{200D}'
            | '\u{2060}'
            | '\u{FE00}'..='\u{FE0F}'
            | '\u{FEFF}'
    )
}

/// Non-ASCII spaces, mapped to U+0020 (RFC 3454 C.1.2).
fn is_non_ascii_space(c: char) -> bool {
    matches!(
        c,
        '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200B}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// RFC 4013 section 2.3: the C.1.2 through C.9 tables.
fn prohibited_class(c: char) -> Option<&'static str> {
    let class = match c {
        _ if is_non_ascii_space(c) => "non-ASCII space",
        '\u{0000}'..='\u{001F}' | '\u{007F}' => "ASCII control",
        '\u{0080}'..='\u{009F}'
        | '\u{06DD}'
        | '\u{070F}'
        | '\u{180E}'
        | '\u{200C}'
        | '\u{200D}'
        | '\u{2028}'
        | '\u{2029}'
        | '\u{2060}'..='\u{2063}'
        | '\u{FEFF}'
        | '\u{1D173}'..='\u{1D17A}' => "non-ASCII control",
        '\u{E000}'..='\u{F8FF}' | '\u{F0000}'..='\u{FFFFD}' | '\u{100000}'..='\u{10FFFD}' => {
            "private use"
        }
        '\u{FDD0}'..='\u{FDEF}' => "non-character",
        _ if (c as u32) & 0xFFFE == 0xFFFE => "non-character",
        '\u{FFF9}'..='\u{FFFD}' => "inappropriate for plain text",
        '\u{2FF0}'..='\u{2FFB}' => "ideographic description",
        '\u{0340}' | '\u{0341}' | '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}'
        | '\u{206A}'..='\u{206F}' => "display property",
        '\u{E0001}' | '\u{E0020}'..='\u{E007F}' => "tagging",
        _ => return None,
    };
    Some(class)
}

fn is_rand_al(c: char) -> bool {
    matches!(bidi_class(c), BidiClass::R | BidiClass::AL)
}

fn is_l(c: char) -> bool {
    bidi_class(c) == BidiClass::L
}

/// Prepare a password with SASLprep.
///
/// # Errors
/// `SaslPrepError` when the normalized string contains a prohibited character or
/// mixes right-to-left and left-to-right text.
pub fn saslprep(data: &str) -> Result<String> {
    let mapped: String = data
        .chars()
        .filter(|&c| !maps_to_nothing(c))
        .map(|c| if is_non_ascii_space(c) { ' ' } else { c })
        .collect();

    let normalized: String = mapped.nfkc().collect();

    if let Some((c, class)) = normalized
        .chars()
        .find_map(|c| prohibited_class(c).map(|class| (c, class)))
    {
        return Err(PdfError::SaslPrepError(format!(
            "prohibited {class} character U+{:04X}",
            c as u32
        )));
    }

    let (Some(first), Some(last)) = (normalized.chars().next(), normalized.chars().last()) else {
        return Ok(normalized);
    };
    if normalized.chars().any(is_rand_al) {
        if normalized.chars().any(is_l) {
            return Err(PdfError::SaslPrepError(
                "mixes right-to-left and left-to-right text".into(),
            ));
        }
        if !is_rand_al(first) || !is_rand_al(last) {
            return Err(PdfError::SaslPrepError(
                "right-to-left text must start and end with a right-to-left character".into(),
            ));
        }
    }

    Ok(normalized)
}
