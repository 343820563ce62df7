//! SASLprep (RFC 4013) password preparation.

use pdfsec_core::PdfError;
use pdfsec_core::security::saslprep::saslprep;

#[test]
fn test_ascii_passthrough() {
    assert_eq!(saslprep("hello").unwrap(), "hello");
    assert_eq!(saslprep("Test String 123").unwrap(), "Test String 123");
}

#[test]
fn test_empty_password() {
    assert_eq!(saslprep("").unwrap(), "");
}

#[test]
fn test_non_ascii_space_mapping() {
    assert_eq!(saslprep("\u{00A0}").unwrap(), " ");
    assert_eq!(saslprep("\u{2002}").unwrap(), " ");
    assert_eq!(saslprep("\u{3000}").unwrap(), " ");
    assert_eq!(saslprep("a\u{00A0}b").unwrap(), "a b");
}

#[test]
fn test_mapped_to_nothing() {
    assert_eq!(saslprep("pass\u{00AD}word").unwrap(), "password");
    assert_eq!(saslprep("pass\u{200B}word").unwrap(), "password");
    assert_eq!(saslprep("\u{FEFF}").unwrap(), "");
}

#[test]
fn test_nfkc_normalization() {
    // ROMAN NUMERAL NINE
    assert_eq!(saslprep("\u{2168}").unwrap(), "IX");
    // SUPERSCRIPT TWO
    assert_eq!(saslprep("x\u{00B2}").unwrap(), "x2");
    // Composed and decomposed forms prepare identically.
    assert_eq!(saslprep("e\u{0301}").unwrap(), saslprep("\u{00E9}").unwrap());
}

#[test]
fn test_prohibited_characters() {
    let prohibited = [
        "\u{0000}",
        "\u{0007}",
        "test\u{007F}",
        "\u{0085}",
        "\u{E000}",
        "\u{FFFF}",
        "\u{FFFD}",
        "\u{200E}",
        "\u{E0001}",
    ];
    for bad in prohibited {
        assert!(
            matches!(saslprep(bad), Err(PdfError::SaslPrepError(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn test_bidirectional_check() {
    // Arabic text
    assert!(saslprep("\u{0627}\u{0644}\u{0639}\u{0631}\u{0628}\u{064A}\u{0629}").is_ok());
    // Hebrew letters around a digit
    assert!(saslprep("\u{05D0}1\u{05D1}").is_ok());

    // Right-to-left followed by left-to-right
    assert!(saslprep("\u{0627}abc").is_err());
    // Right-to-left text ending in a digit
    assert!(saslprep("\u{05D0}1").is_err());

    assert!(saslprep("hello").is_ok());
}

#[test]
fn test_unassigned_code_points_are_allowed() {
    // Unassigned in Unicode 3.2, passwords are prepared as queries.
    assert_eq!(saslprep("hello\u{0221}world").unwrap(), "hello\u{0221}world");
}
