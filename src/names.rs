//! QTI identifier and name validation
//!
//! QTI identifiers follow the NCName production restricted to the
//! characters QTI content actually uses: a letter or underscore followed by
//! letters, digits, `-`, `_` and `.`. Variable references reuse the same
//! grammar (the dot allows `item.SCORE` style references).

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-]*$").unwrap());

static NCNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-\x{B7}]*$").unwrap());

// xs:duration, e.g. PT1M30S, P1DT2H, -P3Y
static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?$")
        .unwrap()
});

/// Check if a string is a valid QTI identifier
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Check if a string is a valid variable reference
pub fn is_valid_variable_ref(name: &str) -> bool {
    is_valid_identifier(name)
}

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Check if a string is a valid xs:duration literal
pub fn is_valid_duration(value: &str) -> bool {
    // "P" and "PT" alone match the pattern but carry no component
    DURATION.is_match(value) && !value.ends_with('P') && !value.ends_with('T')
}

/// Validate an identifier and return an error if invalid
pub fn validate_identifier(name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "'{}' is not a valid QTI Identifier.",
            name
        )))
    }
}

/// Split a prefixed name into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("RESPONSE"));
        assert!(is_valid_identifier("choice-A"));
        assert!(is_valid_identifier("_hidden"));
        assert!(is_valid_identifier("item.SCORE"));
        assert!(is_valid_identifier("Q01"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("999"));
        assert!(!is_valid_identifier("-choice"));
        assert!(!is_valid_identifier("my choice"));
        assert!(!is_valid_identifier("ns:choice"));
    }

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(!is_valid_ncname("prefix:element"));
        assert!(!is_valid_ncname(""));
    }

    #[test]
    fn test_is_valid_duration() {
        assert!(is_valid_duration("PT1M"));
        assert!(is_valid_duration("P1DT2H"));
        assert!(is_valid_duration("PT0.5S"));
        assert!(is_valid_duration("-P3Y"));

        assert!(!is_valid_duration("P"));
        assert!(!is_valid_duration("PT"));
        assert!(!is_valid_duration("1M"));
        assert!(!is_valid_duration("PT1.S"));
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("value"), (None, "value"));
        assert_eq!(split_qname("m:math"), (Some("m"), "math"));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("SCORE").is_ok());
        assert!(validate_identifier("999").is_err());
    }
}
