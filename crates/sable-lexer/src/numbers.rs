//! Conversion des captures numériques.
//!
//! Les séparateurs `_` sont retirés avant conversion ; le signe est porté
//! par l'enregistrement numérique, pas par la capture.

use core::fmt;
use std::num::IntErrorKind;

/// Echec de conversion d'une capture numérique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    /// Dépassement par le haut.
    Overflow,
    /// Dépassement par le bas.
    Underflow,
    /// Capture inconvertible.
    NotConvertible,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "overflow"),
            Self::Underflow => write!(f, "underflow"),
            Self::NotConvertible => write!(f, "not convertible"),
        }
    }
}

impl std::error::Error for ConversionError {}

fn remove_underscores(value: &str) -> String {
    value.chars().filter(|&c| c != '_').collect()
}

/// Convertit une capture entière dans `radix`.
pub fn parse_integer(value: &str, radix: u32) -> Result<i64, ConversionError> {
    let cleaned = remove_underscores(value);
    if cleaned.is_empty() {
        return Err(ConversionError::NotConvertible);
    }
    i64::from_str_radix(&cleaned, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ConversionError::Overflow,
        IntErrorKind::NegOverflow => ConversionError::Underflow,
        _ => ConversionError::NotConvertible,
    })
}

/// Convertit une capture flottante.
pub fn parse_double(value: &str) -> Result<f64, ConversionError> {
    let cleaned = remove_underscores(value);
    if cleaned.is_empty() {
        return Err(ConversionError::NotConvertible);
    }
    let parsed: f64 = cleaned.parse().map_err(|_| ConversionError::NotConvertible)?;
    if parsed.is_infinite() {
        return Err(ConversionError::Overflow);
    }
    Ok(parsed)
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn separators_are_ignored() {
        assert_eq!(parse_integer("1_234", 10), Ok(1234));
        assert_eq!(parse_integer("1111_0000", 2), Ok(0xF0));
        assert_eq!(parse_double("1_0.5"), Ok(10.5));
    }

    #[test]
    fn radixes() {
        assert_eq!(parse_integer("80", 16), Ok(128));
        assert_eq!(parse_integer("777", 8), Ok(511));
        assert_eq!(parse_integer("1010", 2), Ok(10));
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(parse_integer("99999999999999999999", 10), Err(ConversionError::Overflow));
        assert_eq!(parse_integer("-99999999999999999999", 10), Err(ConversionError::Underflow));
        assert_eq!(parse_double("1e999"), Err(ConversionError::Overflow));
    }

    #[test]
    fn garbage_is_not_convertible() {
        assert_eq!(parse_integer("", 10), Err(ConversionError::NotConvertible));
        assert_eq!(parse_integer("_", 10), Err(ConversionError::NotConvertible));
        assert_eq!(parse_double("abc"), Err(ConversionError::NotConvertible));
    }

    #[test]
    fn errors_render_like_the_catalog_expects() {
        assert_eq!(ConversionError::Overflow.to_string(), "overflow");
        assert_eq!(ConversionError::NotConvertible.to_string(), "not convertible");
    }
}
