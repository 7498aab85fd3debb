//! Catalogue localisé des erreurs.
//!
//! Chaque condition porte un mnémonique stable sur quatre caractères et
//! un gabarit de message à trous positionnels `{}` (échappements `{{` et
//! `}}`). La recherche se fait par `(locale, code)` ; une locale absente
//! retombe sur `en_US`.

use crate::diag::Diagnostics;
use crate::SourceLocation;

/// Locale de repli, seule table embarquée pour l'instant.
pub const FALLBACK_LOCALE: &str = "en_US";

/// Conditions d'erreur du front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ----------------------
    // lexer
    // ----------------------
    /// L001
    UnableToConvertIntegerValue,
    /// L002
    UnableToNarrowIntegerValue,
    /// L003
    UnableToConvertFloatingPointValue,
    /// L004
    UnableToNarrowFloatingPointValue,
    /// L005
    InvalidIdentifierStartCharacter,
    /// L006
    ExpectedIdentifier,
    /// L007
    UnexpectedEndOfInput,
    /// L008
    UnexpectedDecimalPoint,
    /// L009
    ExpectedClosingSingleQuote,
    /// L010
    ExpectedDirectivePrefix,
    /// L011
    ExpectedAnnotationPrefix,
    /// L012
    ExponentNotationNotValidForIntegers,
    /// L013
    UnexpectedLetterAfterDecimalNumberLiteral,
    /// L014
    ExpectedHexLiteralPrefix,
    /// L015
    UnexpectedLetterAfterHexadecimalNumberLiteral,
    /// L016
    ExpectedOctalLiteralPrefix,
    /// L017
    UnexpectedLetterAfterOctalNumberLiteral,
    /// L018
    ExpectedBinaryLiteralPrefix,
    /// L019
    UnexpectedLetterAfterBinaryNumberLiteral,
    /// L020
    ExpectedClosingBlockLiteral,
    /// L021
    UnescapedQuote,

    // ----------------------
    // parser
    // ----------------------
    /// P001
    InvalidToken,
    /// P002
    UndefinedProductionRule,
    /// P003
    MissingOperatorProductionRule,
    /// P004
    UnexpectedToken,
    /// P005
    MemberSelectRequiresIdentifierLvalue,
    /// P006
    MemberSelectRequiresIdentifierRvalue,
    /// P007
    ExpectedExpression,
    /// P008
    InvalidAssignmentExpression,

    // ----------------------
    // io
    // ----------------------
    /// I001
    UnableToReadFile,
    /// I002
    UnableToWriteFile,

    // ----------------------
    // source buffer
    // ----------------------
    /// S001
    UnableToOpenFile,
    /// S002
    AtEndOfBuffer,
    /// S003
    AtBeginningOfBuffer,
    /// S004
    IllegalEncoding,
    /// S005
    IllegalNulCharacter,
    /// S006
    IllegalByteOrderMark,

    // ----------------------
    // graphviz
    // ----------------------
    /// G001
    AttributeTypeNotFound,
    /// G002
    InvalidAttributeForComponent,
}

/// Déclaration d'une condition : mnémonique, gabarit, détails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decl {
    /// Mnémonique stable (`L001`, …).
    pub code: &'static str,
    /// Gabarit de message, trous positionnels `{}`.
    pub message: &'static str,
    /// Détails complémentaires éventuels.
    pub details: &'static str,
}

const fn decl(code: &'static str, message: &'static str) -> Decl {
    Decl { code, message, details: "" }
}

fn decl_en_us(code: ErrorCode) -> Decl {
    use ErrorCode::*;
    match code {
        UnableToConvertIntegerValue => {
            decl("L001", "unable to convert integer value {} because {}")
        }
        UnableToNarrowIntegerValue => decl("L002", "unable to narrow integer value"),
        UnableToConvertFloatingPointValue => {
            decl("L003", "unable to convert floating point value {} because {}")
        }
        UnableToNarrowFloatingPointValue => {
            decl("L004", "unable to narrow floating point value")
        }
        InvalidIdentifierStartCharacter => {
            decl("L005", "identifiers must start with _ or a letter; found: {}")
        }
        ExpectedIdentifier => decl("L006", "expected identifier"),
        UnexpectedEndOfInput => decl("L007", "unexpected end of input"),
        UnexpectedDecimalPoint => decl("L008", "unexpected decimal point"),
        ExpectedClosingSingleQuote => decl("L009", "expected closing ' but found: {}"),
        ExpectedDirectivePrefix => decl("L010", "expected directive prefix: #"),
        ExpectedAnnotationPrefix => decl("L011", "expected annotation prefix: @"),
        ExponentNotationNotValidForIntegers => {
            decl("L012", "exponent notation is not valid for integer literals")
        }
        UnexpectedLetterAfterDecimalNumberLiteral => {
            decl("L013", "unexpected letter immediately after decimal number")
        }
        ExpectedHexLiteralPrefix => decl("L014", "expected hex prefix: $"),
        UnexpectedLetterAfterHexadecimalNumberLiteral => {
            decl("L015", "unexpected letter immediately after hexadecimal number")
        }
        ExpectedOctalLiteralPrefix => decl("L016", "expected octal prefix: @"),
        UnexpectedLetterAfterOctalNumberLiteral => {
            decl("L017", "unexpected letter immediately after octal number")
        }
        ExpectedBinaryLiteralPrefix => decl("L018", "expected binary prefix: %"),
        UnexpectedLetterAfterBinaryNumberLiteral => {
            decl("L019", "unexpected letter or non-binary digit immediately after binary number")
        }
        ExpectedClosingBlockLiteral => decl("L020", "expected }} but found: {}"),
        UnescapedQuote => decl("L021", "an unescaped quote was detected"),

        InvalidToken => decl("P001", "a token has not been properly configured for parsing"),
        UndefinedProductionRule => decl("P002", "undefined production rule"),
        MissingOperatorProductionRule => decl("P003", "missing operator production rule"),
        UnexpectedToken => decl("P004", "expected token {} but encountered {}"),
        MemberSelectRequiresIdentifierLvalue => {
            decl("P005", "member select requires identifier lvalue")
        }
        MemberSelectRequiresIdentifierRvalue => {
            decl("P006", "member select requires identifier rvalue")
        }
        ExpectedExpression => decl("P007", "expected expression"),
        InvalidAssignmentExpression => decl("P008", "invalid assignment expression"),

        UnableToReadFile => decl("I001", "unable to read text file: {}"),
        UnableToWriteFile => decl("I002", "unable to write text file: {}"),

        UnableToOpenFile => decl("S001", "unable to open source file: {}"),
        AtEndOfBuffer => decl("S002", "at end of buffer"),
        AtBeginningOfBuffer => decl("S003", "at beginning of buffer"),
        IllegalEncoding => decl("S004", "illegal utf-8 encoding"),
        IllegalNulCharacter => decl("S005", "illegal character NUL"),
        IllegalByteOrderMark => decl("S006", "illegal byte order mark"),

        AttributeTypeNotFound => decl("G001", "attribute type not found"),
        InvalidAttributeForComponent => {
            decl("G002", "invalid attribute '{}' for component '{}'")
        }
    }
}

/// Recherche la déclaration de `code` pour `locale` ; retombe sur `en_US`
/// quand la locale n'est pas embarquée.
#[must_use]
pub fn find_decl(locale: &str, code: ErrorCode) -> Decl {
    // Seule la table en_US existe pour l'instant ; toute autre locale
    // retombe dessus.
    let _ = locale;
    decl_en_us(code)
}

/// Interpole `args` dans les trous positionnels `{}` de `template`.
/// `{{` et `}}` produisent des accolades littérales.
#[must_use]
pub fn interpolate(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => match chars.peek() {
                Some('{') => {
                    chars.next();
                    out.push('{');
                }
                Some('}') => {
                    chars.next();
                    if let Some(arg) = args.get(next_arg) {
                        out.push_str(arg);
                    }
                    next_arg += 1;
                }
                _ => out.push('{'),
            },
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    out
}

/* ─────────────────────────── Aides d'insertion ─────────────────────────── */

/// Consigne une erreur localisée.
pub fn add_error(r: &mut Diagnostics, code: ErrorCode, loc: SourceLocation, args: &[String]) {
    let d = find_decl(FALLBACK_LOCALE, code);
    r.error(d.code, interpolate(d.message, args), loc, d.details.to_string());
}

/// Consigne un avertissement localisé.
pub fn add_warning(r: &mut Diagnostics, code: ErrorCode, loc: SourceLocation, args: &[String]) {
    let d = find_decl(FALLBACK_LOCALE, code);
    r.warning(d.code, interpolate(d.message, args), loc, d.details.to_string());
}

/// Consigne une information localisée (sans plage de source).
pub fn add_info(r: &mut Diagnostics, code: ErrorCode, args: &[String]) {
    let d = find_decl(FALLBACK_LOCALE, code);
    r.info(d.code, interpolate(d.message, args), SourceLocation::default(), d.details.to_string());
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_locale_falls_back_to_en_us() {
        let d = find_decl("fr_FR", ErrorCode::ExpectedIdentifier);
        assert_eq!(d.code, "L006");
        assert_eq!(d.message, "expected identifier");
    }

    #[test]
    fn interpolation_is_positional() {
        let rendered = interpolate(
            "unable to convert integer value {} because {}",
            &["99999999999999999999".to_string(), "overflow".to_string()],
        );
        assert_eq!(rendered, "unable to convert integer value 99999999999999999999 because overflow");
    }

    #[test]
    fn interpolation_unescapes_braces() {
        let rendered = interpolate("expected }} but found: {}", &["x".to_string()]);
        assert_eq!(rendered, "expected } but found: x");
    }

    #[test]
    fn helpers_render_into_the_log() {
        let mut r = Diagnostics::new();
        add_error(
            &mut r,
            ErrorCode::UnexpectedLetterAfterDecimalNumberLiteral,
            SourceLocation::default(),
            &[],
        );
        let msg = r.find_code("L013").unwrap();
        assert_eq!(msg.message, "unexpected letter immediately after decimal number");
        assert!(r.is_failed());
    }
}
