//! Modèle de jetons.
//!
//! Un jeton est le triplet `{genre, tranche de valeur, localisation}` plus
//! un sous-enregistrement éventuel : enregistrement numérique pour les
//! littéraux de nombre, arbre de captures pour les commentaires blocs,
//! marqueurs pour les littéraux de chaîne. Les tranches empruntent au
//! tampon de source pour toute la durée de la session.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sable_core::SourceLocation;

/* ─────────────────────────── Genres ─────────────────────────── */

/// Genre d'un jeton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenKind {
    /// Littéral (nombre, chaîne, bloc).
    Literal,
    /// Commentaire ligne ou bloc.
    Comment,
    /// Mot-clé.
    Keyword,
    /// Directive `#nom`.
    Directive,
    /// Opérateur (glyphes et mots).
    Operator,
    /// Identifiant.
    Identifier,
    /// Annotation `@nom`.
    Annotation,
    /// Ponctuation.
    Punctuation,
    /// Fin d'entrée.
    EndOfInput,
}

impl TokenKind {
    /// Nom affichable du genre.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Comment => "comment",
            Self::Keyword => "keyword",
            Self::Directive => "directive",
            Self::Operator => "operator",
            Self::Identifier => "identifier",
            Self::Annotation => "annotation",
            Self::Punctuation => "punctuation",
            Self::EndOfInput => "end_of_input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/* ─────────────────────────── Nombres ─────────────────────────── */

/// Famille numérique d'un littéral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NumberType {
    /// Pas un nombre.
    None,
    /// Entier.
    Integer,
    /// Précision arbitraire (réservé).
    Arbitrary,
    /// Flottant.
    FloatingPoint,
}

impl NumberType {
    /// Nom affichable.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Integer => "integer",
            Self::Arbitrary => "arbitrary",
            Self::FloatingPoint => "floating_point",
        }
    }
}

/// Taille rétrécie d'un littéral numérique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NumberSize {
    /// 8 bits.
    Byte,
    /// 16 bits.
    Word,
    /// 32 bits.
    Dword,
    /// 64 bits.
    Qword,
}

impl NumberSize {
    /// Nom affichable.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Word => "word",
            Self::Dword => "dword",
            Self::Qword => "qword",
        }
    }
}

/// Valeur rétrécie : somme discriminée à la place de l'union C.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NumberValue {
    /// Octet.
    U8(u8),
    /// Mot.
    U16(u16),
    /// Double mot.
    U32(u32),
    /// Quadruple mot.
    U64(u64),
    /// Flottant 32 bits.
    F32(f32),
    /// Flottant 64 bits.
    F64(f64),
}

impl NumberValue {
    /// Vue entière (zéro-étendue) de la valeur, pour les familles entières.
    #[must_use]
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Self::U8(v) => Some(u64::from(v)),
            Self::U16(v) => Some(u64::from(v)),
            Self::U32(v) => Some(u64::from(v)),
            Self::U64(v) => Some(v),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    /// Vue flottante de la valeur, pour les familles flottantes.
    #[must_use]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(v)),
            Self::F64(v) => Some(v),
            _ => None,
        }
    }
}

/// Enregistrement numérique attaché aux littéraux de nombre.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NumberToken {
    /// Signe `-` en tête du littéral décimal.
    pub is_signed: bool,
    /// Suffixe imaginaire `i`.
    pub imaginary: bool,
    /// Base : 2, 8, 10 ou 16.
    pub radix: u8,
    /// Famille numérique.
    pub number_type: NumberType,
    /// Taille rétrécie.
    pub size: NumberSize,
    /// Valeur rétrécie.
    pub value: NumberValue,
}

/// Plus petite taille contenant `value` sans perte.
#[must_use]
pub fn narrow_integer(value: i64) -> Option<NumberSize> {
    if (-128..=255).contains(&value) {
        Some(NumberSize::Byte)
    } else if (-32_768..=65_535).contains(&value) {
        Some(NumberSize::Word)
    } else if (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
        Some(NumberSize::Dword)
    } else {
        Some(NumberSize::Qword)
    }
}

/// Plus petite taille flottante représentant `value` sans perte.
#[must_use]
pub fn narrow_double(value: f64) -> Option<NumberSize> {
    #[allow(clippy::cast_possible_truncation)]
    let as_f32 = value as f32;
    if f64::from(as_f32) == value {
        Some(NumberSize::Dword)
    } else {
        Some(NumberSize::Qword)
    }
}

/// Range `value` dans `token` à la taille `size`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn apply_narrowed_integer(token: &mut NumberToken, size: NumberSize, value: i64) {
    token.size = size;
    token.value = match size {
        NumberSize::Byte => NumberValue::U8(value as u8),
        NumberSize::Word => NumberValue::U16(value as u16),
        NumberSize::Dword => NumberValue::U32(value as u32),
        NumberSize::Qword => NumberValue::U64(value as u64),
    };
}

/// Range `value` dans `token` à la taille flottante `size`.
#[allow(clippy::cast_possible_truncation)]
pub fn apply_narrowed_double(token: &mut NumberToken, size: NumberSize, value: f64) {
    token.size = size;
    token.value = match size {
        NumberSize::Dword => NumberValue::F32(value as f32),
        _ => NumberValue::F64(value),
    };
}

/* ─────────────────────────── Commentaires ─────────────────────────── */

/// Capture d'un commentaire bloc : tranche interne (délimiteurs exclus)
/// et captures imbriquées, dans l'ordre d'ouverture.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockCommentCapture<'src> {
    /// Tranche interne, délimiteurs exclus.
    pub capture: &'src str,
    /// Blocs imbriqués.
    pub children: Vec<BlockCommentCapture<'src>>,
}

impl BlockCommentCapture<'_> {
    /// Profondeur maximale de l'arbre (1 pour un bloc sans enfant).
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }
}

/* ─────────────────────────── Jeton ─────────────────────────── */

/// Sous-enregistrement éventuel d'un jeton.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenDetail<'src> {
    /// Enregistrement numérique.
    Number(NumberToken),
    /// Commentaire ligne.
    LineComment,
    /// Commentaire bloc et ses captures imbriquées.
    BlockComment(BlockCommentCapture<'src>),
    /// Littéral de chaîne.
    StringLiteral,
    /// Littéral bloc `{{ … }}`.
    BlockLiteral,
}

/// Indice stable d'un jeton dans le flux produit par le lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TokenId(pub u32);

impl TokenId {
    /// Jeton désigné dans `tokens`.
    #[must_use]
    pub fn get<'a, 'src>(self, tokens: &'a [Token<'src>]) -> &'a Token<'src> {
        &tokens[self.0 as usize]
    }
}

/// Un jeton classifié.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token<'src> {
    /// Genre.
    pub kind: TokenKind,
    /// Tranche de valeur, empruntée au tampon de source.
    pub value: &'src str,
    /// Sous-enregistrement éventuel.
    pub detail: Option<TokenDetail<'src>>,
    /// Localisation dans la source.
    pub location: SourceLocation,
}

impl<'src> Token<'src> {
    /// Enregistrement numérique, pour les littéraux de nombre.
    #[must_use]
    pub fn number(&self) -> Option<&NumberToken> {
        match &self.detail {
            Some(TokenDetail::Number(n)) => Some(n),
            _ => None,
        }
    }

    /// Arbre de captures, pour les commentaires blocs.
    #[must_use]
    pub fn block_comment(&self) -> Option<&BlockCommentCapture<'src>> {
        match &self.detail {
            Some(TokenDetail::BlockComment(c)) => Some(c),
            _ => None,
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
