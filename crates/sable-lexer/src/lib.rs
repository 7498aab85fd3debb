//! sable-lexer — analyse lexicale du langage Sable
//!
//! Le lexer est piloté par un trie de lexèmes : la boucle principale pose
//! une marque, descend le trie rune par rune en retenant le plus long
//! match, puis soit émet un jeton sur la plage reconnue, soit rembobine
//! et délègue à un tokenizer spécialisé (nombres par radix, chaînes,
//! blocs, commentaires imbriqués, identifiants, directives, annotations).
//!
//! Particularités :
//! - un mot (mot-clé ou opérateur-mot comme `in`/`shl`) est rejeté si la
//!   rune qui suit le match est alphanumérique ou `_` : `continueif` est
//!   un identifiant, pas `continue` + `if`
//! - les littéraux numériques sont convertis puis rétrécis vers la plus
//!   petite taille parmi byte/word/dword/qword
//! - les commentaires blocs s'imbriquent librement et produisent un arbre
//!   de captures, délimiteurs exclus

#![deny(missing_docs)]

use std::sync::OnceLock;

use sable_core::catalog::ErrorCode;
use sable_core::diag::Diagnostics;
use sable_core::term::StreamFactory;
use sable_core::{CoreResult, Failed, Location, SourceLocation};
use sable_source::highlight::add_source_highlighted_error;
use sable_source::{Cursor, SourceBuffer};

pub mod escape;
pub mod numbers;
pub mod token;
pub mod trie;

pub use token::{
    apply_narrowed_double, apply_narrowed_integer, narrow_double, narrow_integer,
    BlockCommentCapture, NumberSize, NumberToken, NumberType, NumberValue, Token, TokenDetail,
    TokenId, TokenKind,
};
pub use trie::{LexemeTrie, TrieIndex};

/* ─────────────────────────── Lexèmes ─────────────────────────── */

/// Tokenizer spécialisé invoqué après rembobinage sur la marque.
pub type Tokenizer =
    for<'src> fn(&mut Lexer<'src>, &mut Diagnostics, &mut Vec<Token<'src>>) -> CoreResult<()>;

/// Un lexème reconnu par le trie : genre du jeton à émettre, indicateur
/// de mot (sujet au rejet de suffixe alphanumérique), continuation
/// éventuelle vers un tokenizer spécialisé.
#[derive(Debug, Clone, Copy)]
pub struct Lexeme {
    /// Genre du jeton émis sur match simple.
    pub kind: TokenKind,
    /// Vrai pour les mots-clés et opérateurs-mots.
    pub word: bool,
    /// Tokenizer spécialisé éventuel.
    pub tokenizer: Option<Tokenizer>,
}

fn lexicon() -> &'static LexemeTrie<Lexeme> {
    static LEXEMES: OnceLock<LexemeTrie<Lexeme>> = OnceLock::new();
    LEXEMES.get_or_init(build_lexicon)
}

fn build_lexicon() -> LexemeTrie<Lexeme> {
    let glyph = |kind: TokenKind| Lexeme { kind, word: false, tokenizer: None };
    let word = |kind: TokenKind| Lexeme { kind, word: true, tokenizer: None };
    let starter = |kind: TokenKind, tokenizer: Tokenizer| Lexeme {
        kind,
        word: false,
        tokenizer: Some(tokenizer),
    };

    let mut trie = LexemeTrie::new();

    for digit in '0'..='9' {
        trie.insert(&digit.to_string(), starter(TokenKind::Literal, dec_number_literal));
        trie.insert(&format!("-{digit}"), starter(TokenKind::Literal, dec_number_literal));
    }
    for digit in "0123456789abcdefABCDEF".chars() {
        trie.insert(&format!("${digit}"), starter(TokenKind::Literal, hex_number_literal));
    }
    for digit in '0'..='1' {
        trie.insert(&format!("%{digit}"), starter(TokenKind::Literal, binary_number_literal));
    }
    for digit in '0'..='7' {
        trie.insert(&format!("@{digit}"), starter(TokenKind::Literal, octal_number_literal));
    }

    trie.insert("\"", starter(TokenKind::Literal, string_literal));
    trie.insert("{{", starter(TokenKind::Literal, block_string_literal));

    trie.insert("//", starter(TokenKind::Comment, line_comment));
    trie.insert("--", starter(TokenKind::Comment, line_comment));
    trie.insert("/*", starter(TokenKind::Comment, block_comment));

    trie.insert("#", starter(TokenKind::Directive, directive));
    trie.insert("@", starter(TokenKind::Annotation, annotation));

    for punctuation in ["'", ":", ";", ",", "{", "}", "(", ")", "[", "]", "\\"] {
        trie.insert(punctuation, glyph(TokenKind::Punctuation));
    }

    for operator in [
        "&", "|", "~", "**", "+", "-", "*", "/", "%", "&&", "||", ">", "<", ">=", "<=", "==",
        "!=", ":=", "%:=", "/:=", "*:=", "-:=", "+:=", "&:=", "|:=", "~:=", "::", "=>", "->", ".",
    ] {
        trie.insert(operator, glyph(TokenKind::Operator));
    }

    for operator in ["in", "xor", "shl", "shr", "rol", "ror"] {
        trie.insert(operator, word(TokenKind::Operator));
    }

    for keyword in [
        "if", "ns", "for", "nil", "use", "true", "cast", "case", "proc", "enum", "else", "with",
        "goto", "false", "defer", "break", "union", "yield", "struct", "return", "switch",
        "family", "module", "import", "else if", "continue", "transmute", "fallthrough",
    ] {
        trie.insert(keyword, word(TokenKind::Keyword));
    }

    trie
}

/* ────────── Continuations de la table des lexèmes ────────── */

// Le trie est partagé entre toutes les sources : ses continuations
// doivent rester polymorphes sur la durée de vie du tampon, d'où ces
// fonctions libres qui relaient vers les méthodes du lexer.

fn dec_number_literal<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.dec_number_literal(r, tokens)
}

fn hex_number_literal<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.hex_number_literal(r, tokens)
}

fn octal_number_literal<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.octal_number_literal(r, tokens)
}

fn binary_number_literal<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.binary_number_literal(r, tokens)
}

fn string_literal<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.string_literal(r, tokens)
}

fn block_string_literal<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.block_string_literal(r, tokens)
}

fn line_comment<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.line_comment(r, tokens)
}

fn block_comment<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.block_comment(r, tokens)
}

fn directive<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.directive(r, tokens)
}

fn annotation<'src>(
    lexer: &mut Lexer<'src>,
    r: &mut Diagnostics,
    tokens: &mut Vec<Token<'src>>,
) -> CoreResult<()> {
    lexer.annotation(r, tokens)
}

/* ─────────────────────────── Lexer ─────────────────────────── */

/// Analyseur lexical sur un tampon de source chargé.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    term: StreamFactory,
}

impl<'src> Lexer<'src> {
    /// Crée un lexer sur `buffer`, sans couleur dans les diagnostics.
    #[must_use]
    pub fn new(buffer: &'src SourceBuffer) -> Self {
        Self::with_term(buffer, StreamFactory::new())
    }

    /// Crée un lexer avec une fabrique de flux terminal explicite.
    #[must_use]
    pub fn with_term(buffer: &'src SourceBuffer, term: StreamFactory) -> Self {
        Self { cursor: buffer.cursor(), term }
    }

    /// Tokenise tout le tampon et termine par un jeton `end_of_input`.
    /// Echec fatal dans un tokenizer → la passe s'arrête là.
    pub fn tokenize(&mut self, r: &mut Diagnostics) -> CoreResult<Vec<Token<'src>>> {
        log::debug!("tokenize: {} octets", self.cursor.buffer().len());
        let mut tokens = Vec::new();

        while !self.cursor.eof() {
            let mut rune = self.cursor.curr(r)?;

            if rune.is_space() {
                if !self.cursor.move_next(r)? {
                    break;
                }
                continue;
            }

            self.cursor.push_mark();

            // Descente du trie : on retient le plus long lexème vu et la
            // position juste après lui.
            let mut current = None;
            let mut matched: Option<(Lexeme, usize)> = None;
            loop {
                let Some(node) = lexicon().find(current, rune) else {
                    break;
                };
                current = Some(node);
                self.cursor.move_next(r)?;
                if let Some(&lexeme) = lexicon().value(node) {
                    matched = Some((lexeme, self.cursor.pos()));
                }
                rune = self.cursor.curr(r)?;
            }

            // Un mot suivi d'une rune alphanumérique ou `_` n'en est pas
            // un : `continueif` redevient un identifiant entier.
            if let Some((lexeme, end)) = matched {
                if lexeme.word {
                    self.cursor.seek(end);
                    let after = self.cursor.curr(r)?;
                    if after.is_alpha() || after.is_digit() || after == '_' {
                        matched = None;
                    }
                }
            }

            match matched {
                None => {
                    self.cursor.restore_top_mark();
                    let start = self.cursor.pop_mark();
                    if self.identifier(r, &mut tokens).is_err() {
                        self.highlighted(r, ErrorCode::ExpectedIdentifier, start, &[]);
                        return Err(Failed);
                    }
                }
                Some((lexeme, end)) => {
                    if let Some(tokenizer) = lexeme.tokenizer {
                        self.cursor.restore_top_mark();
                        self.cursor.pop_mark();
                        tokenizer(self, r, &mut tokens)?;
                    } else {
                        let start = self.cursor.pop_mark();
                        self.cursor.seek(end);
                        tokens.push(Token {
                            kind: lexeme.kind,
                            value: self.cursor.make_slice(start, end - start),
                            detail: None,
                            location: self.make_location(start, end),
                        });
                    }
                }
            }
        }

        let at_end = self.cursor.pos();
        tokens.push(Token {
            kind: TokenKind::EndOfInput,
            value: "",
            detail: None,
            location: self.make_location(at_end, at_end),
        });

        log::debug!("tokenize: {} jetons", tokens.len());
        if r.is_failed() {
            Err(Failed)
        } else {
            Ok(tokens)
        }
    }

    /* ────────── Aides internes ────────── */

    fn highlighted(&self, r: &mut Diagnostics, code: ErrorCode, start: usize, args: &[String]) {
        let loc = self.make_location(start, self.cursor.pos());
        add_source_highlighted_error(r, code, self.cursor.buffer(), &self.term, loc, args);
    }

    fn make_location(&self, start: usize, end: usize) -> SourceLocation {
        let buffer = self.cursor.buffer();
        let position = |index: usize| {
            Location::new(
                buffer.line_by_index(index).map_or(0, |line| line.line),
                buffer.column_by_index(index),
            )
        };
        SourceLocation::new(position(start), position(end))
    }

    // Balaye un identifiant : `_` ou lettre, puis alphanumériques et `_`.
    // Rend (début, fin, capture).
    fn scan_identifier(&mut self, r: &mut Diagnostics) -> CoreResult<(usize, usize, &'src str)> {
        let start = self.cursor.pos();

        let rune = self.cursor.curr(r)?;
        if rune != '_' && !rune.is_alpha() {
            self.highlighted(
                r,
                ErrorCode::InvalidIdentifierStartCharacter,
                start,
                &[rune.to_string()],
            );
            return Err(Failed);
        }

        if self.cursor.move_next(r)? {
            loop {
                let rune = self.cursor.curr(r)?;
                if !rune.is_digit() && !rune.is_alpha() && rune != '_' {
                    break;
                }
                if !self.cursor.move_next(r)? {
                    break;
                }
            }
        }

        let end = self.cursor.pos();
        Ok((start, end, self.cursor.make_slice(start, end - start)))
    }

    /* ────────── Tokenizers spécialisés ────────── */

    fn identifier(&mut self, r: &mut Diagnostics, tokens: &mut Vec<Token<'src>>) -> CoreResult<()> {
        let (start, end, capture) = self.scan_identifier(r)?;
        tokens.push(Token {
            kind: TokenKind::Identifier,
            value: capture,
            detail: None,
            location: self.make_location(start, end),
        });
        Ok(())
    }

    fn directive(&mut self, r: &mut Diagnostics, tokens: &mut Vec<Token<'src>>) -> CoreResult<()> {
        let prefix = self.cursor.pos();
        let rune = self.cursor.next(r)?;
        if rune != '#' {
            self.highlighted(r, ErrorCode::ExpectedDirectivePrefix, prefix, &[]);
            return Err(Failed);
        }

        let (start, end, capture) = self.scan_identifier(r)?;
        tokens.push(Token {
            kind: TokenKind::Directive,
            value: capture,
            detail: None,
            location: self.make_location(start, end),
        });
        Ok(())
    }

    fn annotation(&mut self, r: &mut Diagnostics, tokens: &mut Vec<Token<'src>>) -> CoreResult<()> {
        let prefix = self.cursor.pos();
        let rune = self.cursor.next(r)?;
        if rune != '@' {
            self.highlighted(r, ErrorCode::ExpectedAnnotationPrefix, prefix, &[]);
            return Err(Failed);
        }

        let (start, end, capture) = self.scan_identifier(r)?;
        tokens.push(Token {
            kind: TokenKind::Annotation,
            value: capture,
            detail: None,
            location: self.make_location(start, end),
        });
        Ok(())
    }

    fn line_comment(&mut self, r: &mut Diagnostics, tokens: &mut Vec<Token<'src>>) -> CoreResult<()> {
        // Préfixé par // ou --.
        self.cursor.move_next(r)?;
        self.cursor.move_next(r)?;

        let start = self.cursor.pos();
        loop {
            let rune = self.cursor.curr(r)?;
            if rune == '\n' || rune.is_eof() {
                break;
            }
            if !self.cursor.move_next(r)? {
                break;
            }
        }

        let end = self.cursor.pos();
        tokens.push(Token {
            kind: TokenKind::Comment,
            value: self.cursor.make_slice(start, end - start),
            detail: Some(TokenDetail::LineComment),
            location: self.make_location(start, end),
        });
        Ok(())
    }

    fn block_comment(&mut self, r: &mut Diagnostics, tokens: &mut Vec<Token<'src>>) -> CoreResult<()> {
        // Préfixé par /*.
        self.cursor.move_next(r)?;
        self.cursor.move_next(r)?;

        let start = self.cursor.pos();
        let root = self.scan_comment_block(r, start)?;
        let end = self.cursor.pos() - 2;

        tokens.push(Token {
            kind: TokenKind::Comment,
            value: self.cursor.substring(start, end),
            detail: Some(TokenDetail::BlockComment(root)),
            location: self.make_location(start, end),
        });
        Ok(())
    }

    // Balaye un niveau de commentaire bloc ; chaque `/*` rencontré ouvre
    // récursivement une capture enfant, `*/` clôt le niveau courant.
    fn scan_comment_block(
        &mut self,
        r: &mut Diagnostics,
        start: usize,
    ) -> CoreResult<BlockCommentCapture<'src>> {
        let mut children = Vec::new();

        loop {
            let rune = self.cursor.curr(r)?;
            if rune.is_eof() {
                self.highlighted(r, ErrorCode::UnexpectedEndOfInput, start, &[]);
                return Err(Failed);
            }

            if rune == '/' {
                self.cursor.move_next(r)?;
                let next = self.cursor.curr(r)?;
                if next == '*' {
                    self.cursor.move_next(r)?;
                    let child_start = self.cursor.pos();
                    children.push(self.scan_comment_block(r, child_start)?);
                }
                continue;
            }

            if rune == '*' {
                self.cursor.move_next(r)?;
                let next = self.cursor.curr(r)?;
                if next == '/' {
                    self.cursor.move_next(r)?;
                    let end = self.cursor.pos() - 2;
                    return Ok(BlockCommentCapture {
                        capture: self.cursor.substring(start, end),
                        children,
                    });
                }
                continue;
            }

            self.cursor.move_next(r)?;
        }
    }

    fn string_literal(&mut self, r: &mut Diagnostics, tokens: &mut Vec<Token<'src>>) -> CoreResult<()> {
        // Préfixé par ".
        self.cursor.move_next(r)?;

        let start = self.cursor.pos();
        loop {
            let rune = self.cursor.curr(r)?;
            if rune.is_eof() {
                self.highlighted(r, ErrorCode::UnexpectedEndOfInput, start, &[]);
                return Err(Failed);
            }
            // Une fin de ligne avant la fermante : la quote ouvrante est
            // restée sans écho.
            if rune == '\n' {
                self.highlighted(r, ErrorCode::UnescapedQuote, start, &[]);
                return Err(Failed);
            }
            // L'interprétation des échappements est différée ; on ne les
            // traverse que pour ne pas clore sur un `\"`.
            if rune == '\\' {
                self.cursor.move_next(r)?;
                self.cursor.move_next(r)?;
                continue;
            }
            if rune == '"' {
                self.cursor.move_next(r)?;
                break;
            }
            self.cursor.move_next(r)?;
        }

        let end = self.cursor.pos() - 1;
        tokens.push(Token {
            kind: TokenKind::Literal,
            value: self.cursor.substring(start, end),
            detail: Some(TokenDetail::StringLiteral),
            location: self.make_location(start, end),
        });
        Ok(())
    }

    fn block_string_literal(
        &mut self,
        r: &mut Diagnostics,
        tokens: &mut Vec<Token<'src>>,
    ) -> CoreResult<()> {
        // Préfixé par {{.
        self.cursor.move_next(r)?;
        self.cursor.move_next(r)?;

        let start = self.cursor.pos();
        loop {
            let rune = self.cursor.curr(r)?;
            if rune.is_eof() {
                self.highlighted(r, ErrorCode::UnexpectedEndOfInput, start, &[]);
                return Err(Failed);
            }
            if rune == '}' {
                self.cursor.move_next(r)?;
                let next = self.cursor.curr(r)?;
                if next != '}' {
                    self.highlighted(
                        r,
                        ErrorCode::ExpectedClosingBlockLiteral,
                        start,
                        &[next.to_string()],
                    );
                    return Err(Failed);
                }
                self.cursor.move_next(r)?;
                break;
            }
            self.cursor.move_next(r)?;
        }

        let end = self.cursor.pos() - 2;
        tokens.push(Token {
            kind: TokenKind::Literal,
            value: self.cursor.substring(start, end),
            detail: Some(TokenDetail::BlockLiteral),
            location: self.make_location(start, end),
        });
        Ok(())
    }

    fn dec_number_literal(
        &mut self,
        r: &mut Diagnostics,
        tokens: &mut Vec<Token<'src>>,
    ) -> CoreResult<()> {
        let mut imaginary = false;
        let mut number_type = NumberType::Integer;

        let rune = self.cursor.curr(r)?;
        let is_signed = rune == '-';
        if is_signed {
            self.cursor.move_next(r)?;
        }

        let start = self.cursor.pos();
        self.scan_dec_digits(r, start, &mut number_type)?;

        let rune = self.cursor.curr(r)?;
        if rune == 'e' || rune == 'E' {
            if number_type != NumberType::FloatingPoint {
                self.highlighted(r, ErrorCode::ExponentNotationNotValidForIntegers, start, &[]);
                return Err(Failed);
            }

            self.cursor.move_next(r)?;
            let rune = self.cursor.curr(r)?;
            if rune == '-' || rune == '+' {
                self.cursor.move_next(r)?;
            }

            let exponent_start = self.cursor.pos();
            self.scan_dec_digits(r, exponent_start, &mut number_type)?;

            let rune = self.cursor.curr(r)?;
            if rune == 'i' {
                self.cursor.move_next(r)?;
                imaginary = true;
            }
        } else if rune.is_alpha() {
            self.highlighted(r, ErrorCode::UnexpectedLetterAfterDecimalNumberLiteral, start, &[]);
            return Err(Failed);
        }

        let capture = self.cursor.make_slice(start, self.cursor.pos() - start);
        self.make_number_token(r, tokens, start, imaginary, is_signed, 10, number_type, capture)
    }

    fn scan_dec_digits(
        &mut self,
        r: &mut Diagnostics,
        start: usize,
        number_type: &mut NumberType,
    ) -> CoreResult<()> {
        loop {
            let rune = self.cursor.curr(r)?;
            if rune == '.' {
                if *number_type == NumberType::FloatingPoint {
                    self.highlighted(r, ErrorCode::UnexpectedDecimalPoint, start, &[]);
                    return Err(Failed);
                }
                *number_type = NumberType::FloatingPoint;
            } else if rune == '_' {
                // Séparateur, ignoré.
            } else if !rune.is_digit() {
                break;
            }
            if !self.cursor.move_next(r)? {
                break;
            }
        }
        Ok(())
    }

    fn hex_number_literal(
        &mut self,
        r: &mut Diagnostics,
        tokens: &mut Vec<Token<'src>>,
    ) -> CoreResult<()> {
        let prefix = self.cursor.pos();
        let rune = self.cursor.next(r)?;
        if rune != '$' {
            self.highlighted(r, ErrorCode::ExpectedHexLiteralPrefix, prefix, &[]);
            return Err(Failed);
        }

        let start = self.cursor.pos();
        loop {
            let rune = self.cursor.curr(r)?;
            if rune == '_' {
                self.cursor.move_next(r)?;
                continue;
            }
            if !rune.is_xdigit() {
                if rune.is_alpha() {
                    self.highlighted(
                        r,
                        ErrorCode::UnexpectedLetterAfterHexadecimalNumberLiteral,
                        start,
                        &[],
                    );
                    return Err(Failed);
                }
                break;
            }
            self.cursor.move_next(r)?;
        }

        let capture = self.cursor.make_slice(start, self.cursor.pos() - start);
        self.make_number_token(r, tokens, start, false, false, 16, NumberType::Integer, capture)
    }

    fn octal_number_literal(
        &mut self,
        r: &mut Diagnostics,
        tokens: &mut Vec<Token<'src>>,
    ) -> CoreResult<()> {
        let prefix = self.cursor.pos();
        let rune = self.cursor.next(r)?;
        if rune != '@' {
            self.highlighted(r, ErrorCode::ExpectedOctalLiteralPrefix, prefix, &[]);
            return Err(Failed);
        }

        let start = self.cursor.pos();
        loop {
            let rune = self.cursor.curr(r)?;
            if rune == '_' {
                self.cursor.move_next(r)?;
                continue;
            }
            if !matches!(rune.as_char(), Some('0'..='7')) {
                if rune.is_alpha() {
                    self.highlighted(
                        r,
                        ErrorCode::UnexpectedLetterAfterOctalNumberLiteral,
                        start,
                        &[],
                    );
                    return Err(Failed);
                }
                break;
            }
            self.cursor.move_next(r)?;
        }

        let capture = self.cursor.make_slice(start, self.cursor.pos() - start);
        self.make_number_token(r, tokens, start, false, false, 8, NumberType::Integer, capture)
    }

    fn binary_number_literal(
        &mut self,
        r: &mut Diagnostics,
        tokens: &mut Vec<Token<'src>>,
    ) -> CoreResult<()> {
        let prefix = self.cursor.pos();
        let rune = self.cursor.next(r)?;
        if rune != '%' {
            self.highlighted(r, ErrorCode::ExpectedBinaryLiteralPrefix, prefix, &[]);
            return Err(Failed);
        }

        let start = self.cursor.pos();
        loop {
            let rune = self.cursor.curr(r)?;
            if rune == '_' {
                self.cursor.move_next(r)?;
                continue;
            }
            if !matches!(rune.as_char(), Some('0' | '1')) {
                if rune.is_alpha() || rune.is_digit() {
                    self.highlighted(
                        r,
                        ErrorCode::UnexpectedLetterAfterBinaryNumberLiteral,
                        start,
                        &[],
                    );
                    return Err(Failed);
                }
                break;
            }
            self.cursor.move_next(r)?;
        }

        let capture = self.cursor.make_slice(start, self.cursor.pos() - start);
        self.make_number_token(r, tokens, start, false, false, 2, NumberType::Integer, capture)
    }

    #[allow(clippy::too_many_arguments)]
    fn make_number_token(
        &mut self,
        r: &mut Diagnostics,
        tokens: &mut Vec<Token<'src>>,
        start: usize,
        imaginary: bool,
        is_signed: bool,
        radix: u8,
        number_type: NumberType,
        capture: &'src str,
    ) -> CoreResult<()> {
        let mut number = NumberToken {
            is_signed,
            imaginary,
            radix,
            number_type,
            size: NumberSize::Qword,
            value: NumberValue::U64(0),
        };

        match number_type {
            NumberType::Integer => {
                let value = match numbers::parse_integer(capture, u32::from(radix)) {
                    Ok(value) => value,
                    Err(cause) => {
                        self.highlighted(
                            r,
                            ErrorCode::UnableToConvertIntegerValue,
                            start,
                            &[capture.to_string(), cause.to_string()],
                        );
                        return Err(Failed);
                    }
                };
                let Some(size) = narrow_integer(value) else {
                    self.highlighted(r, ErrorCode::UnableToNarrowIntegerValue, start, &[]);
                    return Err(Failed);
                };
                apply_narrowed_integer(&mut number, size, value);
            }
            NumberType::FloatingPoint => {
                let text = if imaginary { &capture[..capture.len() - 1] } else { capture };
                let value = match numbers::parse_double(text) {
                    Ok(value) => value,
                    Err(cause) => {
                        self.highlighted(
                            r,
                            ErrorCode::UnableToConvertFloatingPointValue,
                            start,
                            &[text.to_string(), cause.to_string()],
                        );
                        return Err(Failed);
                    }
                };
                let Some(size) = narrow_double(value) else {
                    self.highlighted(r, ErrorCode::UnableToNarrowFloatingPointValue, start, &[]);
                    return Err(Failed);
                };
                apply_narrowed_double(&mut number, size, value);
            }
            NumberType::None | NumberType::Arbitrary => {}
        }

        let end = self.cursor.pos();
        tokens.push(Token {
            kind: TokenKind::Literal,
            value: capture,
            detail: Some(TokenDetail::Number(number)),
            location: self.make_location(start, end),
        });
        Ok(())
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(source: &str) -> (Diagnostics, Vec<(TokenKind, String)>) {
        let mut r = Diagnostics::new();
        let buffer = SourceBuffer::load(&mut r, source).expect("chargement");
        let mut lexer = Lexer::new(&buffer);
        let tokens = lexer
            .tokenize(&mut r)
            .unwrap_or_default()
            .iter()
            .map(|t| (t.kind, t.value.to_string()))
            .collect();
        (r, tokens)
    }

    fn lex_ok(source: &str) -> Vec<(TokenKind, String)> {
        let (r, tokens) = lex(source);
        assert!(!r.is_failed(), "diagnostics inattendus: {r}");
        tokens
    }

    fn lex_tokens(source: &str) -> (SourceBuffer, Vec<String>) {
        // Variante qui rend les jetons complets ; le tampon doit survivre.
        let mut r = Diagnostics::new();
        let buffer = SourceBuffer::load(&mut r, source).expect("chargement");
        let rendered = {
            let mut lexer = Lexer::new(&buffer);
            let tokens = lexer.tokenize(&mut r).expect("tokenisation");
            tokens.iter().map(|t| format!("{}:{}", t.kind, t.value)).collect()
        };
        (buffer, rendered)
    }

    fn first_number(source: &str) -> NumberToken {
        let mut r = Diagnostics::new();
        let buffer = SourceBuffer::load(&mut r, source).expect("chargement");
        let mut lexer = Lexer::new(&buffer);
        let tokens = lexer.tokenize(&mut r).expect("tokenisation");
        *tokens.iter().find_map(Token::number).expect("un littéral de nombre")
    }

    use TokenKind::*;

    #[test]
    fn empty_source_yields_only_end_of_input() {
        let tokens = lex_ok("");
        assert_eq!(tokens, vec![(EndOfInput, String::new())]);
    }

    #[test]
    fn whitespace_and_comments_only() {
        let tokens = lex_ok("  \n\t // rien\n /* bloc */ \n");
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![Comment, Comment, EndOfInput]);
    }

    #[test]
    fn scenario_number_statement() {
        // "32;" : nombre u8 radix 10, ponctuation, fin d'entrée.
        let tokens = lex_ok("32;\n");
        assert_eq!(
            tokens,
            vec![
                (Literal, "32".to_string()),
                (Punctuation, ";".to_string()),
                (EndOfInput, String::new()),
            ]
        );

        let number = first_number("32;\n");
        assert_eq!(number.radix, 10);
        assert_eq!(number.size, NumberSize::Byte);
        assert_eq!(number.value, NumberValue::U8(32));
        assert!(!number.is_signed);
    }

    #[test]
    fn scenario_binary_number() {
        let number = first_number("%1111_0000;\n");
        assert_eq!(number.radix, 2);
        assert_eq!(number.size, NumberSize::Byte);
        assert_eq!(number.value, NumberValue::U8(0xF0));
    }

    #[test]
    fn scenario_hex_number() {
        let number = first_number("$80;\n");
        assert_eq!(number.radix, 16);
        assert_eq!(number.size, NumberSize::Byte);
        assert_eq!(number.value, NumberValue::U8(128));
    }

    #[test]
    fn octal_number() {
        let number = first_number("@777;\n");
        assert_eq!(number.radix, 8);
        assert_eq!(number.value, NumberValue::U16(511));
        assert_eq!(number.size, NumberSize::Word);
    }

    #[test]
    fn negative_decimal_keeps_the_sign_flag() {
        let number = first_number("-3;\n");
        assert!(number.is_signed);
        assert_eq!(number.value, NumberValue::U8(3));
    }

    #[test]
    fn floats_and_exponents() {
        let number = first_number("3.145;\n");
        assert_eq!(number.number_type, NumberType::FloatingPoint);
        assert_eq!(number.size, NumberSize::Qword);
        assert_eq!(number.value.as_f64(), Some(3.145));

        let number = first_number("2.5e-2;\n");
        assert_eq!(number.value.as_f64(), Some(0.025));

        let number = first_number("1.0e3i;\n");
        assert!(number.imaginary);
        assert_eq!(number.value.as_f64(), Some(1000.0));
    }

    #[test]
    fn scenario_letter_after_decimal_number() {
        let (r, _) = lex("123myVar: u8 := 1;\n");
        assert!(r.is_failed());
        let diag = r.find_code("L013").expect("L013");
        assert!(diag.message.starts_with(
            "((anonymous source)@1:1) unexpected letter immediately after decimal number"
        ));
    }

    #[test]
    fn exponent_on_integer_is_rejected() {
        let (r, _) = lex("123e4;\n");
        assert!(r.has_code("L012"));
    }

    #[test]
    fn second_decimal_point_is_rejected() {
        let (r, _) = lex("1.2.3;\n");
        assert!(r.has_code("L008"));
    }

    #[test]
    fn letters_in_radix_literals_are_rejected() {
        assert!(lex("$80g;\n").0.has_code("L015"));
        assert!(lex("@77x;\n").0.has_code("L017"));
        assert!(lex("%1012;\n").0.has_code("L019"));
        assert!(lex("%10z;\n").0.has_code("L019"));
    }

    #[test]
    fn scenario_keyword_must_not_prefix_identifier() {
        let tokens = lex_ok("continueif: bool := false;\n");
        assert_eq!(tokens[0], (Identifier, "continueif".to_string()));
        // `bool` n'est pas un mot-clé du lexique : identifiant.
        assert_eq!(tokens[2], (Identifier, "bool".to_string()));
        assert_eq!(tokens[4], (Keyword, "false".to_string()));
    }

    #[test]
    fn word_operators_get_the_same_rejection() {
        let tokens = lex_ok("info in shlx shl;\n");
        assert_eq!(tokens[0], (Identifier, "info".to_string()));
        assert_eq!(tokens[1], (Operator, "in".to_string()));
        assert_eq!(tokens[2], (Identifier, "shlx".to_string()));
        assert_eq!(tokens[3], (Operator, "shl".to_string()));
    }

    #[test]
    fn else_if_matches_longest_but_backs_off_cleanly() {
        let tokens = lex_ok("else if x;\nelse ix;\n");
        assert_eq!(tokens[0], (Keyword, "else if".to_string()));
        assert_eq!(tokens[1], (Identifier, "x".to_string()));
        // "else ix" : le mot "else" reste un mot-clé, "ix" un identifiant.
        assert_eq!(tokens[3], (Keyword, "else".to_string()));
        assert_eq!(tokens[4], (Identifier, "ix".to_string()));
    }

    #[test]
    fn operators_match_longest_form() {
        let tokens = lex_ok("a : b := c +:= d ** e;\n");
        let operators: Vec<&str> = tokens
            .iter()
            .filter(|(k, _)| *k == Operator || *k == Punctuation)
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(operators, vec![":", ":=", "+:=", "**", ";"]);
    }

    #[test]
    fn partial_descent_does_not_leak_into_the_token() {
        // "*:" : descente vers "*:=" avortée, le jeton doit rester "*".
        let tokens = lex_ok("a *: b;\n");
        assert_eq!(tokens[1], (Operator, "*".to_string()));
        assert_eq!(tokens[2], (Punctuation, ":".to_string()));
    }

    #[test]
    fn directives_and_annotations() {
        let tokens = lex_ok("@no_fold\nfoo;\n#type foo;\n");
        assert_eq!(tokens[0], (Annotation, "no_fold".to_string()));
        assert_eq!(tokens[1], (Identifier, "foo".to_string()));
        assert_eq!(tokens[3], (Directive, "type".to_string()));
    }

    #[test]
    fn octal_still_wins_over_annotation_by_longest_match() {
        let tokens = lex_ok("@7;\n");
        assert_eq!(tokens[0], (Literal, "7".to_string()));
    }

    #[test]
    fn string_literals_capture_between_quotes() {
        let (_buffer, tokens) = lex_tokens("\"bar := {bar}\\n\";\n");
        assert_eq!(tokens[0], "literal:bar := {bar}\\n");
    }

    #[test]
    fn unterminated_string_reports_unescaped_quote() {
        let (r, _) = lex("\"sans fin;\n");
        assert!(r.has_code("L021"));
    }

    #[test]
    fn block_string_literal_captures_inner_text() {
        let (_buffer, tokens) = lex_tokens("{{bloc \"libre\"}};\n");
        assert_eq!(tokens[0], "literal:bloc \"libre\"");
    }

    #[test]
    fn lone_closing_brace_in_block_literal_is_rejected() {
        let (r, _) = lex("{{abc}x;\n");
        let diag = r.find_code("L020").expect("L020");
        assert!(diag.message.ends_with("expected } but found: x"));
    }

    #[test]
    fn line_comments_run_to_end_of_line() {
        let tokens = lex_ok("// jusqu'au bout\n-- pareil\n1;\n");
        assert_eq!(tokens[0], (Comment, " jusqu'au bout".to_string()));
        assert_eq!(tokens[1], (Comment, " pareil".to_string()));
        assert_eq!(tokens[2], (Literal, "1".to_string()));
    }

    #[test]
    fn scenario_nested_block_comment() {
        let mut r = Diagnostics::new();
        let buffer = SourceBuffer::load(&mut r, "/* a /* b */ c */ 1;\n").unwrap();
        let mut lexer = Lexer::new(&buffer);
        let tokens = lexer.tokenize(&mut r).expect("tokenisation");

        let comments: Vec<&Token<'_>> =
            tokens.iter().filter(|t| t.kind == TokenKind::Comment).collect();
        assert_eq!(comments.len(), 1);

        let tree = comments[0].block_comment().expect("arbre de captures");
        assert_eq!(tree.capture, " a /* b */ c ");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].capture, " b ");
        assert_eq!(tree.depth(), 2);

        assert!(tokens.iter().any(|t| t.kind == TokenKind::Literal && t.value == "1"));
    }

    #[test]
    fn deeply_nested_comments_track_depth() {
        let mut r = Diagnostics::new();
        let buffer = SourceBuffer::load(&mut r, "/*1/*2/*3*/*/*/;\n").unwrap();
        let mut lexer = Lexer::new(&buffer);
        let tokens = lexer.tokenize(&mut r).expect("tokenisation");
        let tree = tokens[0].block_comment().expect("arbre");
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.children[0].children[0].capture, "3");
    }

    #[test]
    fn unterminated_block_comment_reports_l007() {
        let (r, _) = lex("/* ouvert /* encore */\n");
        assert!(r.has_code("L007"));
    }

    #[test]
    fn bad_identifier_start_reports_l005_then_l006() {
        let (r, _) = lex("§;\n");
        assert!(r.has_code("L005"));
        assert!(r.has_code("L006"));
    }

    #[test]
    fn token_slices_match_their_locations() {
        let mut r = Diagnostics::new();
        let buffer = SourceBuffer::load(&mut r, "foo := $2a;\nbar := foo * 16;\n").unwrap();
        let mut lexer = Lexer::new(&buffer);
        let tokens = lexer.tokenize(&mut r).expect("tokenisation");

        for token in &tokens {
            let start_line = buffer.line_by_number(token.location.start.line as usize).unwrap();
            let end_line = buffer.line_by_number(token.location.end.line as usize).unwrap();
            let start = start_line.begin + token.location.start.column as usize;
            let end = end_line.begin + token.location.end.column as usize;
            assert_eq!(buffer.substring(start, end), token.value, "jeton {:?}", token.kind);
        }
    }

    #[test]
    fn number_values_rerender_in_their_radix() {
        for (source, radix, expected) in
            [("%1111_0000;", 2, "11110000"), ("@755;", 8, "755"), ("$ff_ff;", 16, "ffff"), ("1_234;", 10, "1234")]
        {
            let number = first_number(source);
            let value = number.value.as_u64().expect("valeur entière");
            let rendered = match radix {
                2 => format!("{value:b}"),
                8 => format!("{value:o}"),
                16 => format!("{value:x}"),
                _ => format!("{value}"),
            };
            assert_eq!(rendered, expected, "source {source}");
        }
    }

    #[test]
    fn tokenizing_twice_is_deterministic() {
        let source = "a := 6 * (6 + 4);\n/* c */ \"s\";\n";
        assert_eq!(lex_ok(source), lex_ok(source));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn identifier_soup_always_tokenizes(words in proptest::collection::vec("[a-z_][a-z0-9_]{0,8}", 1..12)) {
                let source = words.join(" ");
                let mut r = Diagnostics::new();
                let buffer = SourceBuffer::load(&mut r, &source).unwrap();
                let mut lexer = Lexer::new(&buffer);
                let tokens = lexer.tokenize(&mut r).unwrap();
                prop_assert_eq!(tokens.len(), words.len() + 1);
            }
        }
    }
}
