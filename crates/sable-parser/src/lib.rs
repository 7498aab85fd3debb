//! sable-parser — parseur Pratt du langage Sable
//!
//! Chaque genre de jeton est associé à une règle de production
//! `{lbp, nud, led}` : puissance de liaison gauche, dénotation nulle
//! (préfixe) et dénotation gauche (infixe). `apply` précalcule la règle
//! de chaque jeton (jeton sans règle → `P001`) en filtrant les
//! commentaires, qui s'attachent au prochain nœud créé. La boucle
//! `expression(rbp)` est le Pratt des manuels ; le terminateur `;`
//! emballe son opérande gauche dans une instruction et l'ajoute au bloc
//! courant.
//!
//! Le parseur tient trois piles pendant la descente : portée courante,
//! bloc courant, parent courant. Les identifiants rencontrés sont
//! internés et rangés dans le trie de la portée courante.

#![deny(missing_docs)]

use std::collections::HashMap;
use std::path::Path;

use sable_ast::{Ast, IdentTrie, NodeId, NodeKind};
use sable_core::catalog::ErrorCode;
use sable_core::diag::Diagnostics;
use sable_core::strings::Pool;
use sable_core::term::StreamFactory;
use sable_core::{CoreResult, Failed};
use sable_lexer::{Token, TokenDetail, TokenId, TokenKind};
use sable_source::highlight::{add_source_highlighted_error, ANONYMOUS_SOURCE};
use sable_source::SourceBuffer;

/* ─────────────────────────── Puissances de liaison ─────────────────────────── */

// Le terminateur d'instruction lie le plus lâche ; l'affectation vient
// sous l'arithmétique pour que `a := 6 * 7` garde l'affectation en
// racine.
const STATEMENT_LBP: i32 = 10;
const ASSIGNMENT_LBP: i32 = 20;
const TYPE_DECL_LBP: i32 = 22;
const LIST_LBP: i32 = 25;
const ASSOCIATION_LBP: i32 = 27;
const LOGICAL_OR_LBP: i32 = 30;
const LOGICAL_AND_LBP: i32 = 35;
const BINARY_OR_LBP: i32 = 40;
const XOR_LBP: i32 = 42;
const BINARY_AND_LBP: i32 = 44;
const IN_LBP: i32 = 45;
const EQUALITY_LBP: i32 = 46;
const RELATIONAL_LBP: i32 = 48;
const SHIFT_LBP: i32 = 49;
const ADDITIVE_LBP: i32 = 50;
const MULTIPLICATIVE_LBP: i32 = 60;
const POWER_LBP: i32 = 65;
const UNARY_RBP: i32 = 70;
const MEMBER_SELECT_LBP: i32 = 80;
const BIND_LBP: i32 = 85;

// Opérandes des annotations et directives : juste au-dessus du
// terminateur, pour s'arrêter au `;`.
const OPERAND_RBP: i32 = STATEMENT_LBP;

/* ─────────────────────────── Clés de règles ─────────────────────────── */

/// Clé d'une règle de production, dérivée du couple (genre, texte) de
/// chaque jeton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // Les variantes nomment directement leur lexème.
pub enum RuleKey {
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
    RightBracket,
    RightBrace,
    ElseKeyword,
    EndOfInput,
    Arrow,
    Minus,
    Plus,
    Star,
    Slash,
    Percent,
    Power,
    BinaryNot,
    LogicalNot,
    Assignment,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AndAssign,
    OrAssign,
    NotAssign,
    TypeDecl,
    Association,
    Bind,
    MemberSelect,
    LogicalOr,
    LogicalAnd,
    BinaryOr,
    BinaryAnd,
    Xor,
    Equals,
    NotEquals,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Shl,
    Shr,
    Rol,
    Ror,
    In,
    Identifier,
    NumberLiteral,
    StringLiteral,
    BlockLiteral,
    NilKeyword,
    TrueKeyword,
    FalseKeyword,
    Annotation,
    Directive,
}

/// Clé de règle d'un jeton, s'il en a une.
#[must_use]
pub fn rule_key(token: &Token<'_>) -> Option<RuleKey> {
    use RuleKey::*;
    match token.kind {
        TokenKind::Identifier => Some(Identifier),
        TokenKind::Annotation => Some(Annotation),
        TokenKind::Directive => Some(Directive),
        TokenKind::EndOfInput => Some(EndOfInput),
        TokenKind::Comment => None,
        TokenKind::Literal => match token.detail {
            Some(TokenDetail::Number(_)) => Some(NumberLiteral),
            Some(TokenDetail::StringLiteral) => Some(StringLiteral),
            Some(TokenDetail::BlockLiteral) => Some(BlockLiteral),
            _ => None,
        },
        TokenKind::Keyword => match token.value {
            "nil" => Some(NilKeyword),
            "true" => Some(TrueKeyword),
            "false" => Some(FalseKeyword),
            "else" | "else if" => Some(ElseKeyword),
            _ => None,
        },
        TokenKind::Operator => match token.value {
            "-" => Some(Minus),
            "+" => Some(Plus),
            "*" => Some(Star),
            "/" => Some(Slash),
            "%" => Some(Percent),
            "**" => Some(Power),
            "~" => Some(BinaryNot),
            "!" => Some(LogicalNot),
            ":=" => Some(Assignment),
            "+:=" => Some(PlusAssign),
            "-:=" => Some(MinusAssign),
            "*:=" => Some(StarAssign),
            "/:=" => Some(SlashAssign),
            "%:=" => Some(PercentAssign),
            "&:=" => Some(AndAssign),
            "|:=" => Some(OrAssign),
            "~:=" => Some(NotAssign),
            "=>" => Some(Association),
            "::" => Some(Bind),
            "->" => Some(Arrow),
            "." => Some(MemberSelect),
            "||" => Some(LogicalOr),
            "&&" => Some(LogicalAnd),
            "|" => Some(BinaryOr),
            "&" => Some(BinaryAnd),
            "xor" => Some(Xor),
            "==" => Some(Equals),
            "!=" => Some(NotEquals),
            "<" => Some(LessThan),
            "<=" => Some(LessThanEqual),
            ">" => Some(GreaterThan),
            ">=" => Some(GreaterThanEqual),
            "shl" => Some(Shl),
            "shr" => Some(Shr),
            "rol" => Some(Rol),
            "ror" => Some(Ror),
            "in" => Some(In),
            _ => None,
        },
        TokenKind::Punctuation => match token.value {
            "," => Some(Comma),
            ";" => Some(Semicolon),
            "(" => Some(LeftParen),
            ")" => Some(RightParen),
            "]" => Some(RightBracket),
            "}" => Some(RightBrace),
            ":" => Some(TypeDecl),
            _ => None,
        },
    }
}

/* ─────────────────────────── Règles ─────────────────────────── */

/// Dénotation nulle : produit un nœud depuis le jeton courant.
pub type NudFn<'src, 'tok, 'pool> = fn(
    &mut Parser<'src, 'tok, 'pool>,
    &mut Diagnostics,
    TokenId,
    RuleKey,
) -> Option<NodeId>;

/// Dénotation gauche : étend l'opérande gauche depuis le jeton courant.
pub type LedFn<'src, 'tok, 'pool> = fn(
    &mut Parser<'src, 'tok, 'pool>,
    &mut Diagnostics,
    TokenId,
    RuleKey,
    NodeId,
) -> Option<NodeId>;

/// Règle de production d'un genre de jeton.
#[derive(Clone, Copy)]
pub struct ProductionRule<'src, 'tok, 'pool> {
    /// Puissance de liaison gauche.
    pub lbp: i32,
    /// Dénotation nulle. Par défaut : diagnostic `P002`.
    pub nud: NudFn<'src, 'tok, 'pool>,
    /// Dénotation gauche. Par défaut : diagnostic `P003`.
    pub led: LedFn<'src, 'tok, 'pool>,
    /// Constructeur du genre de nœud, pour les littéraux et constantes.
    pub literal: Option<fn() -> NodeKind>,
}

/* ─────────────────────────── Parseur ─────────────────────────── */

/// Module produit par le parseur : l'arène de nœuds et la racine.
#[derive(Debug)]
pub struct Module {
    /// L'arbre.
    pub ast: Ast,
    /// Nœud module racine.
    pub root: NodeId,
}

/// Parseur Pratt sur un flux de jetons.
pub struct Parser<'src, 'tok, 'pool> {
    buffer: &'src SourceBuffer,
    tokens: &'tok [Token<'src>],
    pool: &'pool mut Pool,
    term: StreamFactory,
    rule_table: HashMap<RuleKey, ProductionRule<'src, 'tok, 'pool>>,
    // Précalculés par `apply` : jetons gardés (commentaires exclus), leur
    // règle, et les commentaires en attente devant chacun.
    kept: Vec<TokenId>,
    rules: Vec<RuleKey>,
    comments_before: Vec<Vec<TokenId>>,
    pending_comments: Vec<TokenId>,
    token_index: usize,
    scopes: Vec<NodeId>,
    blocks: Vec<NodeId>,
    parents: Vec<NodeId>,
    ast: Ast,
}

impl<'src, 'tok, 'pool> Parser<'src, 'tok, 'pool> {
    /// Crée un parseur sur `tokens`, sans couleur dans les diagnostics.
    pub fn new(
        buffer: &'src SourceBuffer,
        tokens: &'tok [Token<'src>],
        pool: &'pool mut Pool,
    ) -> Self {
        Self::with_term(buffer, tokens, pool, StreamFactory::new())
    }

    /// Crée un parseur avec une fabrique de flux terminal explicite.
    pub fn with_term(
        buffer: &'src SourceBuffer,
        tokens: &'tok [Token<'src>],
        pool: &'pool mut Pool,
        term: StreamFactory,
    ) -> Self {
        Self {
            buffer,
            tokens,
            pool,
            term,
            rule_table: HashMap::new(),
            kept: Vec::new(),
            rules: Vec::new(),
            comments_before: Vec::new(),
            pending_comments: Vec::new(),
            token_index: 0,
            scopes: Vec::new(),
            blocks: Vec::new(),
            parents: Vec::new(),
            ast: Ast::new(),
        }
    }

    /// Enregistre les règles de production puis précalcule la règle de
    /// chaque jeton (`P001` si un jeton n'en a pas).
    pub fn initialize(&mut self, r: &mut Diagnostics) -> CoreResult<()> {
        use RuleKey::*;

        self.terminal(RightParen, 0);
        self.terminal(RightBracket, 0);
        self.terminal(RightBrace, 0);
        self.terminal(ElseKeyword, 0);
        self.terminal(EndOfInput, 0);
        self.terminal(Arrow, 0);

        self.prefix(Minus, Self::unary_nud);
        self.prefix(BinaryNot, Self::unary_nud);
        self.prefix(LogicalNot, Self::unary_nud);

        self.literal(NumberLiteral, || NodeKind::NumberLiteral);
        self.literal(StringLiteral, || NodeKind::StringLiteral);
        self.literal(BlockLiteral, || NodeKind::BlockLiteral);

        self.literal(NilKeyword, || NodeKind::NilLiteral);
        self.literal(TrueKeyword, || NodeKind::BooleanLiteral);
        self.literal(FalseKeyword, || NodeKind::BooleanLiteral);

        self.infix(Plus, ADDITIVE_LBP, Self::binary_led);
        self.infix(Minus, ADDITIVE_LBP, Self::binary_led);
        self.infix(Star, MULTIPLICATIVE_LBP, Self::binary_led);
        self.infix(Slash, MULTIPLICATIVE_LBP, Self::binary_led);
        self.infix(Percent, MULTIPLICATIVE_LBP, Self::binary_led);
        self.infix(Power, POWER_LBP, Self::binary_led_right);

        self.infix(LogicalOr, LOGICAL_OR_LBP, Self::binary_led);
        self.infix(LogicalAnd, LOGICAL_AND_LBP, Self::binary_led);
        self.infix(BinaryOr, BINARY_OR_LBP, Self::binary_led);
        self.infix(Xor, XOR_LBP, Self::binary_led);
        self.infix(BinaryAnd, BINARY_AND_LBP, Self::binary_led);
        self.infix(Equals, EQUALITY_LBP, Self::binary_led);
        self.infix(NotEquals, EQUALITY_LBP, Self::binary_led);
        self.infix(LessThan, RELATIONAL_LBP, Self::binary_led);
        self.infix(LessThanEqual, RELATIONAL_LBP, Self::binary_led);
        self.infix(GreaterThan, RELATIONAL_LBP, Self::binary_led);
        self.infix(GreaterThanEqual, RELATIONAL_LBP, Self::binary_led);
        self.infix(Shl, SHIFT_LBP, Self::binary_led);
        self.infix(Shr, SHIFT_LBP, Self::binary_led);
        self.infix(Rol, SHIFT_LBP, Self::binary_led);
        self.infix(Ror, SHIFT_LBP, Self::binary_led);
        self.infix(In, IN_LBP, Self::binary_led);
        self.infix(Association, ASSOCIATION_LBP, Self::binary_led);
        self.infix(Bind, BIND_LBP, Self::binary_led);
        self.infix(Comma, LIST_LBP, Self::binary_led);

        self.infix(Assignment, ASSIGNMENT_LBP, Self::assignment_led);
        for key in [
            PlusAssign,
            MinusAssign,
            StarAssign,
            SlashAssign,
            PercentAssign,
            AndAssign,
            OrAssign,
            NotAssign,
        ] {
            self.infix(key, ASSIGNMENT_LBP, Self::binary_led_right);
        }

        self.infix(TypeDecl, TYPE_DECL_LBP, Self::type_decl_led);
        self.infix(MemberSelect, MEMBER_SELECT_LBP, Self::member_select_led);

        self.statement(Semicolon, STATEMENT_LBP);

        self.prefix(Identifier, Self::identifier_nud);
        self.prefix(Annotation, Self::annotation_nud);
        self.prefix(Directive, Self::directive_nud);
        self.prefix(LeftParen, Self::grouping_nud);

        self.apply(r)
    }

    /// Parse le module : crée portée, bloc et nœud module, pousse les
    /// piles, boucle `expression(0)` jusqu'à la sentinelle nulle, dépile.
    pub fn parse(mut self, r: &mut Diagnostics) -> CoreResult<Module> {
        let scope = self.make_node(NodeKind::Scope { identifiers: IdentTrie::new() }, None);
        let block = self.make_node(NodeKind::Block { scope, children: Vec::new() }, None);

        let name = match self.buffer.path() {
            Some(path) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.pool.intern(&stem)
            }
            None => self.pool.intern(ANONYMOUS_SOURCE),
        };
        let module = self.make_node(
            NodeKind::Module {
                path: self.buffer.path().map(Path::to_path_buf),
                name,
                block,
            },
            None,
        );

        self.scopes.push(scope);
        self.blocks.push(block);
        self.parents.push(block);

        while self.expression(r, 0).is_some() {}

        self.scopes.pop();
        debug_assert!(self.scopes.is_empty());
        self.blocks.pop();
        debug_assert!(self.blocks.is_empty());
        self.parents.pop();
        debug_assert!(self.parents.is_empty());

        if r.is_failed() {
            return Err(Failed);
        }
        log::debug!("parse: {} nœuds", self.ast.len());
        Ok(Module { ast: self.ast, root: module })
    }

    /* ────────── Boucle Pratt ────────── */

    fn expression(&mut self, r: &mut Diagnostics, rbp: i32) -> Option<NodeId> {
        if !self.has_more() {
            return None;
        }

        let index = self.token_index;
        let token = self.kept[index];
        let key = self.rules[index];
        let rule = self.rule(key);
        self.stage_comments(index);
        self.token_index += 1;

        let mut lhs = (rule.nud)(self, r, token, key)?;

        loop {
            let Some(next_key) = self.current_key() else {
                break;
            };
            let next_rule = self.rule(next_key);
            if rbp >= next_rule.lbp {
                break;
            }

            let index = self.token_index;
            let token = self.kept[index];
            self.stage_comments(index);
            self.token_index += 1;

            lhs = (next_rule.led)(self, r, token, next_key, lhs)?;
        }

        Some(lhs)
    }

    fn has_more(&self) -> bool {
        self.token_index < self.rules.len()
            && self.rules[self.token_index] != RuleKey::EndOfInput
    }

    fn current_key(&self) -> Option<RuleKey> {
        self.rules.get(self.token_index).copied()
    }

    // Toute clé présente dans `rules` a été vérifiée par `apply`.
    fn rule(&self, key: RuleKey) -> ProductionRule<'src, 'tok, 'pool> {
        self.rule_table[&key]
    }

    fn stage_comments(&mut self, index: usize) {
        if let Some(comments) = self.comments_before.get_mut(index) {
            self.pending_comments.append(comments);
        }
    }

    fn make_node(&mut self, kind: NodeKind, token: Option<TokenId>) -> NodeId {
        let parent = self.parents.last().copied();
        let id = self.ast.alloc(kind, token, parent);
        if !self.pending_comments.is_empty() {
            let node = self.ast.node_mut(id);
            node.comments.extend(self.pending_comments.drain(..));
        }
        id
    }

    fn highlighted(&self, r: &mut Diagnostics, code: ErrorCode, token: TokenId, args: &[String]) {
        let loc = token.get(self.tokens).location;
        add_source_highlighted_error(r, code, self.buffer, &self.term, loc, args);
    }

    fn token_value(&self, token: TokenId) -> &'src str {
        token.get(self.tokens).value
    }

    // Clé de règle du jeton d'origine d'un nœud.
    fn node_token_key(&self, id: NodeId) -> Option<RuleKey> {
        let token = self.ast.node(id).token?;
        rule_key(token.get(self.tokens))
    }

    /* ────────── Enregistrement des règles ────────── */

    fn terminal(&mut self, key: RuleKey, bp: i32) -> &mut ProductionRule<'src, 'tok, 'pool> {
        let rule = self.rule_table.entry(key).or_insert(ProductionRule {
            lbp: 0,
            nud: Self::default_nud,
            led: Self::default_led,
            literal: None,
        });
        if bp > rule.lbp {
            rule.lbp = bp;
        }
        rule
    }

    fn prefix(&mut self, key: RuleKey, nud: NudFn<'src, 'tok, 'pool>) {
        self.terminal(key, 0).nud = nud;
    }

    fn infix(&mut self, key: RuleKey, bp: i32, led: LedFn<'src, 'tok, 'pool>) {
        self.terminal(key, bp).led = led;
    }

    fn literal(&mut self, key: RuleKey, ctor: fn() -> NodeKind) {
        let rule = self.terminal(key, 0);
        rule.nud = Self::literal_nud;
        rule.literal = Some(ctor);
    }

    fn statement(&mut self, key: RuleKey, bp: i32) {
        self.infix(key, bp, Self::statement_led);
    }

    // Précalcule la règle de chaque jeton ; les commentaires sont mis de
    // côté pour s'attacher au prochain nœud créé.
    fn apply(&mut self, r: &mut Diagnostics) -> CoreResult<()> {
        let mut pending = Vec::new();

        for (i, token) in self.tokens.iter().enumerate() {
            let id = TokenId(i as u32);
            if token.kind == TokenKind::Comment {
                pending.push(id);
                continue;
            }
            match rule_key(token) {
                Some(key) if self.rule_table.contains_key(&key) => {
                    self.kept.push(id);
                    self.rules.push(key);
                    self.comments_before.push(std::mem::take(&mut pending));
                }
                _ => {
                    add_source_highlighted_error(
                        r,
                        ErrorCode::InvalidToken,
                        self.buffer,
                        &self.term,
                        token.location,
                        &[],
                    );
                    return Err(Failed);
                }
            }
        }

        log::debug!("apply: {} jetons gardés", self.kept.len());
        Ok(())
    }

    /* ────────── Dénotations ────────── */

    fn default_nud(&mut self, r: &mut Diagnostics, token: TokenId, _key: RuleKey) -> Option<NodeId> {
        self.highlighted(r, ErrorCode::UndefinedProductionRule, token, &[]);
        None
    }

    fn default_led(
        &mut self,
        r: &mut Diagnostics,
        token: TokenId,
        _key: RuleKey,
        _lhs: NodeId,
    ) -> Option<NodeId> {
        self.highlighted(r, ErrorCode::MissingOperatorProductionRule, token, &[]);
        None
    }

    fn literal_nud(&mut self, _r: &mut Diagnostics, token: TokenId, key: RuleKey) -> Option<NodeId> {
        let ctor = self.rule(key).literal?;
        Some(self.make_node(ctor(), Some(token)))
    }

    fn unary_nud(&mut self, r: &mut Diagnostics, token: TokenId, _key: RuleKey) -> Option<NodeId> {
        let Some(operand) = self.expression(r, UNARY_RBP) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };
        Some(self.make_node(NodeKind::UnaryOperator { lhs: operand }, Some(token)))
    }

    fn identifier_nud(&mut self, _r: &mut Diagnostics, token: TokenId, _key: RuleKey) -> Option<NodeId> {
        let scope = *self.scopes.last()?;
        let block = *self.blocks.last()?;

        let text = self.token_value(token);
        let name = self.pool.intern(text);
        let node = self.make_node(NodeKind::Identifier { scope, block, name }, Some(token));

        if let NodeKind::Scope { identifiers } = &mut self.ast.node_mut(scope).kind {
            identifiers.insert(text, node);
        }
        Some(node)
    }

    fn grouping_nud(&mut self, r: &mut Diagnostics, token: TokenId, _key: RuleKey) -> Option<NodeId> {
        let Some(value) = self.expression(r, 0) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };

        if self.current_key() == Some(RuleKey::RightParen) {
            self.token_index += 1;
        } else {
            let at = self.kept.get(self.token_index).copied().unwrap_or(token);
            let found = {
                let token = at.get(self.tokens);
                if token.value.is_empty() { token.kind.name() } else { token.value }
            };
            self.highlighted(
                r,
                ErrorCode::UnexpectedToken,
                at,
                &[")".to_string(), found.to_string()],
            );
            return None;
        }

        // Le groupement est transparent : la parenthèse ne crée pas de
        // nœud, elle borne la sous-expression.
        Some(value)
    }

    fn annotation_nud(&mut self, r: &mut Diagnostics, token: TokenId, _key: RuleKey) -> Option<NodeId> {
        let Some(lhs) = self.operand(r) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };
        let rhs = if self.at_operand_boundary() { None } else { self.operand(r) };
        Some(self.make_node(NodeKind::Annotation { lhs, rhs }, Some(token)))
    }

    fn directive_nud(&mut self, r: &mut Diagnostics, token: TokenId, _key: RuleKey) -> Option<NodeId> {
        let Some(lhs) = self.operand(r) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };
        let rhs = if self.at_operand_boundary() { None } else { self.operand(r) };
        Some(self.make_node(NodeKind::Directive { lhs, rhs }, Some(token)))
    }

    fn operand(&mut self, r: &mut Diagnostics) -> Option<NodeId> {
        if self.at_operand_boundary() {
            return None;
        }
        self.expression(r, OPERAND_RBP)
    }

    fn at_operand_boundary(&self) -> bool {
        matches!(
            self.current_key(),
            None | Some(
                RuleKey::Semicolon
                    | RuleKey::EndOfInput
                    | RuleKey::RightParen
                    | RuleKey::RightBracket
                    | RuleKey::RightBrace
                    | RuleKey::ElseKeyword
            )
        )
    }

    fn binary_led(
        &mut self,
        r: &mut Diagnostics,
        token: TokenId,
        key: RuleKey,
        lhs: NodeId,
    ) -> Option<NodeId> {
        let lbp = self.rule(key).lbp;
        let Some(rhs) = self.expression(r, lbp) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };
        Some(self.make_node(NodeKind::BinaryOperator { lhs, rhs }, Some(token)))
    }

    fn binary_led_right(
        &mut self,
        r: &mut Diagnostics,
        token: TokenId,
        key: RuleKey,
        lhs: NodeId,
    ) -> Option<NodeId> {
        let lbp = self.rule(key).lbp;
        let Some(rhs) = self.expression(r, lbp - 1) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };
        Some(self.make_node(NodeKind::BinaryOperator { lhs, rhs }, Some(token)))
    }

    fn type_decl_led(
        &mut self,
        r: &mut Diagnostics,
        token: TokenId,
        key: RuleKey,
        lhs: NodeId,
    ) -> Option<NodeId> {
        let lbp = self.rule(key).lbp;
        let Some(rhs) = self.expression(r, lbp) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };
        Some(self.make_node(NodeKind::TypeDeclOperator { lhs, rhs }, Some(token)))
    }

    fn member_select_led(
        &mut self,
        r: &mut Diagnostics,
        token: TokenId,
        _key: RuleKey,
        lhs: NodeId,
    ) -> Option<NodeId> {
        if !matches!(self.ast.node(lhs).kind, NodeKind::Identifier { .. }) {
            self.highlighted(r, ErrorCode::MemberSelectRequiresIdentifierLvalue, token, &[]);
            return None;
        }
        let Some(rhs) = self.expression(r, MEMBER_SELECT_LBP) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };
        if !matches!(self.ast.node(rhs).kind, NodeKind::Identifier { .. }) {
            self.highlighted(r, ErrorCode::MemberSelectRequiresIdentifierRvalue, token, &[]);
            return None;
        }
        Some(self.make_node(NodeKind::BinaryOperator { lhs, rhs }, Some(token)))
    }

    fn assignment_led(
        &mut self,
        r: &mut Diagnostics,
        token: TokenId,
        _key: RuleKey,
        lhs: NodeId,
    ) -> Option<NodeId> {
        let mut targets = Vec::new();
        self.flatten_list(lhs, &mut targets);

        for &target in &targets {
            if !self.is_assignable(target) {
                let at = self.ast.node(target).token.unwrap_or(token);
                self.highlighted(r, ErrorCode::InvalidAssignmentExpression, at, &[]);
                return None;
            }
        }

        let Some(rhs) = self.expression(r, ASSIGNMENT_LBP - 1) else {
            self.highlighted(r, ErrorCode::ExpectedExpression, token, &[]);
            return None;
        };
        let mut values = Vec::new();
        self.flatten_list(rhs, &mut values);

        Some(self.make_node(
            NodeKind::AssignmentOperator { lhs: targets, rhs: values },
            Some(token),
        ))
    }

    // Aplatie une chaîne de virgules en liste, dans l'ordre du texte.
    fn flatten_list(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.node_token_key(id) == Some(RuleKey::Comma) {
            if let NodeKind::BinaryOperator { lhs, rhs } = self.ast.node(id).kind {
                self.flatten_list(lhs, out);
                self.flatten_list(rhs, out);
                return;
            }
        }
        out.push(id);
    }

    fn is_assignable(&self, id: NodeId) -> bool {
        match self.ast.node(id).kind {
            NodeKind::Identifier { .. } | NodeKind::TypeDeclOperator { .. } => true,
            NodeKind::BinaryOperator { .. } => {
                self.node_token_key(id) == Some(RuleKey::MemberSelect)
            }
            _ => false,
        }
    }

    fn statement_led(
        &mut self,
        _r: &mut Diagnostics,
        token: TokenId,
        _key: RuleKey,
        lhs: NodeId,
    ) -> Option<NodeId> {
        let node = self.make_node(NodeKind::Statement { expr: lhs, labels: Vec::new() }, Some(token));
        let block = *self.blocks.last()?;
        if let NodeKind::Block { children, .. } = &mut self.ast.node_mut(block).kind {
            children.push(node);
        }
        Some(node)
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
