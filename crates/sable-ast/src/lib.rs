//! sable-ast — arbre de syntaxe abstraite du langage Sable
//!
//! Les nœuds vivent dans une arène et se référencent par [`NodeId`] : les
//! liens de parenté (`parent`, `scope`, `block`) sont des indices, jamais
//! des arêtes de possession. Chaque nœud porte un en-tête commun (jeton
//! d'origine, parent, commentaires/directives/annotations attachés) et une
//! charge utile par genre, une variante de [`NodeKind`] par construction
//! du langage — y compris les genres de contrôle de flot réservés aux
//! passes suivantes.
//!
//! Une portée tient un trie d'identifiants : tout identifiant introduit
//! syntaxiquement dans la portée y est rangé sous son texte ; un même
//! texte accumule toutes ses occurrences (la résolution départagera).

#![deny(missing_docs)]

use std::collections::HashMap;
use std::path::PathBuf;

use smallvec::SmallVec;

use sable_core::strings::Sym;
use sable_lexer::TokenId;
use sable_mem::{Arena, ArenaIndex};

pub mod dot;

/* ─────────────────────────── Indices ─────────────────────────── */

/// Indice d'un nœud de l'arbre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl ArenaIndex for NodeId {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

/* ─────────────────────────── Trie d'identifiants ─────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct IdentIndex(u32);

impl ArenaIndex for IdentIndex {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
struct IdentNode {
    entries: Vec<NodeId>,
    children: HashMap<char, IdentIndex>,
}

/// Trie d'identifiants d'une portée, indexé caractère par caractère.
#[derive(Debug)]
pub struct IdentTrie {
    nodes: Arena<IdentNode, IdentIndex>,
    root: IdentIndex,
    len: usize,
}

impl Default for IdentTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentTrie {
    /// Crée un trie vide.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(IdentNode::default());
        Self { nodes, root, len: 0 }
    }

    /// Range `node` sous `key`. Un texte déjà présent accumule.
    pub fn insert(&mut self, key: &str, node: NodeId) {
        let mut current = self.root;
        for c in key.chars() {
            current = match self.nodes.get(current).children.get(&c) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.alloc(IdentNode::default());
                    self.nodes.get_mut(current).children.insert(c, next);
                    next
                }
            };
        }
        self.nodes.get_mut(current).entries.push(node);
        self.len += 1;
    }

    /// Occurrences rangées sous `key`, dans l'ordre d'insertion.
    #[must_use]
    pub fn find(&self, key: &str) -> &[NodeId] {
        let mut current = self.root;
        for c in key.chars() {
            match self.nodes.get(current).children.get(&c) {
                Some(&next) => current = next,
                None => return &[],
            }
        }
        &self.nodes.get(current).entries
    }

    /// Nombre total d'occurrences rangées.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Vrai si rien n'est rangé.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/* ─────────────────────────── Genres de nœuds ─────────────────────────── */

/// Charge utile d'un nœud, une variante par genre. Les champs sont nommés
/// par rôle ; les genres de contrôle de flot sont portés par le modèle
/// même quand aucune règle de production ne les construit encore.
#[derive(Debug)]
pub enum NodeKind {
    /// Etiquette de saut.
    Label {
        /// Identifiant de l'étiquette.
        identifier: Option<NodeId>,
    },
    /// Portée lexicale et son trie d'identifiants.
    Scope {
        /// Identifiants introduits dans la portée.
        identifiers: IdentTrie,
    },
    /// Bloc d'instructions.
    Block {
        /// Portée du bloc.
        scope: NodeId,
        /// Instructions, dans l'ordre du texte.
        children: Vec<NodeId>,
    },
    /// Module racine d'une source.
    Module {
        /// Chemin du fichier d'origine, s'il y en a un.
        path: Option<PathBuf>,
        /// Nom de base interné.
        name: Sym,
        /// Bloc du module.
        block: NodeId,
    },
    /// Instruction terminée par `;`.
    Statement {
        /// Expression portée.
        expr: NodeId,
        /// Etiquettes attachées.
        labels: Vec<NodeId>,
    },
    /// Directive `#nom expr`.
    Directive {
        /// Opérande gauche.
        lhs: NodeId,
        /// Opérande droit éventuel.
        rhs: Option<NodeId>,
    },
    /// Annotation `@nom expr`.
    Annotation {
        /// Opérande gauche.
        lhs: NodeId,
        /// Opérande droit éventuel.
        rhs: Option<NodeId>,
    },
    /// Occurrence d'identifiant.
    Identifier {
        /// Portée d'introduction.
        scope: NodeId,
        /// Bloc d'introduction.
        block: NodeId,
        /// Texte interné.
        name: Sym,
    },
    /// Groupement parenthésé.
    Expression {
        /// Expression groupée.
        value: NodeId,
    },
    /// Littéral `nil`.
    NilLiteral,
    /// Commentaire ligne attaché.
    LineComment,
    /// Commentaire bloc attaché.
    BlockComment,
    /// Littéral bloc `{{ … }}`.
    BlockLiteral,
    /// Littéral de chaîne.
    StringLiteral,
    /// Littéral de nombre.
    NumberLiteral,
    /// Littéral booléen.
    BooleanLiteral,
    /// Paramètre de type.
    TypeParameter {
        /// Identifiant du paramètre.
        identifier: Option<NodeId>,
        /// Contrainte éventuelle.
        constraint: Option<NodeId>,
    },
    /// Opérateur unaire préfixe.
    UnaryOperator {
        /// Opérande.
        lhs: NodeId,
    },
    /// Opérateur binaire infixe.
    BinaryOperator {
        /// Opérande gauche.
        lhs: NodeId,
        /// Opérande droit.
        rhs: NodeId,
    },
    /// Affectation `:=`, listes à gauche et à droite.
    AssignmentOperator {
        /// Cibles.
        lhs: Vec<NodeId>,
        /// Valeurs.
        rhs: Vec<NodeId>,
    },
    /// Déclaration de type `ident : type`.
    TypeDeclOperator {
        /// Identifiant déclaré.
        lhs: NodeId,
        /// Expression de type.
        rhs: NodeId,
    },
    /// Puits de valeur `_`.
    ValueSinkOperator,
    /// Espace de noms `:: ns { }`.
    NsExpression {
        /// Corps de l'espace.
        expr: Option<NodeId>,
    },
    /// Conditionnelle.
    IfExpression {
        /// Prédicat.
        predicate: Option<NodeId>,
        /// Corps.
        body: Option<NodeId>,
        /// Branche `else` ou `else if`.
        else_branch: Option<NodeId>,
    },
    /// Appartenance `in`.
    InExpression {
        /// Opérande gauche.
        lhs: Option<NodeId>,
        /// Opérande droit.
        rhs: Option<NodeId>,
    },
    /// Boucle `for`.
    ForExpression {
        /// Variables itérées.
        vars: Vec<NodeId>,
        /// Itérable.
        expr: Option<NodeId>,
        /// Corps.
        body: Option<NodeId>,
    },
    /// Bloc `use`.
    UseExpression {
        /// Variables capturées.
        vars: Vec<NodeId>,
        /// Corps.
        body: Option<NodeId>,
    },
    /// Bloc `with`.
    WithExpression {
        /// Sujet.
        expr: Option<NodeId>,
        /// Corps.
        body: Option<NodeId>,
    },
    /// Report `defer`.
    DeferExpression {
        /// Corps différé.
        body: Option<NodeId>,
    },
    /// Sortie `break`.
    BreakExpression {
        /// Etiquette visée.
        label: Option<NodeId>,
    },
    /// Reprise `continue`.
    ContinueExpression {
        /// Etiquette visée.
        label: Option<NodeId>,
    },
    /// Retour `return`.
    ReturnExpression {
        /// Valeur rendue.
        expr: Option<NodeId>,
    },
    /// Production `yield`.
    YieldExpression {
        /// Valeur produite.
        expr: Option<NodeId>,
    },
    /// Chute `fallthrough`.
    FallthroughExpression,
    /// Saut `goto`.
    GotoExpression {
        /// Etiquette visée.
        label: Option<NodeId>,
    },
    /// Import de module.
    ImportExpression {
        /// Chemin importé.
        expr: Option<NodeId>,
    },
    /// Déclaration de module.
    ModuleExpression {
        /// Chemin déclaré.
        expr: Option<NodeId>,
    },
    /// Conversion `cast<T>(expr)`.
    CastExpression {
        /// Paramètre de type.
        type_parameter: Option<NodeId>,
        /// Expression convertie.
        expr: Option<NodeId>,
    },
    /// Réinterprétation `transmute<T>(expr)`.
    BitcastExpression {
        /// Paramètre de type.
        type_parameter: Option<NodeId>,
        /// Expression réinterprétée.
        expr: Option<NodeId>,
    },
    /// Branche `case`.
    CaseExpression {
        /// Prédicat de la branche.
        predicate: Option<NodeId>,
        /// Corps.
        body: Option<NodeId>,
    },
    /// Aiguillage `switch`.
    SwitchExpression {
        /// Sujet.
        expr: Option<NodeId>,
        /// Branches.
        cases: Vec<NodeId>,
    },
    /// Procédure `proc`.
    ProcExpression {
        /// Paramètres.
        params: Vec<NodeId>,
        /// Type de retour.
        return_type: Option<NodeId>,
        /// Corps.
        body: Option<NodeId>,
    },
    /// Structure `struct`.
    StructExpression {
        /// Corps.
        body: Option<NodeId>,
    },
    /// Union `union`.
    UnionExpression {
        /// Corps.
        body: Option<NodeId>,
    },
    /// Enumération `enum`.
    EnumExpression {
        /// Corps.
        body: Option<NodeId>,
    },
    /// Famille de types `family`.
    FamilyExpression {
        /// Membres.
        members: Vec<NodeId>,
    },
    /// Boucle `while`.
    WhileExpression {
        /// Prédicat.
        predicate: Option<NodeId>,
        /// Corps.
        body: Option<NodeId>,
    },
    /// Déclaration de variable.
    VariableDeclaration {
        /// Identifiant déclaré.
        identifier: Option<NodeId>,
        /// Déclaration de type.
        type_decl: Option<NodeId>,
        /// Initialiseur.
        initializer: Option<NodeId>,
    },
    /// Initialiseur.
    InitializerExpression {
        /// Expression d'initialisation.
        expr: Option<NodeId>,
    },
}

impl NodeKind {
    /// Nom stable du genre, tel qu'il apparaît dans les vidages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Label { .. } => "label",
            Self::Scope { .. } => "scope",
            Self::Block { .. } => "block",
            Self::Module { .. } => "module",
            Self::Statement { .. } => "statement",
            Self::Directive { .. } => "directive",
            Self::Annotation { .. } => "annotation",
            Self::Identifier { .. } => "identifier",
            Self::Expression { .. } => "expression",
            Self::NilLiteral => "nil_literal",
            Self::LineComment => "line_comment",
            Self::BlockComment => "block_comment",
            Self::BlockLiteral => "block_literal",
            Self::StringLiteral => "string_literal",
            Self::NumberLiteral => "number_literal",
            Self::BooleanLiteral => "boolean_literal",
            Self::TypeParameter { .. } => "type_parameter",
            Self::UnaryOperator { .. } => "unary_operator",
            Self::BinaryOperator { .. } => "binary_operator",
            Self::AssignmentOperator { .. } => "assignment_operator",
            Self::TypeDeclOperator { .. } => "type_decl_operator",
            Self::ValueSinkOperator => "value_sink_operator",
            Self::NsExpression { .. } => "ns_expression",
            Self::IfExpression { .. } => "if_expression",
            Self::InExpression { .. } => "in_expression",
            Self::ForExpression { .. } => "for_expression",
            Self::UseExpression { .. } => "use_expression",
            Self::WithExpression { .. } => "with_expression",
            Self::DeferExpression { .. } => "defer_expression",
            Self::BreakExpression { .. } => "break_expression",
            Self::ContinueExpression { .. } => "continue_expression",
            Self::ReturnExpression { .. } => "return_expression",
            Self::YieldExpression { .. } => "yield_expression",
            Self::FallthroughExpression => "fallthrough_expression",
            Self::GotoExpression { .. } => "goto_expression",
            Self::ImportExpression { .. } => "import_expression",
            Self::ModuleExpression { .. } => "module_expression",
            Self::CastExpression { .. } => "cast_expression",
            Self::BitcastExpression { .. } => "bitcast_expression",
            Self::CaseExpression { .. } => "case_expression",
            Self::SwitchExpression { .. } => "switch_expression",
            Self::ProcExpression { .. } => "proc_expression",
            Self::StructExpression { .. } => "struct_expression",
            Self::UnionExpression { .. } => "union_expression",
            Self::EnumExpression { .. } => "enum_expression",
            Self::FamilyExpression { .. } => "family_expression",
            Self::WhileExpression { .. } => "while_expression",
            Self::VariableDeclaration { .. } => "variable_declaration",
            Self::InitializerExpression { .. } => "initializer_expression",
        }
    }
}

/* ─────────────────────────── Nœuds ─────────────────────────── */

/// Un nœud : en-tête commun + charge utile par genre.
#[derive(Debug)]
pub struct Node {
    /// Jeton d'origine, s'il y en a un.
    pub token: Option<TokenId>,
    /// Parent syntaxique. Lien arrière, jamais une arête de possession.
    pub parent: Option<NodeId>,
    /// Commentaires attachés.
    pub comments: SmallVec<[TokenId; 2]>,
    /// Directives attachées.
    pub directives: SmallVec<[NodeId; 2]>,
    /// Annotations attachées.
    pub annotations: SmallVec<[NodeId; 2]>,
    /// Charge utile.
    pub kind: NodeKind,
}

/// L'arbre : une arène de nœuds adressés par indices stables. Tout est
/// libéré d'un bloc à la fin de la session de parsing.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Arena<Node, NodeId>,
}

impl Ast {
    /// Crée un arbre vide.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alloue un nœud et rend son indice.
    pub fn alloc(&mut self, kind: NodeKind, token: Option<TokenId>, parent: Option<NodeId>) -> NodeId {
        self.nodes.alloc(Node {
            token,
            parent,
            comments: SmallVec::new(),
            directives: SmallVec::new(),
            annotations: SmallVec::new(),
            kind,
        })
    }

    /// Accès lecture.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    /// Accès écriture.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(id)
    }

    /// Nombre de nœuds alloués.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Vrai si l'arbre est vide.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ident_trie_accumulates_same_text() {
        let mut ast = Ast::new();
        let a = ast.alloc(NodeKind::NilLiteral, None, None);
        let b = ast.alloc(NodeKind::NilLiteral, None, None);

        let mut trie = IdentTrie::new();
        trie.insert("foo", a);
        trie.insert("foo", b);
        trie.insert("foobar", a);

        assert_eq!(trie.find("foo"), &[a, b]);
        assert_eq!(trie.find("foobar"), &[a]);
        assert_eq!(trie.find("fo"), &[] as &[NodeId]);
        assert_eq!(trie.find("bar"), &[] as &[NodeId]);
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn nodes_keep_their_header_and_kind() {
        let mut ast = Ast::new();
        let scope = ast.alloc(NodeKind::Scope { identifiers: IdentTrie::new() }, None, None);
        let block =
            ast.alloc(NodeKind::Block { scope, children: Vec::new() }, None, None);

        let node = ast.node(block);
        assert_eq!(node.kind.name(), "block");
        assert!(node.parent.is_none());
        assert!(node.comments.is_empty());

        match &ast.node(block).kind {
            NodeKind::Block { scope: s, children } => {
                assert_eq!(*s, scope);
                assert!(children.is_empty());
            }
            other => panic!("genre inattendu: {}", other.name()),
        }
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(NodeKind::NilLiteral.name(), "nil_literal");
        assert_eq!(
            NodeKind::AssignmentOperator { lhs: Vec::new(), rhs: Vec::new() }.name(),
            "assignment_operator"
        );
        assert_eq!(NodeKind::FallthroughExpression.name(), "fallthrough_expression");
    }
}
