//! sable-graphviz — émetteur Graphviz DOT
//!
//! Modèle de graphe minimal (graphe, nœuds, arêtes, attributs par
//! composant) et sérialiseur DOT. Chaque attribut porte un masque des
//! composants auxquels il s'applique ; poser un attribut hors de son
//! masque lève `G002`, un attribut hors table lève `G001`. Les tables de
//! valeurs sont à ordre d'insertion : la sortie est déterministe.

#![deny(missing_docs)]

use core::fmt::Write as _;

use indexmap::IndexMap;

use sable_core::catalog::{add_error, ErrorCode};
use sable_core::diag::Diagnostics;
use sable_core::{CoreResult, Failed, SourceLocation};
use sable_mem::{Arena, ArenaIndex};

/* ─────────────────────────── Composants ─────────────────────────── */

bitflags::bitflags! {
    /// Masque des composants auxquels un attribut peut s'appliquer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ComponentFlags: u8 {
        /// Arête.
        const EDGE = 1;
        /// Nœud.
        const NODE = 1 << 1;
        /// Graphe.
        const GRAPH = 1 << 2;
        /// Sous-graphe.
        const SUBGRAPH = 1 << 3;
        /// Sous-graphe cluster.
        const CLUSTER_SUBGRAPH = 1 << 4;
    }
}

/// Composant d'un graphe DOT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Arête.
    Edge,
    /// Nœud.
    Node,
    /// Graphe.
    Graph,
    /// Sous-graphe.
    Subgraph,
    /// Sous-graphe cluster.
    ClusterSubgraph,
}

impl Component {
    /// Nom affichable.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Edge => "edge",
            Self::Node => "node",
            Self::Graph => "graph",
            Self::Subgraph => "subgraph",
            Self::ClusterSubgraph => "cluster_subgraph",
        }
    }

    const fn flag(self) -> ComponentFlags {
        match self {
            Self::Edge => ComponentFlags::EDGE,
            Self::Node => ComponentFlags::NODE,
            Self::Graph => ComponentFlags::GRAPH,
            Self::Subgraph => ComponentFlags::SUBGRAPH,
            Self::ClusterSubgraph => ComponentFlags::CLUSTER_SUBGRAPH,
        }
    }
}

/* ─────────────────────────── Attributs ─────────────────────────── */

/// Attributs connus de l'émetteur. Seuls ceux de la table de métadonnées
/// sont posables ; les autres lèvent `G001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Direction de rang (`rankdir`).
    Rankdir,
    /// Taille de police (`fontsize`).
    Fontsize,
    /// Etiquette (`label`).
    Label,
    /// Couleur de remplissage (`fillcolor`).
    Fillcolor,
    /// Ancrage de l'étiquette (`labelloc`).
    Labelloc,
    /// Forme du nœud (`shape`).
    Shape,
    /// Style (`style`).
    Style,
    /// Couleur de trait (`color`) — hors table pour l'instant.
    Color,
    /// Ordre des fils (`ordering`) — hors table pour l'instant.
    Ordering,
    /// Poids d'arête (`weight`) — hors table pour l'instant.
    Weight,
}

/// Métadonnées d'un attribut : nom DOT et masque d'applicabilité.
#[derive(Debug, Clone, Copy)]
pub struct Metadata {
    /// Nom sérialisé.
    pub name: &'static str,
    /// Composants admis.
    pub flags: ComponentFlags,
}

const GNEC: ComponentFlags = ComponentFlags::GRAPH
    .union(ComponentFlags::NODE)
    .union(ComponentFlags::EDGE)
    .union(ComponentFlags::CLUSTER_SUBGRAPH);

/// Métadonnées de `kind`, si l'attribut est dans la table.
#[must_use]
pub const fn metadata(kind: AttributeKind) -> Option<Metadata> {
    let (name, flags) = match kind {
        AttributeKind::Rankdir => ("rankdir", ComponentFlags::GRAPH),
        AttributeKind::Fontsize => ("fontsize", GNEC),
        AttributeKind::Label => ("label", GNEC),
        AttributeKind::Fillcolor => (
            "fillcolor",
            ComponentFlags::NODE
                .union(ComponentFlags::EDGE)
                .union(ComponentFlags::CLUSTER_SUBGRAPH),
        ),
        AttributeKind::Labelloc => (
            "labelloc",
            ComponentFlags::GRAPH
                .union(ComponentFlags::NODE)
                .union(ComponentFlags::CLUSTER_SUBGRAPH),
        ),
        AttributeKind::Shape => ("shape", ComponentFlags::NODE),
        AttributeKind::Style => ("style", GNEC),
        AttributeKind::Color | AttributeKind::Ordering | AttributeKind::Weight => return None,
    };
    Some(Metadata { name, flags })
}

/// Valeur d'attribut.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Chaîne, sérialisée entre guillemets et échappée.
    String(String),
    /// Booléen.
    Boolean(bool),
    /// Entier.
    Integer(i64),
    /// Flottant.
    FloatingPoint(f64),
    /// Enumération DOT, sérialisée sans guillemets (`LR`, `record`…).
    Enumeration(&'static str),
}

/// Attributs posés sur un composant, à ordre d'insertion stable.
#[derive(Debug)]
pub struct AttributeSet {
    component: Component,
    values: IndexMap<AttributeKind, AttributeValue>,
}

impl AttributeSet {
    /// Crée un jeu d'attributs pour `component`.
    #[must_use]
    pub fn new(component: Component) -> Self {
        Self { component, values: IndexMap::new() }
    }

    /// Composant porteur.
    #[must_use]
    pub const fn component(&self) -> Component {
        self.component
    }

    /// Pose `value` sous `kind` après contrôle d'applicabilité :
    /// attribut hors table → `G001`, composant hors masque → `G002`.
    pub fn set_value(
        &mut self,
        r: &mut Diagnostics,
        kind: AttributeKind,
        value: AttributeValue,
    ) -> CoreResult<()> {
        let Some(meta) = metadata(kind) else {
            add_error(r, ErrorCode::AttributeTypeNotFound, SourceLocation::default(), &[]);
            return Err(Failed);
        };
        if !meta.flags.contains(self.component.flag()) {
            add_error(
                r,
                ErrorCode::InvalidAttributeForComponent,
                SourceLocation::default(),
                &[meta.name.to_string(), self.component.name().to_string()],
            );
            return Err(Failed);
        }
        self.values.insert(kind, value);
        Ok(())
    }

    /// Valeur posée sous `kind`, s'il y en a une.
    #[must_use]
    pub fn get(&self, kind: AttributeKind) -> Option<&AttributeValue> {
        self.values.get(&kind)
    }

    /// Paires (attribut, valeur) dans l'ordre de pose.
    pub fn values(&self) -> impl Iterator<Item = (AttributeKind, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Vrai si aucun attribut n'est posé.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/* ─────────────────────────── Graphe ─────────────────────────── */

/// Indice d'un nœud du graphe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphNodeIndex(u32);

impl ArenaIndex for GraphNodeIndex {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

/// Orientation du graphe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphType {
    /// Arêtes non orientées (`--`).
    Undirected,
    /// Arêtes orientées (`->`).
    Directed,
}

/// Un nœud et ses attributs.
#[derive(Debug)]
pub struct Node {
    /// Nom DOT du nœud.
    pub name: String,
    /// Attributs du nœud.
    pub attributes: AttributeSet,
}

/// Une arête et ses attributs.
#[derive(Debug)]
pub struct Edge {
    /// Extrémité origine.
    pub first: GraphNodeIndex,
    /// Extrémité destination.
    pub second: GraphNodeIndex,
    /// Attributs de l'arête.
    pub attributes: AttributeSet,
}

/// Un graphe DOT en construction.
#[derive(Debug)]
pub struct Graph {
    graph_type: GraphType,
    name: String,
    attributes: AttributeSet,
    nodes: Arena<Node, GraphNodeIndex>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Crée un graphe nommé.
    #[must_use]
    pub fn new(graph_type: GraphType, name: impl Into<String>) -> Self {
        Self {
            graph_type,
            name: name.into(),
            attributes: AttributeSet::new(Component::Graph),
            nodes: Arena::new(),
            edges: Vec::new(),
        }
    }

    /// Orientation.
    #[must_use]
    pub const fn graph_type(&self) -> GraphType {
        self.graph_type
    }

    /// Nom du graphe.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributs du graphe (lecture).
    #[must_use]
    pub const fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Attributs du graphe (écriture).
    pub fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }

    /// Ajoute un nœud nommé et rend son indice.
    pub fn make_node(&mut self, name: impl Into<String>) -> GraphNodeIndex {
        self.nodes.alloc(Node {
            name: name.into(),
            attributes: AttributeSet::new(Component::Node),
        })
    }

    /// Accès écriture à un nœud.
    pub fn node_mut(&mut self, index: GraphNodeIndex) -> &mut Node {
        self.nodes.get_mut(index)
    }

    /// Ajoute une arête et rend son indice dans la liste d'arêtes.
    pub fn make_edge(&mut self, first: GraphNodeIndex, second: GraphNodeIndex) -> usize {
        self.edges.push(Edge { first, second, attributes: AttributeSet::new(Component::Edge) });
        self.edges.len() - 1
    }

    /// Accès écriture à une arête.
    pub fn edge_mut(&mut self, index: usize) -> &mut Edge {
        &mut self.edges[index]
    }
}

/* ─────────────────────────── Sérialisation DOT ─────────────────────────── */

/// Echappe les métacaractères des étiquettes record. Une séquence déjà
/// échappée (`\|`, `\{`, `\}`) redevient le caractère nu : c'est le
/// séparateur de champs voulu par l'appelant.
#[must_use]
pub fn escape_chars(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 2);
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('|') => out.push('|'),
                Some('{') => out.push('{'),
                Some('}') => out.push('}'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            match c {
                '"' => out.push_str("\\\""),
                '{' => out.push_str("\\{"),
                '}' => out.push_str("\\}"),
                '.' => out.push_str("\\."),
                ',' => out.push_str("\\,"),
                '|' => out.push_str("\\|"),
                '<' => out.push_str("\\<"),
                '>' => out.push_str("\\>"),
                '=' => out.push_str("\\="),
                _ => out.push(c),
            }
        }
    }
    out
}

fn serialize_attribute(out: &mut String, kind: AttributeKind, value: &AttributeValue) {
    let name = metadata(kind).map_or("unknown", |m| m.name);
    match value {
        AttributeValue::String(text) => {
            let _ = write!(out, "{}=\"{}\"", name, escape_chars(text));
        }
        AttributeValue::Boolean(flag) => {
            let _ = write!(out, "{name}={flag}");
        }
        AttributeValue::Integer(value) => {
            let _ = write!(out, "{name}={value}");
        }
        AttributeValue::FloatingPoint(value) => {
            let _ = write!(out, "{name}={value}");
        }
        AttributeValue::Enumeration(word) => {
            let _ = write!(out, "{name}={word}");
        }
    }
}

fn serialize_attributes(out: &mut String, attributes: &AttributeSet, separator: &str) {
    let mut first = true;
    for (kind, value) in attributes.values() {
        if !first {
            out.push_str(separator);
        }
        serialize_attribute(out, kind, value);
        first = false;
    }
}

/// Sérialise `graph` en texte DOT.
#[must_use]
pub fn serialize(graph: &Graph) -> String {
    let connector = match graph.graph_type() {
        GraphType::Directed => "->",
        GraphType::Undirected => "--",
    };

    let mut out = String::new();
    match graph.graph_type() {
        GraphType::Directed => {
            let _ = writeln!(out, "digraph {} {{", graph.name());
        }
        GraphType::Undirected => {
            let _ = writeln!(out, "graph {} {{", graph.name());
        }
    }

    for (kind, value) in graph.attributes().values() {
        out.push('\t');
        serialize_attribute(&mut out, kind, value);
        out.push_str(";\n");
    }
    out.push('\n');

    for (_, node) in graph.nodes.iter() {
        let _ = write!(out, "\t{}", node.name);
        if !node.attributes.is_empty() {
            out.push_str(" [ ");
            serialize_attributes(&mut out, &node.attributes, ", ");
            out.push_str(" ]");
        }
        out.push_str(";\n");
    }
    out.push('\n');

    for edge in &graph.edges {
        let _ = write!(
            out,
            "\t{} {} {}",
            graph.nodes.get(edge.first).name,
            connector,
            graph.nodes.get(edge.second).name,
        );
        if !edge.attributes.is_empty() {
            out.push_str(" [ ");
            serialize_attributes(&mut out, &edge.attributes, ", ");
            out.push_str(" ]");
        }
        out.push_str(";\n");
    }

    out.push_str("\n}");
    out
}

/* ─────────────────────────── Tests ─────────────────────────── */
