//! Vidage Graphviz de l'arbre.
//!
//! Chaque nœud devient un record `"<genre>\|<valeur du jeton>"` ; les
//! opérateurs unaires et binaires étiquettent leurs arêtes `lhs`/`rhs`,
//! les autres genres énumèrent leurs fils dans l'ordre de déclaration.

use sable_core::diag::Diagnostics;
use sable_core::CoreResult;
use sable_graphviz::{
    serialize, AttributeKind, AttributeValue, Graph, GraphNodeIndex, GraphType,
};
use sable_lexer::Token;
use sable_mem::ArenaIndex;

use crate::{Ast, NodeId, NodeKind};

/// Construit le graphe orienté d'un arbre enraciné en `root`.
pub fn build_graph(
    r: &mut Diagnostics,
    ast: &Ast,
    tokens: &[Token<'_>],
    name: &str,
    root: NodeId,
) -> CoreResult<Graph> {
    let mut graph = Graph::new(GraphType::Directed, name);
    graph.attributes_mut().set_value(
        r,
        AttributeKind::Rankdir,
        AttributeValue::Enumeration("TB"),
    )?;
    graph.attributes_mut().set_value(
        r,
        AttributeKind::Fontsize,
        AttributeValue::FloatingPoint(16.0),
    )?;

    create_dot_node(r, ast, tokens, &mut graph, root)?;
    Ok(graph)
}

/// Rend le texte DOT d'un arbre enraciné en `root`.
pub fn render(
    r: &mut Diagnostics,
    ast: &Ast,
    tokens: &[Token<'_>],
    name: &str,
    root: NodeId,
) -> CoreResult<String> {
    Ok(serialize(&build_graph(r, ast, tokens, name, root)?))
}

fn labeled_edge(
    r: &mut Diagnostics,
    graph: &mut Graph,
    from: GraphNodeIndex,
    to: GraphNodeIndex,
    label: &str,
) -> CoreResult<()> {
    let edge = graph.make_edge(from, to);
    graph.edge_mut(edge).attributes.set_value(
        r,
        AttributeKind::Label,
        AttributeValue::String(label.to_string()),
    )
}

fn create_dot_node(
    r: &mut Diagnostics,
    ast: &Ast,
    tokens: &[Token<'_>],
    graph: &mut Graph,
    id: NodeId,
) -> CoreResult<GraphNodeIndex> {
    let node = ast.node(id);

    let dot_node = graph.make_node(format!("id_{}", id.raw()));
    graph.node_mut(dot_node).attributes.set_value(
        r,
        AttributeKind::Shape,
        AttributeValue::Enumeration("record"),
    )?;

    let label = match node.token {
        Some(token) => format!("{}\\|{}", node.kind.name(), token.get(tokens).value),
        None => node.kind.name().to_string(),
    };
    graph.node_mut(dot_node).attributes.set_value(
        r,
        AttributeKind::Label,
        AttributeValue::String(label),
    )?;

    match &node.kind {
        NodeKind::Module { block, .. } => {
            let child = create_dot_node(r, ast, tokens, graph, *block)?;
            graph.make_edge(dot_node, child);
        }
        NodeKind::Block { scope, children } => {
            let scope_node = create_dot_node(r, ast, tokens, graph, *scope)?;
            graph.make_edge(dot_node, scope_node);
            for &statement in children {
                let child = create_dot_node(r, ast, tokens, graph, statement)?;
                graph.make_edge(dot_node, child);
            }
        }
        NodeKind::Statement { expr, labels } => {
            let child = create_dot_node(r, ast, tokens, graph, *expr)?;
            graph.make_edge(dot_node, child);
            for &label in labels {
                let child = create_dot_node(r, ast, tokens, graph, label)?;
                graph.make_edge(dot_node, child);
            }
        }
        NodeKind::UnaryOperator { lhs } => {
            let operand = create_dot_node(r, ast, tokens, graph, *lhs)?;
            labeled_edge(r, graph, dot_node, operand, "lhs")?;
        }
        NodeKind::BinaryOperator { lhs, rhs } | NodeKind::TypeDeclOperator { lhs, rhs } => {
            let left = create_dot_node(r, ast, tokens, graph, *lhs)?;
            labeled_edge(r, graph, dot_node, left, "lhs")?;
            let right = create_dot_node(r, ast, tokens, graph, *rhs)?;
            labeled_edge(r, graph, dot_node, right, "rhs")?;
        }
        NodeKind::AssignmentOperator { lhs, rhs } => {
            for &target in lhs {
                let child = create_dot_node(r, ast, tokens, graph, target)?;
                graph.make_edge(dot_node, child);
            }
            for &value in rhs {
                let child = create_dot_node(r, ast, tokens, graph, value)?;
                graph.make_edge(dot_node, child);
            }
        }
        NodeKind::Expression { value } => {
            let child = create_dot_node(r, ast, tokens, graph, *value)?;
            graph.make_edge(dot_node, child);
        }
        NodeKind::Directive { lhs, rhs } | NodeKind::Annotation { lhs, rhs } => {
            let left = create_dot_node(r, ast, tokens, graph, *lhs)?;
            graph.make_edge(dot_node, left);
            if let Some(rhs) = rhs {
                let right = create_dot_node(r, ast, tokens, graph, *rhs)?;
                graph.make_edge(dot_node, right);
            }
        }
        // Les portées n'exposent pas leur trie ; les autres genres n'ont
        // pas encore de fils construits par le parseur.
        _ => {}
    }

    Ok(dot_node)
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdentTrie;
    use sable_core::strings::Pool;

    #[test]
    fn renders_a_module_with_record_nodes() {
        let mut pool = Pool::new();
        let mut ast = Ast::new();

        let scope = ast.alloc(NodeKind::Scope { identifiers: IdentTrie::new() }, None, None);
        let block = ast.alloc(NodeKind::Block { scope, children: Vec::new() }, None, None);
        let module = ast.alloc(
            NodeKind::Module { path: None, name: pool.intern("demo"), block },
            None,
            None,
        );

        let mut r = Diagnostics::new();
        let text = render(&mut r, &ast, &[], "demo", module).expect("rendu DOT");

        assert!(text.starts_with("digraph demo {"));
        assert!(text.contains("rankdir=TB;"));
        assert!(text.contains("fontsize=16;"));
        assert!(text.contains("shape=record"));
        assert!(text.contains("label=\"module\""));
        assert!(text.contains("label=\"block\""));
        assert!(text.contains("label=\"scope\""));
        assert!(text.contains("->"));
        assert!(!r.is_failed());
    }

    #[test]
    fn rendering_is_deterministic() {
        let build = || {
            let mut ast = Ast::new();
            let scope =
                ast.alloc(NodeKind::Scope { identifiers: IdentTrie::new() }, None, None);
            let block =
                ast.alloc(NodeKind::Block { scope, children: Vec::new() }, None, None);
            let mut r = Diagnostics::new();
            render(&mut r, &ast, &[], "g", block).unwrap()
        };
        assert_eq!(build(), build());
    }
}
