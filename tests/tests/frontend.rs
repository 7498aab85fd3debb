//! Scénarios de bout en bout du front-end : sources littérales, jetons et
//! arbres attendus.

use pretty_assertions::assert_eq;

use sable_ast::NodeKind;
use sable_lexer::{NumberSize, NumberValue, Token, TokenKind};
use sable_parser::Module;
use sable_tests::run_pipeline;

fn block_children(module: &Module) -> Vec<sable_ast::NodeId> {
    let NodeKind::Module { block, .. } = &module.ast.node(module.root).kind else {
        panic!("racine sans module");
    };
    let NodeKind::Block { children, .. } = &module.ast.node(*block).kind else {
        panic!("module sans bloc");
    };
    children.clone()
}

fn statement_expr(module: &Module, statement: sable_ast::NodeId) -> sable_ast::NodeId {
    match &module.ast.node(statement).kind {
        NodeKind::Statement { expr, .. } => *expr,
        other => panic!("attendu une instruction, trouvé {}", other.name()),
    }
}

#[test]
fn scenario_1_number_statement() {
    let run = run_pipeline("32;\n");
    assert!(!run.diagnostics.is_failed(), "{}", run.diagnostics);

    assert_eq!(
        run.tokens,
        vec![
            (TokenKind::Literal, "32".to_string()),
            (TokenKind::Punctuation, ";".to_string()),
            (TokenKind::EndOfInput, String::new()),
        ]
    );

    let module = run.module.expect("module");
    let children = block_children(&module);
    assert_eq!(children.len(), 1);
    let expr = statement_expr(&module, children[0]);
    assert!(matches!(module.ast.node(expr).kind, NodeKind::NumberLiteral));
}

#[test]
fn scenario_2_binary_number() {
    let source = "%1111_0000;\n";
    let mut r = sable_core::diag::Diagnostics::new();
    let buffer = sable_source::SourceBuffer::load(&mut r, source).unwrap();
    let mut lexer = sable_lexer::Lexer::new(&buffer);
    let tokens = lexer.tokenize(&mut r).unwrap();

    let number = tokens.iter().find_map(Token::number).expect("nombre");
    assert_eq!(number.radix, 2);
    assert_eq!(number.size, NumberSize::Byte);
    assert_eq!(number.value, NumberValue::U8(0xF0));
}

#[test]
fn scenario_3_hex_number() {
    let mut r = sable_core::diag::Diagnostics::new();
    let buffer = sable_source::SourceBuffer::load(&mut r, "$80;\n").unwrap();
    let mut lexer = sable_lexer::Lexer::new(&buffer);
    let tokens = lexer.tokenize(&mut r).unwrap();

    let number = tokens.iter().find_map(Token::number).expect("nombre");
    assert_eq!(number.radix, 16);
    assert_eq!(number.size, NumberSize::Byte);
    assert_eq!(number.value, NumberValue::U8(128));
}

#[test]
fn scenario_4_letter_after_decimal_number() {
    let run = run_pipeline("123myVar: u8 := 1;\n");
    assert!(run.diagnostics.is_failed());
    let diag = run.diagnostics.find_code("L013").expect("L013");
    assert!(diag.message.starts_with(
        "((anonymous source)@1:1) unexpected letter immediately after decimal number"
    ));
}

#[test]
fn scenario_5_keyword_prefixing_identifier() {
    let run = run_pipeline("continueif: bool := false;\n");
    assert!(!run.diagnostics.is_failed(), "{}", run.diagnostics);
    assert_eq!(run.tokens[0], (TokenKind::Identifier, "continueif".to_string()));
}

#[test]
fn scenario_6_nested_block_comment() {
    let source = "/* a /* b */ c */ 1;\n";
    let mut r = sable_core::diag::Diagnostics::new();
    let buffer = sable_source::SourceBuffer::load(&mut r, source).unwrap();
    let mut lexer = sable_lexer::Lexer::new(&buffer);
    let tokens = lexer.tokenize(&mut r).unwrap();

    let comments: Vec<&Token<'_>> =
        tokens.iter().filter(|t| t.kind == TokenKind::Comment).collect();
    assert_eq!(comments.len(), 1);

    let tree = comments[0].block_comment().expect("arbre de captures");
    assert_eq!(tree.capture, " a /* b */ c ");
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].capture, " b ");

    let numbers: Vec<&Token<'_>> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Literal)
        .collect();
    assert_eq!(numbers.len(), 1);
    assert_eq!(numbers[0].value, "1");
}

#[test]
fn scenario_7_assignment_precedence() {
    let run = run_pipeline("a := 6 * (6 + 4);\n");
    assert!(!run.diagnostics.is_failed(), "{}", run.diagnostics);
    let module = run.module.expect("module");

    let assign = statement_expr(&module, block_children(&module)[0]);
    let NodeKind::AssignmentOperator { lhs, rhs } = &module.ast.node(assign).kind else {
        panic!("attendu une affectation en racine");
    };
    assert!(matches!(module.ast.node(lhs[0]).kind, NodeKind::Identifier { .. }));

    let NodeKind::BinaryOperator { rhs: mul_rhs, .. } = module.ast.node(rhs[0]).kind else {
        panic!("attendu * en valeur");
    };
    assert!(matches!(module.ast.node(mul_rhs).kind, NodeKind::BinaryOperator { .. }));
}

#[test]
fn empty_source_has_one_token_and_an_empty_module() {
    let run = run_pipeline("");
    assert!(!run.diagnostics.is_failed());
    assert_eq!(run.tokens, vec![(TokenKind::EndOfInput, String::new())]);
    assert!(block_children(&run.module.expect("module")).is_empty());
}

#[test]
fn comment_only_source_has_an_empty_block() {
    let run = run_pipeline(" // l1\n/* b */ -- l2\n");
    assert!(!run.diagnostics.is_failed(), "{}", run.diagnostics);
    assert!(run
        .tokens
        .iter()
        .all(|(kind, _)| matches!(kind, TokenKind::Comment | TokenKind::EndOfInput)));
    assert!(block_children(&run.module.expect("module")).is_empty());
}

#[test]
fn longest_operator_wins() {
    let run = run_pipeline("a : b := c +:= 1;\n");
    let rendered: Vec<&str> = run
        .tokens
        .iter()
        .filter(|(kind, _)| matches!(kind, TokenKind::Operator | TokenKind::Punctuation))
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(rendered, vec![":", ":=", "+:=", ";"]);
}

#[test]
fn warnings_do_not_fail_the_session() {
    let mut r = sable_core::diag::Diagnostics::new();
    r.warning("L006", "expected identifier".into(), Default::default(), String::new());
    assert!(!r.is_failed());
    r.error("P002", "undefined production rule".into(), Default::default(), String::new());
    assert!(r.is_failed());
}

#[test]
fn dot_dump_round_trips_through_a_file() {
    use std::io::Write as _;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "total := 6 * (6 + 4);").unwrap();

    let mut r = sable_core::diag::Diagnostics::new();
    let mut session = sable_front::Session::new();
    let buffer = session.load_file(&mut r, file.path()).unwrap();
    let tokens = session.tokenize(&mut r, &buffer).unwrap();
    let module = session.parse(&mut r, &buffer, &tokens).unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ast.dot");
    session.dump_dot(&mut r, &module, &tokens, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("digraph"));
    // Les opérateurs binaires étiquettent leurs arêtes.
    assert!(text.contains("label=\"lhs\""));
    assert!(text.contains("label=\"rhs\""));
    // Les nœuds sont des records genre|valeur.
    assert!(text.contains("shape=record"));
    assert!(text.contains("assignment_operator"));
    assert!(!r.is_failed());
}
