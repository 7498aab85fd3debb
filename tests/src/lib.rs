//! Crate d'intégration : les tests vivent sous `tests/`.
//!
//! La lib n'expose que de petits outils partagés par les scénarios.

use sable_core::diag::Diagnostics;
use sable_front::Session;
use sable_parser::Module;
use sable_source::SourceBuffer;

/// Résultat d'un passage complet tampon → jetons → module.
pub struct Run {
    /// Journal de la passe.
    pub diagnostics: Diagnostics,
    /// Session (pool d'internement compris).
    pub session: Session,
    /// Module produit, si la passe a abouti.
    pub module: Option<Module>,
    /// Paires (genre, valeur) des jetons, fin d'entrée comprise.
    pub tokens: Vec<(sable_lexer::TokenKind, String)>,
}

/// Déroule le pipeline complet sur une source en mémoire.
#[must_use]
pub fn run_pipeline(source: &str) -> Run {
    let mut diagnostics = Diagnostics::new();
    let mut session = Session::new();

    let Ok(buffer) = SourceBuffer::load(&mut diagnostics, source) else {
        return Run { diagnostics, session, module: None, tokens: Vec::new() };
    };
    let Ok(tokens) = session.tokenize(&mut diagnostics, &buffer) else {
        return Run { diagnostics, session, module: None, tokens: Vec::new() };
    };

    let rendered = tokens.iter().map(|t| (t.kind, t.value.to_string())).collect();
    let module = session.parse(&mut diagnostics, &buffer, &tokens).ok();

    Run { diagnostics, session, module, tokens: rendered }
}
