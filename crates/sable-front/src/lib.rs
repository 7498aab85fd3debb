//! sable-front — façade du front-end Sable
//!
//! La [`Session`] attache ce qu'une passe de compilation partage : le pool
//! d'internement et la fabrique de flux terminal. Elle expose la surface
//! que le pilote consomme :
//!
//! ```text
//! load(texte | chemin)      → tampon de source
//! tokenize(tampon)          → jetons | diagnostics
//! parse(tampon, jetons)     → module | diagnostics
//! dump_dot(module, chemin)  → fichier DOT
//! ```
//!
//! Tout échec est consigné dans le tampon de diagnostics passé en
//! paramètre ; la session ne garde aucun état entre deux sources hormis
//! le pool.

#![deny(missing_docs)]

use std::path::Path;

use sable_core::diag::Diagnostics;
use sable_core::strings::Pool;
use sable_core::term::StreamFactory;
use sable_core::CoreResult;
use sable_lexer::{Lexer, Token};
use sable_parser::{Module, Parser};
use sable_source::SourceBuffer;

pub mod io;

pub use sable_ast::{dot, Ast, NodeId, NodeKind};
pub use sable_parser::Module as ParsedModule;

/* ─────────────────────────── Session ─────────────────────────── */

/// Session de compilation : pool d'internement + réglages terminal.
pub struct Session {
    pool: Pool,
    term: StreamFactory,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Crée une session, couleur coupée.
    #[must_use]
    pub fn new() -> Self {
        Self { pool: Pool::new(), term: StreamFactory::new() }
    }

    /// Active ou coupe la couleur des diagnostics surlignés.
    pub fn set_color(&mut self, enabled: bool) {
        self.term.set_enabled(enabled);
    }

    /// Pool d'internement de la session.
    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Charge une source en mémoire.
    pub fn load_source(&mut self, r: &mut Diagnostics, text: &str) -> CoreResult<SourceBuffer> {
        SourceBuffer::load(r, text)
    }

    /// Charge une source depuis un fichier (`S001` si illisible).
    pub fn load_file(&mut self, r: &mut Diagnostics, path: &Path) -> CoreResult<SourceBuffer> {
        SourceBuffer::open(r, path)
    }

    /// Tokenise un tampon chargé.
    pub fn tokenize<'src>(
        &mut self,
        r: &mut Diagnostics,
        buffer: &'src SourceBuffer,
    ) -> CoreResult<Vec<Token<'src>>> {
        Lexer::with_term(buffer, self.term).tokenize(r)
    }

    /// Parse un flux de jetons en module.
    pub fn parse(
        &mut self,
        r: &mut Diagnostics,
        buffer: &SourceBuffer,
        tokens: &[Token<'_>],
    ) -> CoreResult<Module> {
        let mut parser = Parser::with_term(buffer, tokens, &mut self.pool, self.term);
        parser.initialize(r)?;
        parser.parse(r)
    }

    /// Rend le vidage DOT d'un module.
    pub fn render_dot(
        &mut self,
        r: &mut Diagnostics,
        module: &Module,
        tokens: &[Token<'_>],
    ) -> CoreResult<String> {
        let name = self.graph_name(module);
        dot::render(r, &module.ast, tokens, &name, module.root)
    }

    /// Ecrit le vidage DOT d'un module dans `path` (`I002` si l'écriture
    /// échoue).
    pub fn dump_dot(
        &mut self,
        r: &mut Diagnostics,
        module: &Module,
        tokens: &[Token<'_>],
        path: &Path,
    ) -> CoreResult<()> {
        let text = self.render_dot(r, module, tokens)?;
        io::write_text(r, path, &text)
    }

    // Le nom du graphe reprend le nom de base du module ; une source
    // anonyme donne un graphe "module".
    fn graph_name(&self, module: &Module) -> String {
        match &module.ast.node(module.root).kind {
            NodeKind::Module { path: Some(_), name, .. } => self.pool.get(*name).to_string(),
            _ => "module".to_string(),
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
