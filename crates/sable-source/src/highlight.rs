//! Rendu des erreurs surlignées.
//!
//! Reprend la fenêtre `[ligne-4, ligne+4]` autour de la plage fautive,
//! préfixe chaque ligne de son numéro 1-based, surligne la plage de
//! colonnes sur la ligne ciblée et pointe le message dessous. Le message
//! lui-même est préfixé de `(<fichier>@<ligne>:<colonne>)`, colonnes et
//! lignes rendues 1-based.

use sable_core::catalog::{find_decl, interpolate, ErrorCode, FALLBACK_LOCALE};
use sable_core::diag::Diagnostics;
use sable_core::term::{Color, StreamFactory};
use sable_core::SourceLocation;

use crate::SourceBuffer;

/// Nom affiché quand la source ne vient pas d'un fichier.
pub const ANONYMOUS_SOURCE: &str = "(anonymous source)";

// Lignes de contexte de part et d'autre de la plage fautive.
const CONTEXT_LINES: usize = 4;

/// Consigne une erreur dont les détails montrent la fenêtre de source
/// surlignée autour de `loc`.
pub fn add_source_highlighted_error(
    r: &mut Diagnostics,
    code: ErrorCode,
    buffer: &SourceBuffer,
    term: &StreamFactory,
    loc: SourceLocation,
    args: &[String],
) {
    let decl = find_decl(FALLBACK_LOCALE, code);
    let message = interpolate(decl.message, args);

    let number_of_lines = buffer.number_of_lines();
    let target_line = loc.start.line as usize;
    let message_indicator = term.colorize(&format!("^ {message}"), Color::Red);

    let start_line = target_line.saturating_sub(CONTEXT_LINES);
    let stop_line = (loc.end.line as usize + CONTEXT_LINES).min(number_of_lines);

    let mut details = String::new();
    for i in start_line..stop_line {
        let Some(source_line) = buffer.line_by_number(i) else {
            break;
        };
        let source_text = buffer.substring(source_line.begin, source_line.end);
        if !source_text.is_empty() {
            if i == target_line {
                details.push_str(&format!(
                    "{:8}: {}\n{}{}",
                    i + 1,
                    term.colorize_range(
                        source_text,
                        loc.start.column as usize,
                        loc.end.column as usize,
                        Color::Yellow,
                        Color::Blue,
                    ),
                    " ".repeat(10 + loc.start.column as usize),
                    message_indicator,
                ));
            } else {
                details.push_str(&format!("{:8}: {}", i + 1, source_text));
            }
        }
        if i + 1 < stop_line {
            details.push('\n');
        }
    }

    let name = buffer.path().and_then(|p| p.file_name()).map_or_else(
        || ANONYMOUS_SOURCE.to_string(),
        |f| f.to_string_lossy().into_owned(),
    );
    let message = format!(
        "({}@{}:{}) {}",
        name,
        loc.start.line + 1,
        loc.start.column + 1,
        message,
    );

    r.error(decl.code, message, loc, details);
}

/* ─────────────────────────── Tests ─────────────────────────── */
