//! Entrées/sorties texte.
//!
//! Les échecs passent par le tampon de diagnostics : lecture impossible
//! → `I001`, écriture impossible → `I002`.

use std::path::Path;

use sable_core::catalog::{add_error, ErrorCode};
use sable_core::diag::Diagnostics;
use sable_core::{CoreResult, Failed, SourceLocation};

/// Lit un fichier texte entier.
pub fn read_text(r: &mut Diagnostics, path: &Path) -> CoreResult<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(_) => {
            add_error(
                r,
                ErrorCode::UnableToReadFile,
                SourceLocation::default(),
                &[path.display().to_string()],
            );
            Err(Failed)
        }
    }
}

/// Ecrit `contents` dans un fichier texte.
pub fn write_text(r: &mut Diagnostics, path: &Path, contents: &str) -> CoreResult<()> {
    match std::fs::write(path, contents) {
        Ok(()) => {
            log::debug!("write_text: {} octets vers {}", contents.len(), path.display());
            Ok(())
        }
        Err(_) => {
            add_error(
                r,
                ErrorCode::UnableToWriteFile,
                SourceLocation::default(),
                &[path.display().to_string()],
            );
            Err(Failed)
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
