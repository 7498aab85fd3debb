//! sable-source — tampon de source UTF-8 du front-end Sable
//!
//! Le tampon possède les octets bruts (une sentinelle `\n` est ajoutée au
//! chargement pour que la dernière ligne soit toujours indexée) et la table
//! des lignes ; il est en lecture seule une fois chargé. La navigation se
//! fait par [`Cursor`] : décodage de runes, pile de marques LIFO pour les
//! retours arrière bornés, pile de largeurs pour `prev`.
//!
//! Echecs de décodage : NUL → `S005`, séquence malformée → `S004`, BOM hors
//! de l'offset 0 → `S006`. L'ouverture d'un fichier impossible → `S001`.

#![deny(missing_docs)]

use std::path::{Path, PathBuf};

use sable_core::catalog::{add_error, ErrorCode};
use sable_core::diag::Diagnostics;
use sable_core::{CoreResult, Failed, SourceLocation};

pub mod cursor;
pub mod highlight;
pub mod rune;

pub use cursor::Cursor;
pub use rune::{decode, Decoded, Rune};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Lignes ─────────────────────────── */

/// Une ligne indexée. `begin` et `end` sont des offsets en octets ;
/// `end` pointe la fin de ligne (exclue des extraits de texte mais
/// couverte par la recherche offset → ligne).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceLine {
    /// Offset du premier octet de la ligne.
    pub begin: usize,
    /// Offset de la fin de ligne.
    pub end: usize,
    /// Numéro de ligne, 0-based.
    pub line: u32,
    /// Nombre de runes avant la fin de ligne.
    pub columns: u32,
}

/* ─────────────────────────── Tampon ─────────────────────────── */

/// Tampon de source : octets, chemin d'origine éventuel, table des lignes.
/// En lecture seule après chargement ; toute tranche rendue emprunte au
/// tampon et reste stable pour sa durée de vie.
#[derive(Debug, Default)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
    path: Option<PathBuf>,
    lines: Vec<SourceLine>,
}

impl SourceBuffer {
    /// Charge une source en mémoire. Une sentinelle `\n` est ajoutée.
    pub fn load(r: &mut Diagnostics, text: &str) -> CoreResult<Self> {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(b'\n');

        let mut buffer = Self { bytes, path: None, lines: Vec::new() };
        buffer.index_lines(r)?;
        Ok(buffer)
    }

    /// Charge un fichier (lu en binaire). Echec d'ouverture → `S001`.
    pub fn open(r: &mut Diagnostics, path: &Path) -> CoreResult<Self> {
        let mut bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => {
                add_error(
                    r,
                    ErrorCode::UnableToOpenFile,
                    SourceLocation::default(),
                    &[path.display().to_string()],
                );
                return Err(Failed);
            }
        };
        bytes.push(b'\n');

        let mut buffer = Self { bytes, path: Some(path.to_path_buf()), lines: Vec::new() };
        buffer.index_lines(r)?;
        Ok(buffer)
    }

    /// Octets du tampon (sentinelle comprise).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Vrai si le tampon est vide.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Octets bruts.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Chemin d'origine, si la source vient d'un fichier.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Nombre de lignes indexées.
    #[must_use]
    pub fn number_of_lines(&self) -> usize {
        self.lines.len()
    }

    /// Ligne par numéro (0-based).
    #[must_use]
    pub fn line_by_number(&self, line: usize) -> Option<&SourceLine> {
        self.lines.get(line)
    }

    /// Ligne couvrant l'offset `index`, en `O(log n)`.
    #[must_use]
    pub fn line_by_index(&self, index: usize) -> Option<&SourceLine> {
        let at = self.lines.partition_point(|l| l.begin <= index);
        let line = self.lines.get(at.checked_sub(1)?)?;
        (index <= line.end).then_some(line)
    }

    /// Colonne (en octets depuis le début de ligne) de l'offset `index`.
    #[must_use]
    pub fn column_by_index(&self, index: usize) -> u32 {
        self.line_by_index(index).map_or(0, |line| (index - line.begin) as u32)
    }

    /// Extrait `[start, end)` du tampon.
    #[must_use]
    pub fn substring(&self, start: usize, end: usize) -> &str {
        self.make_slice(start, end - start)
    }

    /// Tranche de `length` octets à partir de `offset`.
    #[must_use]
    pub fn make_slice(&self, offset: usize, length: usize) -> &str {
        std::str::from_utf8(&self.bytes[offset..offset + length])
            .expect("les offsets viennent du lexer, alignés sur des frontières de runes")
    }

    /// Ouvre un curseur positionné à l'offset 0.
    #[must_use]
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    // Indexe les lignes en un seul balayage du tampon. Le BOM à l'offset 0
    // est consommé sans compter de colonne.
    fn index_lines(&mut self, r: &mut Diagnostics) -> CoreResult<()> {
        let mut cursor = Cursor::new(self);
        let mut line = 0u32;
        let mut columns = 0u32;
        let mut line_start = 0usize;
        let mut lines = Vec::new();

        loop {
            let position = cursor.pos();
            let rune = cursor.next(r)?;

            if rune.is_bom() && position == 0 {
                line_start = cursor.pos();
                continue;
            }

            let end_of_buffer = rune.is_eof();
            if rune == '\n' || end_of_buffer {
                let end = if end_of_buffer { self.bytes.len() } else { position };
                lines.push(SourceLine { begin: line_start, end, line, columns });
                line_start = cursor.pos();
                line += 1;
                columns = 0;
            } else {
                columns += 1;
            }

            if end_of_buffer {
                break;
            }
        }

        self.lines = lines;
        Ok(())
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load(text: &str) -> SourceBuffer {
        let mut r = Diagnostics::new();
        SourceBuffer::load(&mut r, text).expect("source valide")
    }

    #[test]
    fn sentinel_newline_is_appended() {
        let buffer = load("foo");
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.bytes()[3], b'\n');
    }

    #[test]
    fn lines_are_indexed() {
        let buffer = load("a\nbb\nccc");
        // "a", "bb", "ccc" puis la ligne vide de la sentinelle.
        assert_eq!(buffer.number_of_lines(), 4);

        let first = buffer.line_by_number(0).unwrap();
        assert_eq!((first.begin, first.end, first.columns), (0, 1, 1));

        let third = buffer.line_by_number(2).unwrap();
        assert_eq!((third.begin, third.end, third.columns), (5, 8, 3));
        assert_eq!(buffer.substring(third.begin, third.end), "ccc");
    }

    #[test]
    fn every_offset_is_covered_by_its_line() {
        let buffer = load("un\ndeux\ntrois");
        for index in 0..buffer.len() {
            let line = buffer.line_by_index(index).expect("offset couvert");
            assert!(line.begin <= index && index <= line.end, "offset {index}");
        }
    }

    #[test]
    fn column_by_index_counts_from_line_start() {
        let buffer = load("ab\ncd");
        assert_eq!(buffer.column_by_index(0), 0);
        assert_eq!(buffer.column_by_index(1), 1);
        assert_eq!(buffer.column_by_index(3), 0);
        assert_eq!(buffer.column_by_index(4), 1);
    }

    #[test]
    fn bom_at_offset_zero_is_skipped() {
        let text = "\u{FEFF}x";
        let buffer = load(text);
        let first = buffer.line_by_number(0).unwrap();
        assert_eq!(first.begin, 3);
        assert_eq!(first.columns, 1);
        assert_eq!(buffer.substring(first.begin, first.end), "x");
    }

    #[test]
    fn nul_byte_fails_the_load() {
        let mut r = Diagnostics::new();
        assert!(SourceBuffer::load(&mut r, "a\0b").is_err());
        assert!(r.has_code("S005"));
    }

    #[test]
    fn open_missing_file_reports_s001() {
        let mut r = Diagnostics::new();
        let result = SourceBuffer::open(&mut r, Path::new("/nonexistent/sable.sb"));
        assert!(result.is_err());
        assert!(r.has_code("S001"));
        assert!(r.find_code("S001").unwrap().message.contains("/nonexistent/sable.sb"));
    }

    #[test]
    fn open_reads_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "x := 1;").unwrap();

        let mut r = Diagnostics::new();
        let buffer = SourceBuffer::open(&mut r, file.path()).unwrap();
        assert_eq!(buffer.substring(0, 7), "x := 1;");
        assert_eq!(buffer.path(), Some(file.path()));
    }
}
