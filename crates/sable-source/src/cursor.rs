//! Curseur de lecture sur un tampon de source.
//!
//! Le tampon reste en lecture seule ; tout l'état de navigation vit ici :
//! offset courant, pile de marques LIFO pour les retours arrière bornés,
//! pile de largeurs pour défaire les `next`.

use sable_core::catalog::{add_error, ErrorCode};
use sable_core::diag::Diagnostics;
use sable_core::{CoreResult, Failed, Location, SourceLocation};

use crate::rune::{decode, Decoded, Rune};
use crate::SourceBuffer;

/// Curseur de runes sur un [`SourceBuffer`].
#[derive(Debug)]
pub struct Cursor<'src> {
    buffer: &'src SourceBuffer,
    index: usize,
    marks: Vec<usize>,
    widths: Vec<u8>,
}

impl<'src> Cursor<'src> {
    /// Ouvre un curseur à l'offset 0.
    #[must_use]
    pub fn new(buffer: &'src SourceBuffer) -> Self {
        Self { buffer, index: 0, marks: Vec::new(), widths: Vec::new() }
    }

    /// Tampon sous-jacent.
    #[must_use]
    pub fn buffer(&self) -> &'src SourceBuffer {
        self.buffer
    }

    /// Offset courant, en octets.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.index
    }

    /// Vrai si le curseur a dépassé le dernier octet.
    #[must_use]
    pub fn eof(&self) -> bool {
        self.index >= self.buffer.len()
    }

    /// Largeur de la dernière rune consommée par `next`.
    #[must_use]
    pub fn width(&self) -> u8 {
        self.widths.last().copied().unwrap_or(0)
    }

    /// Déplace le curseur sur `index`. Refuse de sortir du tampon.
    pub fn seek(&mut self, index: usize) -> bool {
        if index > self.buffer.len() {
            return false;
        }
        self.index = index;
        true
    }

    /* ────────── Marques ────────── */

    /// Empile l'offset courant.
    pub fn push_mark(&mut self) {
        self.marks.push(self.index);
    }

    /// Dépile la marque du sommet sans déplacer le curseur. Rend l'offset
    /// courant si la pile est vide.
    pub fn pop_mark(&mut self) -> usize {
        self.marks.pop().unwrap_or(self.index)
    }

    /// Marque du sommet sans dépiler (offset courant si la pile est vide).
    #[must_use]
    pub fn current_mark(&self) -> usize {
        self.marks.last().copied().unwrap_or(self.index)
    }

    /// Replace le curseur sur la marque du sommet sans dépiler.
    pub fn restore_top_mark(&mut self) {
        if let Some(&mark) = self.marks.last() {
            self.index = mark;
        }
    }

    /* ────────── Lecture ────────── */

    /// Décode la rune courante sans avancer. `EOF` après le dernier octet.
    pub fn curr(&self, r: &mut Diagnostics) -> CoreResult<Rune> {
        if self.eof() {
            return Ok(Rune::EOF);
        }
        Ok(self.read(r)?.rune)
    }

    /// Décode la rune courante puis avance de sa largeur ; la largeur est
    /// empilée pour `prev`.
    pub fn next(&mut self, r: &mut Diagnostics) -> CoreResult<Rune> {
        if self.eof() {
            return Ok(Rune::EOF);
        }
        let decoded = self.read(r)?;
        self.index += usize::from(decoded.width);
        self.widths.push(decoded.width);
        Ok(decoded.rune)
    }

    /// Défait exactement le dernier `next` et décode la rune retrouvée.
    /// En début de tampon → `S003`.
    pub fn prev(&mut self, r: &mut Diagnostics) -> CoreResult<Rune> {
        let Some(width) = self.widths.pop() else {
            add_error(r, ErrorCode::AtBeginningOfBuffer, self.location_here(), &[]);
            return Err(Failed);
        };
        if self.index == 0 {
            add_error(r, ErrorCode::AtBeginningOfBuffer, self.location_here(), &[]);
            return Err(Failed);
        }
        self.index -= usize::from(width);
        Ok(self.read(r)?.rune)
    }

    /// Avance d'une rune. `Ok(false)` en fin de tampon.
    pub fn move_next(&mut self, r: &mut Diagnostics) -> CoreResult<bool> {
        if self.eof() {
            return Ok(false);
        }
        self.next(r)?;
        Ok(true)
    }

    /// Recule d'une rune. `Ok(false)` en début de tampon.
    pub fn move_prev(&mut self, r: &mut Diagnostics) -> CoreResult<bool> {
        if self.index == 0 || self.widths.is_empty() {
            return Ok(false);
        }
        self.prev(r)?;
        Ok(true)
    }

    /* ────────── Tranches ────────── */

    /// Tranche de `length` octets à partir de `offset`.
    #[must_use]
    pub fn make_slice(&self, offset: usize, length: usize) -> &'src str {
        self.buffer.make_slice(offset, length)
    }

    /// Extrait `[start, end)`.
    #[must_use]
    pub fn substring(&self, start: usize, end: usize) -> &'src str {
        self.buffer.substring(start, end)
    }

    /* ────────── Décodage contrôlé ────────── */

    // Décode à l'offset courant en appliquant les contrats du tampon :
    // NUL → S005, séquence malformée → S004, BOM hors offset 0 → S006.
    fn read(&self, r: &mut Diagnostics) -> CoreResult<Decoded> {
        if self.buffer.bytes()[self.index] == 0 {
            add_error(r, ErrorCode::IllegalNulCharacter, self.location_here(), &[]);
            return Err(Failed);
        }

        let decoded = decode(self.buffer.bytes(), self.index);
        if decoded.rune.is_errored() {
            add_error(r, ErrorCode::IllegalEncoding, self.location_here(), &[]);
            return Err(Failed);
        }
        if decoded.rune.is_bom() && self.index > 0 {
            add_error(r, ErrorCode::IllegalByteOrderMark, self.location_here(), &[]);
            return Err(Failed);
        }
        Ok(decoded)
    }

    // Localisation approchée de l'offset courant ; l'index des lignes peut
    // ne pas encore exister pendant le chargement.
    fn location_here(&self) -> SourceLocation {
        let position = self
            .buffer
            .line_by_index(self.index)
            .map_or(Location::default(), |line| {
                Location::new(line.line, (self.index - line.begin) as u32)
            });
        SourceLocation::new(position, position)
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buffer(text: &str) -> SourceBuffer {
        let mut r = Diagnostics::new();
        SourceBuffer::load(&mut r, text).expect("source valide")
    }

    #[test]
    fn next_then_prev_restores_the_position() {
        let b = buffer("aé😀");
        let mut r = Diagnostics::new();
        let mut cursor = b.cursor();

        for _ in 0..3 {
            let before = cursor.pos();
            let rune = cursor.next(&mut r).unwrap();
            assert!(!rune.is_eof());
            let back = cursor.prev(&mut r).unwrap();
            assert_eq!(back, rune);
            assert_eq!(cursor.pos(), before);
            cursor.move_next(&mut r).unwrap();
        }
    }

    #[test]
    fn prev_at_start_reports_s003() {
        let b = buffer("a");
        let mut r = Diagnostics::new();
        let mut cursor = b.cursor();
        assert!(cursor.prev(&mut r).is_err());
        assert!(r.has_code("S003"));
    }

    #[test]
    fn marks_are_lifo() {
        let b = buffer("abcdef");
        let mut r = Diagnostics::new();
        let mut cursor = b.cursor();

        cursor.move_next(&mut r).unwrap();
        cursor.push_mark();
        cursor.move_next(&mut r).unwrap();
        cursor.push_mark();
        cursor.move_next(&mut r).unwrap();

        assert_eq!(cursor.current_mark(), 2);
        cursor.restore_top_mark();
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.pop_mark(), 2);
        assert_eq!(cursor.pop_mark(), 1);
        // Pile vide : l'offset courant fait foi.
        assert_eq!(cursor.pop_mark(), cursor.pos());
    }

    #[test]
    fn restore_does_not_pop() {
        let b = buffer("abc");
        let mut r = Diagnostics::new();
        let mut cursor = b.cursor();

        cursor.push_mark();
        cursor.move_next(&mut r).unwrap();
        cursor.restore_top_mark();
        assert_eq!(cursor.pos(), 0);
        cursor.restore_top_mark();
        assert_eq!(cursor.pos(), 0);
        assert_eq!(cursor.pop_mark(), 0);
    }

    #[test]
    fn curr_does_not_advance() {
        let b = buffer("xy");
        let mut r = Diagnostics::new();
        let cursor = b.cursor();
        assert_eq!(cursor.curr(&mut r).unwrap(), Rune::from('x'));
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn eof_after_the_sentinel() {
        let b = buffer("");
        let mut r = Diagnostics::new();
        let mut cursor = b.cursor();
        // La sentinelle.
        assert_eq!(cursor.next(&mut r).unwrap(), Rune::from('\n'));
        assert!(cursor.eof());
        assert!(cursor.next(&mut r).unwrap().is_eof());
    }

    #[test]
    fn bom_after_offset_zero_reports_s006() {
        // L'indexation des lignes décode tout le tampon : le BOM égaré
        // est détecté dès le chargement.
        let mut r = Diagnostics::new();
        assert!(SourceBuffer::load(&mut r, "a\u{FEFF}b").is_err());
        assert!(r.has_code("S006"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn next_prev_round_trip(text in "[a-zé😀 \n]{1,24}") {
                let b = buffer(&text);
                let mut r = Diagnostics::new();
                let mut cursor = b.cursor();

                let mut positions = vec![cursor.pos()];
                while cursor.move_next(&mut r).unwrap() {
                    positions.push(cursor.pos());
                }
                positions.pop();

                while let Some(expected) = positions.pop() {
                    cursor.prev(&mut r).unwrap();
                    prop_assert_eq!(cursor.pos(), expected);
                }
            }
        }
    }
}
