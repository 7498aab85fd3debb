//! Flux terminal.
//!
//! Les diagnostics ne manipulent jamais d'échappements ANSI directement :
//! ils passent par [`Stream`], dont l'implémentation ANSI s'appuie sur
//! owo-colors et l'implémentation brute recopie le texte tel quel.

use owo_colors::{AnsiColors, OwoColorize};

/// Couleurs de premier plan disponibles pour les diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Noir.
    Black,
    /// Rouge : pointeur de message.
    Red,
    /// Vert.
    Green,
    /// Jaune : plage fautive.
    Yellow,
    /// Bleu : contexte de la ligne ciblée.
    Blue,
    /// Magenta.
    Magenta,
    /// Cyan.
    Cyan,
    /// Gris clair.
    LightGray,
    /// Couleur par défaut du terminal.
    Default,
}

impl From<Color> for AnsiColors {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Self::Black,
            Color::Red => Self::Red,
            Color::Green => Self::Green,
            Color::Yellow => Self::Yellow,
            Color::Blue => Self::Blue,
            Color::Magenta => Self::Magenta,
            Color::Cyan => Self::Cyan,
            Color::LightGray => Self::White,
            Color::Default => Self::Default,
        }
    }
}

/// Flux d'écriture des diagnostics.
pub trait Stream {
    /// Ajoute `value` tel quel.
    fn append(&mut self, value: &str);

    /// Ajoute `value` dans `color` (sans effet sur le flux brut).
    fn append_colored(&mut self, value: &str, color: Color);

    /// Contenu accumulé.
    fn format(&self) -> String;
}

/// Flux ANSI : chaque fragment coloré est encadré de ses échappements.
#[derive(Debug, Default)]
pub struct AnsiStream {
    buffer: String,
}

impl Stream for AnsiStream {
    fn append(&mut self, value: &str) {
        self.buffer.push_str(value);
    }

    fn append_colored(&mut self, value: &str, color: Color) {
        use core::fmt::Write;
        let _ = write!(self.buffer, "{}", value.color(AnsiColors::from(color)));
    }

    fn format(&self) -> String {
        self.buffer.clone()
    }
}

/// Flux brut : la couleur est ignorée, le texte coule à l'identique.
#[derive(Debug, Default)]
pub struct AsciiStream {
    buffer: String,
}

impl Stream for AsciiStream {
    fn append(&mut self, value: &str) {
        self.buffer.push_str(value);
    }

    fn append_colored(&mut self, value: &str, _color: Color) {
        self.buffer.push_str(value);
    }

    fn format(&self) -> String {
        self.buffer.clone()
    }
}

/// Fabrique de flux : décide une fois pour toutes si la couleur est émise.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamFactory {
    enabled: bool,
}

impl StreamFactory {
    /// Fabrique sans couleur.
    #[must_use]
    pub const fn new() -> Self {
        Self { enabled: false }
    }

    /// Active ou coupe la couleur.
    pub fn set_enabled(&mut self, value: bool) {
        self.enabled = value;
    }

    /// Vrai si la couleur est émise.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Ouvre un flux conforme au réglage courant.
    #[must_use]
    pub fn stream(&self) -> Box<dyn Stream> {
        if self.enabled {
            Box::new(AnsiStream::default())
        } else {
            Box::new(AsciiStream::default())
        }
    }

    /// Rend `text` dans `color` (ou tel quel si la couleur est coupée).
    #[must_use]
    pub fn colorize(&self, text: &str, color: Color) -> String {
        let mut stream = self.stream();
        stream.append_colored(text, color);
        stream.format()
    }

    /// Rend `text` en surlignant la plage de colonnes (en runes)
    /// `[start_col, end_col)` dans `highlight`, le reste dans `context`.
    #[must_use]
    pub fn colorize_range(
        &self,
        text: &str,
        start_col: usize,
        end_col: usize,
        highlight: Color,
        context: Color,
    ) -> String {
        let mut stream = self.stream();
        for (column, c) in text.chars().enumerate() {
            let mut piece = [0u8; 4];
            let piece = c.encode_utf8(&mut piece);
            if column >= start_col && column < end_col {
                stream.append_colored(piece, highlight);
            } else {
                stream.append_colored(piece, context);
            }
        }
        stream.format()
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
