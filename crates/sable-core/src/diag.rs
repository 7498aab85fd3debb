//! Accumulateur de diagnostics.
//!
//! Journal en append seul : chaque passe y consigne ses messages, un
//! drapeau `failed` collant est levé au premier `error` (jamais par
//! `info`/`warning`). Les sous-routines rendent `CoreResult<T>` et le
//! détail reste ici.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SourceLocation;

/// Gravité d'un diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    /// Information.
    Info,
    /// Avertissement : ne fait pas échouer la session.
    Warning,
    /// Erreur : lève le drapeau `failed`.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Un message du journal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    /// Gravité.
    pub severity: Severity,
    /// Mnémonique stable sur quatre caractères (`L013`, `P002`, …).
    pub code: &'static str,
    /// Message rendu.
    pub message: String,
    /// Plage de source concernée.
    pub location: SourceLocation,
    /// Détails (fenêtre de source surlignée, etc.).
    pub details: String,
}

impl Diagnostic {
    /// Vrai si le message est une erreur.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.severity, self.message)?;
        if !self.details.is_empty() {
            write!(f, "\n{}", self.details)?;
        }
        Ok(())
    }
}

/// Journal de diagnostics à drapeau collant.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    failed: bool,
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Crée un journal vide (non échoué).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lève le drapeau d'échec.
    pub fn fail(&mut self) {
        self.failed = true;
    }

    /// Vrai si une erreur a été consignée.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Consigne une information.
    pub fn info(&mut self, code: &'static str, message: String, location: SourceLocation, details: String) {
        self.push(Severity::Info, code, message, location, details);
    }

    /// Consigne un avertissement. Ne lève pas `failed`.
    pub fn warning(&mut self, code: &'static str, message: String, location: SourceLocation, details: String) {
        self.push(Severity::Warning, code, message, location, details);
    }

    /// Consigne une erreur et lève `failed`.
    pub fn error(&mut self, code: &'static str, message: String, location: SourceLocation, details: String) {
        self.push(Severity::Error, code, message, location, details);
        self.fail();
    }

    /// Vrai si un message porte `code`.
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        self.messages.iter().any(|m| m.code == code)
    }

    /// Premier message portant `code`, s'il existe.
    #[must_use]
    pub fn find_code(&self, code: &str) -> Option<&Diagnostic> {
        self.messages.iter().find(|m| m.code == code)
    }

    /// Retire tous les messages portant `code`. Le drapeau `failed` n'est
    /// pas rabaissé.
    pub fn remove_code(&mut self, code: &str) {
        self.messages.retain(|m| m.code != code);
    }

    /// Messages consignés, dans l'ordre.
    #[must_use]
    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    fn push(
        &mut self,
        severity: Severity,
        code: &'static str,
        message: String,
        location: SourceLocation,
        details: String,
    ) {
        self.messages.push(Diagnostic { severity, code, message, location, details });
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            writeln!(f, "{message}")?;
        }
        Ok(())
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
