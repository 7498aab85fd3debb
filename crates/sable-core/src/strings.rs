//! Pool d'internement.
//!
//! Déduplique les textes de la session : identifiants, noms de modules,
//! messages rendus. Les octets sont recopiés dans des pages de 64 KiB
//! servies par le frame allocator et restent en place jusqu'au drop du
//! pool ; interner deux fois le même texte rend la même poignée et la
//! même tranche. Pas de comptage de références.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use sable_mem::{Allocator, Block, FrameAllocator, SystemAllocator, DEFAULT_ALIGN};

/// Taille de page par défaut du pool.
pub const POOL_BLOCK_SIZE: u32 = 64 * 1024;

/// Poignée stable sur un texte interné. `Sym::EMPTY` désigne le texte
/// vide, qui n'occupe aucune page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sym(u32);

impl Sym {
    /// Poignée réservée du texte vide.
    pub const EMPTY: Self = Self(0);

    /// Valeur brute de la poignée.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Pool d'internement de textes.
pub struct Pool {
    storage: FrameAllocator<SystemAllocator>,
    entries: Vec<Block>,
    index: HashMap<u64, Vec<Sym>>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Crée un pool avec des pages de 64 KiB.
    #[must_use]
    pub fn new() -> Self {
        Self::with_block_size(POOL_BLOCK_SIZE)
    }

    /// Crée un pool avec des pages de `block_size` octets.
    #[must_use]
    pub fn with_block_size(block_size: u32) -> Self {
        Self {
            storage: FrameAllocator::with_page_size(SystemAllocator::new(), block_size),
            // L'entrée 0 est la poignée réservée du texte vide.
            entries: vec![Block::new(0, 0)],
            index: HashMap::new(),
        }
    }

    /// Interne `value` : rend la poignée existante ou recopie les octets.
    pub fn intern(&mut self, value: &str) -> Sym {
        if value.is_empty() {
            return Sym::EMPTY;
        }

        let hash = hash_text(value);
        if let Some(candidates) = self.index.get(&hash) {
            for &sym in candidates {
                if self.get(sym) == value {
                    return sym;
                }
            }
        }

        let block = self
            .storage
            .allocate(value.len() as u32, DEFAULT_ALIGN)
            .expect("le frame allocator du pool ne refuse pas de page");
        self.storage.bytes_mut(block).copy_from_slice(value.as_bytes());

        let sym = Sym(self.entries.len() as u32);
        self.entries.push(block);
        self.index.entry(hash).or_default().push(sym);
        sym
    }

    /// Résout une poignée vers sa tranche, stable pour la vie du pool.
    #[must_use]
    pub fn get(&self, sym: Sym) -> &str {
        if sym == Sym::EMPTY {
            return "";
        }
        let block = self.entries[sym.raw() as usize];
        std::str::from_utf8(self.storage.bytes(block)).expect("le pool ne range que de l'UTF-8")
    }

    /// Nombre de textes internés (texte vide exclu).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    /// Vrai si rien n'a été interné.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }
}

fn hash_text(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interning_twice_returns_the_same_handle_and_slice() {
        let mut pool = Pool::new();
        let a = pool.intern("identifier");
        let b = pool.intern("identifier");
        assert_eq!(a, b);
        assert!(core::ptr::eq(pool.get(a).as_ptr(), pool.get(b).as_ptr()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn distinct_texts_get_distinct_handles() {
        let mut pool = Pool::new();
        let a = pool.intern("foo");
        let b = pool.intern("bar");
        assert_ne!(a, b);
        assert_eq!(pool.get(a), "foo");
        assert_eq!(pool.get(b), "bar");
    }

    #[test]
    fn empty_text_is_the_reserved_handle() {
        let mut pool = Pool::new();
        assert_eq!(pool.intern(""), Sym::EMPTY);
        assert_eq!(pool.get(Sym::EMPTY), "");
        assert!(pool.is_empty());
    }

    #[test]
    fn slices_stay_valid_across_growth() {
        let mut pool = Pool::with_block_size(64);
        let first = pool.intern("premier");
        // Assez de textes pour forcer plusieurs pages.
        for i in 0..64 {
            pool.intern(&format!("filler_{i}"));
        }
        assert_eq!(pool.get(first), "premier");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn intern_is_idempotent(texts in proptest::collection::vec("[a-z]{0,12}", 0..32)) {
                let mut pool = Pool::new();
                let first: Vec<Sym> = texts.iter().map(|t| pool.intern(t)).collect();
                let second: Vec<Sym> = texts.iter().map(|t| pool.intern(t)).collect();
                prop_assert_eq!(&first, &second);
                for (sym, text) in first.iter().zip(&texts) {
                    prop_assert_eq!(pool.get(*sym), text.as_str());
                }
            }
        }
    }
}
