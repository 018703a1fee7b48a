//! Define the reserved keyword vocabulary for the Starlight language.
//!
//! This module is the single source of truth for reserved words: a stable identifier
//! ([`KeywordId`]) plus a const metadata table ([`KEYWORDS`]) that records canonical spellings,
//! legacy aliases, categories and provenance.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Older Starlight sources spell `fun` as `func` and `val` as `let`/`const`; those spellings are
//!   registered as aliases so they lex to the same [`KeywordId`].
//! - [`KEYWORDS`] is ordered exactly like the [`KeywordId`] variants; [`info_for`] relies on it.
//!
//! ## Examples
//! ```rust
//! use starlight_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("func"), Some(KeywordId::Fun));
//! assert_eq!(keywords::as_str(KeywordId::Fun), "fun");
//! ```

use super::registry::{Since, Stability};

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Declarations
    Fun,
    Val,
    Var,
    Class,
    Data,
    Interface,
    Extend,
    Async,

    // Control flow
    If,
    Else,
    While,
    For,
    In,
    Match,
    Return,
    Break,
    Continue,
    Await,

    // Receivers and literals
    This,
    True,
    False,
    Null,
}

/// High-level grouping for documentation and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Declaration,
    ControlFlow,
    Receiver,
    Literal,
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub category: KeywordCategory,
    /// `true` if the keyword can begin a statement; the parser uses this for error recovery.
    pub starts_statement: bool,
    pub since: Since,
    pub stability: Stability,
}

/// Registry of all keywords, in [`KeywordId`] order.
pub const KEYWORDS: &[KeywordInfo] = &[
    info(KeywordId::Fun, "fun", &["func"], KeywordCategory::Declaration, true),
    info(KeywordId::Val, "val", &["let", "const"], KeywordCategory::Declaration, true),
    info(KeywordId::Var, "var", &[], KeywordCategory::Declaration, true),
    info(KeywordId::Class, "class", &[], KeywordCategory::Declaration, true),
    info(KeywordId::Data, "data", &[], KeywordCategory::Declaration, true),
    info(KeywordId::Interface, "interface", &[], KeywordCategory::Declaration, true),
    info(KeywordId::Extend, "extend", &[], KeywordCategory::Declaration, true),
    info(KeywordId::Async, "async", &[], KeywordCategory::Declaration, true),
    info(KeywordId::If, "if", &[], KeywordCategory::ControlFlow, true),
    info(KeywordId::Else, "else", &[], KeywordCategory::ControlFlow, false),
    info(KeywordId::While, "while", &[], KeywordCategory::ControlFlow, true),
    info(KeywordId::For, "for", &[], KeywordCategory::ControlFlow, true),
    info(KeywordId::In, "in", &[], KeywordCategory::ControlFlow, false),
    info(KeywordId::Match, "match", &[], KeywordCategory::ControlFlow, false),
    info(KeywordId::Return, "return", &[], KeywordCategory::ControlFlow, true),
    info(KeywordId::Break, "break", &[], KeywordCategory::ControlFlow, true),
    info(KeywordId::Continue, "continue", &[], KeywordCategory::ControlFlow, true),
    info(KeywordId::Await, "await", &[], KeywordCategory::ControlFlow, false),
    info(KeywordId::This, "this", &[], KeywordCategory::Receiver, false),
    info(KeywordId::True, "true", &[], KeywordCategory::Literal, false),
    info(KeywordId::False, "false", &[], KeywordCategory::Literal, false),
    info(KeywordId::Null, "null", &[], KeywordCategory::Literal, false),
];

/// Canonical spelling.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Accepted legacy spellings.
pub fn aliases(id: KeywordId) -> &'static [&'static str] {
    info_for(id).aliases
}

/// Category.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Full metadata.
///
/// ## Returns
/// - The associated [`KeywordInfo`] from [`KEYWORDS`].
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    &KEYWORDS[id as usize]
}

/// Lookup by spelling (canonical or alias).
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is reserved.
/// - `None` otherwise.
pub fn from_str(s: &str) -> Option<KeywordId> {
    if let Some(k) = KEYWORDS.iter().find(|k| k.canonical == s) {
        return Some(k.id);
    }
    KEYWORDS.iter().find(|k| k.aliases.contains(&s)).map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(
    id: KeywordId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    category: KeywordCategory,
    starts_statement: bool,
) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        aliases,
        category,
        starts_statement,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_canonical() {
        assert_eq!(from_str("let"), Some(KeywordId::Val));
        assert_eq!(from_str("const"), Some(KeywordId::Val));
        assert_eq!(from_str("func"), Some(KeywordId::Fun));
        assert_eq!(as_str(KeywordId::Val), "val");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(from_str("If"), None);
        assert_eq!(from_str("NULL"), None);
    }
}
