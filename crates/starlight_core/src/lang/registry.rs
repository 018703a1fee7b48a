//! Shareable metadata for `starlight_core::lang` registries.
//!
//! Every vocabulary table (keywords, operators, punctuation, builtins) records when an item was
//! introduced and how stable it is. These types are `Copy` so the tables can live in `const`
//! items.
//!
//! ## Notes
//! - Metadata is meant for tooling and diagnostics; syntax rules still live in the lexer/parser.

/// Language version an item has been available since, as `(major, minor)`.
///
/// ## Examples
/// ```rust
/// use starlight_core::lang::registry::Since;
///
/// let since = Since(0, 3);
/// assert_eq!(since.to_string(), "0.3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Since(pub u16, pub u16);

impl std::fmt::Display for Since {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// Lifecycle status of a vocabulary item.
///
/// `Legacy` marks spellings that are still accepted for compatibility with older sources
/// (e.g. `func`, `let`) but are not the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    Legacy,
}
