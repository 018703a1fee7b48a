//! Punctuation vocabulary: delimiters and separators that are not expression operators.

use super::registry::Since;

/// Stable identifier for punctuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationId {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    /// `->` in function signatures and function types.
    Arrow,
    /// `=>` in lambdas and match arms.
    FatArrow,
}

/// Metadata for a punctuation token.
#[derive(Debug, Clone, Copy)]
pub struct PunctuationInfo {
    pub id: PunctuationId,
    pub spelling: &'static str,
    pub since: Since,
}

/// Registry of all punctuation, in [`PunctuationId`] order.
pub const PUNCTUATION: &[PunctuationInfo] = &[
    punct(PunctuationId::LParen, "("),
    punct(PunctuationId::RParen, ")"),
    punct(PunctuationId::LBrace, "{"),
    punct(PunctuationId::RBrace, "}"),
    punct(PunctuationId::LBracket, "["),
    punct(PunctuationId::RBracket, "]"),
    punct(PunctuationId::Comma, ","),
    punct(PunctuationId::Semicolon, ";"),
    punct(PunctuationId::Colon, ":"),
    punct(PunctuationId::Dot, "."),
    punct(PunctuationId::Arrow, "->"),
    punct(PunctuationId::FatArrow, "=>"),
];

/// Source spelling.
pub fn as_str(id: PunctuationId) -> &'static str {
    PUNCTUATION[id as usize].spelling
}

/// Lookup by exact spelling.
pub fn from_str(s: &str) -> Option<PunctuationId> {
    PUNCTUATION.iter().find(|p| p.spelling == s).map(|p| p.id)
}

const fn punct(id: PunctuationId, spelling: &'static str) -> PunctuationInfo {
    PunctuationInfo {
        id,
        spelling,
        since: Since(0, 1),
    }
}
