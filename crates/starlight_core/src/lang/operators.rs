//! Operator vocabulary with precedence and fixity metadata.
//!
//! The parser's precedence-climbing loop reads binding power straight from this table, so the
//! ladder documented for the language lives in exactly one place:
//!
//! | level | operators | assoc |
//! |------:|-----------|-------|
//! | 10 | `= += -= *= /= %=` | right |
//! | 20 | `? :` (conditional) | right |
//! | 30 | `\|\|` | left |
//! | 40 | `&&` | left |
//! | 50 | `== !=` | left |
//! | 60 | `< <= > >=` | left |
//! | 65 | `..` | left |
//! | 70 | `+ -` | left |
//! | 80 | `* / %` | left |
//! | 90 | prefix `+ - ! await` | - |
//! | 100 | postfix `() . [] ?. !! ++ --` | - |
//!
//! `|` and `&` only appear in type expressions and comprehensions and carry no expression
//! precedence.

use super::registry::{Since, Stability};

/// Stable identifier for every operator spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    AndAnd,
    OrOr,
    Bang,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    // Postfix / nullability
    PlusPlus,
    MinusMinus,
    Question,
    QuestionDot,
    BangBang,

    // Ranges and type-level combinators
    DotDot,
    Pipe,
    Amp,
}

/// Associativity for infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    None,
}

/// Where the operator appears relative to its operand(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Prefix,
    Infix,
    Postfix,
    /// Usable both as prefix and infix (`+`, `-`).
    PrefixOrInfix,
}

/// Metadata for an operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spelling: &'static str,
    /// Infix binding power; higher binds tighter. `0` means "not an infix expression operator".
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
    pub since: Since,
    pub stability: Stability,
}

/// Binding power of the assignment operators.
pub const ASSIGNMENT_PRECEDENCE: u8 = 10;
/// Binding power of the conditional operator `?:`.
pub const CONDITIONAL_PRECEDENCE: u8 = 20;
/// Binding power of prefix operators.
pub const PREFIX_PRECEDENCE: u8 = 90;
/// Binding power of postfix operators.
pub const POSTFIX_PRECEDENCE: u8 = 100;

/// Registry of all operators, in [`OperatorId`] order.
pub const OPERATORS: &[OperatorInfo] = &[
    op(OperatorId::Plus, "+", 70, Associativity::Left, Fixity::PrefixOrInfix),
    op(OperatorId::Minus, "-", 70, Associativity::Left, Fixity::PrefixOrInfix),
    op(OperatorId::Star, "*", 80, Associativity::Left, Fixity::Infix),
    op(OperatorId::Slash, "/", 80, Associativity::Left, Fixity::Infix),
    op(OperatorId::Percent, "%", 80, Associativity::Left, Fixity::Infix),
    op(OperatorId::EqEq, "==", 50, Associativity::Left, Fixity::Infix),
    op(OperatorId::NotEq, "!=", 50, Associativity::Left, Fixity::Infix),
    op(OperatorId::Lt, "<", 60, Associativity::Left, Fixity::Infix),
    op(OperatorId::LtEq, "<=", 60, Associativity::Left, Fixity::Infix),
    op(OperatorId::Gt, ">", 60, Associativity::Left, Fixity::Infix),
    op(OperatorId::GtEq, ">=", 60, Associativity::Left, Fixity::Infix),
    op(OperatorId::AndAnd, "&&", 40, Associativity::Left, Fixity::Infix),
    op(OperatorId::OrOr, "||", 30, Associativity::Left, Fixity::Infix),
    op(OperatorId::Bang, "!", 0, Associativity::None, Fixity::Prefix),
    op(OperatorId::Eq, "=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::PlusEq, "+=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::MinusEq, "-=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::StarEq, "*=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::SlashEq, "/=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::PercentEq, "%=", ASSIGNMENT_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::PlusPlus, "++", 0, Associativity::None, Fixity::Postfix),
    op(OperatorId::MinusMinus, "--", 0, Associativity::None, Fixity::Postfix),
    op(OperatorId::Question, "?", CONDITIONAL_PRECEDENCE, Associativity::Right, Fixity::Infix),
    op(OperatorId::QuestionDot, "?.", 0, Associativity::None, Fixity::Postfix),
    op(OperatorId::BangBang, "!!", 0, Associativity::None, Fixity::Postfix),
    op(OperatorId::DotDot, "..", 65, Associativity::Left, Fixity::Infix),
    op(OperatorId::Pipe, "|", 0, Associativity::None, Fixity::Infix),
    op(OperatorId::Amp, "&", 0, Associativity::None, Fixity::Infix),
];

/// Full metadata for an operator.
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    &OPERATORS[id as usize]
}

/// Source spelling.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spelling
}

/// Lookup by exact spelling.
pub fn from_str(s: &str) -> Option<OperatorId> {
    OPERATORS.iter().find(|o| o.spelling == s).map(|o| o.id)
}

/// Binding power of `id` when used as a binary expression operator.
///
/// ## Returns
/// - `Some(precedence)` for the operators handled by the parser's precedence-climbing loop
///   (`||` through `%`, plus `..`).
/// - `None` for assignment, the conditional operator, and non-infix operators; those have
///   dedicated parser productions.
pub fn binary_precedence(id: OperatorId) -> Option<u8> {
    let info = info_for(id);
    let is_binary = matches!(info.fixity, Fixity::Infix | Fixity::PrefixOrInfix);
    if is_binary && info.precedence > CONDITIONAL_PRECEDENCE {
        Some(info.precedence)
    } else {
        None
    }
}

/// Return `true` for `=` and the compound assignment operators.
pub fn is_assignment(id: OperatorId) -> bool {
    info_for(id).precedence == ASSIGNMENT_PRECEDENCE
}

/// For a compound assignment (`+=`), return the underlying arithmetic operator (`+`).
pub fn compound_base(id: OperatorId) -> Option<OperatorId> {
    match id {
        OperatorId::PlusEq => Some(OperatorId::Plus),
        OperatorId::MinusEq => Some(OperatorId::Minus),
        OperatorId::StarEq => Some(OperatorId::Star),
        OperatorId::SlashEq => Some(OperatorId::Slash),
        OperatorId::PercentEq => Some(OperatorId::Percent),
        _ => None,
    }
}

// --- helpers -----------------------------------------------------------------

const fn op(
    id: OperatorId,
    spelling: &'static str,
    precedence: u8,
    associativity: Associativity,
    fixity: Fixity,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity,
        fixity,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplicative_binds_tighter_than_additive() {
        let mul = binary_precedence(OperatorId::Star);
        let add = binary_precedence(OperatorId::Plus);
        assert!(mul > add);
    }

    #[test]
    fn test_assignment_is_not_binary() {
        assert_eq!(binary_precedence(OperatorId::Eq), None);
        assert_eq!(binary_precedence(OperatorId::Question), None);
        assert!(is_assignment(OperatorId::PercentEq));
        assert_eq!(compound_base(OperatorId::MinusEq), Some(OperatorId::Minus));
    }
}
