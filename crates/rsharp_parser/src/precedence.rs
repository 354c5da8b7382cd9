//! Operator precedence for binary operators.

use rsharp_syntax::{BinaryOperator, TokenKind};

/// Precedence levels from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    Lowest = 0,
    Assignment = 1,
    Conditional = 2,
    Coalesce = 3,
    LogicalOr = 4,
    LogicalAnd = 5,
    BitwiseOr = 6,
    ExclusiveOr = 7,
    BitwiseAnd = 8,
    Equality = 9,
    /// Comparisons and the `is`/`as` type tests.
    Relational = 10,
    Shift = 11,
    Additive = 12,
    Multiplicative = 13,
}

pub fn get_binary_operator_precedence(op: BinaryOperator) -> OperatorPrecedence {
    match op {
        BinaryOperator::Coalesce => OperatorPrecedence::Coalesce,
        BinaryOperator::LogicalOr => OperatorPrecedence::LogicalOr,
        BinaryOperator::LogicalAnd => OperatorPrecedence::LogicalAnd,
        BinaryOperator::BitwiseOr => OperatorPrecedence::BitwiseOr,
        BinaryOperator::ExclusiveOr => OperatorPrecedence::ExclusiveOr,
        BinaryOperator::BitwiseAnd => OperatorPrecedence::BitwiseAnd,
        BinaryOperator::Equals | BinaryOperator::NotEquals => OperatorPrecedence::Equality,
        BinaryOperator::LessThan
        | BinaryOperator::GreaterThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThanOrEqual => OperatorPrecedence::Relational,
        BinaryOperator::LeftShift | BinaryOperator::RightShift => OperatorPrecedence::Shift,
        BinaryOperator::Add | BinaryOperator::Subtract => OperatorPrecedence::Additive,
        BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => {
            OperatorPrecedence::Multiplicative
        }
    }
}

/// The binary operator a single token spells. `>>` is two tokens and is
/// recognized by the parser.
pub fn binary_operator_from_token(kind: TokenKind) -> Option<BinaryOperator> {
    Some(match kind {
        TokenKind::QuestionQuestion => BinaryOperator::Coalesce,
        TokenKind::BarBar => BinaryOperator::LogicalOr,
        TokenKind::AmpersandAmpersand => BinaryOperator::LogicalAnd,
        TokenKind::Bar => BinaryOperator::BitwiseOr,
        TokenKind::Caret => BinaryOperator::ExclusiveOr,
        TokenKind::Ampersand => BinaryOperator::BitwiseAnd,
        TokenKind::EqualsEquals => BinaryOperator::Equals,
        TokenKind::ExclamationEquals => BinaryOperator::NotEquals,
        TokenKind::LessThan => BinaryOperator::LessThan,
        TokenKind::GreaterThan => BinaryOperator::GreaterThan,
        TokenKind::LessThanEquals => BinaryOperator::LessThanOrEqual,
        TokenKind::GreaterThanEquals => BinaryOperator::GreaterThanOrEqual,
        TokenKind::LessThanLessThan => BinaryOperator::LeftShift,
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Asterisk => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_binding_strength() {
        let p = |k| get_binary_operator_precedence(binary_operator_from_token(k).unwrap());
        assert!(p(TokenKind::Asterisk) > p(TokenKind::Plus));
        assert!(p(TokenKind::Plus) > p(TokenKind::LessThanLessThan));
        assert!(p(TokenKind::LessThan) > p(TokenKind::EqualsEquals));
        assert!(p(TokenKind::AmpersandAmpersand) > p(TokenKind::BarBar));
        assert!(p(TokenKind::BarBar) > p(TokenKind::QuestionQuestion));
        assert!(OperatorPrecedence::Coalesce > OperatorPrecedence::Conditional);
    }

    #[test]
    fn test_non_operators() {
        assert_eq!(binary_operator_from_token(TokenKind::Equals), None);
        assert_eq!(binary_operator_from_token(TokenKind::Dot), None);
    }
}
