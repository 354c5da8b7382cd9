//! Lookahead sets.
//!
//! Every token kind fits below 256, so a set is two `u128` words. Sets are
//! built in `const` context and named after the production they start or
//! follow.

use rsharp_syntax::TokenKind;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenSet([u128; 2]);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet([0, 0]);

    pub const fn of(kinds: &[TokenKind]) -> TokenSet {
        let mut bits = [0u128; 2];
        let mut i = 0;
        while i < kinds.len() {
            let k = kinds[i] as usize;
            bits[k / 128] |= 1u128 << (k % 128);
            i += 1;
        }
        TokenSet(bits)
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet([self.0[0] | other.0[0], self.0[1] | other.0[1]])
    }

    pub const fn with(self, kind: TokenKind) -> TokenSet {
        let k = kind as usize;
        let mut bits = self.0;
        bits[k / 128] |= 1u128 << (k % 128);
        TokenSet(bits)
    }

    pub const fn without(self, kind: TokenKind) -> TokenSet {
        let k = kind as usize;
        let mut bits = self.0;
        bits[k / 128] &= !(1u128 << (k % 128));
        TokenSet(bits)
    }

    #[inline]
    pub const fn contains(self, kind: TokenKind) -> bool {
        let k = kind as usize;
        self.0[k / 128] & (1u128 << (k % 128)) != 0
    }

    pub fn iter(self) -> impl Iterator<Item = TokenKind> {
        TokenKind::all().filter(move |k| self.contains(*k))
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(TokenKind::text)).finish()
    }
}

use TokenKind as K;

pub const PREDEFINED_TYPE: TokenSet = TokenSet::of(&[
    K::BoolKeyword,
    K::ByteKeyword,
    K::CharKeyword,
    K::DecimalKeyword,
    K::DoubleKeyword,
    K::FloatKeyword,
    K::IntKeyword,
    K::LongKeyword,
    K::ObjectKeyword,
    K::SbyteKeyword,
    K::ShortKeyword,
    K::StringKeyword,
    K::UintKeyword,
    K::UlongKeyword,
    K::UshortKeyword,
]);

/// Tokens that can begin a type, `void` included.
pub const TYPE_START: TokenSet = PREDEFINED_TYPE.with(K::Identifier).with(K::VoidKeyword);

pub const LITERAL: TokenSet = TokenSet::of(&[
    K::IntegerLiteral,
    K::RealLiteral,
    K::CharacterLiteral,
    K::StringLiteral,
    K::InterpolatedStringLiteral,
    K::TrueKeyword,
    K::FalseKeyword,
    K::NullKeyword,
]);

pub const UNARY_OPERATOR: TokenSet = TokenSet::of(&[
    K::Plus,
    K::Minus,
    K::Exclamation,
    K::Tilde,
    K::PlusPlus,
    K::MinusMinus,
    K::Asterisk,
    K::Ampersand,
]);

/// Keywords that begin a primary expression.
pub const KEYWORD_OPERAND: TokenSet = TokenSet::of(&[
    K::ThisKeyword,
    K::BaseKeyword,
    K::NewKeyword,
    K::TypeofKeyword,
    K::DefaultKeyword,
    K::SizeofKeyword,
    K::CheckedKeyword,
    K::UncheckedKeyword,
    K::DelegateKeyword,
    K::StackallocKeyword,
]);

pub const PRIMARY_START: TokenSet = LITERAL
    .union(KEYWORD_OPERAND)
    .union(PREDEFINED_TYPE)
    .with(K::Identifier)
    .with(K::OpenParen);

pub const EXPRESSION_START: TokenSet = PRIMARY_START.union(UNARY_OPERATOR);

/// Tokens that may follow `)` for a parenthesized named type to be read as
/// a cast. Operators that could continue a parenthesized expression are
/// left out.
pub const CAST_FOLLOW: TokenSet = LITERAL
    .union(KEYWORD_OPERAND)
    .union(PREDEFINED_TYPE)
    .with(K::Identifier)
    .with(K::OpenParen)
    .with(K::Tilde)
    .with(K::Exclamation);

/// Tokens that may follow the `>` of a type-argument list in an expression.
pub const TYPE_ARGUMENT_FOLLOW: TokenSet = TokenSet::of(&[
    K::OpenParen,
    K::CloseParen,
    K::CloseBracket,
    K::CloseBrace,
    K::Colon,
    K::Semicolon,
    K::Comma,
    K::Dot,
    K::Question,
    K::EqualsEquals,
    K::ExclamationEquals,
    K::Bar,
    K::Caret,
    K::AmpersandAmpersand,
    K::BarBar,
    K::Ampersand,
    K::OpenBracket,
    K::EndOfFile,
]);

pub const MODIFIER: TokenSet = TokenSet::of(&[
    K::NewKeyword,
    K::PublicKeyword,
    K::ProtectedKeyword,
    K::InternalKeyword,
    K::PrivateKeyword,
    K::AbstractKeyword,
    K::SealedKeyword,
    K::StaticKeyword,
    K::ReadonlyKeyword,
    K::VolatileKeyword,
    K::VirtualKeyword,
    K::OverrideKeyword,
    K::ExternKeyword,
    K::UnsafeKeyword,
    K::ConstKeyword,
]);

pub const TYPE_KEYWORD: TokenSet = TokenSet::of(&[
    K::ClassKeyword,
    K::StructKeyword,
    K::InterfaceKeyword,
    K::EnumKeyword,
    K::DelegateKeyword,
]);

/// Starts of a type declaration, attributes and modifiers included.
pub const TYPE_DECLARATION_START: TokenSet = TYPE_KEYWORD.union(MODIFIER).with(K::OpenBracket);

pub const NAMESPACE_MEMBER_START: TokenSet = TYPE_DECLARATION_START.with(K::NamespaceKeyword).with(K::Identifier);

pub const MEMBER_START: TokenSet = TYPE_DECLARATION_START
    .union(TYPE_START)
    .with(K::EventKeyword)
    .with(K::ImplicitKeyword)
    .with(K::ExplicitKeyword)
    .with(K::Tilde);

/// Tokens that can only begin a member, never a statement. A block stops
/// at them so an unclosed method body does not swallow its siblings.
pub const MEMBER_ONLY_START: TokenSet = TokenSet::of(&[
    K::PublicKeyword,
    K::ProtectedKeyword,
    K::InternalKeyword,
    K::PrivateKeyword,
    K::AbstractKeyword,
    K::SealedKeyword,
    K::StaticKeyword,
    K::ReadonlyKeyword,
    K::VolatileKeyword,
    K::VirtualKeyword,
    K::OverrideKeyword,
    K::ExternKeyword,
    K::ClassKeyword,
    K::StructKeyword,
    K::InterfaceKeyword,
    K::EnumKeyword,
    K::NamespaceKeyword,
    K::EventKeyword,
    K::ImplicitKeyword,
    K::ExplicitKeyword,
    K::OperatorKeyword,
]);

pub const STATEMENT_KEYWORD: TokenSet = TokenSet::of(&[
    K::IfKeyword,
    K::SwitchKeyword,
    K::WhileKeyword,
    K::DoKeyword,
    K::ForKeyword,
    K::ForeachKeyword,
    K::BreakKeyword,
    K::ContinueKeyword,
    K::GotoKeyword,
    K::ReturnKeyword,
    K::ThrowKeyword,
    K::TryKeyword,
    K::CheckedKeyword,
    K::UncheckedKeyword,
    K::LockKeyword,
    K::UsingKeyword,
    K::UnsafeKeyword,
    K::FixedKeyword,
    K::ConstKeyword,
]);

pub const STATEMENT_START: TokenSet = STATEMENT_KEYWORD
    .union(EXPRESSION_START)
    .union(TYPE_START)
    .with(K::OpenBrace)
    .with(K::Semicolon);

/// Resynchronization tokens added to every weak-separator recovery set.
pub const SYNC: TokenSet = STATEMENT_KEYWORD
    .union(TYPE_KEYWORD)
    .union(MEMBER_ONLY_START)
    .with(K::EndOfFile)
    .with(K::Semicolon)
    .with(K::OpenBrace)
    .with(K::CloseBrace);

pub const PARAMETER_START: TokenSet = TYPE_START
    .with(K::OpenBracket)
    .with(K::RefKeyword)
    .with(K::OutKeyword)
    .with(K::InKeyword)
    .with(K::ParamsKeyword)
    .with(K::ThisKeyword);

pub const ARGUMENT_START: TokenSet = EXPRESSION_START
    .with(K::RefKeyword)
    .with(K::OutKeyword)
    .with(K::InKeyword);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_across_words() {
        let set = TokenSet::of(&[K::EndOfFile, K::WhileKeyword]);
        assert!(set.contains(K::EndOfFile));
        assert!(set.contains(K::WhileKeyword));
        assert!(!set.contains(K::Identifier));
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_union_and_without() {
        let set = TokenSet::of(&[K::Comma]).union(TokenSet::of(&[K::Semicolon]));
        assert!(set.contains(K::Comma) && set.contains(K::Semicolon));
        let set = set.without(K::Comma);
        assert!(!set.contains(K::Comma));
        assert_eq!(TokenSet::EMPTY.iter().count(), 0);
    }

    #[test]
    fn test_named_sets() {
        assert!(SYNC.contains(K::EndOfFile));
        assert!(STATEMENT_START.contains(K::Identifier));
        assert!(!STATEMENT_START.contains(K::PublicKeyword));
        assert!(TYPE_START.contains(K::VoidKeyword));
        assert!(!CAST_FOLLOW.contains(K::Minus));
        assert!(TYPE_ARGUMENT_FOLLOW.contains(K::OpenParen));
        assert!(!TYPE_ARGUMENT_FOLLOW.contains(K::Identifier));
    }

    #[test]
    fn test_modifier_set_matches_token_classification() {
        for kind in K::all() {
            assert_eq!(MODIFIER.contains(kind), kind.is_modifier_keyword(), "{kind:?}");
        }
    }
}
