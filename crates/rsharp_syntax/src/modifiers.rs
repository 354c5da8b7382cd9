//! Declaration modifiers.

use crate::token::{Token, TokenId};
use crate::token_kind::{contextual, TokenKind};

bitflags::bitflags! {
    /// Modifier flags for declarations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const NONE      = 0;
        const NEW       = 1 << 0;
        const PUBLIC    = 1 << 1;
        const PROTECTED = 1 << 2;
        const INTERNAL  = 1 << 3;
        const PRIVATE   = 1 << 4;
        const ABSTRACT  = 1 << 5;
        const SEALED    = 1 << 6;
        const STATIC    = 1 << 7;
        const READONLY  = 1 << 8;
        const VOLATILE  = 1 << 9;
        const VIRTUAL   = 1 << 10;
        const OVERRIDE  = 1 << 11;
        const EXTERN    = 1 << 12;
        const UNSAFE    = 1 << 13;
        const PARTIAL   = 1 << 14;
        const CONST     = 1 << 15;
        const ASYNC     = 1 << 16;

        const ACCESSIBILITY = Self::PUBLIC.bits()
            | Self::PROTECTED.bits()
            | Self::INTERNAL.bits()
            | Self::PRIVATE.bits();
    }
}

impl Modifiers {
    /// The modifier a token spells, if any. Contextual modifiers
    /// (`partial`, `async`) are recognized from identifier text.
    pub fn from_token(token: &Token) -> Option<Modifiers> {
        let flag = match token.kind {
            TokenKind::NewKeyword => Modifiers::NEW,
            TokenKind::PublicKeyword => Modifiers::PUBLIC,
            TokenKind::ProtectedKeyword => Modifiers::PROTECTED,
            TokenKind::InternalKeyword => Modifiers::INTERNAL,
            TokenKind::PrivateKeyword => Modifiers::PRIVATE,
            TokenKind::AbstractKeyword => Modifiers::ABSTRACT,
            TokenKind::SealedKeyword => Modifiers::SEALED,
            TokenKind::StaticKeyword => Modifiers::STATIC,
            TokenKind::ReadonlyKeyword => Modifiers::READONLY,
            TokenKind::VolatileKeyword => Modifiers::VOLATILE,
            TokenKind::VirtualKeyword => Modifiers::VIRTUAL,
            TokenKind::OverrideKeyword => Modifiers::OVERRIDE,
            TokenKind::ExternKeyword => Modifiers::EXTERN,
            TokenKind::UnsafeKeyword => Modifiers::UNSAFE,
            TokenKind::ConstKeyword => Modifiers::CONST,
            TokenKind::Identifier if token.is_contextual(contextual::PARTIAL) => Modifiers::PARTIAL,
            TokenKind::Identifier if token.is_contextual(contextual::ASYNC) => Modifiers::ASYNC,
            _ => return None,
        };
        Some(flag)
    }

    /// The declared accessibility with `protected internal` kept as a pair.
    pub fn accessibility(self) -> Modifiers {
        self & Modifiers::ACCESSIBILITY
    }

    /// Source spelling of each flag set, in declaration order.
    pub fn keywords(self) -> Vec<&'static str> {
        const NAMES: &[(Modifiers, &str)] = &[
            (Modifiers::NEW, "new"),
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::INTERNAL, "internal"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::SEALED, "sealed"),
            (Modifiers::STATIC, "static"),
            (Modifiers::READONLY, "readonly"),
            (Modifiers::VOLATILE, "volatile"),
            (Modifiers::VIRTUAL, "virtual"),
            (Modifiers::OVERRIDE, "override"),
            (Modifiers::EXTERN, "extern"),
            (Modifiers::UNSAFE, "unsafe"),
            (Modifiers::PARTIAL, "partial"),
            (Modifiers::CONST, "const"),
            (Modifiers::ASYNC, "async"),
        ];
        NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// The modifiers written on one declaration: their tokens in source order
/// plus the combined flags. A repeated modifier appears twice in `tokens`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierList {
    pub tokens: Vec<TokenId>,
    pub flags: Modifiers,
}

impl ModifierList {
    pub fn push(&mut self, token: TokenId, flag: Modifiers) {
        self.tokens.push(token);
        self.flags |= flag;
    }

    pub fn contains(&self, flag: Modifiers) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(text: &str) -> Token {
        Token::new(TokenKind::Identifier, 0, text.len() as u32, 1, 1, text.to_string())
    }

    #[test]
    fn test_contextual_modifiers() {
        assert_eq!(Modifiers::from_token(&ident("partial")), Some(Modifiers::PARTIAL));
        assert_eq!(Modifiers::from_token(&ident("async")), Some(Modifiers::ASYNC));
        assert_eq!(Modifiers::from_token(&ident("Partial")), None);
    }

    #[test]
    fn test_keywords_and_accessibility() {
        let flags = Modifiers::PROTECTED | Modifiers::INTERNAL | Modifiers::STATIC;
        assert_eq!(flags.keywords(), vec!["protected", "internal", "static"]);
        assert_eq!(flags.accessibility(), Modifiers::PROTECTED | Modifiers::INTERNAL);
    }
}
