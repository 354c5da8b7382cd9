//! TokenKind enum - every token the scanner can produce.
//!
//! Kinds are numbered below 256 so the parser's lookahead sets fit in two
//! `u128` words. Contextual keywords (`partial`, `where`, `var`, query
//! keywords, accessor names) are scanned as identifiers and recognized by
//! the parser from their text.

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TokenKind {
    // ========================================================================
    // Special and literals
    // ========================================================================
    EndOfFile = 0,
    /// Sentinel for input the scanner could not recognize.
    NoSymbol,
    Identifier,
    IntegerLiteral,
    RealLiteral,
    CharacterLiteral,
    StringLiteral,
    InterpolatedStringLiteral,

    // ========================================================================
    // Punctuation and operators
    // ========================================================================
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Dot,
    Comma,
    Colon,
    ColonColon,
    Semicolon,
    Question,
    QuestionQuestion,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Ampersand,
    Bar,
    Caret,
    Exclamation,
    Tilde,
    PlusPlus,
    MinusMinus,
    AmpersandAmpersand,
    BarBar,
    LessThanLessThan,
    EqualsEquals,
    ExclamationEquals,
    LessThan,
    GreaterThan,
    LessThanEquals,
    GreaterThanEquals,
    Arrow,
    EqualsGreaterThan,
    Equals,
    PlusEquals,
    MinusEquals,
    AsteriskEquals,
    SlashEquals,
    PercentEquals,
    AmpersandEquals,
    BarEquals,
    CaretEquals,
    LessThanLessThanEquals,

    // ========================================================================
    // Keywords
    // ========================================================================
    AbstractKeyword,
    AsKeyword,
    BaseKeyword,
    BoolKeyword,
    BreakKeyword,
    ByteKeyword,
    CaseKeyword,
    CatchKeyword,
    CharKeyword,
    CheckedKeyword,
    ClassKeyword,
    ConstKeyword,
    ContinueKeyword,
    DecimalKeyword,
    DefaultKeyword,
    DelegateKeyword,
    DoKeyword,
    DoubleKeyword,
    ElseKeyword,
    EnumKeyword,
    EventKeyword,
    ExplicitKeyword,
    ExternKeyword,
    FalseKeyword,
    FinallyKeyword,
    FixedKeyword,
    FloatKeyword,
    ForKeyword,
    ForeachKeyword,
    GotoKeyword,
    IfKeyword,
    ImplicitKeyword,
    InKeyword,
    IntKeyword,
    InterfaceKeyword,
    InternalKeyword,
    IsKeyword,
    LockKeyword,
    LongKeyword,
    NamespaceKeyword,
    NewKeyword,
    NullKeyword,
    ObjectKeyword,
    OperatorKeyword,
    OutKeyword,
    OverrideKeyword,
    ParamsKeyword,
    PrivateKeyword,
    ProtectedKeyword,
    PublicKeyword,
    ReadonlyKeyword,
    RefKeyword,
    ReturnKeyword,
    SbyteKeyword,
    SealedKeyword,
    ShortKeyword,
    SizeofKeyword,
    StackallocKeyword,
    StaticKeyword,
    StringKeyword,
    StructKeyword,
    SwitchKeyword,
    ThisKeyword,
    ThrowKeyword,
    TrueKeyword,
    TryKeyword,
    TypeofKeyword,
    UintKeyword,
    UlongKeyword,
    UncheckedKeyword,
    UnsafeKeyword,
    UshortKeyword,
    UsingKeyword,
    VirtualKeyword,
    VoidKeyword,
    VolatileKeyword,
    WhileKeyword,
}

impl TokenKind {
    pub const FIRST_PUNCTUATION: TokenKind = TokenKind::OpenBrace;
    pub const LAST_PUNCTUATION: TokenKind = TokenKind::LessThanLessThanEquals;
    pub const FIRST_KEYWORD: TokenKind = TokenKind::AbstractKeyword;
    pub const LAST_KEYWORD: TokenKind = TokenKind::WhileKeyword;
    pub const FIRST_ASSIGNMENT: TokenKind = TokenKind::Equals;
    pub const LAST_ASSIGNMENT: TokenKind = TokenKind::LessThanLessThanEquals;
    /// Number of distinct kinds.
    pub const COUNT: usize = TokenKind::WhileKeyword as usize + 1;

    /// Every kind in declaration order.
    pub fn all() -> impl Iterator<Item = TokenKind> {
        (0..Self::COUNT as u8).filter_map(TokenKind::from_u8)
    }

    pub fn from_u8(value: u8) -> Option<TokenKind> {
        if (value as usize) < Self::COUNT {
            // SAFETY: `TokenKind` is `repr(u8)` with contiguous discriminants
            // starting at zero, and `value` is below the variant count.
            Some(unsafe { std::mem::transmute::<u8, TokenKind>(value) })
        } else {
            None
        }
    }

    #[inline]
    pub fn is_keyword(self) -> bool {
        self >= Self::FIRST_KEYWORD && self <= Self::LAST_KEYWORD
    }

    #[inline]
    pub fn is_punctuation(self) -> bool {
        self >= Self::FIRST_PUNCTUATION && self <= Self::LAST_PUNCTUATION
    }

    #[inline]
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntegerLiteral
                | TokenKind::RealLiteral
                | TokenKind::CharacterLiteral
                | TokenKind::StringLiteral
                | TokenKind::InterpolatedStringLiteral
                | TokenKind::TrueKeyword
                | TokenKind::FalseKeyword
                | TokenKind::NullKeyword
        )
    }

    /// `=` and the compound assignment operators.
    #[inline]
    pub fn is_assignment_operator(self) -> bool {
        self >= Self::FIRST_ASSIGNMENT && self <= Self::LAST_ASSIGNMENT
    }

    /// Keywords naming a predefined type (`void` excluded).
    #[inline]
    pub fn is_predefined_type(self) -> bool {
        matches!(
            self,
            TokenKind::BoolKeyword
                | TokenKind::ByteKeyword
                | TokenKind::CharKeyword
                | TokenKind::DecimalKeyword
                | TokenKind::DoubleKeyword
                | TokenKind::FloatKeyword
                | TokenKind::IntKeyword
                | TokenKind::LongKeyword
                | TokenKind::ObjectKeyword
                | TokenKind::SbyteKeyword
                | TokenKind::ShortKeyword
                | TokenKind::StringKeyword
                | TokenKind::UintKeyword
                | TokenKind::UlongKeyword
                | TokenKind::UshortKeyword
        )
    }

    /// Reserved-word modifiers. `partial` and `async` are contextual and
    /// handled by the parser.
    #[inline]
    pub fn is_modifier_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::NewKeyword
                | TokenKind::PublicKeyword
                | TokenKind::ProtectedKeyword
                | TokenKind::InternalKeyword
                | TokenKind::PrivateKeyword
                | TokenKind::AbstractKeyword
                | TokenKind::SealedKeyword
                | TokenKind::StaticKeyword
                | TokenKind::ReadonlyKeyword
                | TokenKind::VolatileKeyword
                | TokenKind::VirtualKeyword
                | TokenKind::OverrideKeyword
                | TokenKind::ExternKeyword
                | TokenKind::UnsafeKeyword
                | TokenKind::ConstKeyword
        )
    }

    /// Operators that may appear after `operator` in an operator declaration.
    #[inline]
    pub fn is_overloadable_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Exclamation
                | TokenKind::Tilde
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::TrueKeyword
                | TokenKind::FalseKeyword
                | TokenKind::Asterisk
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Ampersand
                | TokenKind::Bar
                | TokenKind::Caret
                | TokenKind::LessThanLessThan
                | TokenKind::GreaterThan
                | TokenKind::EqualsEquals
                | TokenKind::ExclamationEquals
                | TokenKind::LessThan
                | TokenKind::GreaterThanEquals
                | TokenKind::LessThanEquals
        )
    }

    /// The source text of a fixed token, or a description for variable ones.
    pub fn text(self) -> &'static str {
        match self {
            TokenKind::EndOfFile => "end-of-file",
            TokenKind::NoSymbol => "invalid token",
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerLiteral => "integer literal",
            TokenKind::RealLiteral => "real literal",
            TokenKind::CharacterLiteral => "character literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::InterpolatedStringLiteral => "interpolated string",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::ColonColon => "::",
            TokenKind::Semicolon => ";",
            TokenKind::Question => "?",
            TokenKind::QuestionQuestion => "??",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Ampersand => "&",
            TokenKind::Bar => "|",
            TokenKind::Caret => "^",
            TokenKind::Exclamation => "!",
            TokenKind::Tilde => "~",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::BarBar => "||",
            TokenKind::LessThanLessThan => "<<",
            TokenKind::EqualsEquals => "==",
            TokenKind::ExclamationEquals => "!=",
            TokenKind::LessThan => "<",
            TokenKind::GreaterThan => ">",
            TokenKind::LessThanEquals => "<=",
            TokenKind::GreaterThanEquals => ">=",
            TokenKind::Arrow => "->",
            TokenKind::EqualsGreaterThan => "=>",
            TokenKind::Equals => "=",
            TokenKind::PlusEquals => "+=",
            TokenKind::MinusEquals => "-=",
            TokenKind::AsteriskEquals => "*=",
            TokenKind::SlashEquals => "/=",
            TokenKind::PercentEquals => "%=",
            TokenKind::AmpersandEquals => "&=",
            TokenKind::BarEquals => "|=",
            TokenKind::CaretEquals => "^=",
            TokenKind::LessThanLessThanEquals => "<<=",
            keyword => keyword_text(keyword).unwrap_or("?"),
        }
    }
}

/// Table of reserved words, in `TokenKind` order.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("abstract", TokenKind::AbstractKeyword),
    ("as", TokenKind::AsKeyword),
    ("base", TokenKind::BaseKeyword),
    ("bool", TokenKind::BoolKeyword),
    ("break", TokenKind::BreakKeyword),
    ("byte", TokenKind::ByteKeyword),
    ("case", TokenKind::CaseKeyword),
    ("catch", TokenKind::CatchKeyword),
    ("char", TokenKind::CharKeyword),
    ("checked", TokenKind::CheckedKeyword),
    ("class", TokenKind::ClassKeyword),
    ("const", TokenKind::ConstKeyword),
    ("continue", TokenKind::ContinueKeyword),
    ("decimal", TokenKind::DecimalKeyword),
    ("default", TokenKind::DefaultKeyword),
    ("delegate", TokenKind::DelegateKeyword),
    ("do", TokenKind::DoKeyword),
    ("double", TokenKind::DoubleKeyword),
    ("else", TokenKind::ElseKeyword),
    ("enum", TokenKind::EnumKeyword),
    ("event", TokenKind::EventKeyword),
    ("explicit", TokenKind::ExplicitKeyword),
    ("extern", TokenKind::ExternKeyword),
    ("false", TokenKind::FalseKeyword),
    ("finally", TokenKind::FinallyKeyword),
    ("fixed", TokenKind::FixedKeyword),
    ("float", TokenKind::FloatKeyword),
    ("for", TokenKind::ForKeyword),
    ("foreach", TokenKind::ForeachKeyword),
    ("goto", TokenKind::GotoKeyword),
    ("if", TokenKind::IfKeyword),
    ("implicit", TokenKind::ImplicitKeyword),
    ("in", TokenKind::InKeyword),
    ("int", TokenKind::IntKeyword),
    ("interface", TokenKind::InterfaceKeyword),
    ("internal", TokenKind::InternalKeyword),
    ("is", TokenKind::IsKeyword),
    ("lock", TokenKind::LockKeyword),
    ("long", TokenKind::LongKeyword),
    ("namespace", TokenKind::NamespaceKeyword),
    ("new", TokenKind::NewKeyword),
    ("null", TokenKind::NullKeyword),
    ("object", TokenKind::ObjectKeyword),
    ("operator", TokenKind::OperatorKeyword),
    ("out", TokenKind::OutKeyword),
    ("override", TokenKind::OverrideKeyword),
    ("params", TokenKind::ParamsKeyword),
    ("private", TokenKind::PrivateKeyword),
    ("protected", TokenKind::ProtectedKeyword),
    ("public", TokenKind::PublicKeyword),
    ("readonly", TokenKind::ReadonlyKeyword),
    ("ref", TokenKind::RefKeyword),
    ("return", TokenKind::ReturnKeyword),
    ("sbyte", TokenKind::SbyteKeyword),
    ("sealed", TokenKind::SealedKeyword),
    ("short", TokenKind::ShortKeyword),
    ("sizeof", TokenKind::SizeofKeyword),
    ("stackalloc", TokenKind::StackallocKeyword),
    ("static", TokenKind::StaticKeyword),
    ("string", TokenKind::StringKeyword),
    ("struct", TokenKind::StructKeyword),
    ("switch", TokenKind::SwitchKeyword),
    ("this", TokenKind::ThisKeyword),
    ("throw", TokenKind::ThrowKeyword),
    ("true", TokenKind::TrueKeyword),
    ("try", TokenKind::TryKeyword),
    ("typeof", TokenKind::TypeofKeyword),
    ("uint", TokenKind::UintKeyword),
    ("ulong", TokenKind::UlongKeyword),
    ("unchecked", TokenKind::UncheckedKeyword),
    ("unsafe", TokenKind::UnsafeKeyword),
    ("ushort", TokenKind::UshortKeyword),
    ("using", TokenKind::UsingKeyword),
    ("virtual", TokenKind::VirtualKeyword),
    ("void", TokenKind::VoidKeyword),
    ("volatile", TokenKind::VolatileKeyword),
    ("while", TokenKind::WhileKeyword),
];

fn keyword_text(kind: TokenKind) -> Option<&'static str> {
    let offset = (kind as usize).checked_sub(TokenKind::FIRST_KEYWORD as usize)?;
    KEYWORDS.get(offset).map(|(text, _)| *text)
}

/// Map an accumulated identifier to its keyword kind, or `Identifier`.
pub fn check_literal(text: &str) -> TokenKind {
    // Every reserved word is 2..=10 lowercase ASCII letters.
    if text.len() < 2 || text.len() > 10 || !text.as_bytes()[0].is_ascii_lowercase() {
        return TokenKind::Identifier;
    }
    KEYWORDS
        .binary_search_by(|(word, _)| (*word).cmp(text))
        .map(|i| KEYWORDS[i].1)
        .unwrap_or(TokenKind::Identifier)
}

/// Contextual keywords recognized by text in specific grammar positions.
pub mod contextual {
    pub const PARTIAL: &str = "partial";
    pub const WHERE: &str = "where";
    pub const VAR: &str = "var";
    pub const GET: &str = "get";
    pub const SET: &str = "set";
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
    pub const YIELD: &str = "yield";
    pub const ASYNC: &str = "async";
    pub const AWAIT: &str = "await";
    pub const GLOBAL: &str = "global";
    pub const ALIAS: &str = "alias";
    pub const ASSEMBLY: &str = "assembly";
    pub const MODULE: &str = "module";
    pub const FROM: &str = "from";
    pub const LET: &str = "let";
    pub const JOIN: &str = "join";
    pub const ON: &str = "on";
    pub const EQUALS: &str = "equals";
    pub const INTO: &str = "into";
    pub const ORDERBY: &str = "orderby";
    pub const ASCENDING: &str = "ascending";
    pub const DESCENDING: &str = "descending";
    pub const SELECT: &str = "select";
    pub const GROUP: &str = "group";
    pub const BY: &str = "by";
    pub const WHEN: &str = "when";
}
