//! Tokens and the scanner's side channels (comments and directives).

use crate::token_kind::TokenKind;
use rsharp_core::text::{SourcePosition, TextPos, TextSpan};

rsharp_core::define_index! {
    /// Index of a token in a tree's token vector.
    pub struct TokenId;
}

/// A scanned token. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub pos: TextPos,
    /// Byte offset one past the last character.
    pub end: TextPos,
    /// 1-based line.
    pub line: u32,
    /// 1-based column, counted in characters.
    pub column: u32,
    /// Raw source text.
    pub text: String,
    /// Unescaped identifier name when it differs from `text`
    /// (`@class`, `Abc`).
    pub value: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, pos: TextPos, end: TextPos, line: u32, column: u32, text: String) -> Self {
        Self {
            kind,
            pos,
            end,
            line,
            column,
            text,
            value: None,
        }
    }

    /// The token's logical value: the unescaped name for identifiers,
    /// the source text otherwise.
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.text)
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::from_bounds(self.pos, self.end)
    }

    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.column)
    }

    /// Whether this is the contextual keyword `word`. Verbatim identifiers
    /// (`@where`) never match because their text keeps the `@`.
    #[inline]
    pub fn is_contextual(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }

    /// Whether `next` starts exactly where this token ends.
    #[inline]
    pub fn touches(&self, next: &Token) -> bool {
        self.end == next.pos
    }
}

/// The flavor of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    /// `// ...`
    SingleLine,
    /// `/* ... */`
    Delimited,
    /// `/// ...`
    Documentation,
}

/// A comment from the trivia channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
    pub span: TextSpan,
    pub line: u32,
}

impl Comment {
    /// The comment body without its `//`, `///` or `/* */` delimiters.
    pub fn body(&self) -> &str {
        match self.kind {
            CommentKind::Documentation => self.text.strip_prefix("///").unwrap_or(&self.text),
            CommentKind::SingleLine => self.text.strip_prefix("//").unwrap_or(&self.text),
            CommentKind::Delimited => {
                let inner = self.text.strip_prefix("/*").unwrap_or(&self.text);
                inner.strip_suffix("*/").unwrap_or(inner)
            }
        }
    }
}

/// A preprocessor directive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Define,
    Undef,
    If,
    Elif,
    Else,
    Endif,
    Region,
    EndRegion,
    Error,
    Warning,
    Line,
    Pragma,
    Unknown,
}

impl DirectiveKind {
    pub fn from_name(name: &str) -> DirectiveKind {
        match name {
            "define" => DirectiveKind::Define,
            "undef" => DirectiveKind::Undef,
            "if" => DirectiveKind::If,
            "elif" => DirectiveKind::Elif,
            "else" => DirectiveKind::Else,
            "endif" => DirectiveKind::Endif,
            "region" => DirectiveKind::Region,
            "endregion" => DirectiveKind::EndRegion,
            "error" => DirectiveKind::Error,
            "warning" => DirectiveKind::Warning,
            "line" => DirectiveKind::Line,
            "pragma" => DirectiveKind::Pragma,
            _ => DirectiveKind::Unknown,
        }
    }
}

/// A processed preprocessor directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Everything after the directive name, trimmed.
    pub text: String,
    pub line: u32,
    pub span: TextSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbatim_identifier_is_not_contextual() {
        let mut token = Token::new(TokenKind::Identifier, 0, 6, 1, 1, "@where".to_string());
        token.value = Some("where".to_string());
        assert_eq!(token.value(), "where");
        assert!(!token.is_contextual("where"));
    }

    #[test]
    fn test_comment_body() {
        let doc = Comment {
            kind: CommentKind::Documentation,
            text: "/// <summary>".to_string(),
            span: TextSpan::new(0, 13),
            line: 1,
        };
        assert_eq!(doc.body(), " <summary>");
        let block = Comment {
            kind: CommentKind::Delimited,
            text: "/* x */".to_string(),
            span: TextSpan::new(0, 7),
            line: 1,
        };
        assert_eq!(block.body(), " x ");
    }
}
