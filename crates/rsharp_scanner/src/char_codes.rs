//! Character classification and the scanner's start-state table.

use rsharp_syntax::TokenKind;
use unicode_xid::UnicodeXID;

/// What the first character of a token tells the scanner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartState {
    Invalid,
    Whitespace,
    NewLine,
    Identifier,
    /// `\` may start an identifier through a `\u` escape.
    Backslash,
    Digit,
    Dot,
    String,
    Char,
    /// `@` prefix: verbatim string or verbatim identifier.
    At,
    /// `$` prefix: interpolated string.
    Dollar,
    Slash,
    Hash,
    /// A token that is always exactly one character.
    Single(TokenKind),
    /// The start of a possibly multi-character operator.
    Operator,
}

const fn build_start_states() -> [StartState; 128] {
    let mut table = [StartState::Invalid; 128];
    let mut c = 0;
    while c < 128 {
        let ch = c as u8;
        table[c] = match ch {
            b' ' | b'\t' | 0x0B | 0x0C => StartState::Whitespace,
            b'\n' | b'\r' => StartState::NewLine,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => StartState::Identifier,
            b'0'..=b'9' => StartState::Digit,
            b'\\' => StartState::Backslash,
            b'.' => StartState::Dot,
            b'"' => StartState::String,
            b'\'' => StartState::Char,
            b'@' => StartState::At,
            b'$' => StartState::Dollar,
            b'/' => StartState::Slash,
            b'#' => StartState::Hash,
            b'{' => StartState::Single(TokenKind::OpenBrace),
            b'}' => StartState::Single(TokenKind::CloseBrace),
            b'(' => StartState::Single(TokenKind::OpenParen),
            b')' => StartState::Single(TokenKind::CloseParen),
            b'[' => StartState::Single(TokenKind::OpenBracket),
            b']' => StartState::Single(TokenKind::CloseBracket),
            b',' => StartState::Single(TokenKind::Comma),
            b';' => StartState::Single(TokenKind::Semicolon),
            b'~' => StartState::Single(TokenKind::Tilde),
            b':' | b'?' | b'+' | b'-' | b'*' | b'%' | b'&' | b'|' | b'^' | b'!' | b'=' | b'<' | b'>' => {
                StartState::Operator
            }
            _ => StartState::Invalid,
        };
        c += 1;
    }
    table
}

static START_STATES: [StartState; 128] = build_start_states();

/// The start state for `ch`. Non-ASCII characters are classified with the
/// Unicode identifier tables.
#[inline]
pub fn start_state(ch: char) -> StartState {
    if (ch as u32) < 128 {
        return START_STATES[ch as usize];
    }
    if is_newline(ch) {
        StartState::NewLine
    } else if is_whitespace(ch) {
        StartState::Whitespace
    } else if ch.is_xid_start() {
        StartState::Identifier
    } else {
        StartState::Invalid
    }
}

/// Line terminators. `\r\n` is handled as a pair by the scanner.
#[inline]
pub fn is_newline(ch: char) -> bool {
    rsharp_core::text::is_line_terminator(ch)
}

/// Whitespace that does not end a line.
#[inline]
pub fn is_whitespace(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t'
            | '\u{000B}' // vertical tab
            | '\u{000C}' // form feed
            | '\u{00A0}' // no-break space
            | '\u{1680}' // ogham space mark
            | '\u{2000}'..='\u{200A}' // various spaces
            | '\u{202F}' // narrow no-break space
            | '\u{205F}' // medium mathematical space
            | '\u{3000}' // ideographic space
            | '\u{FEFF}' // zero-width no-break space
    )
}

#[inline]
pub fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic() || (!ch.is_ascii() && ch.is_xid_start())
}

#[inline]
pub fn is_identifier_part(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric() || (!ch.is_ascii() && ch.is_xid_continue())
}

#[inline]
pub fn hex_value(ch: char) -> Option<u32> {
    ch.to_digit(16)
}
