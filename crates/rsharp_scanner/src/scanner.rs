//! The C# scanner.
//!
//! Converts the character stream of a [`Utf8Buffer`] into [`Token`]s. The
//! first character of every token selects a start state from the table in
//! [`crate::char_codes`]; each state consumes characters until the token is
//! complete. Comments go to a trivia channel, directive lines go to the
//! [`Preprocessor`], and excluded conditional sections are skipped line by
//! line.

use crate::buffer::{Buffer, Utf8Buffer};
use crate::char_codes::*;
use crate::preprocessor::{Preprocessor, SectionState};
use crate::ScanError;
use rsharp_core::text::{SourcePosition, TextSpan};
use rsharp_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage, Location};
use rsharp_syntax::{check_literal, Comment, CommentKind, Directive, DirectiveKind, Token, TokenKind};

/// The scanner converts C# source text into tokens.
pub struct Scanner {
    file_name: String,
    buffer: Utf8Buffer,
    /// Current character; `None` at end of input.
    ch: Option<char>,
    /// Byte offset of `ch`.
    pos: usize,
    /// 1-based line of `ch`.
    line: u32,
    /// 1-based column of `ch`, in characters.
    col: u32,
    /// Only whitespace seen since the last line terminator.
    at_line_start: bool,
    /// A token was already produced (`#define` is no longer allowed).
    seen_token: bool,
    preprocessor: Preprocessor,
    comments: Vec<Comment>,
    directives: Vec<Directive>,
    diagnostics: DiagnosticCollection,
    finished: bool,
}

impl Scanner {
    /// Create a scanner over `buffer` with the initial conditional
    /// compilation symbols.
    pub fn new<I, S>(file_name: impl Into<String>, buffer: Buffer, defines: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let buffer = Utf8Buffer::new(buffer)?;
        Ok(Self::with_buffer(file_name.into(), buffer, Preprocessor::new(defines)))
    }

    /// Scan in-memory source text with no predefined symbols.
    pub fn from_text(file_name: impl Into<String>, text: &str) -> Self {
        Self::with_buffer(file_name.into(), Utf8Buffer::from_text(text), Preprocessor::default())
    }

    /// Replace the conditional compilation symbols before scanning starts.
    pub fn with_defines<I, S>(mut self, defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preprocessor = Preprocessor::new(defines);
        self
    }

    fn with_buffer(file_name: String, buffer: Utf8Buffer, preprocessor: Preprocessor) -> Self {
        let mut scanner = Self {
            file_name,
            buffer,
            ch: None,
            pos: 0,
            line: 1,
            col: 0,
            at_line_start: true,
            seen_token: false,
            preprocessor,
            comments: Vec::new(),
            directives: Vec::new(),
            diagnostics: DiagnosticCollection::new(),
            finished: false,
        };
        scanner.next_ch();
        scanner
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Take the accumulated diagnostics, leaving an empty collection.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }

    pub fn take_directives(&mut self) -> Vec<Directive> {
        std::mem::take(&mut self.directives)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// The I/O error that cut the input short, if any.
    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.buffer.take_error()
    }

    // ========================================================================
    // Character level
    // ========================================================================

    fn next_ch(&mut self) {
        if let Some(c) = self.ch {
            // `\r\n` ends a line at the `\n`.
            if is_newline(c) && !(c == '\r' && self.buffer.peek() == Some('\n')) {
                self.line += 1;
                self.col = 0;
            }
        }
        self.pos = self.buffer.pos();
        self.ch = self.buffer.read();
        self.col += 1;
    }

    /// The character after `ch`.
    #[inline]
    fn peek_ch(&mut self) -> Option<char> {
        self.buffer.peek()
    }

    #[inline]
    fn at(&self, c: char) -> bool {
        self.ch == Some(c)
    }

    fn at_newline(&self) -> bool {
        self.ch.is_some_and(is_newline)
    }

    fn report(&mut self, message: &DiagnosticMessage, args: &[&str], start: usize, line: u32, col: u32) {
        let span = TextSpan::from_bounds(start as u32, self.pos.max(start) as u32);
        let location = Location::new(self.file_name.clone(), span, SourcePosition::new(line, col));
        self.diagnostics.add(Diagnostic::at(location, message, args));
    }

    /// Report at the current character.
    fn report_here(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let (pos, line, col) = (self.pos, self.line, self.col);
        self.report(message, args, pos, line, col);
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Scan the next token. At end of input this keeps returning
    /// `EndOfFile`.
    pub fn scan(&mut self) -> Token {
        loop {
            let Some(c) = self.ch else {
                return self.end_of_file();
            };
            match start_state(c) {
                StartState::Whitespace => self.next_ch(),
                StartState::NewLine => {
                    self.next_ch();
                    self.at_line_start = true;
                }
                StartState::Slash if matches!(self.peek_ch(), Some('/') | Some('*')) => self.scan_comment(),
                StartState::Hash if self.at_line_start => self.scan_directive(),
                _ => break,
            }
        }

        let (start, line, col) = (self.pos, self.line, self.col);
        self.at_line_start = false;
        self.seen_token = true;
        let mut value = None;
        let kind = match self.ch.map(start_state).unwrap_or(StartState::Invalid) {
            StartState::Identifier | StartState::Backslash => {
                if self.at('\\') && !matches!(self.peek_ch(), Some('u') | Some('U')) {
                    self.invalid_character()
                } else {
                    let (kind, name) = self.scan_identifier(false);
                    value = name;
                    kind
                }
            }
            StartState::Digit => self.scan_number(),
            StartState::Dot => {
                if self.peek_ch().is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    self.next_ch();
                    TokenKind::Dot
                }
            }
            StartState::String => {
                self.next_ch();
                self.scan_string_body(false, false);
                TokenKind::StringLiteral
            }
            StartState::Char => self.scan_char(),
            StartState::At => self.scan_at(&mut value),
            StartState::Dollar => self.scan_dollar(),
            StartState::Slash => {
                self.next_ch();
                self.operator_tail('=', TokenKind::SlashEquals, TokenKind::Slash)
            }
            StartState::Single(kind) => {
                self.next_ch();
                kind
            }
            StartState::Operator => self.scan_operator(),
            StartState::Hash | StartState::Invalid => self.invalid_character(),
            StartState::Whitespace | StartState::NewLine => TokenKind::NoSymbol,
        };

        let end = self.pos;
        let text = self.buffer.slice(start, end);
        let value = value.filter(|v| *v != text);
        let mut token = Token::new(kind, start as u32, end as u32, line, col, text);
        token.value = value;
        token
    }

    fn end_of_file(&mut self) -> Token {
        if !self.finished {
            self.finished = true;
            for mut problem in self.preprocessor.finish() {
                let location = Location::new(
                    self.file_name.clone(),
                    TextSpan::empty(self.pos as u32),
                    SourcePosition::new(self.line, self.col),
                );
                problem.location = Some(location);
                self.diagnostics.add(problem);
            }
            tracing::trace!(file = %self.file_name, comments = self.comments.len(), "scanner reached end of file");
        }
        Token::new(TokenKind::EndOfFile, self.pos as u32, self.pos as u32, self.line, self.col, String::new())
    }

    fn invalid_character(&mut self) -> TokenKind {
        let shown = self.ch.map(String::from).unwrap_or_default();
        self.report_here(&messages::UNEXPECTED_CHARACTER, &[shown.as_str()]);
        self.next_ch();
        TokenKind::NoSymbol
    }

    /// `c` completes a two-character operator, otherwise the token is
    /// `single`.
    fn operator_tail(&mut self, c: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.at(c) {
            self.next_ch();
            double
        } else {
            single
        }
    }

    fn scan_operator(&mut self) -> TokenKind {
        let Some(first) = self.ch else {
            return TokenKind::EndOfFile;
        };
        self.next_ch();
        match first {
            ':' => self.operator_tail(':', TokenKind::ColonColon, TokenKind::Colon),
            '?' => self.operator_tail('?', TokenKind::QuestionQuestion, TokenKind::Question),
            '*' => self.operator_tail('=', TokenKind::AsteriskEquals, TokenKind::Asterisk),
            '%' => self.operator_tail('=', TokenKind::PercentEquals, TokenKind::Percent),
            '^' => self.operator_tail('=', TokenKind::CaretEquals, TokenKind::Caret),
            '!' => self.operator_tail('=', TokenKind::ExclamationEquals, TokenKind::Exclamation),
            // `>>` and `>>=` are joined by the parser.
            '>' => self.operator_tail('=', TokenKind::GreaterThanEquals, TokenKind::GreaterThan),
            '+' => match self.ch {
                Some('+') => self.advance_with(TokenKind::PlusPlus),
                Some('=') => self.advance_with(TokenKind::PlusEquals),
                _ => TokenKind::Plus,
            },
            '-' => match self.ch {
                Some('-') => self.advance_with(TokenKind::MinusMinus),
                Some('=') => self.advance_with(TokenKind::MinusEquals),
                Some('>') => self.advance_with(TokenKind::Arrow),
                _ => TokenKind::Minus,
            },
            '&' => match self.ch {
                Some('&') => self.advance_with(TokenKind::AmpersandAmpersand),
                Some('=') => self.advance_with(TokenKind::AmpersandEquals),
                _ => TokenKind::Ampersand,
            },
            '|' => match self.ch {
                Some('|') => self.advance_with(TokenKind::BarBar),
                Some('=') => self.advance_with(TokenKind::BarEquals),
                _ => TokenKind::Bar,
            },
            '=' => match self.ch {
                Some('=') => self.advance_with(TokenKind::EqualsEquals),
                Some('>') => self.advance_with(TokenKind::EqualsGreaterThan),
                _ => TokenKind::Equals,
            },
            '<' => match self.ch {
                Some('<') => {
                    self.next_ch();
                    self.operator_tail('=', TokenKind::LessThanLessThanEquals, TokenKind::LessThanLessThan)
                }
                Some('=') => self.advance_with(TokenKind::LessThanEquals),
                _ => TokenKind::LessThan,
            },
            _ => TokenKind::NoSymbol,
        }
    }

    fn advance_with(&mut self, kind: TokenKind) -> TokenKind {
        self.next_ch();
        kind
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    /// Scan an identifier or keyword, returning its kind and its unescaped
    /// name. Escaped and verbatim identifiers are never keywords.
    fn scan_identifier(&mut self, verbatim: bool) -> (TokenKind, Option<String>) {
        let mut name = String::new();
        let mut escaped = false;
        loop {
            let ch = self.ch;
            match ch {
                Some('\\') if matches!(self.peek_ch(), Some('u') | Some('U')) => {
                    escaped = true;
                    let (start, line, col) = (self.pos, self.line, self.col);
                    match self.scan_unicode_escape() {
                        Some(c) if is_identifier_part(c) && (!name.is_empty() || is_identifier_start(c)) => name.push(c),
                        _ => self.report(&messages::UNRECOGNIZED_ESCAPE_SEQUENCE, &[], start, line, col),
                    }
                }
                Some(c) if is_identifier_part(c) => {
                    name.push(c);
                    self.next_ch();
                }
                _ => break,
            }
        }
        let kind = if verbatim || escaped {
            TokenKind::Identifier
        } else {
            check_literal(&name)
        };
        (kind, Some(name))
    }

    /// Decode `\uXXXX` or `\UXXXXXXXX` starting at the backslash.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        self.next_ch();
        let digits = if self.at('U') { 8 } else { 4 };
        self.next_ch();
        self.scan_hex_digits(digits, digits).and_then(char::from_u32)
    }

    /// Read between `min` and `max` hex digits.
    fn scan_hex_digits(&mut self, min: usize, max: usize) -> Option<u32> {
        let mut value = 0u32;
        let mut count = 0;
        while count < max {
            let Some(digit) = self.ch.and_then(hex_value) else {
                break;
            };
            value = value.wrapping_mul(16).wrapping_add(digit);
            count += 1;
            self.next_ch();
        }
        (count >= min).then_some(value)
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    fn scan_number(&mut self) -> TokenKind {
        let (start, line, col) = (self.pos, self.line, self.col);
        if self.at('0') && matches!(self.peek_ch(), Some('x') | Some('X')) {
            self.next_ch();
            self.next_ch();
            let mut digits = 0;
            while self.ch.is_some_and(|c| c.is_ascii_hexdigit()) {
                digits += 1;
                self.next_ch();
            }
            if digits == 0 {
                self.report(&messages::INVALID_NUMBER, &[], start, line, col);
            }
            self.scan_integer_suffix();
            return TokenKind::IntegerLiteral;
        }

        let mut real = false;
        self.skip_digits();
        if self.at('.') && self.peek_ch().is_some_and(|c| c.is_ascii_digit()) {
            real = true;
            self.next_ch();
            self.skip_digits();
        }
        if matches!(self.ch, Some('e') | Some('E')) {
            real = true;
            self.next_ch();
            if matches!(self.ch, Some('+') | Some('-')) {
                self.next_ch();
            }
            if !self.ch.is_some_and(|c| c.is_ascii_digit()) {
                self.report(&messages::INVALID_NUMBER, &[], start, line, col);
            }
            self.skip_digits();
        }
        match self.ch {
            Some('f' | 'F' | 'd' | 'D' | 'm' | 'M') => {
                self.next_ch();
                TokenKind::RealLiteral
            }
            _ if real => TokenKind::RealLiteral,
            _ => {
                self.scan_integer_suffix();
                TokenKind::IntegerLiteral
            }
        }
    }

    fn skip_digits(&mut self) {
        while self.ch.is_some_and(|c| c.is_ascii_digit()) {
            self.next_ch();
        }
    }

    /// `u`, `l`, `ul` or `lu` in any case.
    fn scan_integer_suffix(&mut self) {
        match self.ch {
            Some('u' | 'U') => {
                self.next_ch();
                if matches!(self.ch, Some('l' | 'L')) {
                    self.next_ch();
                }
            }
            Some('l' | 'L') => {
                self.next_ch();
                if matches!(self.ch, Some('u' | 'U')) {
                    self.next_ch();
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Character and string literals
    // ========================================================================

    /// A simple escape sequence after `\`. The backslash is current.
    fn scan_escape(&mut self) {
        let (start, line, col) = (self.pos, self.line, self.col);
        self.next_ch();
        match self.ch {
            Some('\'' | '"' | '\\' | '0' | 'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v') => self.next_ch(),
            Some('x') => {
                self.next_ch();
                if self.scan_hex_digits(1, 4).is_none() {
                    self.report(&messages::UNRECOGNIZED_ESCAPE_SEQUENCE, &[], start, line, col);
                }
            }
            Some('u' | 'U') => {
                let digits = if self.at('U') { 8 } else { 4 };
                self.next_ch();
                if self.scan_hex_digits(digits, digits).is_none() {
                    self.report(&messages::UNRECOGNIZED_ESCAPE_SEQUENCE, &[], start, line, col);
                }
            }
            _ => {
                if !self.at_newline() && self.ch.is_some() {
                    self.next_ch();
                }
                self.report(&messages::UNRECOGNIZED_ESCAPE_SEQUENCE, &[], start, line, col);
            }
        }
    }

    fn scan_char(&mut self) -> TokenKind {
        let (start, line, col) = (self.pos, self.line, self.col);
        self.next_ch();
        if self.at('\'') {
            self.next_ch();
            self.report(&messages::EMPTY_CHARACTER_LITERAL, &[], start, line, col);
            return TokenKind::CharacterLiteral;
        }
        let mut count = 0;
        loop {
            match self.ch {
                None => {
                    self.report(&messages::NEWLINE_IN_CONSTANT, &[], start, line, col);
                    break;
                }
                Some(c) if is_newline(c) => {
                    self.report(&messages::NEWLINE_IN_CONSTANT, &[], start, line, col);
                    break;
                }
                Some('\'') => {
                    self.next_ch();
                    if count > 1 {
                        self.report(&messages::TOO_MANY_CHARACTERS_IN_CHARACTER_LITERAL, &[], start, line, col);
                    }
                    break;
                }
                Some('\\') => {
                    self.scan_escape();
                    count += 1;
                }
                Some(_) => {
                    self.next_ch();
                    count += 1;
                }
            }
        }
        TokenKind::CharacterLiteral
    }

    /// Scan a string body after its opening quote, through the closing
    /// quote. Interpolated strings track holes so that quotes and braces
    /// inside `{...}` do not end the literal.
    fn scan_string_body(&mut self, verbatim: bool, interpolated: bool) {
        let (start, line, col) = (self.pos, self.line, self.col);
        loop {
            match self.ch {
                None => {
                    let message = if verbatim {
                        &messages::UNTERMINATED_STRING_LITERAL
                    } else {
                        &messages::NEWLINE_IN_CONSTANT
                    };
                    self.report(message, &[], start, line, col);
                    return;
                }
                Some(c) if is_newline(c) && !verbatim => {
                    self.report(&messages::NEWLINE_IN_CONSTANT, &[], start, line, col);
                    return;
                }
                Some('"') => {
                    self.next_ch();
                    if verbatim && self.at('"') {
                        self.next_ch();
                    } else {
                        return;
                    }
                }
                Some('\\') if !verbatim => self.scan_escape(),
                Some('{') if interpolated => {
                    self.next_ch();
                    if self.at('{') {
                        self.next_ch();
                    } else {
                        self.skip_interpolation_hole();
                    }
                }
                Some('}') if interpolated => {
                    self.next_ch();
                    if self.at('}') {
                        self.next_ch();
                    }
                }
                Some(_) => self.next_ch(),
            }
        }
    }

    /// Skip an interpolation hole through its closing brace. Nested
    /// literals are scanned so that their contents cannot close the hole.
    fn skip_interpolation_hole(&mut self) {
        let mut depth = 1usize;
        while let Some(c) = self.ch {
            match c {
                '{' => {
                    depth += 1;
                    self.next_ch();
                }
                '}' => {
                    self.next_ch();
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                '"' => {
                    self.next_ch();
                    self.scan_string_body(false, false);
                }
                '\'' => {
                    self.scan_char();
                }
                '@' if self.peek_ch() == Some('"') => {
                    self.next_ch();
                    self.next_ch();
                    self.scan_string_body(true, false);
                }
                '$' if matches!(self.peek_ch(), Some('"') | Some('@')) => {
                    self.scan_dollar();
                }
                c if is_newline(c) => return,
                _ => self.next_ch(),
            }
        }
    }

    /// `@"..."`, `@$"..."` or `@identifier`.
    fn scan_at(&mut self, value: &mut Option<String>) -> TokenKind {
        match self.peek_ch() {
            Some('"') => {
                self.next_ch();
                self.next_ch();
                self.scan_string_body(true, false);
                TokenKind::StringLiteral
            }
            Some('$') => {
                let mark = (self.pos, self.line, self.col);
                self.next_ch();
                if self.peek_ch() == Some('"') {
                    self.next_ch();
                    self.next_ch();
                    self.scan_string_body(true, true);
                    TokenKind::InterpolatedStringLiteral
                } else {
                    self.report(&messages::UNEXPECTED_CHARACTER, &["@"], mark.0, mark.1, mark.2);
                    TokenKind::NoSymbol
                }
            }
            Some(c) if is_identifier_start(c) || c == '\\' => {
                self.next_ch();
                let (kind, name) = self.scan_identifier(true);
                *value = name;
                kind
            }
            _ => self.invalid_character(),
        }
    }

    /// `$"..."` or `$@"..."`.
    fn scan_dollar(&mut self) -> TokenKind {
        match self.peek_ch() {
            Some('"') => {
                self.next_ch();
                self.next_ch();
                self.scan_string_body(false, true);
                TokenKind::InterpolatedStringLiteral
            }
            Some('@') => {
                let mark = (self.pos, self.line, self.col);
                self.next_ch();
                if self.peek_ch() == Some('"') {
                    self.next_ch();
                    self.next_ch();
                    self.scan_string_body(true, true);
                    TokenKind::InterpolatedStringLiteral
                } else {
                    self.report(&messages::UNEXPECTED_CHARACTER, &["$"], mark.0, mark.1, mark.2);
                    TokenKind::NoSymbol
                }
            }
            _ => self.invalid_character(),
        }
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    /// `//`, `///` or `/* */`; the slash is current.
    fn scan_comment(&mut self) {
        let (start, line, col) = (self.pos, self.line, self.col);
        self.next_ch();
        let kind = if self.at('/') {
            self.next_ch();
            let documentation = self.at('/') && self.peek_ch() != Some('/');
            while self.ch.is_some() && !self.at_newline() {
                self.next_ch();
            }
            if documentation {
                CommentKind::Documentation
            } else {
                CommentKind::SingleLine
            }
        } else {
            self.next_ch();
            loop {
                let ch = self.ch;
                match ch {
                    None => {
                        self.report(&messages::END_OF_FILE_IN_COMMENT, &[], start, line, col);
                        break;
                    }
                    Some('*') if self.peek_ch() == Some('/') => {
                        self.next_ch();
                        self.next_ch();
                        break;
                    }
                    Some(_) => self.next_ch(),
                }
            }
            self.at_line_start = false;
            CommentKind::Delimited
        };
        let text = self.buffer.slice(start, self.pos);
        self.comments.push(Comment {
            kind,
            text,
            span: TextSpan::from_bounds(start as u32, self.pos as u32),
            line,
        });
    }

    /// Process a directive line (`#` is current and first on its line),
    /// then skip any excluded section that follows.
    fn scan_directive(&mut self) {
        let mut state = self.process_directive_line();
        while state == SectionState::Skipped {
            // Skip whole lines until one starts with `#`.
            loop {
                while self.ch.is_some_and(is_whitespace) {
                    self.next_ch();
                }
                match self.ch {
                    None => return,
                    Some('#') => break,
                    _ => {
                        while self.ch.is_some() && !self.at_newline() {
                            self.next_ch();
                        }
                        self.next_ch();
                    }
                }
            }
            state = self.process_directive_line();
        }
    }

    fn process_directive_line(&mut self) -> SectionState {
        let (start, line, col) = (self.pos, self.line, self.col);
        self.next_ch();
        while self.ch.is_some_and(is_whitespace) {
            self.next_ch();
        }
        let name_start = self.pos;
        while self.ch.is_some_and(|c| c.is_ascii_alphabetic()) {
            self.next_ch();
        }
        let name = self.buffer.slice(name_start, self.pos);
        let argument_start = self.pos;
        while self.ch.is_some() && !self.at_newline() {
            self.next_ch();
        }
        let argument = self.buffer.slice(argument_start, self.pos);
        let argument = argument.trim();

        let kind = DirectiveKind::from_name(&name);
        let span = TextSpan::from_bounds(start as u32, self.pos as u32);
        let (state, problems) = self.preprocessor.process(kind, argument, self.seen_token);
        for mut problem in problems {
            problem.location = Some(Location::new(self.file_name.clone(), span, SourcePosition::new(line, col)));
            self.diagnostics.add(problem);
        }
        tracing::trace!(directive = %name, line, ?state, "preprocessor directive");
        self.directives.push(Directive {
            kind,
            text: argument.to_string(),
            line,
            span,
        });
        // The line terminator is left for the main loop.
        state
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("file_name", &self.file_name)
            .field("pos", &self.pos)
            .field("line", &self.line)
            .field("col", &self.col)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::from_text("test.cs", text);
        let mut out = Vec::new();
        loop {
            let token = scanner.scan();
            if token.kind == TokenKind::EndOfFile {
                return out;
            }
            out.push(token.kind);
        }
    }

    #[test]
    fn test_operators_are_maximal_munch_except_shift_right() {
        assert_eq!(
            kinds(":: -> => <<= >>= ?? ++"),
            vec![
                TokenKind::ColonColon,
                TokenKind::Arrow,
                TokenKind::EqualsGreaterThan,
                TokenKind::LessThanLessThanEquals,
                TokenKind::GreaterThan,
                TokenKind::GreaterThanEquals,
                TokenKind::QuestionQuestion,
                TokenKind::PlusPlus,
            ]
        );
    }

    #[test]
    fn test_end_of_file_repeats() {
        let mut scanner = Scanner::from_text("test.cs", "x");
        assert_eq!(scanner.scan().kind, TokenKind::Identifier);
        assert_eq!(scanner.scan().kind, TokenKind::EndOfFile);
        assert_eq!(scanner.scan().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn test_member_access_on_integer() {
        assert_eq!(
            kinds("1.ToString() 1.5"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::RealLiteral,
            ]
        );
    }
}
