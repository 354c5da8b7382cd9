//! The parser's view of the scanner: a token vector with a scan cursor and
//! a peek cursor.
//!
//! `scan` commits to the next token. `peek` looks further ahead without
//! committing; every `scan` and every `reset_peek` moves the peek cursor
//! back to just after the last scanned token. Tokens are pulled from the
//! scanner on demand and kept, so the ids handed out stay valid for the
//! syntax tree.

use crate::scanner::Scanner;
use rsharp_core::arena::ArenaIndex;
use rsharp_diagnostics::DiagnosticCollection;
use rsharp_syntax::{Comment, Directive, Token, TokenId, TokenKind};

pub struct TokenStream {
    scanner: Scanner,
    tokens: Vec<Token>,
    /// Index of the next token `scan` returns.
    scan_index: usize,
    /// Index of the next token `peek` returns.
    peek_index: usize,
}

/// Everything a finished token stream produced.
#[derive(Debug)]
pub struct ScanOutput {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    pub directives: Vec<Directive>,
    pub diagnostics: DiagnosticCollection,
    pub error: Option<std::io::Error>,
}

impl TokenStream {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            scanner,
            tokens: Vec::new(),
            scan_index: 0,
            peek_index: 0,
        }
    }

    /// Commit to the next token. Stays on `EndOfFile` once reached.
    pub fn scan(&mut self) -> TokenId {
        let index = self.fill(self.scan_index);
        self.scan_index = self.advance(index);
        self.peek_index = self.scan_index;
        TokenId::from_usize(index)
    }

    /// The next token after the peek cursor. Repeated calls look further
    /// ahead.
    pub fn peek(&mut self) -> TokenId {
        let index = self.fill(self.peek_index);
        self.peek_index = self.advance(index);
        TokenId::from_usize(index)
    }

    /// Rewind the peek cursor to the scan position.
    pub fn reset_peek(&mut self) {
        self.peek_index = self.scan_index;
    }

    #[inline]
    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Drain the scanner to end of file and hand out everything it produced.
    pub fn finish(mut self) -> ScanOutput {
        self.fill(usize::MAX);
        ScanOutput {
            tokens: self.tokens,
            comments: self.scanner.take_comments(),
            directives: self.scanner.take_directives(),
            diagnostics: self.scanner.take_diagnostics(),
            error: self.scanner.take_error(),
        }
    }

    /// Make sure token `index` exists; returns it, or the end-of-file index
    /// when the input is shorter.
    fn fill(&mut self, index: usize) -> usize {
        while self.tokens.len() <= index {
            if self.tokens.last().is_some_and(|t| t.kind == TokenKind::EndOfFile) {
                return self.tokens.len() - 1;
            }
            let token = self.scanner.scan();
            self.tokens.push(token);
        }
        index
    }

    fn advance(&self, index: usize) -> usize {
        if self.tokens[index].kind == TokenKind::EndOfFile {
            index
        } else {
            index + 1
        }
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("scanned", &self.tokens.len())
            .field("scan_index", &self.scan_index)
            .field("peek_index", &self.peek_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(text: &str) -> TokenStream {
        TokenStream::new(Scanner::from_text("test.cs", text))
    }

    #[test]
    fn test_peek_does_not_commit() {
        let mut ts = stream("a b c");
        let a = ts.scan();
        assert_eq!(ts.token(a).text, "a");
        let b = ts.peek();
        let c = ts.peek();
        assert_eq!(ts.token(b).text, "b");
        assert_eq!(ts.token(c).text, "c");
        let end = ts.peek();
        assert_eq!(ts.token(end).kind, TokenKind::EndOfFile);

        ts.reset_peek();
        assert_eq!(ts.peek(), b);
        assert_eq!(ts.scan(), b);
        // Scanning resets the peek cursor.
        assert_eq!(ts.peek(), c);
    }

    #[test]
    fn test_end_of_file_is_sticky() {
        let mut ts = stream("x");
        ts.scan();
        let eof = ts.scan();
        assert_eq!(ts.token(eof).kind, TokenKind::EndOfFile);
        assert_eq!(ts.scan(), eof);
        assert_eq!(ts.peek(), eof);
        assert_eq!(ts.peek(), eof);
        assert_eq!(ts.tokens().len(), 2);
    }

    #[test]
    fn test_finish_collects_trivia() {
        let mut ts = stream("// lead\nx /* tail */");
        ts.scan();
        let out = ts.finish();
        assert_eq!(out.tokens.len(), 2);
        assert_eq!(out.comments.len(), 2);
        assert!(out.diagnostics.is_empty());
        assert!(out.error.is_none());
    }
}
