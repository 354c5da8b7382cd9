//! The C# parser.
//!
//! Recursive descent with one method per nonterminal. `la` is the lookahead
//! token and `t` the last consumed one. Alternatives are chosen on `la` or
//! by membership in a [`TokenSet`]; the few ambiguous spots (casts, generic
//! argument lists, lambdas, local declarations, queries) scan ahead with
//! the token stream's peek cursor and never build nodes speculatively.
//!
//! Error recovery follows the classic scheme: `expect` reports and moves on
//! without consuming, `expect_weak` and `weak_separator` skip to a
//! synchronization set, and `err_dist` suppresses reports until two tokens
//! have been consumed since the last one.

mod declarations;
mod expressions;
mod query;
mod statements;
mod types;

use crate::sets::{self, TokenSet};
use rsharp_core::arena::ArenaIndex;
use rsharp_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage, Location};
use rsharp_scanner::{Buffer, ScanError, Scanner, TokenStream};
use rsharp_syntax::{CommentKind, Ident, NodeId, NodeKind, SyntaxTree, Token, TokenId, TokenKind};

/// Nesting limit for expressions, statements and types.
pub const MAX_RECURSION_DEPTH: u32 = 512;

/// Tokens that must be consumed after an error before the next one is
/// reported.
const MIN_ERR_DIST: u32 = 2;

/// A parsed file and every diagnostic its scanning and parsing produced.
#[derive(Debug)]
pub struct ParseResult {
    pub tree: SyntaxTree,
    pub diagnostics: DiagnosticCollection,
}

impl ParseResult {
    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }
}

pub struct Parser {
    stream: TokenStream,
    tree: SyntaxTree,
    /// Lookahead token.
    la: TokenId,
    /// Last consumed token.
    t: TokenId,
    err_dist: u32,
    diagnostics: DiagnosticCollection,
    recursion_depth: u32,
    /// Inside the body of an `async` method, lambda or anonymous method.
    in_async: bool,
}

impl Parser {
    /// A parser over in-memory source text.
    pub fn new<I, S>(file_name: &str, text: &str, defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scanner = Scanner::from_text(file_name, text).with_defines(defines);
        Self::with_scanner(scanner, SyntaxTree::new(file_name, text))
    }

    /// A parser over raw bytes. Fails on a malformed byte-order mark.
    ///
    /// The tree keeps the source text only when the buffer holds the whole
    /// file; for a windowed stream [`SyntaxTree::text`] is empty.
    pub fn from_buffer<I, S>(file_name: &str, buffer: Buffer, defines: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = buffer
            .as_bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        let scanner = Scanner::new(file_name, buffer, defines)?;
        Ok(Self::with_scanner(scanner, SyntaxTree::new(file_name, source)))
    }

    fn with_scanner(scanner: Scanner, tree: SyntaxTree) -> Self {
        let mut stream = TokenStream::new(scanner);
        let la = stream.scan();
        Self {
            stream,
            tree,
            la,
            t: la,
            err_dist: MIN_ERR_DIST,
            diagnostics: DiagnosticCollection::new(),
            recursion_depth: 0,
            in_async: false,
        }
    }

    /// Parse the whole file. Fails only when the source stream could not
    /// be read.
    pub fn parse(mut self) -> Result<ParseResult, ScanError> {
        let root = self.parse_compilation_unit();
        self.tree.set_root(root);

        let Parser {
            stream,
            mut tree,
            diagnostics: syntax_errors,
            ..
        } = self;
        let output = stream.finish();
        if let Some(error) = output.error {
            return Err(ScanError::Io(error));
        }
        tree.tokens = output.tokens;
        tree.comments = output.comments;
        tree.directives = output.directives;

        let mut diagnostics = output.diagnostics;
        diagnostics.extend(syntax_errors);
        tracing::debug!(
            file = %tree.file_name,
            tokens = tree.tokens.len(),
            nodes = tree.node_count(),
            errors = diagnostics.error_count(),
            "parsed"
        );
        Ok(ParseResult { tree, diagnostics })
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn token(&self, id: TokenId) -> &Token {
        self.stream.token(id)
    }

    #[inline]
    fn kind(&self, id: TokenId) -> TokenKind {
        self.stream.token(id).kind
    }

    #[inline]
    fn la_kind(&self) -> TokenKind {
        self.kind(self.la)
    }

    #[inline]
    fn at(&self, kind: TokenKind) -> bool {
        self.la_kind() == kind
    }

    #[inline]
    fn at_set(&self, set: TokenSet) -> bool {
        set.contains(self.la_kind())
    }

    #[inline]
    fn at_contextual(&self, word: &str) -> bool {
        self.token(self.la).is_contextual(word)
    }

    fn get(&mut self) {
        self.t = self.la;
        self.la = self.stream.scan();
        self.err_dist += 1;
    }

    /// Consume `kind` if it is the lookahead.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.get();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report it missing. Never skips.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.expected(kind);
            false
        }
    }

    /// Consume `kind`, or report it and skip to a token in `follow`.
    fn expect_weak(&mut self, kind: TokenKind, follow: TokenSet) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.expected(kind);
        self.skip_until(follow.with(TokenKind::EndOfFile));
        false
    }

    /// Separator in a repetition. Returns whether another item follows.
    ///
    /// `sy_fol` starts the next item, `rep_fol` follows the whole list.
    /// A missing separator is reported and the input is skipped to the
    /// union of both sets and [`sets::SYNC`]; the list continues only if an
    /// item starts there.
    fn weak_separator(&mut self, kind: TokenKind, sy_fol: TokenSet, rep_fol: TokenSet) -> bool {
        if self.eat(kind) {
            return true;
        }
        if self.at_set(rep_fol) {
            return false;
        }
        self.expected(kind);
        self.skip_until(sy_fol.union(rep_fol).union(sets::SYNC));
        self.at_set(sy_fol)
    }

    fn skip_until(&mut self, set: TokenSet) {
        let from = self.la;
        while !self.at_set(set) {
            self.get();
        }
        if self.la != from {
            tracing::trace!(from = from.0, to = self.la.0, "skipped tokens");
        }
    }

    /// An identifier, or `None` after reporting it missing.
    fn ident(&mut self) -> Ident {
        if self.eat(TokenKind::Identifier) {
            Some(self.t)
        } else {
            self.expected(TokenKind::Identifier);
            None
        }
    }

    /// The token `n` positions after the lookahead.
    fn peek_at(&mut self, n: usize) -> TokenId {
        self.stream.reset_peek();
        let mut id = self.la;
        for _ in 0..n {
            id = self.stream.peek();
        }
        id
    }

    fn peek_kind(&mut self, n: usize) -> TokenKind {
        let id = self.peek_at(n);
        self.kind(id)
    }

    /// Start a scan-ahead at the lookahead token. The peek cursor then sits
    /// just after the returned token, which [`Parser::advance`] relies on.
    fn start_scan(&mut self) -> TokenId {
        self.stream.reset_peek();
        self.la
    }

    #[inline]
    fn advance(&mut self, pt: &mut TokenId) {
        *pt = self.stream.peek();
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn token_location(&self, id: TokenId) -> Location {
        let token = self.token(id);
        Location::new(self.tree.file_name.clone(), token.span(), token.position())
    }

    /// Report a syntax error at the lookahead unless one was reported
    /// fewer than [`MIN_ERR_DIST`] tokens ago.
    fn syn_err(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        if self.err_dist >= MIN_ERR_DIST {
            let location = self.token_location(self.la);
            self.diagnostics.add(Diagnostic::at(location, message, args));
        }
        self.err_dist = 0;
    }

    /// Report unconditionally at `at`.
    fn report(&mut self, at: TokenId, message: &DiagnosticMessage, args: &[&str]) {
        let location = self.token_location(at);
        self.diagnostics.add(Diagnostic::at(location, message, args));
    }

    fn expected(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::Identifier if self.la_kind().is_keyword() => {
                let text = self.token(self.la).text.clone();
                self.syn_err(&messages::IDENTIFIER_EXPECTED_0_IS_KEYWORD, &[&text]);
            }
            TokenKind::Identifier => self.syn_err(&messages::IDENTIFIER_EXPECTED, &[]),
            TokenKind::Semicolon => self.syn_err(&messages::SEMICOLON_EXPECTED, &[]),
            TokenKind::CloseParen => self.syn_err(&messages::CLOSE_PAREN_EXPECTED, &[]),
            TokenKind::CloseBrace => self.syn_err(&messages::CLOSE_BRACE_EXPECTED, &[]),
            TokenKind::OpenBrace => self.syn_err(&messages::OPEN_BRACE_EXPECTED, &[]),
            other => self.syn_err(&messages::SYNTAX_ERROR_0_EXPECTED, &[other.text()]),
        }
    }

    /// Report the lookahead as an invalid expression term.
    fn invalid_term(&mut self) {
        let text = self.token(self.la).text.clone();
        self.syn_err(&messages::INVALID_EXPRESSION_TERM, &[&text]);
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Allocate a node for a production that began at `start` and ended at
    /// the last consumed token. A production that consumed nothing sits on
    /// the last consumed token; the range is widened to cover every child.
    fn finish(&mut self, kind: NodeKind, start: TokenId) -> NodeId {
        let mut start = start;
        let mut end = self.t;
        if end < start {
            start = end;
        }
        for child in kind.children() {
            let node = self.tree.node(child);
            start = start.min(node.start);
            end = end.max(node.end);
        }
        self.tree.alloc(kind, start, end)
    }

    fn error_node(&mut self) -> NodeId {
        self.finish(NodeKind::Error, self.la)
    }

    /// Enter a nested production. Past [`MAX_RECURSION_DEPTH`] the input is
    /// skipped to a synchronization token (at least one token is consumed)
    /// and `false` is returned; the caller then produces an error node.
    fn enter(&mut self) -> bool {
        if self.recursion_depth < MAX_RECURSION_DEPTH {
            self.recursion_depth += 1;
            return true;
        }
        self.report(self.la, &messages::EXPRESSION_TOO_COMPLEX, &[]);
        let from = self.la;
        self.skip_until(sets::SYNC);
        if self.la == from && !self.at(TokenKind::EndOfFile) {
            self.get();
        }
        self.err_dist = 0;
        false
    }

    fn leave(&mut self) {
        self.recursion_depth -= 1;
    }

    /// The `///` block directly before `token`, with no other token or
    /// comment in between.
    fn doc_comment_before(&self, token: TokenId) -> Option<String> {
        let pos = self.token(token).pos;
        let floor = match token.index() {
            0 => 0,
            i => self.token(TokenId::from_usize(i - 1)).end,
        };
        let comments = self.stream.scanner().comments();
        let end = comments.partition_point(|c| c.span.start < pos);
        let mut lines = Vec::new();
        for comment in comments[..end].iter().rev() {
            if comment.span.start < floor || comment.kind != CommentKind::Documentation {
                break;
            }
            let body = comment.body();
            lines.push(body.strip_prefix(' ').unwrap_or(body));
        }
        if lines.is_empty() {
            return None;
        }
        lines.reverse();
        Some(lines.join("\n"))
    }

    fn attach_doc_comment(&mut self, node: NodeId, doc: Option<String>) {
        if let Some(text) = doc {
            self.tree.attach_doc_comment(node, text);
        }
    }
}

/// Parse in-memory source text.
pub fn parse_text<I, S>(file_name: &str, text: &str, defines: I) -> Result<ParseResult, ScanError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Parser::new(file_name, text, defines).parse()
}

/// Parse a byte buffer (in memory or windowed over a seekable stream).
pub fn parse_buffer<I, S>(file_name: &str, buffer: Buffer, defines: I) -> Result<ParseResult, ScanError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Parser::from_buffer(file_name, buffer, defines)?.parse()
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("file", &self.tree.file_name)
            .field("la", &self.la)
            .field("t", &self.t)
            .field("err_dist", &self.err_dist)
            .field("recursion_depth", &self.recursion_depth)
            .finish()
    }
}
