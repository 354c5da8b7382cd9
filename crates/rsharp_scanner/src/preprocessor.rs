//! Conditional compilation: directive bookkeeping and the `#if` expression
//! evaluator.
//!
//! The expression grammar groups its binary operators in three sequential
//! loops rather than by precedence:
//!
//! ```text
//! expr    := unary ( "||" unary )* ( "&&" unary )* ( ("==" | "!=") unary )*
//! unary   := primary | "!" unary
//! primary := "true" | "false" | IDENT | "(" expr ")"
//! ```
//!
//! so `true || false && false` is `(true || false) && false`, and in
//! `a && b || c` the trailing `|| c` is never consumed, which makes the
//! whole expression invalid.

use crate::char_codes::{is_identifier_part, is_identifier_start};
use rsharp_diagnostics::{messages, Diagnostic};
use rsharp_syntax::DirectiveKind;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// A `#if`/`#elif` condition the grammar does not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid preprocessor expression at offset {offset}")]
pub struct InvalidExpression {
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprToken<'a> {
    True,
    False,
    Ident(&'a str),
    OpenParen,
    CloseParen,
    Not,
    And,
    Or,
    Equal,
    NotEqual,
    End,
    Invalid,
}

struct ExprLexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> ExprLexer<'a> {
    fn next(&mut self) -> (ExprToken<'a>, usize) {
        let rest = &self.text[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        let start = self.pos;
        let mut chars = trimmed.chars();
        let Some(first) = chars.next() else {
            return (ExprToken::End, start);
        };
        let second = chars.next();
        let (token, width) = match (first, second) {
            ('/', Some('/')) => (ExprToken::End, 0),
            ('(', _) => (ExprToken::OpenParen, 1),
            (')', _) => (ExprToken::CloseParen, 1),
            ('!', Some('=')) => (ExprToken::NotEqual, 2),
            ('!', _) => (ExprToken::Not, 1),
            ('=', Some('=')) => (ExprToken::Equal, 2),
            ('&', Some('&')) => (ExprToken::And, 2),
            ('|', Some('|')) => (ExprToken::Or, 2),
            (c, _) if is_identifier_start(c) => {
                let len = trimmed
                    .char_indices()
                    .find(|(_, c)| !is_identifier_part(*c))
                    .map_or(trimmed.len(), |(i, _)| i);
                let word = &trimmed[..len];
                let token = match word {
                    "true" => ExprToken::True,
                    "false" => ExprToken::False,
                    _ => ExprToken::Ident(word),
                };
                (token, len)
            }
            _ => (ExprToken::Invalid, 0),
        };
        if token == ExprToken::End {
            self.pos = self.text.len();
        } else {
            self.pos += width;
        }
        (token, start)
    }
}

struct ExprParser<'a, 's> {
    lexer: ExprLexer<'a>,
    la: ExprToken<'a>,
    la_pos: usize,
    symbols: &'s FxHashSet<String>,
}

impl<'a, 's> ExprParser<'a, 's> {
    fn bump(&mut self) {
        let (token, pos) = self.lexer.next();
        self.la = token;
        self.la_pos = pos;
    }

    fn fail<T>(&self) -> Result<T, InvalidExpression> {
        Err(InvalidExpression { offset: self.la_pos })
    }

    fn expr(&mut self) -> Result<bool, InvalidExpression> {
        let mut value = self.unary()?;
        while self.la == ExprToken::Or {
            self.bump();
            let rhs = self.unary()?;
            value = value || rhs;
        }
        while self.la == ExprToken::And {
            self.bump();
            let rhs = self.unary()?;
            value = value && rhs;
        }
        loop {
            match self.la {
                ExprToken::Equal => {
                    self.bump();
                    value = value == self.unary()?;
                }
                ExprToken::NotEqual => {
                    self.bump();
                    value = value != self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<bool, InvalidExpression> {
        if self.la == ExprToken::Not {
            self.bump();
            return Ok(!self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<bool, InvalidExpression> {
        let value = match self.la {
            ExprToken::True => true,
            ExprToken::False => false,
            ExprToken::Ident(name) => self.symbols.contains(name),
            ExprToken::OpenParen => {
                self.bump();
                let value = self.expr()?;
                if self.la != ExprToken::CloseParen {
                    return self.fail();
                }
                value
            }
            _ => return self.fail(),
        };
        self.bump();
        Ok(value)
    }
}

/// Evaluate a conditional-compilation expression against `symbols`.
///
/// Text the grammar does not consume (other than a trailing `//` comment)
/// makes the expression invalid.
pub fn evaluate(expression: &str, symbols: &FxHashSet<String>) -> Result<bool, InvalidExpression> {
    let mut parser = ExprParser {
        lexer: ExprLexer { text: expression, pos: 0 },
        la: ExprToken::End,
        la_pos: 0,
        symbols,
    };
    parser.bump();
    let value = parser.expr()?;
    if parser.la != ExprToken::End {
        return parser.fail();
    }
    Ok(value)
}

/// Whether tokens after a directive are scanned or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Active,
    Skipped,
}

#[derive(Debug, Clone)]
struct Conditional {
    /// The enclosing section is active.
    parent_active: bool,
    /// Some branch of this `#if` group was already taken.
    taken: bool,
    /// The current branch is active.
    active: bool,
    seen_else: bool,
}

/// Per-file preprocessor state: the symbol set and the open `#if` and
/// `#region` groups.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    symbols: FxHashSet<String>,
    conditionals: Vec<Conditional>,
    regions: usize,
}

impl Preprocessor {
    pub fn new<I, S>(defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: defines.into_iter().map(Into::into).collect(),
            conditionals: Vec::new(),
            regions: 0,
        }
    }

    pub fn is_defined(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn symbols(&self) -> &FxHashSet<String> {
        &self.symbols
    }

    pub fn state(&self) -> SectionState {
        match self.conditionals.last() {
            Some(c) if !(c.parent_active && c.active) => SectionState::Skipped,
            _ => SectionState::Active,
        }
    }

    /// Process one directive line. `argument` is the text after the
    /// directive name; `seen_token` tells whether the file already produced
    /// a token. Problems are returned without a location.
    pub fn process(
        &mut self,
        kind: DirectiveKind,
        argument: &str,
        seen_token: bool,
    ) -> (SectionState, Vec<Diagnostic>) {
        let mut problems = Vec::new();
        let active = self.state() == SectionState::Active;
        match kind {
            DirectiveKind::If => {
                let value = active && self.condition(argument, &mut problems);
                self.conditionals.push(Conditional {
                    parent_active: active,
                    taken: value,
                    active: value,
                    seen_else: false,
                });
            }
            DirectiveKind::Elif => match self.conditionals.pop() {
                Some(mut group) if !group.seen_else => {
                    // Checked even after a taken branch so malformed
                    // expressions are still reported.
                    let condition = group.parent_active && self.condition(argument, &mut problems);
                    let value = !group.taken && condition;
                    group.active = value;
                    group.taken |= value;
                    self.conditionals.push(group);
                }
                Some(group) => {
                    self.conditionals.push(group);
                    problems.push(Diagnostic::new(&messages::UNEXPECTED_PREPROCESSOR_DIRECTIVE, &[]));
                }
                None => problems.push(Diagnostic::new(&messages::UNEXPECTED_PREPROCESSOR_DIRECTIVE, &[])),
            },
            DirectiveKind::Else => {
                match self.conditionals.last_mut() {
                    Some(group) if !group.seen_else => {
                        group.seen_else = true;
                        group.active = !group.taken;
                        group.taken = true;
                    }
                    _ => problems.push(Diagnostic::new(&messages::UNEXPECTED_PREPROCESSOR_DIRECTIVE, &[])),
                }
                Self::check_end_of_line(argument, &mut problems);
            }
            DirectiveKind::Endif => {
                if self.conditionals.pop().is_none() {
                    problems.push(Diagnostic::new(&messages::UNEXPECTED_PREPROCESSOR_DIRECTIVE, &[]));
                }
                Self::check_end_of_line(argument, &mut problems);
            }
            _ if !active => {}
            DirectiveKind::Define | DirectiveKind::Undef => {
                if seen_token {
                    problems.push(Diagnostic::new(&messages::CANNOT_DEFINE_AFTER_FIRST_TOKEN, &[]));
                } else {
                    match symbol_name(argument) {
                        Some(name) if kind == DirectiveKind::Define => {
                            self.symbols.insert(name.to_string());
                        }
                        Some(name) => {
                            self.symbols.remove(name);
                        }
                        None => problems.push(Diagnostic::new(&messages::IDENTIFIER_EXPECTED, &[])),
                    }
                }
            }
            DirectiveKind::Region => self.regions += 1,
            DirectiveKind::EndRegion => {
                if self.regions == 0 {
                    problems.push(Diagnostic::new(&messages::UNEXPECTED_PREPROCESSOR_DIRECTIVE, &[]));
                } else {
                    self.regions -= 1;
                }
            }
            DirectiveKind::Error => problems.push(Diagnostic::new(&messages::ERROR_DIRECTIVE, &[argument])),
            DirectiveKind::Warning => problems.push(Diagnostic::new(&messages::WARNING_DIRECTIVE, &[argument])),
            DirectiveKind::Line | DirectiveKind::Pragma => {}
            DirectiveKind::Unknown => problems.push(Diagnostic::new(&messages::PREPROCESSOR_DIRECTIVE_EXPECTED, &[])),
        }
        (self.state(), problems)
    }

    /// Problems left open at end of file.
    pub fn finish(&mut self) -> Vec<Diagnostic> {
        let mut problems = Vec::new();
        if !self.conditionals.is_empty() {
            problems.push(Diagnostic::new(&messages::ENDIF_DIRECTIVE_EXPECTED, &[]));
            self.conditionals.clear();
        }
        if self.regions > 0 {
            problems.push(Diagnostic::new(&messages::ENDREGION_DIRECTIVE_EXPECTED, &[]));
            self.regions = 0;
        }
        problems
    }

    fn condition(&self, argument: &str, problems: &mut Vec<Diagnostic>) -> bool {
        match evaluate(argument, &self.symbols) {
            Ok(value) => value,
            Err(err) => {
                tracing::trace!(expression = argument, offset = err.offset, "invalid #if expression");
                problems.push(Diagnostic::new(&messages::INVALID_PREPROCESSOR_EXPRESSION, &[]));
                false
            }
        }
    }

    fn check_end_of_line(argument: &str, problems: &mut Vec<Diagnostic>) {
        let rest = argument.trim();
        if !rest.is_empty() && !rest.starts_with("//") {
            problems.push(Diagnostic::new(&messages::END_OF_LINE_EXPECTED, &[]));
        }
    }
}

/// The identifier argument of `#define`/`#undef`.
fn symbol_name(argument: &str) -> Option<&str> {
    let argument = argument.trim();
    let argument = argument.split("//").next().unwrap_or("").trim_end();
    let mut chars = argument.chars();
    let valid = chars.next().is_some_and(is_identifier_start)
        && chars.all(is_identifier_part)
        && argument != "true"
        && argument != "false";
    valid.then_some(argument)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(names: &[&str]) -> FxHashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn codes(problems: &[Diagnostic]) -> Vec<u32> {
        problems.iter().map(|d| d.code).collect()
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    #[test]
    fn test_literals_and_symbols() {
        let defined = symbols(&["DEBUG"]);
        assert_eq!(evaluate("true", &defined), Ok(true));
        assert_eq!(evaluate("DEBUG", &defined), Ok(true));
        assert_eq!(evaluate("!DEBUG", &defined), Ok(false));
        assert_eq!(evaluate("RELEASE", &defined), Ok(false));
        assert_eq!(evaluate("(DEBUG)", &defined), Ok(true));
        assert_eq!(evaluate("DEBUG // trailing comment", &defined), Ok(true));
    }

    #[test]
    fn test_sequential_loop_grouping() {
        let none = symbols(&[]);
        // (true || false) && false, not true || (false && false).
        assert_eq!(evaluate("true || false && false", &none), Ok(false));
        assert_eq!(evaluate("true || false && true", &none), Ok(true));
        // `==` is applied last: (true && false) == false.
        assert_eq!(evaluate("true && false == false", &none), Ok(true));
        assert_eq!(evaluate("false != true", &none), Ok(true));
    }

    #[test]
    fn test_or_after_and_is_not_consumed() {
        let defined = symbols(&["A", "B", "C"]);
        assert!(evaluate("A && B || C", &defined).is_err());
        // Parentheses restore the intended grouping.
        assert_eq!(evaluate("(A && B) || C", &defined), Ok(true));
    }

    #[test]
    fn test_invalid_expressions() {
        let none = symbols(&[]);
        assert!(evaluate("", &none).is_err());
        assert!(evaluate("(A", &none).is_err());
        assert!(evaluate("A B", &none).is_err());
        assert!(evaluate("A & B", &none).is_err());
        assert_eq!(evaluate("1", &none), Err(InvalidExpression { offset: 0 }));
    }

    // ========================================================================
    // Directives
    // ========================================================================

    #[test]
    fn test_if_elif_else_chain() {
        let mut pp = Preprocessor::new(["B"]);
        assert_eq!(pp.process(DirectiveKind::If, "A", false).0, SectionState::Skipped);
        assert_eq!(pp.process(DirectiveKind::Elif, "B", false).0, SectionState::Active);
        assert_eq!(pp.process(DirectiveKind::Elif, "true", false).0, SectionState::Skipped);
        assert_eq!(pp.process(DirectiveKind::Else, "", false).0, SectionState::Skipped);
        assert_eq!(pp.process(DirectiveKind::Endif, "", false).0, SectionState::Active);
        assert!(pp.finish().is_empty());
    }

    #[test]
    fn test_elif_after_taken_branch_is_still_checked() {
        let mut pp = Preprocessor::new(Vec::<String>::new());
        pp.process(DirectiveKind::If, "true", false);
        let (state, problems) = pp.process(DirectiveKind::Elif, "(", false);
        assert_eq!(state, SectionState::Skipped);
        assert_eq!(codes(&problems), vec![1517]);
        let (state, problems) = pp.process(DirectiveKind::Elif, "true", false);
        assert_eq!(state, SectionState::Skipped);
        assert!(problems.is_empty());
        pp.process(DirectiveKind::Endif, "", false);

        pp.process(DirectiveKind::If, "false", false);
        pp.process(DirectiveKind::If, "true", false);
        assert!(pp.process(DirectiveKind::Elif, "(", false).1.is_empty());
    }

    #[test]
    fn test_nested_groups_inside_skipped_section_stay_skipped() {
        let mut pp = Preprocessor::new(Vec::<String>::new());
        pp.process(DirectiveKind::If, "false", false);
        assert_eq!(pp.process(DirectiveKind::If, "true", false).0, SectionState::Skipped);
        assert_eq!(pp.process(DirectiveKind::Else, "", false).0, SectionState::Skipped);
        assert_eq!(pp.process(DirectiveKind::Endif, "", false).0, SectionState::Skipped);
        assert_eq!(pp.process(DirectiveKind::Else, "", false).0, SectionState::Active);
        pp.process(DirectiveKind::Endif, "", false);
        assert_eq!(pp.state(), SectionState::Active);
    }

    #[test]
    fn test_define_and_undef() {
        let mut pp = Preprocessor::new(["X"]);
        let (_, problems) = pp.process(DirectiveKind::Define, "Y // comment", false);
        assert!(problems.is_empty());
        pp.process(DirectiveKind::Undef, "X", false);
        assert!(pp.is_defined("Y"));
        assert!(!pp.is_defined("X"));

        let (_, problems) = pp.process(DirectiveKind::Define, "Z", true);
        assert_eq!(codes(&problems), vec![1032]);
        let (_, problems) = pp.process(DirectiveKind::Define, "true", false);
        assert_eq!(codes(&problems), vec![1001]);
    }

    #[test]
    fn test_unbalanced_directives() {
        let mut pp = Preprocessor::new(Vec::<String>::new());
        assert_eq!(codes(&pp.process(DirectiveKind::Endif, "", false).1), vec![1028]);
        assert_eq!(codes(&pp.process(DirectiveKind::Else, "", false).1), vec![1028]);
        assert_eq!(codes(&pp.process(DirectiveKind::EndRegion, "", false).1), vec![1028]);

        pp.process(DirectiveKind::Region, "R", false);
        pp.process(DirectiveKind::If, "true", false);
        pp.process(DirectiveKind::Else, "", false);
        assert_eq!(codes(&pp.process(DirectiveKind::Elif, "true", false).1), vec![1028]);
        assert_eq!(codes(&pp.finish()), vec![1027, 1038]);
    }

    #[test]
    fn test_messages_and_invalid_conditions() {
        let mut pp = Preprocessor::new(Vec::<String>::new());
        let (_, problems) = pp.process(DirectiveKind::Warning, "careful", false);
        assert_eq!(problems[0].message_text, "#warning: 'careful'");
        assert!(!problems[0].is_error());

        let (state, problems) = pp.process(DirectiveKind::If, "A && B || C", false);
        assert_eq!(state, SectionState::Skipped);
        assert_eq!(codes(&problems), vec![1517]);
        let (_, problems) = pp.process(DirectiveKind::Endif, "junk", false);
        assert_eq!(codes(&problems), vec![1025]);
        assert_eq!(codes(&pp.process(DirectiveKind::Unknown, "", false).1), vec![1024]);
    }

    #[test]
    fn test_directives_in_skipped_sections_are_ignored() {
        let mut pp = Preprocessor::new(Vec::<String>::new());
        pp.process(DirectiveKind::If, "false", false);
        assert!(pp.process(DirectiveKind::Error, "not reported", false).1.is_empty());
        assert!(pp.process(DirectiveKind::Define, "X", true).1.is_empty());
        pp.process(DirectiveKind::Endif, "", false);
        assert!(!pp.is_defined("X"));
    }
}
