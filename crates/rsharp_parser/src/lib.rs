//! rsharp_parser: Recursive-descent parser for C#.
//!
//! Turns the scanner's token stream into a [`SyntaxTree`](rsharp_syntax::SyntaxTree).
//! One method per grammar production, lookahead sets in [`sets`], and a
//! scan-ahead cursor for the handful of ambiguous spots. Syntax errors are
//! recovered from and collected; parsing only fails when the source cannot
//! be read.

mod parser;
mod precedence;
pub mod sets;

pub use parser::{parse_buffer, parse_text, ParseResult, Parser, MAX_RECURSION_DEPTH};
pub use precedence::{binary_operator_from_token, get_binary_operator_precedence, OperatorPrecedence};
pub use sets::TokenSet;
