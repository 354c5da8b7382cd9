//! rsharp_scanner: Lexer for C# source code.
//!
//! Layers, bottom-up:
//! - [`Buffer`] / [`Utf8Buffer`]: seekable byte window and UTF-8 decoding
//! - [`Scanner`]: table-driven tokenizer with a comment trivia channel
//! - [`Preprocessor`]: `#define`, `#if` groups, regions and diagnostics
//! - [`TokenStream`]: scan/peek/reset-peek cursor pair for the parser

mod buffer;
mod char_codes;
mod preprocessor;
mod scanner;
mod token_stream;

pub use buffer::{Buffer, SeekRead, Utf8Buffer};
pub use char_codes::{is_identifier_part, is_identifier_start, is_newline, is_whitespace};
pub use preprocessor::{evaluate, InvalidExpression, Preprocessor, SectionState};
pub use scanner::Scanner;
pub use token_stream::{ScanOutput, TokenStream};

use thiserror::Error;

/// Errors that abort scanning a file.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("malformed byte-order mark: expected EF BB BF, found EF {}", show_byte(.second, .third))]
    MalformedByteOrderMark { second: Option<u8>, third: Option<u8> },

    #[error("could not read source: {0}")]
    Io(#[from] std::io::Error),
}

fn show_byte(second: &Option<u8>, third: &Option<u8>) -> String {
    let show = |b: &Option<u8>| b.map_or_else(|| "<eof>".to_string(), |b| format!("{b:02X}"));
    format!("{} {}", show(second), show(third))
}
