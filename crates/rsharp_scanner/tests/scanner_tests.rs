//! Scanner integration tests.
//!
//! Verifies that the scanner correctly tokenizes C# constructs, reports
//! lexical diagnostics and applies conditional compilation.

use rsharp_scanner::{Buffer, ScanError, Scanner, TokenStream};
use rsharp_syntax::{CommentKind, DirectiveKind, Token, TokenKind};
use std::io::Cursor;

/// Helper: scan all tokens (without the end-of-file token).
fn scan_tokens(scanner: &mut Scanner) -> Vec<Token> {
    let mut tokens = Vec::new();
    loop {
        let token = scanner.scan();
        if token.kind == TokenKind::EndOfFile {
            break;
        }
        tokens.push(token);
    }
    tokens
}

/// Helper: scan all tokens from source and return them as (kind, text) pairs.
fn scan_all(source: &str) -> Vec<(TokenKind, String)> {
    let mut scanner = Scanner::from_text("test.cs", source);
    scan_tokens(&mut scanner).into_iter().map(|t| (t.kind, t.text)).collect()
}

/// Helper: scan all token kinds.
fn scan_kinds(source: &str) -> Vec<TokenKind> {
    scan_all(source).into_iter().map(|(k, _)| k).collect()
}

/// Helper: scan with predefined symbols and return the scanner for
/// inspecting diagnostics and trivia.
fn scan_with_defines(source: &str, defines: &[&str]) -> (Vec<Token>, Scanner) {
    let buffer = Buffer::from_bytes(source.as_bytes().to_vec());
    let mut scanner = Scanner::new("test.cs", buffer, defines.iter().copied()).unwrap();
    let tokens = scan_tokens(&mut scanner);
    (tokens, scanner)
}

/// Helper: diagnostic codes reported while scanning `source`.
fn diagnostic_codes(source: &str) -> Vec<u32> {
    let (_, scanner) = scan_with_defines(source, &[]);
    scanner.diagnostics().diagnostics().iter().map(|d| d.code).collect()
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_empty_source() {
    assert!(scan_all("").is_empty());
}

#[test]
fn test_whitespace_only() {
    assert!(scan_all("   \n\t  \u{00A0}\r\n").is_empty());
}

#[test]
fn test_keywords_and_identifiers() {
    assert_eq!(
        scan_kinds("class Foo : Bar where partial"),
        vec![
            TokenKind::ClassKeyword,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn test_verbatim_identifier_is_never_a_keyword() {
    let mut scanner = Scanner::from_text("test.cs", "@class @where");
    let tokens = scan_tokens(&mut scanner);
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].text, "@class");
    assert_eq!(tokens[0].value(), "class");
    assert!(!tokens[1].is_contextual("where"));
}

#[test]
fn test_unicode_escape_in_identifier() {
    let mut scanner = Scanner::from_text("test.cs", r"\u0041bc x\U00000062");
    let tokens = scan_tokens(&mut scanner);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].text, r"\u0041bc");
    assert_eq!(tokens[0].value(), "Abc");
    assert_eq!(tokens[1].value(), "xb");
    assert!(scanner.diagnostics().is_empty());
}

#[test]
fn test_escaped_keyword_is_an_identifier() {
    assert_eq!(scan_kinds(r"\u0069f"), vec![TokenKind::Identifier]);
}

#[test]
fn test_unicode_identifiers() {
    assert_eq!(scan_kinds("größe ñ_1"), vec![TokenKind::Identifier, TokenKind::Identifier]);
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numeric_literals() {
    let cases = [
        ("42", TokenKind::IntegerLiteral),
        ("0xFF", TokenKind::IntegerLiteral),
        ("10UL", TokenKind::IntegerLiteral),
        ("7lu", TokenKind::IntegerLiteral),
        ("3.14", TokenKind::RealLiteral),
        ("1e10", TokenKind::RealLiteral),
        ("2.5E-3", TokenKind::RealLiteral),
        ("1.5f", TokenKind::RealLiteral),
        (".5", TokenKind::RealLiteral),
        ("2m", TokenKind::RealLiteral),
        ("3d", TokenKind::RealLiteral),
    ];
    for (text, kind) in cases {
        let tokens = scan_all(text);
        assert_eq!(tokens, vec![(kind, text.to_string())], "scanning {text}");
    }
}

#[test]
fn test_invalid_numbers() {
    assert_eq!(diagnostic_codes("0x"), vec![1013]);
    assert_eq!(diagnostic_codes("1e+"), vec![1013]);
}

#[test]
fn test_string_literals() {
    let tokens = scan_all(r#""hello \"world\"\n" 'a' '\'' 'A'"#);
    assert_eq!(
        tokens.iter().map(|t| t.0).collect::<Vec<_>>(),
        vec![
            TokenKind::StringLiteral,
            TokenKind::CharacterLiteral,
            TokenKind::CharacterLiteral,
            TokenKind::CharacterLiteral,
        ]
    );
    assert_eq!(tokens[0].1, r#""hello \"world\"\n""#);
}

#[test]
fn test_verbatim_string_spans_lines() {
    let mut scanner = Scanner::from_text("test.cs", "@\"a\n\"\"b\"\"\" x");
    let tokens = scan_tokens(&mut scanner);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].text, "@\"a\n\"\"b\"\"\"");
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn test_interpolated_strings() {
    let source = r#"$"x {a + "}"} {{y}} {b:N2}" $@"p {q}" @$"r" z"#;
    let kinds = scan_kinds(source);
    assert_eq!(
        kinds,
        vec![
            TokenKind::InterpolatedStringLiteral,
            TokenKind::InterpolatedStringLiteral,
            TokenKind::InterpolatedStringLiteral,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn test_nested_interpolation() {
    let tokens = scan_all(r#"$"a {$"b {c}"} d" e"#);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].1, r#"$"a {$"b {c}"} d""#);
}

// ============================================================================
// Lexical errors
// ============================================================================

#[test]
fn test_character_literal_errors() {
    assert_eq!(diagnostic_codes("''"), vec![1011]);
    assert_eq!(diagnostic_codes("'ab'"), vec![1012]);
    assert_eq!(diagnostic_codes("'a\n"), vec![1010]);
}

#[test]
fn test_string_literal_errors() {
    assert_eq!(diagnostic_codes("\"abc\nx"), vec![1010]);
    assert_eq!(diagnostic_codes("@\"abc"), vec![1039]);
    assert_eq!(diagnostic_codes(r#""\q""#), vec![1009]);
}

#[test]
fn test_unterminated_comment() {
    assert_eq!(diagnostic_codes("x /* never closed"), vec![1035]);
}

#[test]
fn test_invalid_character_yields_no_symbol() {
    let (tokens, scanner) = scan_with_defines("a ` b", &[]);
    assert_eq!(
        tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![TokenKind::Identifier, TokenKind::NoSymbol, TokenKind::Identifier]
    );
    assert_eq!(scanner.diagnostics().count_code(1056), 1);
}

#[test]
fn test_hash_inside_a_line_is_invalid() {
    let (tokens, scanner) = scan_with_defines("a #if", &[]);
    assert_eq!(tokens[1].kind, TokenKind::NoSymbol);
    assert_eq!(scanner.diagnostics().count_code(1056), 1);
}

#[test]
fn test_malformed_byte_order_mark_is_fatal() {
    let buffer = Buffer::from_bytes(vec![0xEF, 0xBB, 0x41]);
    let err = Scanner::new("bom.cs", buffer, Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, ScanError::MalformedByteOrderMark { .. }));
    assert!(err.to_string().contains("EF BB 41"));

    let buffer = Buffer::from_bytes(vec![0xEF, 0xBB, 0xBF, b'x']);
    let mut scanner = Scanner::new("bom.cs", buffer, Vec::<String>::new()).unwrap();
    let token = scanner.scan();
    assert_eq!(token.text, "x");
    assert_eq!(token.pos, 3);
    assert_eq!(token.column, 1);
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_line_terminators() {
    let mut scanner = Scanner::from_text("test.cs", "a\r\nb\rc\nd\u{2028}e\u{0085}f");
    let tokens = scan_tokens(&mut scanner);
    let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
    assert_eq!(lines, vec![1, 2, 3, 4, 5, 6]);
    assert!(tokens.iter().all(|t| t.column == 1));
}

#[test]
fn test_columns_count_characters_positions_count_bytes() {
    let mut scanner = Scanner::from_text("test.cs", "ä = ü;");
    let tokens = scan_tokens(&mut scanner);
    assert_eq!(tokens[1].kind, TokenKind::Equals);
    assert_eq!(tokens[1].column, 3);
    assert_eq!(tokens[1].pos, 3);
    assert_eq!(tokens[3].column, 6);
    assert_eq!(tokens[3].pos, 7);
}

#[test]
fn test_shift_operators_are_split() {
    let mut scanner = Scanner::from_text("test.cs", "a >> b > > c");
    let tokens = scan_tokens(&mut scanner);
    assert_eq!(tokens[1].kind, TokenKind::GreaterThan);
    assert_eq!(tokens[2].kind, TokenKind::GreaterThan);
    assert!(tokens[1].touches(&tokens[2]));
    assert!(!tokens[4].touches(&tokens[5]));
}

#[test]
fn test_windowed_buffer_scans_large_files() {
    let source = "ident_abc ".repeat(15_000);
    let buffer = Buffer::from_seekable(Cursor::new(source.into_bytes())).unwrap();
    assert!(!buffer.is_in_memory());
    let mut scanner = Scanner::new("big.cs", buffer, Vec::<String>::new()).unwrap();
    let tokens = scan_tokens(&mut scanner);
    assert_eq!(tokens.len(), 15_000);
    assert!(tokens.iter().all(|t| t.text == "ident_abc"));
    assert_eq!(tokens[14_999].pos, 149_990);
}

// ============================================================================
// Trivia
// ============================================================================

#[test]
fn test_comments_go_to_trivia_channel() {
    let source = "/// doc\n//// not doc\n// line\n/* block */ x";
    let mut scanner = Scanner::from_text("test.cs", source);
    let tokens = scan_tokens(&mut scanner);
    assert_eq!(tokens.len(), 1);
    let kinds: Vec<CommentKind> = scanner.comments().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CommentKind::Documentation,
            CommentKind::SingleLine,
            CommentKind::SingleLine,
            CommentKind::Delimited,
        ]
    );
    assert_eq!(scanner.comments()[0].body(), " doc");
    assert_eq!(scanner.comments()[3].line, 4);
}

// ============================================================================
// Preprocessor
// ============================================================================

#[test]
fn test_conditional_sections() {
    let source = "#if DEBUG\nclass A {}\n#else\nclass B {}\n#endif\n";
    let (tokens, _) = scan_with_defines(source, &["DEBUG"]);
    assert_eq!(tokens[1].text, "A");
    let (tokens, scanner) = scan_with_defines(source, &[]);
    assert_eq!(tokens[1].text, "B");
    assert_eq!(tokens[1].line, 4);
    assert!(scanner.diagnostics().is_empty());
}

#[test]
fn test_skipped_section_is_not_scanned() {
    let source = "#if false\n\"unterminated ` /*\n#if true\n#endif\n#endif\nx";
    let (tokens, scanner) = scan_with_defines(source, &[]);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].text, "x");
    assert!(scanner.diagnostics().is_empty());
}

#[test]
fn test_if_expression_uses_sequential_grouping() {
    let source = "#if true || false && false\nyes\n#else\nno\n#endif";
    let (tokens, _) = scan_with_defines(source, &[]);
    assert_eq!(tokens[0].text, "no");
}

#[test]
fn test_invalid_if_expression_is_reported_and_false() {
    let source = "#if A && B || C\nyes\n#endif";
    let (tokens, scanner) = scan_with_defines(source, &["A", "B", "C"]);
    assert!(tokens.is_empty());
    assert_eq!(scanner.diagnostics().count_code(1517), 1);
}

#[test]
fn test_define_before_first_token_only() {
    let (tokens, scanner) = scan_with_defines("#define X\n#if X\nx\n#endif", &[]);
    assert_eq!(tokens.len(), 1);
    assert!(scanner.diagnostics().is_empty());

    assert_eq!(diagnostic_codes("x\n#define Y\n"), vec![1032]);
}

#[test]
fn test_unbalanced_directives() {
    assert_eq!(diagnostic_codes("#if X\nx"), vec![1027]);
    assert_eq!(diagnostic_codes("#region R\nx"), vec![1038]);
    assert_eq!(diagnostic_codes("#endif\n"), vec![1028]);
    assert_eq!(diagnostic_codes("#bogus\n"), vec![1024]);
}

#[test]
fn test_error_and_warning_directives() {
    let (_, scanner) = scan_with_defines("#error stop here\n#warning careful\n", &[]);
    let diagnostics = scanner.diagnostics().diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].code, 1029);
    assert!(diagnostics[0].is_error());
    assert_eq!(diagnostics[0].message_text, "#error: 'stop here'");
    assert_eq!(diagnostics[1].code, 1030);
    assert!(!diagnostics[1].is_error());
    assert_eq!(diagnostics[1].position().map(|p| p.line), Some(2));
}

#[test]
fn test_directives_are_recorded() {
    let (_, scanner) = scan_with_defines("  #region Setup\n#pragma warning disable\n#endregion\n", &[]);
    let directives = scanner.directives();
    assert_eq!(directives.len(), 3);
    assert_eq!(directives[0].kind, DirectiveKind::Region);
    assert_eq!(directives[0].text, "Setup");
    assert_eq!(directives[1].kind, DirectiveKind::Pragma);
    assert_eq!(directives[2].line, 3);
    assert!(scanner.diagnostics().is_empty());
}

// ============================================================================
// Token stream
// ============================================================================

#[test]
fn test_token_stream_peek_past_directives() {
    let mut ts = TokenStream::new(Scanner::from_text("test.cs", "a\n#if false\nb\n#endif\nc"));
    let a = ts.scan();
    assert_eq!(ts.token(a).text, "a");
    let next = ts.peek();
    assert_eq!(ts.token(next).text, "c");
    ts.reset_peek();
    assert_eq!(ts.scan(), next);
}
