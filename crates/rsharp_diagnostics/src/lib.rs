//! rsharp_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Every stage of the pipeline reports problems as [`Diagnostic`] values
//! appended to a [`DiagnosticCollection`]; nothing is thrown. Message
//! templates live in [`messages`], keyed by their `CSxxxx` codes.

use parking_lot::Mutex;
use rsharp_core::text::{SourcePosition, TextSpan};
use std::fmt;
use std::sync::Arc;

/// Diagnostic severity. Only errors make a compilation fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message template with a code and severity.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The numeric part of the code (`246` for `CS0246`).
    pub code: u32,
    pub severity: Severity,
    /// The message template. May contain `{0}`, `{1}`, … placeholders.
    pub message: &'static str,
}

/// Where a diagnostic points: a file, a byte span, and the 1-based
/// line/column of the span start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub span: TextSpan,
    pub position: SourcePosition,
}

impl Location {
    pub fn new(file: impl Into<String>, span: TextSpan, position: SourcePosition) -> Self {
        Self {
            file: file.into(),
            span,
            position,
        }
    }
}

/// A realized diagnostic. Immutable once created.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: u32,
    pub severity: Severity,
    pub message_text: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a diagnostic without location info (global diagnostic).
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            code: message.code,
            severity: message.severity,
            message_text: format_message(message.message, args),
            location: None,
        }
    }

    /// Create a diagnostic at a source location.
    pub fn at(location: Location, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            location: Some(location),
            ..Self::new(message, args)
        }
    }

    /// The printable code, e.g. `CS0246`.
    pub fn code_string(&self) -> String {
        format!("CS{:04}", self.code)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn file(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.file.as_str())
    }

    pub fn position(&self) -> Option<SourcePosition> {
        self.location.as_ref().map(|l| l.position)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "{}({}): ", loc.file, loc.position)?;
        }
        write!(
            f,
            "{} {}: {}",
            self.severity,
            self.code_string(),
            self.message_text
        )
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// An append-only list of diagnostics accumulated during compilation.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// Number of diagnostics carrying `code`.
    pub fn count_code(&self, code: u32) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Promote every warning to an error (`warningsAsErrors`).
    pub fn promote_warnings(&mut self) {
        for diag in &mut self.diagnostics {
            diag.severity = Severity::Error;
        }
    }

    /// Sort diagnostics by file and position. The sort is stable, so
    /// diagnostics at the same position keep their emission order.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let a_key = a.location.as_ref().map(|l| (l.file.as_str(), l.span.start));
            let b_key = b.location.as_ref().map(|l| (l.file.as_str(), l.span.start));
            a_key.cmp(&b_key)
        });
    }
}

/// A collector shared between threads parsing independent files.
///
/// Appends are serialized by one mutex; diagnostic order across threads is
/// not significant until [`DiagnosticCollection::sort`] runs.
#[derive(Debug, Clone, Default)]
pub struct SharedDiagnostics {
    inner: Arc<Mutex<DiagnosticCollection>>,
}

impl SharedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, diagnostic: Diagnostic) {
        self.inner.lock().add(diagnostic);
    }

    pub fn extend(&self, diagnostics: DiagnosticCollection) {
        self.inner.lock().extend(diagnostics);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Take everything collected so far, leaving the collector empty.
    pub fn take(&self) -> DiagnosticCollection {
        std::mem::take(&mut *self.inner.lock())
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, severity: Severity::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, severity: Severity::Warning, message: $msg }
        };
    }

    // ========================================================================
    // Source input and lexical errors
    // ========================================================================
    pub const SOURCE_FILE_COULD_NOT_BE_READ: DiagnosticMessage = diag!(2001, Error, "Source file '{0}' could not be read: {1}");
    pub const UNEXPECTED_CHARACTER: DiagnosticMessage = diag!(1056, Error, "Unexpected character '{0}'");
    pub const NEWLINE_IN_CONSTANT: DiagnosticMessage = diag!(1010, Error, "Newline in constant");
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = diag!(1039, Error, "Unterminated string literal");
    pub const END_OF_FILE_IN_COMMENT: DiagnosticMessage = diag!(1035, Error, "End-of-file found, '*/' expected");
    pub const UNRECOGNIZED_ESCAPE_SEQUENCE: DiagnosticMessage = diag!(1009, Error, "Unrecognized escape sequence");
    pub const EMPTY_CHARACTER_LITERAL: DiagnosticMessage = diag!(1011, Error, "Empty character literal");
    pub const TOO_MANY_CHARACTERS_IN_CHARACTER_LITERAL: DiagnosticMessage = diag!(1012, Error, "Too many characters in character literal");
    pub const INVALID_NUMBER: DiagnosticMessage = diag!(1013, Error, "Invalid number");

    // ========================================================================
    // Preprocessor
    // ========================================================================
    pub const INVALID_PREPROCESSOR_EXPRESSION: DiagnosticMessage = diag!(1517, Error, "Invalid preprocessor expression");
    pub const ENDIF_DIRECTIVE_EXPECTED: DiagnosticMessage = diag!(1027, Error, "#endif directive expected");
    pub const UNEXPECTED_PREPROCESSOR_DIRECTIVE: DiagnosticMessage = diag!(1028, Error, "Unexpected preprocessor directive");
    pub const ENDREGION_DIRECTIVE_EXPECTED: DiagnosticMessage = diag!(1038, Error, "#endregion directive expected");
    pub const ERROR_DIRECTIVE: DiagnosticMessage = diag!(1029, Error, "#error: '{0}'");
    pub const WARNING_DIRECTIVE: DiagnosticMessage = diag!(1030, Warning, "#warning: '{0}'");
    pub const PREPROCESSOR_DIRECTIVE_EXPECTED: DiagnosticMessage = diag!(1024, Error, "Preprocessor directive expected");
    pub const CANNOT_DEFINE_AFTER_FIRST_TOKEN: DiagnosticMessage = diag!(1032, Error, "Cannot define/undefine preprocessor symbols after first token in file");
    pub const END_OF_LINE_EXPECTED: DiagnosticMessage = diag!(1025, Error, "Single-line comment or end-of-line expected");

    // ========================================================================
    // Syntax errors
    // ========================================================================
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(1001, Error, "Identifier expected");
    pub const SEMICOLON_EXPECTED: DiagnosticMessage = diag!(1002, Error, "; expected");
    pub const SYNTAX_ERROR_0_EXPECTED: DiagnosticMessage = diag!(1003, Error, "Syntax error, '{0}' expected");
    pub const CLOSE_PAREN_EXPECTED: DiagnosticMessage = diag!(1026, Error, ") expected");
    pub const CLOSE_BRACE_EXPECTED: DiagnosticMessage = diag!(1513, Error, "} expected");
    pub const OPEN_BRACE_EXPECTED: DiagnosticMessage = diag!(1514, Error, "{ expected");
    pub const INVALID_EXPRESSION_TERM: DiagnosticMessage = diag!(1525, Error, "Invalid expression term '{0}'");
    pub const INVALID_TOKEN_IN_MEMBER_DECLARATION: DiagnosticMessage = diag!(1519, Error, "Invalid token '{0}' in class, struct, or interface member declaration");
    pub const TYPE_EXPECTED: DiagnosticMessage = diag!(1031, Error, "Type expected");
    pub const NAMESPACE_MEMBER_EXPECTED: DiagnosticMessage = diag!(1022, Error, "Type or namespace definition, or end-of-file expected");
    pub const EMBEDDED_STATEMENT_CANNOT_BE_DECLARATION: DiagnosticMessage = diag!(1023, Error, "Embedded statement cannot be a declaration or labeled statement");
    pub const USING_MUST_PRECEDE_OTHER_ELEMENTS: DiagnosticMessage = diag!(1529, Error, "A using clause must precede all other elements defined in the namespace except extern alias declarations");
    pub const IDENTIFIER_EXPECTED_0_IS_KEYWORD: DiagnosticMessage = diag!(1041, Error, "Identifier expected; '{0}' is a keyword");
    pub const ACCESSOR_EXPECTED: DiagnosticMessage = diag!(1014, Error, "A get or set accessor expected");
    pub const EVENT_ACCESSOR_EXPECTED: DiagnosticMessage = diag!(1055, Error, "An add or remove accessor expected");
    pub const OVERLOADABLE_OPERATOR_EXPECTED: DiagnosticMessage = diag!(1037, Error, "Overloadable operator expected");
    pub const QUERY_BODY_MUST_END_WITH_SELECT_OR_GROUP: DiagnosticMessage = diag!(742, Error, "A query body must end with a select clause or a group clause");
    pub const EXPRESSION_TOO_COMPLEX: DiagnosticMessage = diag!(8078, Error, "An expression is too long or complex to compile");

    // ========================================================================
    // Declaration errors
    // ========================================================================
    pub const NAMESPACE_ALREADY_CONTAINS_DEFINITION: DiagnosticMessage = diag!(101, Error, "The namespace '{0}' already contains a definition for '{1}'");
    pub const TYPE_ALREADY_CONTAINS_DEFINITION: DiagnosticMessage = diag!(102, Error, "The type '{0}' already contains a definition for '{1}'");
    pub const MISSING_PARTIAL_MODIFIER: DiagnosticMessage = diag!(260, Error, "Missing partial modifier on declaration of type '{0}'; another partial declaration of this type exists");
    pub const PARTIAL_DECLARATIONS_DIFFERENT_KINDS: DiagnosticMessage = diag!(261, Error, "Partial declarations of '{0}' must be all classes, all structs, or all interfaces");
    pub const PARTIAL_DECLARATIONS_CONFLICTING_ACCESSIBILITY: DiagnosticMessage = diag!(262, Error, "Partial declarations of '{0}' have conflicting accessibility modifiers");
    pub const PARTIAL_DECLARATIONS_DIFFERENT_BASE_CLASSES: DiagnosticMessage = diag!(263, Error, "Partial declarations of '{0}' must not specify different base classes");
    pub const MEMBER_NAME_SAME_AS_ENCLOSING_TYPE: DiagnosticMessage = diag!(542, Error, "'{0}': member names cannot be the same as their enclosing type");
    pub const MEMBER_WITH_SAME_PARAMETER_TYPES: DiagnosticMessage = diag!(111, Error, "Type '{0}' already defines a member called '{1}' with the same parameter types");
    pub const PARTIAL_METHOD_OUT_PARAMETER: DiagnosticMessage = diag!(752, Error, "A partial method cannot have out parameters");
    pub const PARTIAL_METHOD_MUST_RETURN_VOID: DiagnosticMessage = diag!(766, Error, "Partial methods must have a void return type");
    pub const PARTIAL_METHOD_MULTIPLE_DEFINING: DiagnosticMessage = diag!(756, Error, "A partial method may not have multiple defining declarations");
    pub const PARTIAL_METHOD_MULTIPLE_IMPLEMENTING: DiagnosticMessage = diag!(757, Error, "A partial method may not have multiple implementing declarations");
    pub const DUPLICATE_MODIFIER: DiagnosticMessage = diag!(1004, Error, "Duplicate '{0}' modifier");
    pub const MORE_THAN_ONE_PROTECTION_MODIFIER: DiagnosticMessage = diag!(107, Error, "More than one protection modifier");
    pub const MODIFIER_NOT_VALID_FOR_ITEM: DiagnosticMessage = diag!(106, Error, "The modifier '{0}' is not valid for this item");
    pub const ABSTRACT_CLASS_SEALED_OR_STATIC: DiagnosticMessage = diag!(418, Error, "'{0}': an abstract class cannot be sealed or static");
    pub const STATIC_CLASS_SEALED: DiagnosticMessage = diag!(441, Error, "'{0}': a class cannot be both static and sealed");
    pub const ABSTRACT_MEMBER_WITH_BODY: DiagnosticMessage = diag!(500, Error, "'{0}' cannot declare a body because it is marked abstract");
    pub const MEMBER_MUST_DECLARE_BODY: DiagnosticMessage = diag!(501, Error, "'{0}' must declare a body because it is not marked abstract, extern, or partial");
    pub const ABSTRACT_MEMBER_IN_NON_ABSTRACT_CLASS: DiagnosticMessage = diag!(513, Error, "'{0}' is abstract but it is contained in non-abstract class '{1}'");
    pub const ABSTRACT_MEMBER_MARKED_VIRTUAL: DiagnosticMessage = diag!(503, Error, "The abstract method '{0}' cannot be marked virtual");

    // ========================================================================
    // Resolution errors
    // ========================================================================
    pub const TYPE_OR_NAMESPACE_NOT_FOUND: DiagnosticMessage = diag!(246, Error, "The type or namespace name '{0}' could not be found (are you missing a using directive or an assembly reference?)");
    pub const NAME_DOES_NOT_EXIST_IN_NAMESPACE: DiagnosticMessage = diag!(234, Error, "The type or namespace name '{0}' does not exist in the namespace '{1}' (are you missing an assembly reference?)");
    pub const NAME_DOES_NOT_EXIST_IN_TYPE: DiagnosticMessage = diag!(426, Error, "The type name '{0}' does not exist in the type '{1}'");
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: DiagnosticMessage = diag!(305, Error, "Using the generic type '{0}' requires {1} type arguments");
    pub const TYPE_PARAMETER_WITH_TYPE_ARGUMENTS: DiagnosticMessage = diag!(307, Error, "The type parameter '{0}' cannot be used with type arguments");
    pub const AMBIGUOUS_REFERENCE: DiagnosticMessage = diag!(104, Error, "'{0}' is an ambiguous reference between '{1}' and '{2}'");
    pub const ALIAS_NOT_FOUND: DiagnosticMessage = diag!(432, Error, "Alias '{0}' not found");
    pub const ALIAS_CONFLICTS_WITH_DECLARATION: DiagnosticMessage = diag!(576, Error, "Namespace '{0}' contains a definition conflicting with alias '{1}'");
    pub const DUPLICATE_USING_DIRECTIVE: DiagnosticMessage = diag!(105, Warning, "The using directive for '{0}' appeared previously in this namespace");
    pub const USING_NAMESPACE_IS_A_TYPE: DiagnosticMessage = diag!(138, Error, "A using namespace directive can only be applied to namespaces; '{0}' is a type not a namespace");
    pub const NAMESPACE_USED_AS_TYPE: DiagnosticMessage = diag!(118, Error, "'{0}' is a namespace but is used like a type");
    pub const DUPLICATE_USING_ALIAS: DiagnosticMessage = diag!(1537, Error, "The using alias '{0}' appeared previously in this namespace");
    pub const CIRCULAR_BASE_CLASS: DiagnosticMessage = diag!(146, Error, "Circular base class dependency involving '{0}' and '{1}'");
    pub const NOT_AN_INTERFACE_IN_INTERFACE_LIST: DiagnosticMessage = diag!(527, Error, "Type '{0}' in interface list is not an interface");
    pub const CANNOT_DERIVE_FROM_SEALED_TYPE: DiagnosticMessage = diag!(509, Error, "'{0}': cannot derive from sealed type '{1}'");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(file: &str, start: u32) -> Location {
        Location::new(file, TextSpan::new(start, 1), SourcePosition::new(1, start + 1))
    }

    #[test]
    fn test_format_message() {
        let msg = format_message("'{0}' is an ambiguous reference between '{1}' and '{2}'", &["A", "N.A", "M.A"]);
        assert_eq!(msg, "'A' is an ambiguous reference between 'N.A' and 'M.A'");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::at(
            location("Program.cs", 4),
            &messages::TYPE_OR_NAMESPACE_NOT_FOUND,
            &["Foo"],
        );
        let display = diag.to_string();
        assert!(display.starts_with("Program.cs(1,5): error CS0246:"));
        assert!(display.contains("'Foo'"));
    }

    #[test]
    fn test_code_string_is_zero_padded() {
        let diag = Diagnostic::new(&messages::NAMESPACE_ALREADY_CONTAINS_DEFINITION, &["N", "A"]);
        assert_eq!(diag.code_string(), "CS0101");
        assert!(diag.location.is_none());
    }

    #[test]
    fn test_collection_counts() {
        let mut collection = DiagnosticCollection::new();
        collection.add(Diagnostic::new(&messages::WARNING_DIRECTIVE, &["careful"]));
        assert!(!collection.has_errors());
        collection.add(Diagnostic::new(&messages::SEMICOLON_EXPECTED, &[]));
        assert_eq!(collection.error_count(), 1);
        assert_eq!(collection.warning_count(), 1);
        assert_eq!(collection.count_code(1002), 1);
    }

    #[test]
    fn test_collection_sort_is_stable() {
        let mut collection = DiagnosticCollection::new();
        collection.add(Diagnostic::at(location("b.cs", 3), &messages::SEMICOLON_EXPECTED, &[]));
        collection.add(Diagnostic::at(location("a.cs", 9), &messages::IDENTIFIER_EXPECTED, &[]));
        collection.add(Diagnostic::at(location("a.cs", 9), &messages::TYPE_EXPECTED, &[]));
        collection.sort();
        let codes: Vec<_> = collection.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![1001, 1031, 1002]);
    }

    #[test]
    fn test_promote_warnings() {
        let mut collection = DiagnosticCollection::new();
        collection.add(Diagnostic::new(&messages::DUPLICATE_USING_DIRECTIVE, &["System"]));
        collection.promote_warnings();
        assert!(collection.has_errors());
    }

    #[test]
    fn test_shared_diagnostics_across_threads() {
        let shared = SharedDiagnostics::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.add(Diagnostic::new(&messages::SEMICOLON_EXPECTED, &[]));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.len(), 4);
        assert_eq!(shared.take().len(), 4);
        assert!(shared.is_empty());
    }
}
