//! Error types for the LaTeX math pipeline.
//!
//! Each pipeline stage (tokenize, parse, evaluate, symbolic rewrite) has its
//! own error enum so errors are produced by the deepest component that
//! detects them and surface unmodified to the caller. [`MathError`] is the
//! umbrella the library facade exposes.
//!
//! Every error can report a byte position when one is available, and the
//! common mistakes carry a concrete fix suggestion drawn from a fixed
//! lookup. [`MathError::diagnostic`] enriches an error with a source snippet
//! and caret marker for display.

use serde::Serialize;
use thiserror::Error;

pub mod snippet;
pub mod suggest;

pub use snippet::source_snippet;
pub use suggest::did_you_mean;

/// Result alias used by the facade.
pub type MathResult<T> = Result<T, MathError>;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    Tokenizer,
    Parser,
    Evaluator,
    Symbolic,
    Validation,
}

/// Errors produced while scanning LaTeX source into tokens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizeError {
    /// Backslash command not present in the command table or extensions
    #[error("Unknown command '\\{name}' at position {position}")]
    UnknownCommand { name: String, position: usize, suggestion: Option<String> },

    /// A character with no meaning in LaTeX math mode
    #[error("Unexpected character '{ch}' at position {position}")]
    StrayCharacter { ch: char, position: usize },

    /// Input ended in the middle of a backslash command
    #[error("Input ends in an incomplete command at position {position}")]
    TruncatedCommand { position: usize },

    /// `\begin` or `\end` without a braced environment name
    #[error("Malformed environment declaration at position {position}")]
    MalformedEnvironment { position: usize },

    /// A known function name written without its backslash, which
    /// otherwise parses as multiplied single-letter variables
    #[error("Function name '{name}' is missing its backslash at position {position}")]
    MissingBackslash { name: String, position: usize },
}

impl TokenizeError {
    pub fn position(&self) -> usize {
        match self {
            TokenizeError::UnknownCommand { position, .. }
            | TokenizeError::StrayCharacter { position, .. }
            | TokenizeError::TruncatedCommand { position }
            | TokenizeError::MalformedEnvironment { position }
            | TokenizeError::MissingBackslash { position, .. } => *position,
        }
    }

    /// Fix suggestion for the common cases.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            TokenizeError::UnknownCommand { name, suggestion, .. } => suggestion
                .clone()
                .map(|s| format!("did you mean '\\{s}'?"))
                .or_else(|| Some(format!("remove '\\{name}' or register it as an extension"))),
            TokenizeError::StrayCharacter { ch, .. } => match ch {
                '!' => Some("factorials are written as \\factorial{n}".to_string()),
                ';' | ':' => Some("separate a domain condition with ',' instead".to_string()),
                _ => None,
            },
            TokenizeError::TruncatedCommand { .. } => {
                Some("complete the command after the backslash, e.g. \\sin".to_string())
            }
            TokenizeError::MalformedEnvironment { .. } => {
                Some("write the environment name in braces, e.g. \\begin{matrix}".to_string())
            }
            TokenizeError::MissingBackslash { name, .. } => {
                Some(format!("write \\{name}{{...}}"))
            }
        }
    }
}

/// Errors produced while building the expression tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {position}")]
    UnexpectedToken { expected: String, found: String, position: usize },

    #[error("Unexpected end of input")]
    UnexpectedEnd { position: usize },

    #[error("Invalid syntax at position {position}: {message}")]
    Syntax { message: String, position: usize },

    /// `\frac`, `\binom`, `\sqrt` and friends need braced arguments
    #[error("'\\{command}' requires braced arguments at position {position}")]
    MissingBraceArgument { command: String, position: usize },

    /// `\begin{a} ... \end{b}`
    #[error("Environment mismatch: '\\begin{{{begin}}}' closed by '\\end{{{end}}}' at position {position}")]
    EnvironmentMismatch { begin: String, end: String, position: usize },

    #[error("Unsupported environment '{name}' at position {position}")]
    UnsupportedEnvironment { name: String, position: usize },

    /// A definite or indefinite integral whose integrand never ends in `dx`
    #[error("Integral without a differential at position {position}")]
    MissingDifferential { position: usize },

    #[error("Maximum expression depth exceeded ({max})")]
    RecursionLimit { max: usize },

    #[error("Expression too large: more than {max} nodes")]
    NodeBudget { max: usize },
}

impl ParseError {
    /// Constructor helper for the common unexpected-token case.
    pub fn unexpected(
        expected: impl Into<String>,
        found: impl Into<String>,
        position: usize,
    ) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            position,
        }
    }

    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        ParseError::Syntax { message: message.into(), position }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEnd { position }
            | ParseError::Syntax { position, .. }
            | ParseError::MissingBraceArgument { position, .. }
            | ParseError::EnvironmentMismatch { position, .. }
            | ParseError::UnsupportedEnvironment { position, .. }
            | ParseError::MissingDifferential { position } => Some(*position),
            ParseError::RecursionLimit { .. } | ParseError::NodeBudget { .. } => None,
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            ParseError::UnexpectedToken { expected, .. } => {
                if expected.contains("RightBrace") || expected.contains('}') {
                    Some("add a closing brace '}'".to_string())
                } else if expected.contains("RightParen") || expected.contains(')') {
                    Some("add a closing parenthesis ')'".to_string())
                } else if expected.contains("RightBracket") || expected.contains(']') {
                    Some("add a closing bracket ']'".to_string())
                } else if expected.contains("Pipe") || expected.contains('|') {
                    Some("close the absolute value with '|'".to_string())
                } else {
                    None
                }
            }
            ParseError::MissingBraceArgument { command, .. } => {
                Some(format!("use braces, e.g. \\{command}{{1}}{{2}}"))
            }
            ParseError::MissingDifferential { .. } => {
                Some("end the integrand with a differential, e.g. \\int x \\, dx".to_string())
            }
            ParseError::EnvironmentMismatch { begin, .. } => {
                Some(format!("close the environment with \\end{{{begin}}}"))
            }
            ParseError::UnsupportedEnvironment { .. } => Some(
                "supported environments: matrix, pmatrix, bmatrix, vmatrix, align, aligned"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Errors produced while walking the tree against an environment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String, suggestion: Option<String> },

    #[error("Unknown function '{name}'")]
    UndefinedFunction { name: String, suggestion: Option<String> },

    #[error("Division by zero")]
    DivisionByZero,

    /// Argument outside the mathematical domain of an operation
    #[error("{message}")]
    Domain { message: String, suggestion: Option<String> },

    #[error("Matrix shape mismatch for {op}: {lhs_rows}x{lhs_cols} vs {rhs_rows}x{rhs_cols}")]
    ShapeMismatch {
        op: String,
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    #[error("Unsupported operands for {op}: {lhs} and {rhs}")]
    UnsupportedOperands { op: String, lhs: String, rhs: String },

    #[error("Iteration count {count} exceeds the limit of {max}")]
    IterationCap { count: u64, max: u64 },

    #[error("Limit does not exist as '{var}' approaches the target")]
    LimitDoesNotExist { var: String },

    #[error("Expected a scalar result, found {found}")]
    NonScalarResult { found: String },

    #[error("Expected a matrix result, found {found}")]
    NonMatrixResult { found: String },

    /// Symbolic failures reached through evaluation (derivative nodes,
    /// indefinite integrals) surface unmodified
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
}

impl EvalError {
    pub fn domain(message: impl Into<String>) -> Self {
        EvalError::Domain { message: message.into(), suggestion: None }
    }

    pub fn domain_with(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        EvalError::Domain { message: message.into(), suggestion: Some(suggestion.into()) }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            EvalError::UndefinedVariable { name, suggestion } => suggestion
                .clone()
                .map(|s| format!("did you mean '{s}'?"))
                .or_else(|| Some(format!("bind '{name}' in the environment"))),
            EvalError::UndefinedFunction { suggestion, .. } => {
                suggestion.clone().map(|s| format!("did you mean '\\{s}'?"))
            }
            EvalError::Domain { suggestion, .. } => suggestion.clone(),
            EvalError::DivisionByZero => {
                Some("guard the denominator with a domain condition".to_string())
            }
            EvalError::IterationCap { max, .. } => {
                Some(format!("reduce the bounds to at most {max} iterations"))
            }
            EvalError::Symbolic(inner) => inner.suggestion(),
            _ => None,
        }
    }
}

/// Errors from the symbolic transformer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolicError {
    #[error("No integration pattern matches {detail}")]
    NoIntegrationPattern { detail: String },

    #[error("Symbolic rewriting exceeded the depth limit ({max})")]
    RecursionLimit { max: usize },

    #[error("Cannot differentiate {what}")]
    UnsupportedDerivative { what: String },
}

impl SymbolicError {
    pub fn suggestion(&self) -> Option<String> {
        match self {
            SymbolicError::NoIntegrationPattern { .. } => {
                Some("add integration bounds for a numerical result".to_string())
            }
            _ => None,
        }
    }
}

/// Umbrella error exposed by the library surface.
///
/// Wraps each stage error transparently so messages, positions, and
/// suggestions pass through unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Symbolic(#[from] SymbolicError),

    /// Aggregate produced by the validation pass
    #[error("{message}")]
    Validation { message: String, sub_errors: Vec<MathError> },
}

impl MathError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MathError::Tokenize(_) => ErrorCategory::Tokenizer,
            MathError::Parse(_) => ErrorCategory::Parser,
            MathError::Eval(EvalError::Symbolic(_)) => ErrorCategory::Symbolic,
            MathError::Eval(_) => ErrorCategory::Evaluator,
            MathError::Symbolic(_) => ErrorCategory::Symbolic,
            MathError::Validation { .. } => ErrorCategory::Validation,
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            MathError::Tokenize(e) => Some(e.position()),
            MathError::Parse(e) => e.position(),
            MathError::Eval(_) | MathError::Symbolic(_) => None,
            MathError::Validation { sub_errors, .. } => {
                sub_errors.first().and_then(|e| e.position())
            }
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            MathError::Tokenize(e) => e.suggestion(),
            MathError::Parse(e) => e.suggestion(),
            MathError::Eval(e) => e.suggestion(),
            MathError::Symbolic(e) => e.suggestion(),
            MathError::Validation { sub_errors, .. } => {
                sub_errors.first().and_then(|e| e.suggestion())
            }
        }
    }

    /// Enrich the error with a snippet of the offending source.
    pub fn diagnostic(&self, source: Option<&str>) -> Diagnostic {
        let position = self.position();
        let (source_snippet, caret_marker) = match (source, position) {
            (Some(src), Some(pos)) => {
                let rendered = snippet::source_snippet(src, pos);
                (Some(rendered.text), Some(rendered.caret))
            }
            _ => (None, None),
        };
        let sub_errors = match self {
            MathError::Validation { sub_errors, .. } => {
                sub_errors.iter().map(|e| e.diagnostic(source)).collect()
            }
            _ => Vec::new(),
        };
        Diagnostic {
            category: self.category(),
            message: self.to_string(),
            position,
            source_snippet,
            caret_marker,
            suggestion: self.suggestion(),
            sub_errors,
        }
    }
}

/// Display-ready error report: category, message, position, snippet with
/// caret marker, suggestion, and nested sub-errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub message: String,
    pub position: Option<usize>,
    pub source_snippet: Option<String>,
    pub caret_marker: Option<String>,
    pub suggestion: Option<String>,
    pub sub_errors: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenize_error_reports_position_and_suggestion() {
        let err = TokenizeError::UnknownCommand {
            name: "sine".to_string(),
            position: 3,
            suggestion: Some("sin".to_string()),
        };
        assert_eq!(err.position(), 3);
        assert_eq!(err.suggestion().as_deref(), Some("did you mean '\\sin'?"));
    }

    #[test]
    fn parse_error_suggests_closing_delimiters() {
        let err = ParseError::unexpected("RightParen", "Eof", 10);
        assert_eq!(err.suggestion().as_deref(), Some("add a closing parenthesis ')'"));
    }

    #[test]
    fn umbrella_preserves_category() {
        let err: MathError = ParseError::RecursionLimit { max: 500 }.into();
        assert_eq!(err.category(), ErrorCategory::Parser);
        assert_eq!(err.position(), None);

        let err: MathError = EvalError::from(SymbolicError::RecursionLimit { max: 500 }).into();
        assert_eq!(err.category(), ErrorCategory::Symbolic);
    }

    #[test]
    fn diagnostic_carries_snippet() {
        let err: MathError = TokenizeError::StrayCharacter { ch: '#', position: 4 }.into();
        let diag = err.diagnostic(Some("2 + #x"));
        assert!(diag.source_snippet.is_some());
        let caret = diag.caret_marker.unwrap_or_default();
        assert!(caret.contains('^'));
    }

    #[test]
    fn validation_aggregates_sub_errors() {
        let sub: MathError = TokenizeError::StrayCharacter { ch: '#', position: 0 }.into();
        let err = MathError::Validation {
            message: "2 problems found".to_string(),
            sub_errors: vec![sub],
        };
        let diag = err.diagnostic(Some("#"));
        assert_eq!(diag.sub_errors.len(), 1);
        assert_eq!(err.position(), Some(0));
    }
}
