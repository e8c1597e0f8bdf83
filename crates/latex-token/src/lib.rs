//! LaTeX Math Token Definitions
//!
//! This crate provides the shared token definitions used by the LaTeX math
//! tokenizer and parser, together with the command table that maps backslash
//! commands (`\sin`, `\frac`, `\begin`, ...) to token classifications.

use std::sync::Arc;

pub mod command;

pub use command::{known_command_names, register_command, resolve_command, Command};

/// Token produced by the tokenizer and consumed by the parser.
///
/// Stores the token kind, original source text, and byte span. The text is kept
/// in an `Arc<str>` so buffering and lookahead can clone tokens cheaply.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token classification for parser decision making
    pub kind: TokenKind,
    /// Original source text for diagnostics and reconstruction
    pub text: Arc<str>,
    /// Starting byte position for error reporting
    pub start: usize,
    /// Ending byte position for span calculation
    pub end: usize,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, text: impl Into<Arc<str>>, start: usize, end: usize) -> Self {
        Token { kind, text: text.into(), start, end }
    }

    /// Byte position of the token for error reporting
    pub fn position(&self) -> usize {
        self.start
    }
}

/// Token classification for LaTeX math parsing.
///
/// The set is intentionally flat for fast parser matching while covering
/// literals, operators, delimiters, comparison forms, and the structural
/// LaTeX commands (`\frac`, `\sum`, `\begin`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ===== Literals and identifiers =====
    /// Numeric literal: `42`, `3.14`
    Number,
    /// Single-letter or Greek-letter variable
    Identifier,
    /// Named mathematical constant: `\pi`
    Constant(Arc<str>),
    /// Function command: `\sin`, `\log`, `\det`
    Function(Arc<str>),
    /// Infinity symbol: `\infty`
    Infinity,

    // ===== Operators =====
    /// Addition: `+`
    Plus,
    /// Subtraction / negation: `-`
    Minus,
    /// Multiplication: `*`, `\times`, `\cdot`
    Star,
    /// Division: `/`, `\div`
    Slash,
    /// Exponentiation: `^`
    Caret,
    /// Subscript: `_`
    Underscore,

    // ===== Delimiters =====
    /// Left parenthesis: `(`
    LeftParen,
    /// Right parenthesis: `)`
    RightParen,
    /// Left brace: `{` or `\{`
    LeftBrace,
    /// Right brace: `}` or `\}`
    RightBrace,
    /// Left bracket: `[`
    LeftBracket,
    /// Right bracket: `]`
    RightBracket,
    /// Vertical bar: `|` (absolute value or matrix column)
    Pipe,
    /// Argument separator: `,`
    Comma,
    /// Matrix cell separator: `&`
    Ampersand,
    /// Matrix row separator: `\\`
    RowBreak,

    // ===== Comparisons =====
    /// Less than: `<`
    Less,
    /// Greater than: `>`
    Greater,
    /// Less than or equal: `<=` or `\leq`
    LessEqual,
    /// Greater than or equal: `>=` or `\geq`
    GreaterEqual,
    /// Equality: `=`
    Equal,
    /// Inequality: `\neq`
    NotEqual,
    /// Limit arrow: `\to`, `\rightarrow`
    Arrow,

    // ===== Structural commands =====
    /// Fraction: `\frac{a}{b}`
    Frac,
    /// Binomial coefficient: `\binom{n}{k}`
    Binom,
    /// Summation: `\sum`
    Sum,
    /// Product: `\prod`
    Product,
    /// Limit: `\lim`
    Limit,
    /// Integral with multiplicity: `\int`, `\iint`, `\iiint`
    Integral { dims: u8 },
    /// Environment open with captured name: `\begin{matrix}`
    Begin(Arc<str>),
    /// Environment close with captured name: `\end{matrix}`
    End(Arc<str>),
    /// Partial derivative symbol: `\partial`
    Partial,
    /// Nabla symbol: `\nabla`
    Nabla,
    /// Root: `\sqrt` / `\sqrt[n]`
    Sqrt,
    /// Text block with captured content: `\text{...}`
    Text(Arc<str>),
    /// Font styling command: `\mathbf`, `\mathcal`, ...
    Font(FontStyle),

    // ===== Special =====
    /// Token with no parsing effect: `\left`, `\right`, `\big`, spacing
    Ignored,
    /// End of input
    Eof,
}

/// Font style carried by `\mathbf{x}`-style commands.
///
/// Preserved on the tree only so `to_latex()` can round-trip the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Bold,
    BoldSymbol,
    Calligraphic,
    Roman,
    Italic,
    Blackboard,
    Fraktur,
    SansSerif,
    Typewriter,
}

impl FontStyle {
    /// The LaTeX command name for this style, without the backslash.
    pub fn command_name(&self) -> &'static str {
        match self {
            FontStyle::Bold => "mathbf",
            FontStyle::BoldSymbol => "boldsymbol",
            FontStyle::Calligraphic => "mathcal",
            FontStyle::Roman => "mathrm",
            FontStyle::Italic => "mathit",
            FontStyle::Blackboard => "mathbb",
            FontStyle::Fraktur => "mathfrak",
            FontStyle::SansSerif => "mathsf",
            FontStyle::Typewriter => "mathtt",
        }
    }
}
