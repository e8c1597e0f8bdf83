//! Recursive descent parser for LaTeX math expressions.
//!
//! Consumes the token stream from `latex-lexer` and produces the typed
//! expression tree from `latex-ast`, handling the LaTeX-specific quirks:
//! implicit multiplication, subscript/superscript forms, grouping braces,
//! delimiter-sized absolute values, matrix environments, and the calculus
//! constructs (`\frac{d}{dx}`, `\int ... dx`, `\sum`, `\lim`).
//!
//! The parser enforces hard safety budgets (recursion depth and produced
//! node count) so adversarial input terminates with an error instead of a
//! stack overflow.

mod parser;

pub use parser::Parser;

use latex_ast::Expr;
use latex_error::MathError;

/// Parser behavior switches.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Infer multiplication between adjacent factors (`2x`, `2\pi r`)
    pub allow_implicit_multiplication: bool,
    /// Maximum recursion depth before parsing aborts
    pub max_depth: usize,
    /// Maximum number of tree nodes before parsing aborts
    pub max_nodes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { allow_implicit_multiplication: true, max_depth: 500, max_nodes: 10_000 }
    }
}

/// Parse a LaTeX source string with default configuration.
pub fn parse(source: &str) -> Result<Expr, MathError> {
    parse_with_config(source, &ParserConfig::default())
}

/// Parse a LaTeX source string.
pub fn parse_with_config(source: &str, config: &ParserConfig) -> Result<Expr, MathError> {
    let tokens = latex_lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens, config.clone());
    Ok(parser.parse_program()?)
}
