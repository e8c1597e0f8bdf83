//! Multi-error validation pass.
//!
//! Unlike `parse`, which stops at the first problem, validation keeps
//! scanning: the tokenizer is restarted after each error (up to a cap),
//! the parser contributes its first error, and a final advisory pass
//! flags known function names written without a backslash.

use latex_error::{Diagnostic, MathError, TokenizeError};
use latex_parser::{Parser, ParserConfig};
use serde::Serialize;

/// Hard errors collected before validation gives up.
const MAX_VALIDATION_ERRORS: usize = 10;

/// Names that almost always indicate a forgotten backslash when they
/// appear as bare words.
const BARE_FUNCTION_NAMES: &[&str] =
    &["sin", "cos", "tan", "ln", "log", "exp", "sqrt", "sum", "prod", "lim", "frac", "int"];

/// Outcome of [`crate::validate`]: overall verdict plus every problem
/// found, each enriched with a snippet and suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub message: Option<String>,
    pub position: Option<usize>,
    pub suggestion: Option<String>,
    pub sub_errors: Vec<Diagnostic>,
}

pub(crate) fn validate_source(source: &str, config: &ParserConfig) -> ValidationResult {
    let mut hard: Vec<MathError> = Vec::new();

    // Tokenizer pass, resuming after each error position
    let mut base = 0usize;
    let mut clean_tokens = None;
    loop {
        match latex_lexer::tokenize(&source[base..]) {
            Ok(tokens) => {
                if base == 0 {
                    clean_tokens = Some(tokens);
                }
                break;
            }
            Err(err) => {
                let resume = base + err.position() + 1;
                hard.push(MathError::Tokenize(shift_position(err, base)));
                if hard.len() >= MAX_VALIDATION_ERRORS {
                    break;
                }
                base = next_char_boundary(source, resume);
                if base >= source.len() {
                    break;
                }
            }
        }
    }

    // Parser pass over a clean token stream
    if let Some(tokens) = clean_tokens {
        let mut parser = Parser::new(tokens, config.clone());
        if let Err(err) = parser.parse_program() {
            hard.push(MathError::Parse(err));
        }
    }

    // Advisory pass: bare function names
    let advisories = bare_function_names(source);

    let ok = hard.is_empty();
    let primary = hard.first().or_else(|| advisories.first());
    let message = primary.map(|e| e.to_string());
    let position = primary.and_then(|e| e.position());
    let suggestion = primary.and_then(|e| e.suggestion());
    let sub_errors = hard
        .iter()
        .chain(advisories.iter())
        .map(|e| e.diagnostic(Some(source)))
        .collect();

    ValidationResult { ok, message, position, suggestion, sub_errors }
}

fn shift_position(err: TokenizeError, base: usize) -> TokenizeError {
    match err {
        TokenizeError::UnknownCommand { name, position, suggestion } => {
            TokenizeError::UnknownCommand { name, position: position + base, suggestion }
        }
        TokenizeError::StrayCharacter { ch, position } => {
            TokenizeError::StrayCharacter { ch, position: position + base }
        }
        TokenizeError::TruncatedCommand { position } => {
            TokenizeError::TruncatedCommand { position: position + base }
        }
        TokenizeError::MalformedEnvironment { position } => {
            TokenizeError::MalformedEnvironment { position: position + base }
        }
        TokenizeError::MissingBackslash { name, position } => {
            TokenizeError::MissingBackslash { name, position: position + base }
        }
    }
}

fn next_char_boundary(source: &str, mut index: usize) -> usize {
    while index < source.len() && !source.is_char_boundary(index) {
        index += 1;
    }
    index
}

fn bare_function_names(source: &str) -> Vec<MathError> {
    let mut out = Vec::new();
    for name in BARE_FUNCTION_NAMES {
        for (position, _) in source.match_indices(name) {
            let preceded_by = source[..position].chars().next_back();
            let clear_before =
                !matches!(preceded_by, Some('\\')) && !preceded_by.is_some_and(char::is_alphabetic);
            let followed_by = source[position + name.len()..].chars().next();
            let clear_after = !followed_by.is_some_and(char::is_alphabetic);
            if clear_before && clear_after {
                out.push(MathError::Tokenize(TokenizeError::MissingBackslash {
                    name: (*name).to_string(),
                    position,
                }));
            }
        }
    }
    out.sort_by_key(|e| e.position());
    out
}
