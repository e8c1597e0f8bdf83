//! Byte-oriented tokenizer for LaTeX math expressions.
//!
//! Scans UTF-8 source into the flat token stream the parser consumes.
//! Backslash commands resolve through the central command table in
//! `latex-token`, consulting the runtime extension registry before failing,
//! so unknown commands report a position and a "did you mean" suggestion.
//!
//! Interpretation stays out of the tokenizer: `|` is emitted as a plain
//! `Pipe` whether it opens an absolute value or separates matrix columns,
//! and sizing commands like `\left` become `Ignored` tokens for the parser
//! to strip.

use std::sync::Arc;

use latex_error::{did_you_mean, TokenizeError};
use latex_token::{known_command_names, resolve_command, Command, Token, TokenKind};

/// Cursor-based scanner over the source bytes.
pub struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    position: usize,
}

/// Tokenize a full source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(source).tokenize()
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer { input, bytes: input.as_bytes(), position: 0 }
    }

    /// Scan the whole input into a token vector ending in `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.position >= self.bytes.len() {
                let end = self.input.len();
                tokens.push(Token::new(TokenKind::Eof, "", end, end));
                return Ok(tokens);
            }
            if let Some(token) = self.next_token()? {
                tokens.push(token);
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.bytes.len()
            && matches!(self.bytes[self.position], b' ' | b'\t' | b'\n' | b'\r')
        {
            self.position += 1;
        }
    }

    /// Scan one token. Returns `None` when the scan consumed input with no
    /// token to emit (spacing commands).
    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        let start = self.position;
        let byte = self.bytes[start];
        match byte {
            b'0'..=b'9' => Ok(Some(self.scan_number())),
            b'a'..=b'z' | b'A'..=b'Z' => {
                self.position += 1;
                Ok(Some(self.token(TokenKind::Identifier, start)))
            }
            b'\\' => self.scan_command(),
            b'+' => Ok(Some(self.single(TokenKind::Plus))),
            b'-' => Ok(Some(self.single(TokenKind::Minus))),
            b'*' => Ok(Some(self.single(TokenKind::Star))),
            b'/' => Ok(Some(self.single(TokenKind::Slash))),
            b'^' => Ok(Some(self.single(TokenKind::Caret))),
            b'_' => Ok(Some(self.single(TokenKind::Underscore))),
            b'(' => Ok(Some(self.single(TokenKind::LeftParen))),
            b')' => Ok(Some(self.single(TokenKind::RightParen))),
            b'{' => Ok(Some(self.single(TokenKind::LeftBrace))),
            b'}' => Ok(Some(self.single(TokenKind::RightBrace))),
            b'[' => Ok(Some(self.single(TokenKind::LeftBracket))),
            b']' => Ok(Some(self.single(TokenKind::RightBracket))),
            b'|' => Ok(Some(self.single(TokenKind::Pipe))),
            b',' => Ok(Some(self.single(TokenKind::Comma))),
            b'&' => Ok(Some(self.single(TokenKind::Ampersand))),
            b'=' => Ok(Some(self.single(TokenKind::Equal))),
            b'<' => Ok(Some(self.compound(TokenKind::Less, TokenKind::LessEqual))),
            b'>' => Ok(Some(self.compound(TokenKind::Greater, TokenKind::GreaterEqual))),
            b'!' if self.peek_byte(1) == Some(b'=') => {
                self.position += 2;
                Ok(Some(self.token(TokenKind::NotEqual, start)))
            }
            _ => {
                let ch = self.current_char();
                Err(TokenizeError::StrayCharacter { ch, position: start })
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.position;
        while self.position < self.bytes.len() && self.bytes[self.position].is_ascii_digit() {
            self.position += 1;
        }
        // A decimal point counts only when digits follow it
        if self.peek_byte(0) == Some(b'.')
            && self.peek_byte(1).is_some_and(|b| b.is_ascii_digit())
        {
            self.position += 1;
            while self.position < self.bytes.len() && self.bytes[self.position].is_ascii_digit() {
                self.position += 1;
            }
        }
        self.token(TokenKind::Number, start)
    }

    fn scan_command(&mut self) -> Result<Option<Token>, TokenizeError> {
        let start = self.position;
        self.position += 1; // backslash
        if self.position >= self.bytes.len() {
            return Err(TokenizeError::TruncatedCommand { position: start });
        }

        let name_start = self.position;
        while self.position < self.bytes.len()
            && self.bytes[self.position].is_ascii_alphabetic()
        {
            self.position += 1;
        }

        if self.position == name_start {
            // Punctuation escape: a single non-letter byte after the backslash
            return match self.bytes[self.position] {
                b'\\' => {
                    self.position += 1;
                    Ok(Some(self.token(TokenKind::RowBreak, start)))
                }
                b'{' => {
                    self.position += 1;
                    Ok(Some(self.token(TokenKind::LeftBrace, start)))
                }
                b'}' => {
                    self.position += 1;
                    Ok(Some(self.token(TokenKind::RightBrace, start)))
                }
                b'|' => {
                    self.position += 1;
                    Ok(Some(self.token(TokenKind::Pipe, start)))
                }
                // Thin spaces and friends carry no meaning
                b',' | b';' | b':' | b'!' | b' ' => {
                    self.position += 1;
                    Ok(None)
                }
                _ => {
                    let ch = self.current_char();
                    Err(TokenizeError::UnknownCommand {
                        name: ch.to_string(),
                        position: start,
                        suggestion: None,
                    })
                }
            };
        }

        // Reborrow from the original input so the name slice does not hold
        // a borrow of `self` across the mutating scans below
        let input = self.input;
        let name = &input[name_start..self.position];
        let Some(command) = resolve_command(name) else {
            return Err(TokenizeError::UnknownCommand {
                name: name.to_string(),
                position: start,
                suggestion: did_you_mean(name, known_command_names()),
            });
        };

        let kind = match command {
            Command::Function => TokenKind::Function(Arc::from(name)),
            Command::Constant => TokenKind::Constant(Arc::from(name)),
            // Greek letters behave exactly like single-letter identifiers
            Command::Letter => TokenKind::Identifier,
            Command::Sum => TokenKind::Sum,
            Command::Product => TokenKind::Product,
            Command::Limit => TokenKind::Limit,
            Command::Integral(dims) => TokenKind::Integral { dims },
            Command::Arrow => TokenKind::Arrow,
            Command::Infinity => TokenKind::Infinity,
            Command::LessEqual => TokenKind::LessEqual,
            Command::GreaterEqual => TokenKind::GreaterEqual,
            Command::NotEqual => TokenKind::NotEqual,
            Command::Frac => TokenKind::Frac,
            Command::Binom => TokenKind::Binom,
            Command::Sqrt => TokenKind::Sqrt,
            Command::Partial => TokenKind::Partial,
            Command::Nabla => TokenKind::Nabla,
            Command::Times => TokenKind::Star,
            Command::Divide => TokenKind::Slash,
            Command::Font(style) => TokenKind::Font(style),
            Command::Ignored => TokenKind::Ignored,
            Command::Begin => {
                let env = self.scan_environment_name(start)?;
                TokenKind::Begin(env)
            }
            Command::End => {
                let env = self.scan_environment_name(start)?;
                TokenKind::End(env)
            }
            Command::Text => {
                let content = self.scan_braced_raw(start)?;
                TokenKind::Text(content)
            }
        };

        // Greek identifiers keep the command name as their text so the
        // parser sees "alpha" rather than "\alpha"
        if command == Command::Letter {
            return Ok(Some(Token::new(
                TokenKind::Identifier,
                name,
                start,
                self.position,
            )));
        }
        Ok(Some(self.token(kind, start)))
    }

    /// Read `{name}` after `\begin` / `\end`.
    fn scan_environment_name(&mut self, command_start: usize) -> Result<Arc<str>, TokenizeError> {
        if self.peek_byte(0) != Some(b'{') {
            return Err(TokenizeError::MalformedEnvironment { position: command_start });
        }
        self.position += 1;
        let name_start = self.position;
        while self.position < self.bytes.len()
            && (self.bytes[self.position].is_ascii_alphanumeric()
                || self.bytes[self.position] == b'*')
        {
            self.position += 1;
        }
        if self.position == name_start || self.peek_byte(0) != Some(b'}') {
            return Err(TokenizeError::MalformedEnvironment { position: command_start });
        }
        let name = Arc::from(&self.input[name_start..self.position]);
        self.position += 1;
        Ok(name)
    }

    /// Read raw `{...}` content after `\text`, without nesting.
    fn scan_braced_raw(&mut self, command_start: usize) -> Result<Arc<str>, TokenizeError> {
        if self.peek_byte(0) != Some(b'{') {
            return Err(TokenizeError::MalformedEnvironment { position: command_start });
        }
        self.position += 1;
        let content_start = self.position;
        while self.position < self.bytes.len() && self.bytes[self.position] != b'}' {
            self.position += 1;
        }
        if self.position >= self.bytes.len() {
            return Err(TokenizeError::MalformedEnvironment { position: command_start });
        }
        let content = Arc::from(&self.input[content_start..self.position]);
        self.position += 1;
        Ok(content)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.position;
        self.position += 1;
        self.token(kind, start)
    }

    /// One- or two-byte comparison, `<` / `<=` style.
    fn compound(&mut self, bare: TokenKind, with_equal: TokenKind) -> Token {
        let start = self.position;
        self.position += 1;
        if self.peek_byte(0) == Some(b'=') {
            self.position += 1;
            self.token(with_equal, start)
        } else {
            self.token(bare, start)
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, &self.input[start..self.position], start, self.position)
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.position + offset).copied()
    }

    fn current_char(&self) -> char {
        self.input[self.position..].chars().next().unwrap_or('\0')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_numbers_and_identifiers() {
        assert_eq!(
            kinds("2x + 3.5"),
            vec![
                TokenKind::Number,
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_text_and_span() {
        let tokens = tokenize("  3.14 ").unwrap();
        assert_eq!(&*tokens[0].text, "3.14");
        assert_eq!(tokens[0].start, 2);
        assert_eq!(tokens[0].end, 6);
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let err = tokenize("1.x").unwrap_err();
        assert!(matches!(err, TokenizeError::StrayCharacter { ch: '.', position: 1 }));
    }

    #[test]
    fn commands_resolve_to_kinds() {
        let tokens = tokenize("\\sin \\pi \\frac \\sum \\infty").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Function(name) if &**name == "sin"));
        assert!(matches!(&tokens[1].kind, TokenKind::Constant(name) if &**name == "pi"));
        assert_eq!(tokens[2].kind, TokenKind::Frac);
        assert_eq!(tokens[3].kind, TokenKind::Sum);
        assert_eq!(tokens[4].kind, TokenKind::Infinity);
    }

    #[test]
    fn greek_letters_are_identifiers() {
        let tokens = tokenize("\\alpha").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(&*tokens[0].text, "alpha");
    }

    #[test]
    fn multichar_integrals() {
        assert_eq!(
            kinds("\\int \\iint \\iiint"),
            vec![
                TokenKind::Integral { dims: 1 },
                TokenKind::Integral { dims: 2 },
                TokenKind::Integral { dims: 3 },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comparison_lookahead() {
        assert_eq!(
            kinds("a <= b >= c < d \\neq e"),
            vec![
                TokenKind::Identifier,
                TokenKind::LessEqual,
                TokenKind::Identifier,
                TokenKind::GreaterEqual,
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Identifier,
                TokenKind::NotEqual,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn punctuation_escapes() {
        assert_eq!(
            kinds("\\{ \\} \\\\ \\, x"),
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::RowBreak,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn sizing_commands_become_ignored() {
        assert_eq!(
            kinds("\\left( x \\right)"),
            vec![
                TokenKind::Ignored,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::Ignored,
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn environment_names_are_captured() {
        let tokens = tokenize("\\begin{pmatrix}1\\end{pmatrix}").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Begin(env) if &**env == "pmatrix"));
        assert!(matches!(&tokens[2].kind, TokenKind::End(env) if &**env == "pmatrix"));
    }

    #[test]
    fn malformed_environment_is_error() {
        let err = tokenize("\\begin matrix").unwrap_err();
        assert!(matches!(err, TokenizeError::MalformedEnvironment { position: 0 }));
    }

    #[test]
    fn text_content_is_captured() {
        let tokens = tokenize("\\text{speed of light}").unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Text(s) if &**s == "speed of light"));
    }

    #[test]
    fn unknown_command_suggests_nearest() {
        let err = tokenize("\\sine{x}").unwrap_err();
        match err {
            TokenizeError::UnknownCommand { name, position, suggestion } => {
                assert_eq!(name, "sine");
                assert_eq!(position, 0);
                assert_eq!(suggestion.as_deref(), Some("sin"));
            }
            other => panic!("expected UnknownCommand, got {other:?}"),
        }
    }

    #[test]
    fn truncated_command_at_eof() {
        let err = tokenize("x + \\").unwrap_err();
        assert!(matches!(err, TokenizeError::TruncatedCommand { position: 4 }));
    }

    #[test]
    fn stray_character_reports_position() {
        let err = tokenize("2 + #").unwrap_err();
        assert!(matches!(err, TokenizeError::StrayCharacter { ch: '#', position: 4 }));
    }

    #[test]
    fn pipe_and_matrix_separators() {
        assert_eq!(
            kinds("|x| & y \\\\"),
            vec![
                TokenKind::Pipe,
                TokenKind::Identifier,
                TokenKind::Pipe,
                TokenKind::Ampersand,
                TokenKind::Identifier,
                TokenKind::RowBreak,
                TokenKind::Eof,
            ]
        );
    }
}
