use std::sync::Arc;

use latex_ast::{BinaryOp, CompareOp, DerivativeKind, Expr, MatrixKind};
use latex_error::ParseError;
use latex_token::{Token, TokenKind};

use crate::ParserConfig;

type ParseResult<T> = Result<T, ParseError>;

/// Open delimiters the parser is currently inside.
///
/// Needed because `|` cannot be classified by token kind alone: a pipe is an
/// opening absolute-value bar unless an unmatched pipe is already on this
/// stack, in which case it closes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Paren,
    Brace,
    Bracket,
    Pipe,
}

/// Recursive descent parser over a token vector.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Current recursion depth for overflow protection
    depth: usize,
    /// Nodes produced so far, for the size budget
    node_count: usize,
    delimiters: Vec<Delimiter>,
    /// Nesting level of integral bodies, where `dX` terminates a factor
    integral_depth: usize,
    config: ParserConfig,
}

impl Parser {
    /// Create a parser over pre-lexed tokens. Sizing tokens (`\left`,
    /// `\big`, spacing) are stripped here; they carry no parse meaning.
    pub fn new(tokens: Vec<Token>, config: ParserConfig) -> Self {
        let mut tokens: Vec<Token> =
            tokens.into_iter().filter(|t| t.kind != TokenKind::Ignored).collect();
        // The lexer always terminates the stream; guarantee it for
        // externally built token vectors too
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let end = tokens.last().map(|t| t.end).unwrap_or(0);
            tokens.push(Token::new(TokenKind::Eof, "", end, end));
        }
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            node_count: 0,
            delimiters: Vec::new(),
            integral_depth: 0,
            config,
        }
    }

    /// Parse a complete program: an expression, optionally followed by
    /// `, condition`, then end of input.
    pub fn parse_program(&mut self) -> ParseResult<Expr> {
        self.skip_function_definition_prefix();

        let expr = self.parse_expression()?;
        let expr = if self.peek_kind() == &TokenKind::Comma {
            self.advance();
            let condition = self.parse_expression()?;
            self.bump_node()?;
            Expr::Conditional { value: Box::new(expr), condition: Box::new(condition) }
        } else {
            expr
        };

        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            return Err(ParseError::unexpected(
                "end of input",
                format!("{:?}", token.kind),
                token.start,
            ));
        }
        Ok(expr)
    }

    /// A leading `v(v) =` names a function being defined; the definition
    /// head is dropped and only the body is parsed.
    fn skip_function_definition_prefix(&mut self) {
        if self.tokens.len() >= 5
            && self.tokens[0].kind == TokenKind::Identifier
            && self.tokens[1].kind == TokenKind::LeftParen
            && self.tokens[2].kind == TokenKind::Identifier
            && self.tokens[3].kind == TokenKind::RightParen
            && self.tokens[4].kind == TokenKind::Equal
        {
            self.pos = 5;
        }
    }

    // ===== Precedence ladder =====

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.enter_recursion()?;
        let result = self.parse_comparison();
        self.exit_recursion();
        result
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let first = self.parse_add_sub()?;
        let Some(op) = comparison_op(self.peek_kind()) else {
            return Ok(first);
        };
        self.advance();

        let mut exprs = vec![first, self.parse_add_sub()?];
        let mut ops = vec![op];
        while let Some(op) = comparison_op(self.peek_kind()) {
            self.advance();
            ops.push(op);
            exprs.push(self.parse_add_sub()?);
        }
        self.bump_node()?;

        if ops.len() == 1 {
            let right = Box::new(exprs.remove(1));
            let left = Box::new(exprs.remove(0));
            Ok(Expr::Compare { left, op: ops[0], right })
        } else {
            Ok(Expr::CompareChain { exprs, ops })
        }
    }

    fn parse_add_sub(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_mul_div()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul_div()?;
            self.bump_node()?;
            expr = Expr::binary(op, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_mul_div(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_power()?;
        loop {
            match self.peek_kind() {
                TokenKind::Star => {
                    self.advance();
                    let rhs = self.parse_power()?;
                    self.bump_node()?;
                    expr = Expr::mul(expr, rhs);
                }
                TokenKind::Slash => {
                    self.advance();
                    let rhs = self.parse_power()?;
                    self.bump_node()?;
                    expr = Expr::div(expr, rhs);
                }
                _ if self.implicit_multiplication_applies() => {
                    let rhs = self.parse_power()?;
                    self.bump_node()?;
                    expr = Expr::mul(expr, rhs);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// True when the next token opens another factor and an implicit `*`
    /// should be inferred.
    fn implicit_multiplication_applies(&self) -> bool {
        if !self.config.allow_implicit_multiplication {
            return false;
        }
        // The differential terminates an integrand, never multiplies it
        if self.integral_depth > 0 && self.at_differential() {
            return false;
        }
        match self.peek_kind() {
            TokenKind::Number
            | TokenKind::Identifier
            | TokenKind::Constant(_)
            | TokenKind::Infinity
            | TokenKind::LeftParen
            | TokenKind::LeftBrace
            | TokenKind::Function(_)
            | TokenKind::Frac
            | TokenKind::Binom
            | TokenKind::Sqrt
            | TokenKind::Sum
            | TokenKind::Product
            | TokenKind::Limit
            | TokenKind::Integral { .. }
            | TokenKind::Begin(_)
            | TokenKind::Font(_)
            | TokenKind::Text(_) => true,
            // A pipe opens a factor only when it is not closing `|...|`
            TokenKind::Pipe => !self.delimiters.contains(&Delimiter::Pipe),
            _ => false,
        }
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_unary()?;
        if self.peek_kind() != &TokenKind::Caret {
            return Ok(base);
        }
        self.advance();
        let exponent = self.parse_exponent_operand()?;
        self.bump_node()?;
        Ok(Expr::pow(base, exponent))
    }

    /// An exponent is either a braced expression or a tighter power chain,
    /// which makes `a^b^c` right-associative.
    fn parse_exponent_operand(&mut self) -> ParseResult<Expr> {
        if self.peek_kind() == &TokenKind::LeftBrace {
            self.parse_braced_expression()
        } else {
            self.enter_recursion()?;
            let result = self.parse_power();
            self.exit_recursion();
            result
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.peek_kind() == &TokenKind::Minus {
            self.advance();
            self.enter_recursion()?;
            let inner = self.parse_unary();
            self.exit_recursion();
            self.bump_node()?;
            return Ok(Expr::negate(inner?));
        }
        self.parse_primary()
    }

    // ===== Primaries =====

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        self.bump_node()?;
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value: f64 = token
                    .text
                    .parse()
                    .map_err(|_| ParseError::syntax("invalid number literal", token.start))?;
                Ok(Expr::Number(value))
            }
            TokenKind::Identifier => {
                self.advance();
                let name = self.parse_variable_name(&token)?;
                Ok(Expr::Variable(name))
            }
            TokenKind::Constant(name) => {
                self.advance();
                Ok(Expr::Variable(name.to_string()))
            }
            TokenKind::Infinity => {
                self.advance();
                Ok(Expr::Number(f64::INFINITY))
            }
            TokenKind::LeftParen => {
                self.advance();
                self.delimiters.push(Delimiter::Paren);
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                self.delimiters.pop();
                Ok(expr)
            }
            TokenKind::LeftBrace => {
                self.advance();
                self.delimiters.push(Delimiter::Brace);
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightBrace)?;
                self.delimiters.pop();
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                self.delimiters.push(Delimiter::Bracket);
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightBracket)?;
                self.delimiters.pop();
                Ok(expr)
            }
            TokenKind::Pipe => {
                self.advance();
                self.delimiters.push(Delimiter::Pipe);
                let inner = self.parse_expression()?;
                self.expect(TokenKind::Pipe)?;
                self.delimiters.pop();
                Ok(Expr::Abs(Box::new(inner)))
            }
            TokenKind::Function(name) => self.parse_function_call(&name),
            TokenKind::Frac => {
                self.advance();
                self.parse_fraction(token.start)
            }
            TokenKind::Binom => {
                self.advance();
                let n = self.parse_required_brace_group("binom", token.start)?;
                let k = self.parse_required_brace_group("binom", token.start)?;
                Ok(Expr::call("binom", vec![n, k]))
            }
            TokenKind::Sqrt => {
                self.advance();
                self.parse_root(token.start)
            }
            TokenKind::Sum => {
                self.advance();
                self.parse_reduction(true, token.start)
            }
            TokenKind::Product => {
                self.advance();
                self.parse_reduction(false, token.start)
            }
            TokenKind::Limit => {
                self.advance();
                self.parse_limit(token.start)
            }
            TokenKind::Integral { dims } => {
                self.advance();
                self.parse_integral(dims, token.start)
            }
            TokenKind::Begin(env) => {
                self.advance();
                self.parse_matrix(&env, token.start)
            }
            TokenKind::Font(style) => {
                self.advance();
                let name = if self.peek_kind() == &TokenKind::LeftBrace {
                    self.advance();
                    let inner = self.expect(TokenKind::Identifier)?;
                    self.expect(TokenKind::RightBrace)?;
                    inner.text.to_string()
                } else {
                    self.expect(TokenKind::Identifier)?.text.to_string()
                };
                Ok(Expr::Fonted { style, name })
            }
            TokenKind::Text(content) => {
                self.advance();
                Ok(Expr::Variable(content.trim().to_string()))
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEnd { position: token.start }),
            other => Err(ParseError::unexpected(
                "an expression",
                format!("{other:?}"),
                token.start,
            )),
        }
    }

    /// Fold an optional subscript into the variable name: `x_1`, `x_{max}`.
    fn parse_variable_name(&mut self, token: &Token) -> ParseResult<String> {
        let mut name = token.text.to_string();
        if self.peek_kind() == &TokenKind::Underscore {
            self.advance();
            let subscript = if self.peek_kind() == &TokenKind::LeftBrace {
                self.advance();
                let mut parts = String::new();
                while !matches!(self.peek_kind(), TokenKind::RightBrace | TokenKind::Eof) {
                    parts.push_str(&self.advance().text);
                }
                self.expect(TokenKind::RightBrace)?;
                parts
            } else {
                let tok = self.advance();
                match tok.kind {
                    TokenKind::Number | TokenKind::Identifier => tok.text.to_string(),
                    other => {
                        return Err(ParseError::unexpected(
                            "a subscript",
                            format!("{other:?}"),
                            tok.start,
                        ))
                    }
                }
            };
            name.push('_');
            name.push_str(&subscript);
        }
        Ok(name)
    }

    /// `\sin{x}`, `\log_{2}{x}`, `\min(a, b)`, `\sin^{2} x`, `\sin x`.
    fn parse_function_call(&mut self, name: &str) -> ParseResult<Expr> {
        self.advance();

        let subscript = if self.peek_kind() == &TokenKind::Underscore {
            self.advance();
            Some(self.parse_script_operand()?)
        } else {
            None
        };

        // `\sin^{2} x` squares the whole call; the exponent is applied
        // after the argument is read
        let exponent = if self.peek_kind() == &TokenKind::Caret {
            self.advance();
            Some(self.parse_script_operand()?)
        } else {
            None
        };

        let mut args = Vec::new();
        match self.peek_kind() {
            TokenKind::LeftParen => {
                self.advance();
                self.delimiters.push(Delimiter::Paren);
                args.push(self.parse_expression()?);
                while self.peek_kind() == &TokenKind::Comma {
                    self.advance();
                    args.push(self.parse_expression()?);
                }
                self.expect(TokenKind::RightParen)?;
                self.delimiters.pop();
            }
            TokenKind::LeftBrace => {
                while self.peek_kind() == &TokenKind::LeftBrace {
                    args.push(self.parse_braced_expression()?);
                }
            }
            _ => {
                // Bare argument: binds as tightly as a power chain
                args.push(self.parse_power()?);
            }
        }

        self.bump_node()?;
        let call = Expr::Call {
            name: name.to_string(),
            args,
            subscript: subscript.map(Box::new),
        };
        match exponent {
            Some(exp) => {
                self.bump_node()?;
                Ok(Expr::pow(call, exp))
            }
            None => Ok(call),
        }
    }

    /// Subscript/superscript operand: `{expr}` or a single tight factor.
    fn parse_script_operand(&mut self) -> ParseResult<Expr> {
        if self.peek_kind() == &TokenKind::LeftBrace {
            self.parse_braced_expression()
        } else {
            self.parse_unary()
        }
    }

    fn parse_braced_expression(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LeftBrace)?;
        self.delimiters.push(Delimiter::Brace);
        let expr = self.parse_expression()?;
        self.expect(TokenKind::RightBrace)?;
        self.delimiters.pop();
        Ok(expr)
    }

    /// Braced argument that reports the owning command on failure.
    fn parse_required_brace_group(&mut self, command: &str, at: usize) -> ParseResult<Expr> {
        if self.peek_kind() != &TokenKind::LeftBrace {
            return Err(ParseError::MissingBraceArgument {
                command: command.to_string(),
                position: at,
            });
        }
        self.parse_braced_expression()
    }

    // ===== LaTeX structures =====

    /// `\frac{a}{b}`, or a derivative when the numerator and denominator
    /// spell `\frac{d}{dx}` / `\frac{d^n}{dx^n}` / the `\partial` forms.
    fn parse_fraction(&mut self, at: usize) -> ParseResult<Expr> {
        if let Some(spec) = self.match_derivative_spec() {
            self.pos = spec.resume_pos;
            // The differentiated body must be parenthesized
            if self.peek_kind() != &TokenKind::LeftParen {
                let position = self.peek().start;
                return Err(ParseError::syntax(
                    "derivative body must be parenthesized, e.g. \\frac{d}{dx}(x^2)",
                    position,
                ));
            }
            self.advance();
            self.delimiters.push(Delimiter::Paren);
            let body = self.parse_expression()?;
            self.expect(TokenKind::RightParen)?;
            self.delimiters.pop();
            self.bump_node()?;
            return Ok(Expr::Derivative {
                body: Box::new(body),
                var: spec.var,
                order: spec.order,
                kind: spec.kind,
            });
        }

        let numerator = self.parse_required_brace_group("frac", at)?;
        let denominator = self.parse_required_brace_group("frac", at)?;
        self.bump_node()?;
        Ok(Expr::div(numerator, denominator))
    }

    fn parse_root(&mut self, at: usize) -> ParseResult<Expr> {
        let index = if self.peek_kind() == &TokenKind::LeftBracket {
            self.advance();
            self.delimiters.push(Delimiter::Bracket);
            let index = self.parse_expression()?;
            self.expect(TokenKind::RightBracket)?;
            self.delimiters.pop();
            Some(Box::new(index))
        } else {
            None
        };
        let radicand = self.parse_required_brace_group("sqrt", at)?;
        self.bump_node()?;
        Ok(Expr::Root { radicand: Box::new(radicand), index })
    }

    /// `\sum_{i=1}^{n} body` / `\prod_{i=1}^{n} body`.
    fn parse_reduction(&mut self, is_sum: bool, at: usize) -> ParseResult<Expr> {
        let command = if is_sum { "sum" } else { "prod" };
        if self.peek_kind() != &TokenKind::Underscore {
            return Err(ParseError::syntax(
                format!("\\{command} requires bounds, e.g. \\{command}_{{i=1}}^{{n}}"),
                at,
            ));
        }
        self.advance();
        self.expect(TokenKind::LeftBrace)?;
        let index = self.expect(TokenKind::Identifier)?.text.to_string();
        self.expect(TokenKind::Equal)?;
        self.delimiters.push(Delimiter::Brace);
        let start = self.parse_expression()?;
        self.expect(TokenKind::RightBrace)?;
        self.delimiters.pop();
        self.expect(TokenKind::Caret)?;
        let end = self.parse_script_operand()?;
        let body = self.parse_mul_div()?;
        self.bump_node()?;

        let node = if is_sum {
            Expr::Sum {
                index,
                start: Box::new(start),
                end: Box::new(end),
                body: Box::new(body),
            }
        } else {
            Expr::Product {
                index,
                start: Box::new(start),
                end: Box::new(end),
                body: Box::new(body),
            }
        };
        Ok(node)
    }

    /// `\lim_{x \to a} body`.
    fn parse_limit(&mut self, at: usize) -> ParseResult<Expr> {
        if self.peek_kind() != &TokenKind::Underscore {
            return Err(ParseError::syntax(
                "\\lim requires a target, e.g. \\lim_{x \\to 0}",
                at,
            ));
        }
        self.advance();
        self.expect(TokenKind::LeftBrace)?;
        let var = self.expect(TokenKind::Identifier)?.text.to_string();
        self.expect(TokenKind::Arrow)?;
        self.delimiters.push(Delimiter::Brace);
        let target = self.parse_expression()?;
        self.expect(TokenKind::RightBrace)?;
        self.delimiters.pop();
        let body = self.parse_mul_div()?;
        self.bump_node()?;
        Ok(Expr::Limit { var, target: Box::new(target), body: Box::new(body) })
    }

    /// `\int_{a}^{b} body dX`, nested once per differential for `\iint`
    /// and `\iiint`.
    fn parse_integral(&mut self, dims: u8, at: usize) -> ParseResult<Expr> {
        let mut lower = None;
        let mut upper = None;
        loop {
            match self.peek_kind() {
                TokenKind::Underscore if lower.is_none() => {
                    self.advance();
                    lower = Some(self.parse_script_operand()?);
                }
                TokenKind::Caret if upper.is_none() => {
                    self.advance();
                    upper = Some(self.parse_script_operand()?);
                }
                _ => break,
            }
        }

        // `\int dx` integrates the constant 1
        let body = if self.at_differential() {
            Expr::Number(1.0)
        } else {
            self.integral_depth += 1;
            let body = self.parse_add_sub();
            self.integral_depth -= 1;
            body?
        };

        let mut vars: Vec<String> = Vec::new();
        while vars.len() < usize::from(dims) && self.at_differential() {
            self.advance(); // the 'd'
            let var = self.advance();
            vars.push(var.text.to_string());
        }
        if vars.is_empty() {
            if dims >= 2 {
                vars = ["x", "y", "z"].iter().take(usize::from(dims)).map(|s| s.to_string()).collect();
            } else {
                return Err(ParseError::MissingDifferential { position: at });
            }
        }

        // Innermost integral binds the first differential
        let mut expr = body;
        for var in vars {
            self.bump_node()?;
            expr = Expr::Integral {
                lower: lower.clone().map(Box::new),
                upper: upper.clone().map(Box::new),
                body: Box::new(expr),
                var,
            };
        }
        Ok(expr)
    }

    /// True when the next two tokens read as a differential (`dx`).
    fn at_differential(&self) -> bool {
        let d = match self.tokens.get(self.pos) {
            Some(t) => t,
            None => return false,
        };
        if d.kind != TokenKind::Identifier || &*d.text != "d" {
            return false;
        }
        matches!(
            self.tokens.get(self.pos + 1),
            Some(t) if t.kind == TokenKind::Identifier
        )
    }

    /// `\begin{env} cells \end{env}` with `&` columns and `\\` rows.
    fn parse_matrix(&mut self, env: &str, at: usize) -> ParseResult<Expr> {
        let kind = match env {
            "matrix" => MatrixKind::Plain,
            "pmatrix" => MatrixKind::Parens,
            "bmatrix" => MatrixKind::Brackets,
            "vmatrix" => MatrixKind::Bars,
            "align" | "aligned" => MatrixKind::Aligned,
            other => {
                return Err(ParseError::UnsupportedEnvironment {
                    name: other.to_string(),
                    position: at,
                })
            }
        };

        let mut rows: Vec<Vec<Expr>> = Vec::new();
        'matrix: loop {
            // A row break directly before \end closes the matrix
            if let TokenKind::End(found) = self.peek_kind() {
                let found = Arc::clone(found);
                let end_pos = self.peek().start;
                self.advance();
                self.check_environment(env, &found, end_pos)?;
                break 'matrix;
            }

            let mut row = Vec::new();
            loop {
                // Missing cells at row edges are zero-filled
                let cell = match self.peek_kind() {
                    TokenKind::Ampersand | TokenKind::RowBreak | TokenKind::End(_) => {
                        self.bump_node()?;
                        Expr::Number(0.0)
                    }
                    _ => self.parse_expression()?,
                };
                row.push(cell);

                match self.peek_kind() {
                    TokenKind::Ampersand => {
                        self.advance();
                    }
                    TokenKind::RowBreak => {
                        self.advance();
                        rows.push(row);
                        continue 'matrix;
                    }
                    TokenKind::End(found) => {
                        let found = Arc::clone(found);
                        let end_pos = self.peek().start;
                        self.advance();
                        self.check_environment(env, &found, end_pos)?;
                        rows.push(row);
                        break 'matrix;
                    }
                    other => {
                        let position = self.peek().start;
                        return Err(ParseError::unexpected(
                            "'&', '\\\\', or '\\end'",
                            format!("{other:?}"),
                            position,
                        ));
                    }
                }
            }
        }

        if rows.is_empty() {
            return Err(ParseError::syntax("matrix has no rows", at));
        }

        // Pad short rows so every row has equal length
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            while row.len() < width {
                self.bump_node()?;
                row.push(Expr::Number(0.0));
            }
        }

        self.bump_node()?;
        Ok(Expr::Matrix { rows, kind })
    }

    fn check_environment(&self, begin: &str, end: &str, position: usize) -> ParseResult<()> {
        if begin != end {
            return Err(ParseError::EnvironmentMismatch {
                begin: begin.to_string(),
                end: end.to_string(),
                position,
            });
        }
        Ok(())
    }

    // ===== Derivative lookahead =====

    /// Bounded lookahead for `\frac{d}{dx}` / `\frac{d^n}{dx^n}` and the
    /// `\partial` forms. Does not consume tokens; on a match the caller
    /// jumps to `resume_pos`.
    fn match_derivative_spec(&self) -> Option<DerivativeSpec> {
        let mut cursor = self.pos;

        // Numerator: {d} or {d^n}
        self.eat_kind(&mut cursor, &TokenKind::LeftBrace)?;
        let kind = self.eat_derivative_symbol(&mut cursor)?;
        let numerator_order = self.eat_optional_order(&mut cursor)?;
        self.eat_kind(&mut cursor, &TokenKind::RightBrace)?;

        // Denominator: {dX} or {dX^n}
        self.eat_kind(&mut cursor, &TokenKind::LeftBrace)?;
        let denominator_kind = self.eat_derivative_symbol(&mut cursor)?;
        if denominator_kind != kind {
            return None;
        }
        let var = match self.tokens.get(cursor) {
            Some(t) if t.kind == TokenKind::Identifier => t.text.to_string(),
            _ => return None,
        };
        cursor += 1;
        let denominator_order = self.eat_optional_order(&mut cursor)?;
        self.eat_kind(&mut cursor, &TokenKind::RightBrace)?;

        if numerator_order != denominator_order || numerator_order == 0 {
            return None;
        }

        Some(DerivativeSpec { var, order: numerator_order, kind, resume_pos: cursor })
    }

    /// `d` for ordinary derivatives, `\partial` for partials.
    fn eat_derivative_symbol(&self, cursor: &mut usize) -> Option<DerivativeKind> {
        let token = self.tokens.get(*cursor)?;
        let kind = match &token.kind {
            TokenKind::Identifier if &*token.text == "d" => DerivativeKind::Ordinary,
            TokenKind::Partial => DerivativeKind::Partial,
            _ => return None,
        };
        *cursor += 1;
        Some(kind)
    }

    /// Optional `^n` or `^{n}`; returns 1 when absent, None on malformed.
    fn eat_optional_order(&self, cursor: &mut usize) -> Option<u32> {
        if self.tokens.get(*cursor).map(|t| &t.kind) != Some(&TokenKind::Caret) {
            return Some(1);
        }
        *cursor += 1;
        let braced = self.tokens.get(*cursor).map(|t| &t.kind) == Some(&TokenKind::LeftBrace);
        if braced {
            *cursor += 1;
        }
        let order = match self.tokens.get(*cursor) {
            Some(t) if t.kind == TokenKind::Number => t.text.parse::<u32>().ok()?,
            _ => return None,
        };
        *cursor += 1;
        if braced {
            self.eat_kind(cursor, &TokenKind::RightBrace)?;
        }
        Some(order)
    }

    fn eat_kind(&self, cursor: &mut usize, kind: &TokenKind) -> Option<()> {
        if self.tokens.get(*cursor).map(|t| &t.kind) == Some(kind) {
            *cursor += 1;
            Some(())
        } else {
            None
        }
    }

    // ===== Token plumbing =====

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        let token = self.peek().clone();
        if token.kind != kind {
            return Err(ParseError::unexpected(
                format!("{kind:?}"),
                format!("{:?}", token.kind),
                token.start,
            ));
        }
        self.advance();
        Ok(token)
    }

    #[inline]
    fn enter_recursion(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(ParseError::RecursionLimit { max: self.config.max_depth });
        }
        Ok(())
    }

    fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    fn bump_node(&mut self) -> ParseResult<()> {
        self.node_count += 1;
        if self.node_count > self.config.max_nodes {
            return Err(ParseError::NodeBudget { max: self.config.max_nodes });
        }
        Ok(())
    }
}

struct DerivativeSpec {
    var: String,
    order: u32,
    kind: DerivativeKind,
    resume_pos: usize,
}

fn comparison_op(kind: &TokenKind) -> Option<CompareOp> {
    match kind {
        TokenKind::Less => Some(CompareOp::Less),
        TokenKind::LessEqual => Some(CompareOp::LessEqual),
        TokenKind::Greater => Some(CompareOp::Greater),
        TokenKind::GreaterEqual => Some(CompareOp::GreaterEqual),
        TokenKind::Equal => Some(CompareOp::Equal),
        TokenKind::NotEqual => Some(CompareOp::NotEqual),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, parse_with_config, ParserConfig};
    use latex_error::MathError;
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> Expr {
        match parse(source) {
            Ok(expr) => expr,
            Err(err) => panic!("parse of {source:?} failed: {err}"),
        }
    }

    fn parse_err(source: &str) -> ParseError {
        match parse(source) {
            Err(MathError::Parse(err)) => err,
            Err(other) => panic!("expected parse error for {source:?}, got {other:?}"),
            Ok(expr) => panic!("expected error for {source:?}, parsed {expr:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_ok("2 + 3 \\times 4");
        assert_eq!(
            expr,
            Expr::add(Expr::Number(2.0), Expr::mul(Expr::Number(3.0), Expr::Number(4.0)))
        );
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(
            parse_ok("2x"),
            Expr::mul(Expr::Number(2.0), Expr::variable("x"))
        );
        assert_eq!(
            parse_ok("2\\pi r"),
            Expr::mul(
                Expr::mul(Expr::Number(2.0), Expr::variable("pi")),
                Expr::variable("r")
            )
        );
    }

    #[test]
    fn implicit_multiplication_can_be_disabled() {
        let config = ParserConfig { allow_implicit_multiplication: false, ..Default::default() };
        assert!(parse_with_config("2x", &config).is_err());
        assert!(parse_with_config("2 * x", &config).is_ok());
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            parse_ok("2^3^2"),
            Expr::pow(Expr::Number(2.0), Expr::pow(Expr::Number(3.0), Expr::Number(2.0)))
        );
    }

    #[test]
    fn braced_exponent() {
        assert_eq!(
            parse_ok("x^{2}"),
            Expr::pow(Expr::variable("x"), Expr::Number(2.0))
        );
    }

    #[test]
    fn fraction_becomes_division() {
        assert_eq!(
            parse_ok("\\frac{1}{2}"),
            Expr::div(Expr::Number(1.0), Expr::Number(2.0))
        );
    }

    #[test]
    fn fraction_without_braces_suggests_fix() {
        let err = parse_err("\\frac12");
        assert!(matches!(err, ParseError::MissingBraceArgument { ref command, .. } if command == "frac"));
        let suggestion = err.suggestion().unwrap_or_default();
        assert!(suggestion.contains("\\frac{1}{2}"));
    }

    #[test]
    fn roots_with_and_without_index() {
        assert_eq!(
            parse_ok("\\sqrt{4}"),
            Expr::Root { radicand: Box::new(Expr::Number(4.0)), index: None }
        );
        assert_eq!(
            parse_ok("\\sqrt[3]{8}"),
            Expr::Root {
                radicand: Box::new(Expr::Number(8.0)),
                index: Some(Box::new(Expr::Number(3.0))),
            }
        );
    }

    #[test]
    fn binom_is_a_function_call() {
        assert_eq!(
            parse_ok("\\binom{5}{2}"),
            Expr::call("binom", vec![Expr::Number(5.0), Expr::Number(2.0)])
        );
    }

    #[test]
    fn absolute_value_with_plain_and_sized_bars() {
        let expected = Expr::Abs(Box::new(Expr::variable("x")));
        assert_eq!(parse_ok("|x|"), expected);
        assert_eq!(parse_ok("\\left| x \\right|"), expected);
    }

    #[test]
    fn closing_pipe_does_not_multiply() {
        assert_eq!(
            parse_ok("|2x|"),
            Expr::Abs(Box::new(Expr::mul(Expr::Number(2.0), Expr::variable("x"))))
        );
    }

    #[test]
    fn adjacent_absolute_values_multiply() {
        assert_eq!(
            parse_ok("|x| |y|"),
            Expr::mul(
                Expr::Abs(Box::new(Expr::variable("x"))),
                Expr::Abs(Box::new(Expr::variable("y"))),
            )
        );
    }

    #[test]
    fn sum_structure() {
        let expr = parse_ok("\\sum_{i=1}^{5} i");
        assert_eq!(
            expr,
            Expr::Sum {
                index: "i".to_string(),
                start: Box::new(Expr::Number(1.0)),
                end: Box::new(Expr::Number(5.0)),
                body: Box::new(Expr::variable("i")),
            }
        );
    }

    #[test]
    fn sum_body_stops_at_additive_operator() {
        let expr = parse_ok("\\sum_{i=1}^{3} i^2 + 1");
        match expr {
            Expr::Binary { op: BinaryOp::Add, left, .. } => {
                assert!(matches!(*left, Expr::Sum { .. }));
            }
            other => panic!("expected sum + 1, got {other:?}"),
        }
    }

    #[test]
    fn integral_with_bounds_and_differential() {
        let expr = parse_ok("\\int_{0}^{1} x \\, dx");
        assert_eq!(
            expr,
            Expr::Integral {
                lower: Some(Box::new(Expr::Number(0.0))),
                upper: Some(Box::new(Expr::Number(1.0))),
                body: Box::new(Expr::variable("x")),
                var: "x".to_string(),
            }
        );
    }

    #[test]
    fn integral_without_differential_is_an_error() {
        let err = parse_err("\\int_{0}^{1} x");
        assert!(matches!(err, ParseError::MissingDifferential { .. }));
        assert!(err.suggestion().unwrap_or_default().contains("dx"));
    }

    #[test]
    fn double_integral_defaults_variables() {
        let expr = parse_ok("\\iint x y");
        match expr {
            Expr::Integral { var, body, .. } => {
                assert_eq!(var, "y");
                assert!(matches!(*body, Expr::Integral { ref var, .. } if var == "x"));
            }
            other => panic!("expected nested integral, got {other:?}"),
        }
    }

    #[test]
    fn integral_of_bare_differential() {
        let expr = parse_ok("\\int dx");
        assert_eq!(
            expr,
            Expr::Integral {
                lower: None,
                upper: None,
                body: Box::new(Expr::Number(1.0)),
                var: "x".to_string(),
            }
        );
    }

    #[test]
    fn derivative_detection_first_order() {
        let expr = parse_ok("\\frac{d}{dx}(x^3)");
        assert_eq!(
            expr,
            Expr::Derivative {
                body: Box::new(Expr::pow(Expr::variable("x"), Expr::Number(3.0))),
                var: "x".to_string(),
                order: 1,
                kind: DerivativeKind::Ordinary,
            }
        );
    }

    #[test]
    fn derivative_detection_higher_order_and_partial() {
        let expr = parse_ok("\\frac{d^{2}}{dx^{2}}(x^3)");
        assert!(matches!(expr, Expr::Derivative { order: 2, kind: DerivativeKind::Ordinary, .. }));

        let expr = parse_ok("\\frac{\\partial}{\\partial x}(x y)");
        assert!(matches!(expr, Expr::Derivative { order: 1, kind: DerivativeKind::Partial, .. }));
    }

    #[test]
    fn derivative_body_requires_parentheses() {
        let err = parse_err("\\frac{d}{dx} x^3");
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn plain_d_fraction_still_parses() {
        // Without the derivative shape this is an ordinary quotient
        let expr = parse_ok("\\frac{d}{c}");
        assert_eq!(expr, Expr::div(Expr::variable("d"), Expr::variable("c")));
    }

    #[test]
    fn matrix_rows_and_cells() {
        let expr = parse_ok("\\begin{pmatrix}1 & 2 \\\\ 3 & 4\\end{pmatrix}");
        assert_eq!(
            expr,
            Expr::Matrix {
                rows: vec![
                    vec![Expr::Number(1.0), Expr::Number(2.0)],
                    vec![Expr::Number(3.0), Expr::Number(4.0)],
                ],
                kind: MatrixKind::Parens,
            }
        );
    }

    #[test]
    fn short_matrix_rows_are_zero_filled() {
        let expr = parse_ok("\\begin{matrix}1 & 2 \\\\ 3\\end{matrix}");
        match expr {
            Expr::Matrix { rows, .. } => {
                assert_eq!(rows[1], vec![Expr::Number(3.0), Expr::Number(0.0)]);
            }
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn environment_mismatch_is_reported() {
        let err = parse_err("\\begin{pmatrix}1\\end{bmatrix}");
        assert!(matches!(err, ParseError::EnvironmentMismatch { .. }));
    }

    #[test]
    fn unsupported_environment_is_reported() {
        let err = parse_err("\\begin{cases}1\\end{cases}");
        assert!(matches!(err, ParseError::UnsupportedEnvironment { .. }));
    }

    #[test]
    fn single_comparison() {
        let expr = parse_ok("x < 5");
        assert!(matches!(expr, Expr::Compare { op: CompareOp::Less, .. }));
    }

    #[test]
    fn chained_comparison() {
        let expr = parse_ok("-5 < x \\leq 5");
        match expr {
            Expr::CompareChain { exprs, ops } => {
                assert_eq!(exprs.len(), 3);
                assert_eq!(ops, vec![CompareOp::Less, CompareOp::LessEqual]);
            }
            other => panic!("expected chain, got {other:?}"),
        }
    }

    #[test]
    fn trailing_condition_builds_conditional() {
        let expr = parse_ok("x^2, -5 < x < 5");
        match expr {
            Expr::Conditional { value, condition } => {
                assert!(matches!(*value, Expr::Binary { op: BinaryOp::Pow, .. }));
                assert!(matches!(*condition, Expr::CompareChain { .. }));
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn function_definition_prefix_is_dropped() {
        assert_eq!(parse_ok("f(x) = x^2"), parse_ok("x^2"));
    }

    #[test]
    fn subscripted_variables_fold_into_the_name() {
        assert_eq!(parse_ok("x_1"), Expr::variable("x_1"));
        assert_eq!(parse_ok("x_{12}"), Expr::variable("x_12"));
    }

    #[test]
    fn function_with_subscript_base() {
        let expr = parse_ok("\\log_{2}{8}");
        assert_eq!(
            expr,
            Expr::Call {
                name: "log".to_string(),
                args: vec![Expr::Number(8.0)],
                subscript: Some(Box::new(Expr::Number(2.0))),
            }
        );
    }

    #[test]
    fn function_exponent_applies_to_the_call() {
        let expr = parse_ok("\\sin^{2}{x}");
        assert_eq!(
            expr,
            Expr::pow(Expr::call("sin", vec![Expr::variable("x")]), Expr::Number(2.0))
        );
    }

    #[test]
    fn function_with_parenthesized_arguments() {
        let expr = parse_ok("\\min(3, 7)");
        assert_eq!(
            expr,
            Expr::call("min", vec![Expr::Number(3.0), Expr::Number(7.0)])
        );
    }

    #[test]
    fn bare_function_argument() {
        let expr = parse_ok("\\sin x + 1");
        assert_eq!(
            expr,
            Expr::add(Expr::call("sin", vec![Expr::variable("x")]), Expr::Number(1.0))
        );
    }

    #[test]
    fn limit_structure() {
        let expr = parse_ok("\\lim_{x \\to 0} x");
        assert_eq!(
            expr,
            Expr::Limit {
                var: "x".to_string(),
                target: Box::new(Expr::Number(0.0)),
                body: Box::new(Expr::variable("x")),
            }
        );
    }

    #[test]
    fn fonted_variable() {
        let expr = parse_ok("\\mathbf{v}");
        assert!(matches!(expr, Expr::Fonted { name, .. } if name == "v"));
    }

    #[test]
    fn deep_nesting_hits_recursion_limit() {
        let source = format!("{}x{}", "(".repeat(600), ")".repeat(600));
        let err = parse_err(&source);
        assert!(matches!(err, ParseError::RecursionLimit { max: 500 }));
    }

    #[test]
    fn node_budget_is_enforced() {
        let config = ParserConfig { max_nodes: 10, ..Default::default() };
        let err = parse_with_config("1+2+3+4+5+6+7+8+9", &config).unwrap_err();
        assert!(matches!(err, MathError::Parse(ParseError::NodeBudget { max: 10 })));
    }

    #[test]
    fn unclosed_paren_suggests_fix() {
        let err = parse_err("(1 + 2");
        assert!(err.suggestion().unwrap_or_default().contains(')'));
    }

    #[test]
    fn matrix_transpose_spelling_parses() {
        let expr = parse_ok("\\begin{pmatrix}1\\end{pmatrix}^T");
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Pow, .. }));
    }
}
