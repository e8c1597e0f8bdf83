//! Render a tree back to LaTeX source.
//!
//! The output is value-equivalent to the input under re-parsing rather than
//! byte-identical: grouping braces may become parentheses, `\cdot` stands
//! in for implicit multiplication, and sizing commands are not restored.

use crate::expr::{BinaryOp, CompareOp, DerivativeKind, Expr, MatrixKind};

const PREC_CONDITIONAL: u8 = 0;
const PREC_COMPARE: u8 = 1;
const PREC_ADD: u8 = 2;
const PREC_MUL: u8 = 3;
const PREC_NEG: u8 = 4;
const PREC_POW: u8 = 5;
const PREC_ATOM: u8 = 6;

/// Greek names that render with a leading backslash.
const GREEK_NAMES: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "lambda", "mu", "nu", "xi", "omicron", "pi", "varpi", "rho",
    "varrho", "sigma", "varsigma", "tau", "upsilon", "phi", "varphi", "chi", "psi", "omega",
    "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon", "Phi", "Psi", "Omega",
];

/// Render `expr` as LaTeX.
pub fn to_latex(expr: &Expr) -> String {
    render(expr, 0)
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Conditional { .. } => PREC_CONDITIONAL,
        Expr::Compare { .. } | Expr::CompareChain { .. } => PREC_COMPARE,
        Expr::Binary { op: BinaryOp::Add | BinaryOp::Sub, .. } => PREC_ADD,
        Expr::Binary { op: BinaryOp::Mul, .. } => PREC_MUL,
        Expr::Negate(_) => PREC_NEG,
        Expr::Binary { op: BinaryOp::Pow, .. } => PREC_POW,
        Expr::Number(n) if *n < 0.0 => PREC_NEG,
        Expr::Sum { .. } | Expr::Product { .. } | Expr::Integral { .. } | Expr::Limit { .. } => {
            PREC_MUL
        }
        // \frac{..}{..} is visually atomic
        _ => PREC_ATOM,
    }
}

fn render(expr: &Expr, required: u8) -> String {
    let rendered = render_bare(expr);
    if precedence(expr) < required {
        format!("({rendered})")
    } else {
        rendered
    }
}

fn render_bare(expr: &Expr) -> String {
    match expr {
        Expr::Number(n) => format_number(*n),
        Expr::Variable(name) => variable_name(name),
        Expr::Binary { op, left, right } => match op {
            BinaryOp::Add => {
                format!("{} + {}", render(left, PREC_ADD), render(right, PREC_ADD))
            }
            BinaryOp::Sub => {
                format!("{} - {}", render(left, PREC_ADD), render(right, PREC_ADD + 1))
            }
            BinaryOp::Mul => {
                format!("{} \\cdot {}", render(left, PREC_MUL), render(right, PREC_MUL))
            }
            BinaryOp::Div => {
                format!("\\frac{{{}}}{{{}}}", render_bare(left), render_bare(right))
            }
            BinaryOp::Pow => {
                format!("{}^{{{}}}", render(left, PREC_POW + 1), render_bare(right))
            }
        },
        Expr::Negate(inner) => format!("-{}", render(inner, PREC_NEG)),
        Expr::Call { name, args, subscript } => {
            let mut out = format!("\\{name}");
            if let Some(sub) = subscript {
                out.push_str(&format!("_{{{}}}", render_bare(sub)));
            }
            // \binom takes braced arguments; other multi-argument calls
            // re-parse through their parenthesized form
            if args.len() > 1 && name != "binom" {
                let joined: Vec<String> = args.iter().map(render_bare).collect();
                out.push_str(&format!("({})", joined.join(", ")));
            } else {
                for arg in args {
                    out.push_str(&format!("{{{}}}", render_bare(arg)));
                }
            }
            out
        }
        Expr::Abs(inner) => format!("|{}|", render_bare(inner)),
        Expr::Matrix { rows, kind } => {
            let env = match kind {
                MatrixKind::Plain => "matrix",
                MatrixKind::Parens => "pmatrix",
                MatrixKind::Brackets => "bmatrix",
                MatrixKind::Bars => "vmatrix",
                MatrixKind::Aligned => "aligned",
            };
            let body = rows
                .iter()
                .map(|row| {
                    row.iter().map(render_bare).collect::<Vec<_>>().join(" & ")
                })
                .collect::<Vec<_>>()
                .join(" \\\\ ");
            format!("\\begin{{{env}}}{body}\\end{{{env}}}")
        }
        Expr::Root { radicand, index } => match index {
            Some(index) => {
                format!("\\sqrt[{}]{{{}}}", render_bare(index), render_bare(radicand))
            }
            None => format!("\\sqrt{{{}}}", render_bare(radicand)),
        },
        Expr::Sum { index, start, end, body } => format!(
            "\\sum_{{{index}={}}}^{{{}}} {}",
            render_bare(start),
            render_bare(end),
            render(body, PREC_MUL)
        ),
        Expr::Product { index, start, end, body } => format!(
            "\\prod_{{{index}={}}}^{{{}}} {}",
            render_bare(start),
            render_bare(end),
            render(body, PREC_MUL)
        ),
        Expr::Integral { lower, upper, body, var } => {
            let mut out = String::from("\\int");
            if let Some(lower) = lower {
                out.push_str(&format!("_{{{}}}", render_bare(lower)));
            }
            if let Some(upper) = upper {
                out.push_str(&format!("^{{{}}}", render_bare(upper)));
            }
            out.push_str(&format!(" {} \\, d{}", render(body, PREC_ADD), variable_name(var)));
            out
        }
        Expr::Derivative { body, var, order, kind } => {
            let sym = match kind {
                DerivativeKind::Ordinary => "d",
                DerivativeKind::Partial => "\\partial",
            };
            let var_sym = variable_name(var);
            if *order == 1 {
                format!("\\frac{{{sym}}}{{{sym} {var_sym}}}({})", render_bare(body))
            } else {
                format!(
                    "\\frac{{{sym}^{{{order}}}}}{{{sym} {var_sym}^{{{order}}}}}({})",
                    render_bare(body)
                )
            }
        }
        Expr::Limit { var, target, body } => format!(
            "\\lim_{{{} \\to {}}} {}",
            variable_name(var),
            render_bare(target),
            render(body, PREC_MUL)
        ),
        Expr::Compare { left, op, right } => format!(
            "{} {} {}",
            render(left, PREC_COMPARE + 1),
            compare_symbol(*op),
            render(right, PREC_COMPARE + 1)
        ),
        Expr::CompareChain { exprs, ops } => {
            let mut out = render(&exprs[0], PREC_COMPARE + 1);
            for (op, expr) in ops.iter().zip(exprs.iter().skip(1)) {
                out.push_str(&format!(
                    " {} {}",
                    compare_symbol(*op),
                    render(expr, PREC_COMPARE + 1)
                ));
            }
            out
        }
        Expr::Conditional { value, condition } => {
            format!("{}, {}", render(value, PREC_COMPARE), render(condition, PREC_COMPARE))
        }
        Expr::Fonted { style, name } => {
            format!("\\{}{{{}}}", style.command_name(), name)
        }
    }
}

fn compare_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Less => "<",
        CompareOp::LessEqual => "\\leq",
        CompareOp::Greater => ">",
        CompareOp::GreaterEqual => "\\geq",
        CompareOp::Equal => "=",
        CompareOp::NotEqual => "\\neq",
    }
}

fn format_number(n: f64) -> String {
    if n.is_infinite() {
        if n > 0.0 { "\\infty".to_string() } else { "-\\infty".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn variable_name(name: &str) -> String {
    // Subscripted variables were folded into the name at parse time
    if let Some((base, sub)) = name.split_once('_') {
        return format!("{}_{{{}}}", variable_name(base), sub);
    }
    if GREEK_NAMES.contains(&name) {
        format!("\\{name}")
    } else {
        name.to_string()
    }
}
