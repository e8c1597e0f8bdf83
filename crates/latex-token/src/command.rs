//! Central LaTeX command table.
//!
//! Backslash commands resolve here: the static `phf` table covers every
//! built-in command, and a runtime registry accepts extensions installed
//! through the library facade. Lookups check the static table first, then
//! the extension registry.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::FontStyle;

/// Classification a command name resolves to.
///
/// The tokenizer turns each classification into the matching [`crate::TokenKind`];
/// `Function` and `Constant` keep the command name as the token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Named function handler: `\sin`, `\det`, `\gcd`
    Function,
    /// Named constant: `\pi`
    Constant,
    /// Greek letter used as a variable: `\alpha`
    Letter,
    Sum,
    Product,
    Limit,
    /// Integral with dimension count (1..=3)
    Integral(u8),
    Arrow,
    Infinity,
    LessEqual,
    GreaterEqual,
    NotEqual,
    Frac,
    Binom,
    Sqrt,
    Partial,
    Nabla,
    Begin,
    End,
    Text,
    Font(FontStyle),
    /// Multiplication spelled as a command: `\times`, `\cdot`
    Times,
    /// Division spelled as a command: `\div`
    Divide,
    /// Sizing and spacing commands with no parse effect
    Ignored,
}

static COMMANDS: phf::Map<&'static str, Command> = phf::phf_map! {
    // Trigonometric functions and inverses
    "sin" => Command::Function,
    "cos" => Command::Function,
    "tan" => Command::Function,
    "cot" => Command::Function,
    "sec" => Command::Function,
    "csc" => Command::Function,
    "arcsin" => Command::Function,
    "arccos" => Command::Function,
    "arctan" => Command::Function,
    "arccot" => Command::Function,
    "arcsec" => Command::Function,
    "arccsc" => Command::Function,

    // Hyperbolic functions and inverses
    "sinh" => Command::Function,
    "cosh" => Command::Function,
    "tanh" => Command::Function,
    "coth" => Command::Function,
    "sech" => Command::Function,
    "csch" => Command::Function,
    "arcsinh" => Command::Function,
    "arccosh" => Command::Function,
    "arctanh" => Command::Function,
    "arccoth" => Command::Function,
    "arcsech" => Command::Function,
    "arccsch" => Command::Function,

    // Exponential, logarithmic, roots
    "ln" => Command::Function,
    "log" => Command::Function,
    "exp" => Command::Function,
    "sqrt" => Command::Sqrt,

    // Rounding and magnitude
    "abs" => Command::Function,
    "sgn" => Command::Function,
    "sign" => Command::Function,
    "floor" => Command::Function,
    "ceil" => Command::Function,
    "round" => Command::Function,

    // Combinatorics and number theory
    "factorial" => Command::Function,
    "fibonacci" => Command::Function,
    "gcd" => Command::Function,
    "lcm" => Command::Function,
    "min" => Command::Function,
    "max" => Command::Function,

    // Complex parts
    "Re" => Command::Function,
    "Im" => Command::Function,
    "conj" => Command::Function,
    "overline" => Command::Function,

    // Matrix reductions
    "det" => Command::Function,
    "trace" => Command::Function,
    "tr" => Command::Function,

    // Lowercase Greek letters
    "alpha" => Command::Letter,
    "beta" => Command::Letter,
    "gamma" => Command::Letter,
    "delta" => Command::Letter,
    "epsilon" => Command::Letter,
    "varepsilon" => Command::Letter,
    "zeta" => Command::Letter,
    "eta" => Command::Letter,
    "theta" => Command::Letter,
    "vartheta" => Command::Letter,
    "iota" => Command::Letter,
    "kappa" => Command::Letter,
    "lambda" => Command::Letter,
    "mu" => Command::Letter,
    "nu" => Command::Letter,
    "xi" => Command::Letter,
    "omicron" => Command::Letter,
    "rho" => Command::Letter,
    "varrho" => Command::Letter,
    "sigma" => Command::Letter,
    "varsigma" => Command::Letter,
    "tau" => Command::Letter,
    "upsilon" => Command::Letter,
    "phi" => Command::Letter,
    "varphi" => Command::Letter,
    "chi" => Command::Letter,
    "psi" => Command::Letter,
    "omega" => Command::Letter,

    // Uppercase Greek letters
    "Gamma" => Command::Letter,
    "Delta" => Command::Letter,
    "Theta" => Command::Letter,
    "Lambda" => Command::Letter,
    "Xi" => Command::Letter,
    "Pi" => Command::Letter,
    "Sigma" => Command::Letter,
    "Upsilon" => Command::Letter,
    "Phi" => Command::Letter,
    "Psi" => Command::Letter,
    "Omega" => Command::Letter,

    // pi is the one Greek command bound to a value
    "pi" => Command::Constant,
    "varpi" => Command::Constant,

    // Calculus
    "sum" => Command::Sum,
    "prod" => Command::Product,
    "lim" => Command::Limit,
    "int" => Command::Integral(1),
    "iint" => Command::Integral(2),
    "iiint" => Command::Integral(3),
    "to" => Command::Arrow,
    "rightarrow" => Command::Arrow,
    "infty" => Command::Infinity,
    "partial" => Command::Partial,
    "nabla" => Command::Nabla,

    // Comparisons
    "leq" => Command::LessEqual,
    "le" => Command::LessEqual,
    "geq" => Command::GreaterEqual,
    "ge" => Command::GreaterEqual,
    "neq" => Command::NotEqual,
    "ne" => Command::NotEqual,

    // Structure
    "frac" => Command::Frac,
    "dfrac" => Command::Frac,
    "tfrac" => Command::Frac,
    "cfrac" => Command::Frac,
    "binom" => Command::Binom,
    "dbinom" => Command::Binom,
    "tbinom" => Command::Binom,
    "begin" => Command::Begin,
    "end" => Command::End,
    "text" => Command::Text,

    // Fonts
    "mathbf" => Command::Font(FontStyle::Bold),
    "boldsymbol" => Command::Font(FontStyle::BoldSymbol),
    "mathcal" => Command::Font(FontStyle::Calligraphic),
    "mathrm" => Command::Font(FontStyle::Roman),
    "mathit" => Command::Font(FontStyle::Italic),
    "mathbb" => Command::Font(FontStyle::Blackboard),
    "mathfrak" => Command::Font(FontStyle::Fraktur),
    "mathsf" => Command::Font(FontStyle::SansSerif),
    "mathtt" => Command::Font(FontStyle::Typewriter),

    // Operators spelled as commands
    "times" => Command::Times,
    "cdot" => Command::Times,
    "div" => Command::Divide,

    // Sizing, grouping, and spacing: no parse effect
    "left" => Command::Ignored,
    "right" => Command::Ignored,
    "big" => Command::Ignored,
    "Big" => Command::Ignored,
    "bigg" => Command::Ignored,
    "Bigg" => Command::Ignored,
    "bigl" => Command::Ignored,
    "bigr" => Command::Ignored,
    "Bigl" => Command::Ignored,
    "Bigr" => Command::Ignored,
    "biggl" => Command::Ignored,
    "biggr" => Command::Ignored,
    "Biggl" => Command::Ignored,
    "Biggr" => Command::Ignored,
    "limits" => Command::Ignored,
    "displaystyle" => Command::Ignored,
    "quad" => Command::Ignored,
    "qquad" => Command::Ignored,
};

lazy_static! {
    /// Commands installed at runtime through the extension surface.
    static ref EXTENSIONS: RwLock<FxHashMap<String, Command>> =
        RwLock::new(FxHashMap::default());
}

/// Resolve a command name to its classification.
///
/// Built-in commands win over extensions so installing an extension can
/// never silently change the meaning of standard LaTeX.
pub fn resolve_command(name: &str) -> Option<Command> {
    COMMANDS
        .get(name)
        .copied()
        .or_else(|| EXTENSIONS.read().get(name).copied())
}

/// Install a custom command. Visible to all subsequent tokenizations.
pub fn register_command(name: impl Into<String>, command: Command) {
    EXTENSIONS.write().insert(name.into(), command);
}

/// All known command names (built-in and extension), for "did you mean"
/// suggestions on unknown commands. Sorted so suggestions are
/// deterministic.
pub fn known_command_names() -> Vec<String> {
    let mut names: Vec<String> = COMMANDS.keys().map(|k| (*k).to_string()).collect();
    names.extend(EXTENSIONS.read().keys().cloned());
    names.sort();
    names
}
