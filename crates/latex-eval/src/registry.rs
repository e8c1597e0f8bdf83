//! Process-wide constant and function registries.
//!
//! Both are lazily initialized and read-mostly: the steady state is
//! lookups, with extension installation the only mutation path. Within a
//! call, extension handlers resolve before built-ins so installed hooks
//! can shadow standard behavior; the facade is responsible for flushing
//! caches when that happens.

use std::sync::Arc;

use lazy_static::lazy_static;
use latex_ast::Expr;
use latex_error::EvalError;
use latex_numeric::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::functions;
use crate::Environment;

/// Re-entry point handed to function handlers so they can evaluate
/// their argument expressions.
pub type EvalFn<'a> = &'a dyn Fn(&Expr, &Environment) -> Result<Value, EvalError>;

/// A function handler: receives the call node, the environment, and an
/// evaluation callback, and returns a result or its own domain error.
pub type Handler = Arc<
    dyn Fn(&FunctionCall<'_>, &Environment, EvalFn<'_>) -> Result<Value, EvalError>
        + Send
        + Sync,
>;

/// Borrowed view of a `Call` node handed to handlers.
pub struct FunctionCall<'a> {
    pub name: &'a str,
    pub args: &'a [Expr],
    pub subscript: Option<&'a Expr>,
}

fn builtin_constants() -> FxHashMap<String, f64> {
    let mut map = FxHashMap::default();
    map.insert("pi".to_string(), std::f64::consts::PI);
    map.insert("varpi".to_string(), std::f64::consts::PI);
    map.insert("e".to_string(), std::f64::consts::E);
    map.insert("tau".to_string(), std::f64::consts::TAU);
    // Golden ratio and the Euler-Mascheroni constant
    map.insert("phi".to_string(), 1.618_033_988_749_894_8);
    map.insert("gamma".to_string(), 0.577_215_664_901_532_9);
    map
}

lazy_static! {
    static ref CONSTANTS: RwLock<FxHashMap<String, f64>> = RwLock::new(builtin_constants());

    /// Built-in handlers, immutable after initialization.
    static ref BUILTINS: FxHashMap<String, Handler> = functions::builtin_functions();

    /// Handlers installed at runtime; consulted before the built-ins.
    static ref EXTENSIONS: RwLock<FxHashMap<String, Handler>> =
        RwLock::new(FxHashMap::default());
}

/// Value of a registered constant.
pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS.read().get(name).copied()
}

/// Install or override a constant. Visible to subsequent evaluations.
pub fn register_constant(name: impl Into<String>, value: f64) {
    CONSTANTS.write().insert(name.into(), value);
}

/// Resolve a function, extensions first.
pub fn lookup_function(name: &str) -> Option<Handler> {
    if let Some(handler) = EXTENSIONS.read().get(name) {
        return Some(Arc::clone(handler));
    }
    BUILTINS.get(name).map(Arc::clone)
}

/// Install a custom function handler.
pub fn register_function(name: impl Into<String>, handler: Handler) {
    EXTENSIONS.write().insert(name.into(), handler);
}

/// All known function names, sorted for deterministic "did you mean"
/// suggestions.
pub fn function_names() -> Vec<String> {
    let mut names: Vec<String> = BUILTINS.keys().cloned().collect();
    names.extend(EXTENSIONS.read().keys().cloned());
    names.sort();
    names
}

/// All known constant names, sorted.
pub fn constant_names() -> Vec<String> {
    let mut names: Vec<String> = CONSTANTS.read().keys().cloned().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_constants_present() {
        assert_eq!(constant("pi"), Some(std::f64::consts::PI));
        assert_eq!(constant("e"), Some(std::f64::consts::E));
        assert_eq!(constant("nope"), None);
    }

    #[test]
    fn constant_registration() {
        register_constant("answer", 42.0);
        assert_eq!(constant("answer"), Some(42.0));
    }

    #[test]
    fn builtin_functions_present() {
        for name in ["sin", "ln", "det", "factorial", "min", "Re"] {
            assert!(lookup_function(name).is_some(), "missing builtin {name}");
        }
        assert!(lookup_function("frobnicate").is_none());
    }

    #[test]
    fn extension_shadows_builtin() {
        let handler: Handler = Arc::new(|_, _, _| Ok(Value::Numeric(99.0)));
        register_function("sin_shadow_test", handler);
        assert!(lookup_function("sin_shadow_test").is_some());
        assert!(function_names().iter().any(|n| n == "sin_shadow_test"));
    }
}
