//! Runtime extensions: custom commands, constants, and handlers.

use std::sync::Arc;

use latex_math::{
    CacheSettings, Command, Environment, EvalError, MathConfig, MathEngine, MathExtension, Value,
};
use pretty_assertions::assert_eq;

fn engine() -> MathEngine {
    MathEngine::new(MathConfig {
        allow_implicit_multiplication: true,
        cache: CacheSettings::with_statistics(),
    })
}

#[test]
fn custom_function_and_constant() {
    let engine = engine();
    let extension = MathExtension::new()
        .command("twice", Command::Function)
        .constant("lightspeed", 299_792_458.0)
        .function(
            "twice",
            Arc::new(|call, env, eval| {
                if call.args.len() != 1 {
                    return Err(EvalError::domain("twice expects one argument"));
                }
                match eval(&call.args[0], env)? {
                    Value::Numeric(n) => Ok(Value::Numeric(2.0 * n)),
                    other => Err(EvalError::domain(format!(
                        "twice expects a scalar, got a {}",
                        other.kind_name()
                    ))),
                }
            }),
        );
    engine.install_extension(extension);

    let env = Environment::new();
    assert_eq!(engine.evaluate_numeric("\\twice{21}", &env).ok(), Some(42.0));
    assert_eq!(
        engine.evaluate_numeric("lightspeed", &env).ok(),
        Some(299_792_458.0)
    );
}

#[test]
fn custom_greek_style_letter() {
    let engine = engine();
    engine.install_extension(MathExtension::new().command("spam", Command::Letter));

    let env = Environment::new().with("spam", 7.0);
    assert_eq!(engine.evaluate_numeric("2\\spam", &env).ok(), Some(14.0));
}

#[test]
fn installation_flushes_every_cache_layer() {
    let engine = engine();
    let env = Environment::new();
    let _ = engine.evaluate("1 + 2", &env);
    assert!(engine.cache_stats().parse.entries > 0);

    engine.install_extension(MathExtension::new().constant("answer_ext", 42.0));

    let stats = engine.cache_stats();
    assert_eq!(stats.parse.entries, 0);
    assert_eq!(stats.eval.entries, 0);
    assert_eq!(stats.derivative.entries, 0);
    assert_eq!(stats.subexpression.entries, 0);
}

#[test]
fn unknown_command_errors_before_installation() {
    let engine = engine();
    assert!(!engine.is_valid("\\definitely_not_installed{1}"));
}
