use latex_eval::Handler;
use latex_token::Command;

/// A bundle of runtime additions: tokenizer commands, constants, and
/// function handlers.
///
/// Installed through [`crate::MathEngine::install_extension`], which
/// also flushes the caches. Registrations are process-wide.
///
/// ```
/// use std::sync::Arc;
/// use latex_math::{Command, MathExtension, Value};
///
/// let extension = MathExtension::new()
///     .command("double", Command::Function)
///     .constant("c", 299_792_458.0)
///     .function("double", Arc::new(|call, env, eval| {
///         let value = eval(&call.args[0], env)?;
///         match value {
///             Value::Numeric(n) => Ok(Value::Numeric(2.0 * n)),
///             other => Ok(other),
///         }
///     }));
/// # let _ = extension;
/// ```
#[derive(Default)]
pub struct MathExtension {
    commands: Vec<(String, Command)>,
    constants: Vec<(String, f64)>,
    functions: Vec<(String, Handler)>,
}

impl MathExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tokenizer command, e.g. mapping `\double` to a function
    /// token.
    pub fn command(mut self, name: impl Into<String>, command: Command) -> Self {
        self.commands.push((name.into(), command));
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: f64) -> Self {
        self.constants.push((name.into(), value));
        self
    }

    /// Add a function handler; extension handlers resolve before
    /// built-ins.
    pub fn function(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.functions.push((name.into(), handler));
        self
    }

    pub(crate) fn install(self) {
        for (name, command) in self.commands {
            latex_token::register_command(name, command);
        }
        for (name, value) in self.constants {
            latex_eval::register_constant(name, value);
        }
        for (name, handler) in self.functions {
            latex_eval::register_function(name, handler);
        }
    }
}
