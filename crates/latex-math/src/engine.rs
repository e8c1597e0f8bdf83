use std::sync::Arc;

use latex_ast::Expr;
use latex_cache::{CacheManager, CacheManagerStats, CacheSettings, DerivativeKey, EvalKey};
use latex_error::{EvalError, MathError};
use latex_eval::{Environment, Evaluator};
use latex_numeric::{Matrix, Value};
use latex_parser::ParserConfig;
use tracing::debug;

use crate::extension::MathExtension;
use crate::validate::{validate_source, ValidationResult};
use crate::ParsedExpr;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct MathConfig {
    /// Infer multiplication between adjacent factors (`2x`)
    pub allow_implicit_multiplication: bool,
    /// Sizing and policy for the four cache layers
    pub cache: CacheSettings,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self { allow_implicit_multiplication: true, cache: CacheSettings::default() }
    }
}

/// The caching front door: parse, evaluate, and differentiate with the
/// four cache layers in front of the pipeline stages.
///
/// Caches are per-engine; the registries (constants, functions,
/// commands) are process-wide. Installing an extension through
/// [`MathEngine::install_extension`] flushes every layer, because new
/// handlers can change the meaning of previously cached results.
pub struct MathEngine {
    parser_config: ParserConfig,
    caches: Arc<CacheManager>,
    evaluator: Evaluator,
}

impl Default for MathEngine {
    fn default() -> Self {
        Self::new(MathConfig::default())
    }
}

impl MathEngine {
    pub fn new(config: MathConfig) -> Self {
        let parser_config = ParserConfig {
            allow_implicit_multiplication: config.allow_implicit_multiplication,
            ..Default::default()
        };
        let caches = Arc::new(CacheManager::new(&config.cache));
        let evaluator = Evaluator::with_caches(Arc::clone(&caches));
        MathEngine { parser_config, caches, evaluator }
    }

    /// Parse through the L1 layer.
    pub fn parse(&self, source: &str) -> Result<ParsedExpr, MathError> {
        if let Some(tree) = self.caches.lookup_parse(source) {
            debug!(source, "parse served from L1");
            return Ok(tree);
        }
        let tree = Arc::new(latex_parser::parse_with_config(source, &self.parser_config)?);
        self.caches.store_parse(source, Arc::clone(&tree));
        Ok(tree)
    }

    /// Parse and evaluate through L1 and L2.
    pub fn evaluate(&self, source: &str, env: &Environment) -> Result<Value, MathError> {
        let tree = self.parse(source)?;
        self.evaluate_parsed(&tree, env)
    }

    /// Evaluate a shared tree through the L2 layer.
    pub fn evaluate_parsed(
        &self,
        tree: &ParsedExpr,
        env: &Environment,
    ) -> Result<Value, MathError> {
        let key = EvalKey { tree: Arc::clone(tree), env_hash: env.stable_hash() };
        if let Some(value) = self.caches.lookup_eval(&key) {
            debug!("evaluation served from L2");
            return Ok(value);
        }
        let value = self.evaluator.evaluate(tree, env)?;
        self.caches.store_eval(key, value.clone());
        Ok(value)
    }

    /// Evaluate and require a real scalar.
    pub fn evaluate_numeric(&self, source: &str, env: &Environment) -> Result<f64, MathError> {
        let value = self.evaluate(source, env)?;
        value.as_numeric().ok_or_else(|| {
            MathError::from(EvalError::NonScalarResult {
                found: value.kind_name().to_string(),
            })
        })
    }

    /// Evaluate and require a matrix.
    pub fn evaluate_matrix(&self, source: &str, env: &Environment) -> Result<Matrix, MathError> {
        match self.evaluate(source, env)? {
            Value::Matrix(m) => Ok(m),
            other => Err(MathError::from(EvalError::NonMatrixResult {
                found: other.kind_name().to_string(),
            })),
        }
    }

    pub fn is_valid(&self, source: &str) -> bool {
        self.parse(source).is_ok()
    }

    pub fn validate(&self, source: &str) -> ValidationResult {
        validate_source(source, &self.parser_config)
    }

    /// Symbolic derivative through the L3 layer.
    pub fn differentiate(
        &self,
        source: &str,
        var: &str,
        order: u32,
    ) -> Result<ParsedExpr, MathError> {
        let tree = self.parse(source)?;
        self.differentiate_parsed(&tree, var, order)
    }

    /// Derivative of a shared tree through the L3 layer.
    pub fn differentiate_parsed(
        &self,
        tree: &ParsedExpr,
        var: &str,
        order: u32,
    ) -> Result<ParsedExpr, MathError> {
        let key = DerivativeKey {
            tree: Arc::clone(tree),
            var: var.to_string(),
            order,
        };
        if let Some(derived) = self.caches.lookup_derivative(&key) {
            debug!(var, order, "derivative served from L3");
            return Ok(derived);
        }
        let derived = Arc::new(latex_symbolic::differentiate(tree, var, order)?);
        self.caches.store_derivative(key, Arc::clone(&derived));
        Ok(derived)
    }

    /// Symbolic antiderivative (pattern-based, uncached).
    pub fn integrate(&self, source: &str, var: &str) -> Result<Expr, MathError> {
        let tree = self.parse(source)?;
        Ok(latex_symbolic::integrate(&tree, var)?)
    }

    /// Prime the parse cache; returns how many sources parsed cleanly.
    pub fn warm_up(&self, sources: &[&str]) -> usize {
        sources.iter().filter(|source| self.parse(source).is_ok()).count()
    }

    /// Install commands, constants, and function handlers, then flush
    /// every cache layer.
    pub fn install_extension(&self, extension: MathExtension) {
        extension.install();
        // Handler semantics may have changed; cached trees and results
        // could be stale
        self.caches.clear_all();
    }

    pub fn clear_caches(&self) {
        self.caches.clear_all();
    }

    pub fn clear_parse_cache(&self) {
        self.caches.clear_parse();
    }

    pub fn clear_eval_cache(&self) {
        self.caches.clear_eval();
    }

    pub fn clear_derivative_cache(&self) {
        self.caches.clear_derivative();
    }

    pub fn clear_subexpression_cache(&self) {
        self.caches.clear_subexpr();
    }

    pub fn cache_stats(&self) -> CacheManagerStats {
        self.caches.stats()
    }
}
