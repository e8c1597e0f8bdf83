//! The four-layer cache manager.

use std::sync::Arc;
use std::time::Duration;

use latex_ast::Expr;
use latex_numeric::Value;
use tracing::debug;

use crate::{CacheStats, EvictionPolicy, LayerConfig, MathCache};

/// Sizing and policy for all four layers.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// L1: source string to parsed tree
    pub l1_size: usize,
    /// L2: (tree, environment) to result
    pub l2_size: usize,
    /// L3: (tree, variable, order) to derivative tree
    pub l3_size: usize,
    /// L4: sub-expression hash to scalar
    pub l4_size: usize,
    pub policy: EvictionPolicy,
    pub ttl: Option<Duration>,
    pub collect_stats: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            l1_size: 128,
            l2_size: 512,
            l3_size: 128,
            l4_size: 1024,
            policy: EvictionPolicy::Lru,
            ttl: None,
            collect_stats: false,
        }
    }
}

impl CacheSettings {
    /// Every layer off.
    pub fn disabled() -> Self {
        Self { l1_size: 0, l2_size: 0, l3_size: 0, l4_size: 0, ..Default::default() }
    }

    /// Large layers, no statistics overhead.
    pub fn high_performance() -> Self {
        Self {
            l1_size: 1024,
            l2_size: 4096,
            l3_size: 512,
            l4_size: 8192,
            ..Default::default()
        }
    }

    /// Default sizes with counters enabled.
    pub fn with_statistics() -> Self {
        Self { collect_stats: true, ..Default::default() }
    }

    fn layer(&self, capacity: usize, policy: EvictionPolicy) -> LayerConfig {
        LayerConfig { capacity, policy, ttl: self.ttl, collect_stats: self.collect_stats }
    }
}

/// L2 key: the tree plus a stable hash of the environment's sorted
/// entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvalKey {
    pub tree: Arc<Expr>,
    pub env_hash: u64,
}

/// L3 key: the tree, the differentiation variable, and the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivativeKey {
    pub tree: Arc<Expr>,
    pub var: String,
    pub order: u32,
}

/// Statistics snapshot across all four layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheManagerStats {
    pub parse: CacheStats,
    pub eval: CacheStats,
    pub derivative: CacheStats,
    pub subexpression: CacheStats,
}

impl CacheManagerStats {
    pub fn combined(&self) -> CacheStats {
        self.parse
            .merged(self.eval)
            .merged(self.derivative)
            .merged(self.subexpression)
    }
}

/// The engine's cache layers, one manager per engine instance.
pub struct CacheManager {
    parse: MathCache<String, Arc<Expr>>,
    eval: MathCache<EvalKey, Value>,
    derivative: MathCache<DerivativeKey, Arc<Expr>>,
    subexpression: MathCache<u64, f64>,
}

impl CacheManager {
    pub fn new(settings: &CacheSettings) -> Self {
        CacheManager {
            parse: MathCache::new(settings.layer(settings.l1_size, settings.policy)),
            eval: MathCache::new(settings.layer(settings.l2_size, settings.policy)),
            derivative: MathCache::new(settings.layer(settings.l3_size, settings.policy)),
            // The hot-subexpression layer is frequency-driven by design of
            // its workload: always LFU
            subexpression: MathCache::new(settings.layer(settings.l4_size, EvictionPolicy::Lfu)),
        }
    }

    // ===== L1: parse =====

    pub fn lookup_parse(&self, source: &str) -> Option<Arc<Expr>> {
        self.parse.get(&source.to_string())
    }

    pub fn store_parse(&self, source: &str, tree: Arc<Expr>) {
        self.parse.insert(source.to_string(), tree);
    }

    // ===== L2: evaluate =====

    pub fn lookup_eval(&self, key: &EvalKey) -> Option<Value> {
        self.eval.get(key)
    }

    pub fn store_eval(&self, key: EvalKey, value: Value) {
        self.eval.insert(key, value);
    }

    // ===== L3: differentiate =====

    pub fn lookup_derivative(&self, key: &DerivativeKey) -> Option<Arc<Expr>> {
        self.derivative.get(key)
    }

    pub fn store_derivative(&self, key: DerivativeKey, tree: Arc<Expr>) {
        self.derivative.insert(key, tree);
    }

    // ===== L4: sub-expressions =====

    pub fn subexpr_enabled(&self) -> bool {
        self.subexpression.is_enabled()
    }

    pub fn lookup_subexpr(&self, key: u64) -> Option<f64> {
        self.subexpression.get(&key)
    }

    pub fn store_subexpr(&self, key: u64, value: f64) {
        self.subexpression.insert(key, value);
    }

    // ===== Maintenance =====

    pub fn clear_parse(&self) {
        self.parse.clear();
    }

    pub fn clear_eval(&self) {
        self.eval.clear();
    }

    pub fn clear_derivative(&self) {
        self.derivative.clear();
    }

    pub fn clear_subexpr(&self) {
        self.subexpression.clear();
    }

    /// Flush every layer. Required when extensions change handler
    /// semantics; cached results may no longer be valid.
    pub fn clear_all(&self) {
        debug!("flushing all cache layers");
        self.clear_parse();
        self.clear_eval();
        self.clear_derivative();
        self.clear_subexpr();
    }

    pub fn stats(&self) -> CacheManagerStats {
        CacheManagerStats {
            parse: self.parse.stats(),
            eval: self.eval.stats(),
            derivative: self.derivative.stats(),
            subexpression: self.subexpression.stats(),
        }
    }
}
