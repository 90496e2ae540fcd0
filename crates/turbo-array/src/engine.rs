//! The engine value: configuration plus the optional compiled-expression cache.

use crate::error::Result;
use crate::eval::Env;
use crate::expression::Expression;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Keep compiled expressions keyed by source text across calls.
    pub cache_expressions: bool,
    /// Upper bound on cached expressions; once reached, new ones are not cached.
    pub cache_capacity: usize,
    /// Tolerance for the structured `==` and `!=` operations. Expression
    /// comparisons are exact.
    pub equality_epsilon: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            cache_expressions: false,
            cache_capacity: 256,
            equality_epsilon: 1e-10,
        }
    }
}

/// Array transformation engine.
///
/// Construct one per process and share it by reference. All operations take
/// `&self`; the only shared state is the expression cache, which is disabled
/// unless [`EngineOptions::cache_expressions`] is set.
#[derive(Debug, Default)]
pub struct Engine {
    options: EngineOptions,
    cache: RwLock<HashMap<String, Arc<Expression>>>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Engine {
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compiles `source`, consulting the cache when enabled.
    pub fn compile(&self, source: &str) -> Result<Arc<Expression>> {
        if !self.options.cache_expressions {
            return Expression::compile(source).map(Arc::new);
        }

        if let Some(hit) = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(source).cloned())
        {
            debug!("expression cache hit: {source}");
            return Ok(hit);
        }

        let compiled = Arc::new(Expression::compile(source)?);
        debug!("compiled expression: {source}");
        if let Ok(mut cache) = self.cache.write() {
            if cache.len() < self.options.cache_capacity {
                cache.insert(source.to_string(), Arc::clone(&compiled));
            }
        }
        Ok(compiled)
    }

    /// Number of expressions currently cached.
    pub fn cached_expressions(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Evaluates a standalone expression against `env`.
    pub fn evaluate(&self, source: &str, env: &Env) -> Result<f64> {
        self.compile(source)?.eval(env)
    }
}
