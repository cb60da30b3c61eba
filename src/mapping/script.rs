//! The scripting hook behind the `custom` function.
//!
//! Rule documents can carry small scripts, either as a `custom` condition
//! (script source in the condition's `value`) or as a `custom` subfield
//! split. Scripts see two variables: `value`, the current working value, and
//! `params`, the condition's parameter bag as a map.
//!
//! [`ValueTransform`] is the seam; [`RhaiTransform`] is the default
//! implementation, backed by the [`rhai`] engine. Compiled scripts are kept
//! in a [`ScriptCache`] keyed by the SHA-256 of their source, so each
//! distinct script is compiled once for the lifetime of the transform.
//!
//! ```
//! use marc_rules::mapping::script::{RhaiTransform, ScriptValue, ValueTransform};
//! use marc_rules::mapping::{MapperConfig, Parameters};
//!
//! let transform = RhaiTransform::new(&MapperConfig::default());
//! let out = transform
//!     .evaluate("value.to_upper()", "dune", &Parameters::new())
//!     .unwrap();
//! assert_eq!(out, ScriptValue::Text("DUNE".to_string()));
//! assert_eq!(transform.cache().len(), 1);
//! ```

use super::config::MapperConfig;
use super::rules::Parameters;
use crate::error::{MarcError, Result};
use rhai::{Dynamic, Engine, Scope, AST};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Result of one script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    /// A single string
    Text(String),
    /// A list of strings, as returned by split scripts
    List(Vec<String>),
}

impl ScriptValue {
    /// Collapse to one string; list items are joined with a space.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            ScriptValue::Text(text) => text,
            ScriptValue::List(items) => items.join(" "),
        }
    }

    /// Expand to a list; a single string becomes a one-item list.
    #[must_use]
    pub fn into_list(self) -> Vec<String> {
        match self {
            ScriptValue::Text(text) => vec![text],
            ScriptValue::List(items) => items,
        }
    }
}

/// A pluggable value transform evaluating script source against one value.
pub trait ValueTransform: Send + Sync {
    /// Run `source` with `value` and `params` in scope.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Script`] when the source does not compile, the
    /// run fails or exceeds its limits.
    fn evaluate(&self, source: &str, value: &str, params: &Parameters) -> Result<ScriptValue>;
}

type ScriptKey = [u8; 32];

/// Compiled scripts keyed by the SHA-256 of their source.
///
/// Entries are computed once per key and never evicted; [`ScriptCache::clear`]
/// is the only way to release them.
#[derive(Debug, Default)]
pub struct ScriptCache {
    entries: RwLock<HashMap<ScriptKey, Arc<AST>>>,
}

impl ScriptCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compiled scripts held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every compiled script.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Fetch the compiled form of `source`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the error from `compile`; failures are not cached.
    pub fn get_or_compile(
        &self,
        source: &str,
        compile: impl FnOnce(&str) -> Result<AST>,
    ) -> Result<Arc<AST>> {
        let key: ScriptKey = Sha256::digest(source.as_bytes()).into();

        if let Some(ast) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(ast));
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(ast) = entries.get(&key) {
            return Ok(Arc::clone(ast));
        }
        let ast = Arc::new(compile(source)?);
        entries.insert(key, Arc::clone(&ast));
        Ok(ast)
    }
}

/// [`ValueTransform`] backed by an embedded `rhai` engine.
pub struct RhaiTransform {
    engine: Engine,
    cache: ScriptCache,
}

impl std::fmt::Debug for RhaiTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhaiTransform")
            .field("cached_scripts", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl RhaiTransform {
    /// Engine with the limits from `config`.
    #[must_use]
    pub fn new(config: &MapperConfig) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(config.script_max_operations);
        engine.set_max_string_size(config.script_max_string_size);
        RhaiTransform {
            engine,
            cache: ScriptCache::new(),
        }
    }

    /// The compiled-script cache.
    #[must_use]
    pub fn cache(&self) -> &ScriptCache {
        &self.cache
    }
}

impl ValueTransform for RhaiTransform {
    fn evaluate(&self, source: &str, value: &str, params: &Parameters) -> Result<ScriptValue> {
        let ast = self.cache.get_or_compile(source, |text| {
            self.engine
                .compile(text)
                .map_err(|e| MarcError::Script(format!("compile: {e}")))
        })?;

        let mut scope = Scope::new();
        scope.push("value", value.to_string());
        scope.push("params", params_to_map(params));

        let result: Dynamic = self
            .engine
            .eval_ast_with_scope(&mut scope, &ast)
            .map_err(|e| MarcError::Script(e.to_string()))?;
        Ok(from_dynamic(result))
    }
}

fn params_to_map(params: &Parameters) -> rhai::Map {
    params
        .iter()
        .map(|(key, value)| (key.as_str().into(), json_to_dynamic(value)))
        .collect()
}

fn json_to_dynamic(value: &serde_json::Value) -> Dynamic {
    match value {
        serde_json::Value::Null => Dynamic::UNIT,
        serde_json::Value::Bool(b) => Dynamic::from(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Dynamic::from(i),
            None => Dynamic::from(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Dynamic::from(s.clone()),
        serde_json::Value::Array(items) => {
            Dynamic::from_array(items.iter().map(json_to_dynamic).collect())
        },
        serde_json::Value::Object(_) => Dynamic::from(value.to_string()),
    }
}

fn from_dynamic(result: Dynamic) -> ScriptValue {
    if result.is_unit() {
        return ScriptValue::Text(String::new());
    }
    if result.is_array() {
        let items = result
            .into_array()
            .unwrap_or_default()
            .into_iter()
            .map(dynamic_text)
            .collect();
        return ScriptValue::List(items);
    }
    ScriptValue::Text(dynamic_text(result))
}

fn dynamic_text(value: Dynamic) -> String {
    if value.is_string() {
        value.into_string().unwrap_or_default()
    } else if value.is_unit() {
        String::new()
    } else {
        value.to_string()
    }
}
