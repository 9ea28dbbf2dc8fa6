//! Application settings, locals, and view engines shared with handlers.
//!
//! Handlers reach the context through the `Extension<AppContext>` extractor.
//! Everything lives in concurrent maps so settings can change while the
//! server is running.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::error::{AdapterError, AdapterResult};
use crate::views::{MiniJinjaEngine, ViewEngine};

/// Setting holding the views directory (string or array of strings).
pub const SETTING_VIEWS: &str = "views";
/// Setting holding the default template extension.
pub const SETTING_VIEW_ENGINE: &str = "view engine";
/// Setting that makes `X-Forwarded-Host` authoritative for hostnames.
pub const SETTING_TRUST_PROXY: &str = "trust proxy";

#[derive(Default)]
struct ContextInner {
    settings: DashMap<String, Value>,
    locals: DashMap<String, Value>,
    engines: DashMap<String, Arc<dyn ViewEngine>>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext {
    /// Create a context with the `minijinja` engine registered for `html` and `jinja`.
    pub fn new() -> Self {
        let context = Self {
            inner: Arc::new(ContextInner::default()),
        };
        context.register_engine("html", Arc::new(MiniJinjaEngine));
        context.register_engine("jinja", Arc::new(MiniJinjaEngine));
        context
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.settings.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.settings.get(key).map(|v| v.value().clone())
    }

    pub fn enable(&self, key: impl Into<String>) {
        self.set(key, Value::Bool(true));
    }

    pub fn disable(&self, key: impl Into<String>) {
        self.set(key, Value::Bool(false));
    }

    /// True when the setting holds a truthy value.
    pub fn enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| is_truthy(&v))
    }

    pub fn set_local(&self, key: impl Into<String>, value: Value) {
        self.inner.locals.insert(key.into(), value);
    }

    pub fn local(&self, key: &str) -> Option<Value> {
        self.inner.locals.get(key).map(|v| v.value().clone())
    }

    /// Snapshot of all locals.
    pub fn locals(&self) -> Map<String, Value> {
        self.inner
            .locals
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn register_engine(&self, ext: impl Into<String>, engine: Arc<dyn ViewEngine>) {
        let ext = ext.into();
        let ext = ext.trim_start_matches('.').to_string();
        self.inner.engines.insert(ext, engine);
    }

    /// Render a view with locals merged under `context`.
    pub fn render(&self, view: &str, context: &Value) -> AdapterResult<String> {
        let dirs = self.views_dirs();
        if dirs.is_empty() {
            return Err(AdapterError::ViewsNotConfigured);
        }

        let (template, ext) = match Path::new(view).extension().and_then(|e| e.to_str()) {
            Some(ext) => (view.to_string(), ext.to_string()),
            None => {
                let ext = self
                    .get(SETTING_VIEW_ENGINE)
                    .and_then(|v| v.as_str().map(|s| s.trim_start_matches('.').to_string()))
                    .ok_or_else(|| AdapterError::UnknownViewEngine(String::new()))?;
                (format!("{view}.{ext}"), ext)
            }
        };

        let engine = self
            .inner
            .engines
            .get(&ext)
            .map(|e| e.value().clone())
            .ok_or_else(|| AdapterError::UnknownViewEngine(ext.clone()))?;

        // First directory containing the template wins.
        let dir = dirs
            .iter()
            .find(|dir| dir.join(&template).is_file())
            .unwrap_or(&dirs[0]);

        let merged = self.merge_locals(context);
        engine.render(dir, &template, &merged)
    }

    fn views_dirs(&self) -> Vec<PathBuf> {
        match self.get(SETTING_VIEWS) {
            Some(Value::String(dir)) => vec![PathBuf::from(dir)],
            Some(Value::Array(dirs)) => dirs
                .iter()
                .filter_map(|d| d.as_str().map(PathBuf::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn merge_locals(&self, context: &Value) -> Value {
        match context {
            Value::Object(fields) => {
                let mut merged = self.locals();
                for (k, v) in fields {
                    merged.insert(k.clone(), v.clone());
                }
                Value::Object(merged)
            }
            Value::Null => Value::Object(self.locals()),
            other => other.clone(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
