//! Template rendering.
//!
//! View engines are registered per file extension. The bundled engine wraps
//! `minijinja` and loads templates from the configured views directory.

use std::path::Path;

use minijinja::{path_loader, Environment};
use serde_json::Value;

use crate::error::{AdapterError, AdapterResult};

/// A template engine keyed by file extension.
pub trait ViewEngine: Send + Sync {
    /// Render `template` (relative to `views_dir`) with `context`.
    fn render(&self, views_dir: &Path, template: &str, context: &Value) -> AdapterResult<String>;
}

/// `minijinja` engine loading templates from disk on every render.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniJinjaEngine;

impl ViewEngine for MiniJinjaEngine {
    fn render(&self, views_dir: &Path, template: &str, context: &Value) -> AdapterResult<String> {
        let render_error = |e: minijinja::Error| AdapterError::Render {
            view: template.to_string(),
            reason: e.to_string(),
        };

        let mut env = Environment::new();
        env.set_loader(path_loader(views_dir));
        let tmpl = env.get_template(template).map_err(render_error)?;
        tmpl.render(context).map_err(render_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_render_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.html"), "Hello {{ name }}!").unwrap();

        let out = MiniJinjaEngine
            .render(dir.path(), "hello.html", &json!({"name": "adapter"}))
            .unwrap();
        assert_eq!(out, "Hello adapter!");
    }

    #[test]
    fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let err = MiniJinjaEngine
            .render(dir.path(), "nope.html", &json!({}))
            .unwrap_err();
        assert!(matches!(err, AdapterError::Render { .. }));
    }
}
