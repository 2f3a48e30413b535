//! Flat key/value message templates.
//!
//! Templates use `{{.key}}` (or `{{key}}`) placeholders. Values come from a flat
//! JSON object; strings are inserted verbatim, everything else via its JSON
//! representation.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Map;
pub use serde_json::Value;

use crate::{Error, Result};

/// Render context: a flat mapping from placeholder name to value.
pub type Context = Map<String, Value>;

/// Build a [`Context`] from `key => value` pairs.
#[macro_export]
macro_rules! context {
    () => {
        $crate::template::Context::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut ctx = $crate::template::Context::new();
        $(ctx.insert(($key).to_string(), $crate::template::Value::from($value));)+
        ctx
    }};
}

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, ctx: &Context) -> Result<String>;
}

/// Regex-backed `{{.key}}` substitution.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderRenderer;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex")
    })
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, ctx: &Context) -> Result<String> {
        let mut missing: Option<String> = None;
        let out = placeholder_re().replace_all(template, |caps: &Captures<'_>| {
            let key = &caps[1];
            match ctx.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) => String::new(),
                Some(v) => v.to_string(),
                None => {
                    missing.get_or_insert_with(|| key.to_string());
                    String::new()
                }
            }
        });

        if let Some(key) = missing {
            return Err(Error::Template(format!("unknown key `{key}`")));
        }
        Ok(out.into_owned())
    }
}
