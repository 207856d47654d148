//! # Page Template Substitution
//!
//! Templates use shell-style placeholders:
//!
//! - `$name` or `${name}`: replaced by the fragment called `name`
//! - `$$`: a literal `$`
//! - any other `$` is copied as-is
//!
//! A placeholder without a fragment renders as the empty string, so optional
//! sections (weather, precipitation chart) simply disappear. Output depends
//! only on the template text and the fragments, never on map iteration order.

use crate::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Built-in calendar page, used when no template path is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/calendar_template.html");

/// Markup fragments keyed by placeholder name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragments(BTreeMap<String, String>);

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A page template held in memory.
#[derive(Clone, Debug)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(fs::read_to_string(path)?))
    }

    /// Template from `path`, or the built-in page when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Escape text for use inside element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fills templates with fragments.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateRenderer;

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Substitute every placeholder; unknown names become empty strings.
    pub fn render(&self, template: &Template, fragments: &Fragments) -> String {
        let src = template.source();
        let mut out = String::with_capacity(src.len() * 2);
        let mut rest = src;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
            } else if let Some(braced) = after.strip_prefix('{') {
                match braced.find('}') {
                    Some(end) if Self::is_ident(&braced[..end]) => {
                        out.push_str(fragments.get(&braced[..end]).unwrap_or(""));
                        rest = &braced[end + 1..];
                    }
                    _ => {
                        out.push('$');
                        rest = after;
                    }
                }
            } else if after.starts_with(is_ident_start) {
                let end = after.find(|c: char| !is_ident_char(c)).unwrap_or(after.len());
                out.push_str(fragments.get(&after[..end]).unwrap_or(""));
                rest = &after[end..];
            } else {
                out.push('$');
                rest = after;
            }
        }

        out.push_str(rest);
        out
    }

    fn is_ident(name: &str) -> bool {
        name.starts_with(is_ident_start) && name.chars().all(is_ident_char)
    }
}
