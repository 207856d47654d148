//! Declarative text rules for event summaries.
//!
//! Two ordered tables drive how summaries are decorated:
//!
//! - [`GlyphRule`]: case-insensitive keyword → glyph substitution applied to
//!   every summary
//! - [`AllDayCategory`]: all-day events whose summary contains one of the
//!   category triggers get the category glyph as a prefix plus a few text
//!   rewrites
//!
//! Both tables are plain data with serde support so new categories can be
//! added from `calendar-config.toml` without touching the layout code.

use serde::{Deserialize, Serialize};

/// Replace every case-insensitive occurrence of `keyword` with `glyph`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlyphRule {
    pub keyword: String,
    pub glyph: String,
}

/// Literal text rewrite applied to a summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rewrite {
    pub from: String,
    pub to: String,
}

/// A category of all-day events, recognised by trigger substrings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllDayCategory {
    pub name: String,
    /// Case-sensitive substrings; any one of them selects the category
    pub triggers: Vec<String>,
    pub glyph: String,
    #[serde(default)]
    pub rewrites: Vec<Rewrite>,
}

fn rule(keyword: &str, glyph: &str) -> GlyphRule {
    GlyphRule {
        keyword: keyword.to_string(),
        glyph: glyph.to_string(),
    }
}

fn rewrite(from: &str, to: &str) -> Rewrite {
    Rewrite {
        from: from.to_string(),
        to: to.to_string(),
    }
}

/// Built-in keyword table. Longer keywords come first so they win over
/// shorter keywords they contain.
pub fn default_glyph_rules() -> Vec<GlyphRule> {
    vec![rule("pádel", "🎾"), rule("padel", "🎾")]
}

/// Built-in all-day categories, checked in order.
pub fn default_all_day_categories() -> Vec<AllDayCategory> {
    vec![
        AllDayCategory {
            name: "birthday".to_string(),
            triggers: vec![" - Cumpleaños".to_string()],
            glyph: "🎁".to_string(),
            rewrites: vec![rewrite(" - Cumpleaños", "")],
        },
        AllDayCategory {
            name: "hospital".to_string(),
            triggers: vec![
                "Guardia".to_string(),
                "Pase de planta".to_string(),
                "Tarde".to_string(),
            ],
            glyph: "🏥".to_string(),
            rewrites: vec![rewrite("Pase de planta ", ""), rewrite("Residente", "Resi")],
        },
        AllDayCategory {
            name: "vacation".to_string(),
            triggers: vec!["Vacaciones".to_string()],
            glyph: "🏖️".to_string(),
            rewrites: vec![rewrite("Vacaciones ", "Vacas")],
        },
    ]
}

/// Apply every glyph rule, in table order.
pub fn apply_glyph_rules(text: &str, rules: &[GlyphRule]) -> String {
    rules.iter().fold(text.to_string(), |acc, rule| {
        replace_ignore_case(&acc, &rule.keyword, &rule.glyph)
    })
}

impl AllDayCategory {
    pub fn matches(&self, summary: &str) -> bool {
        self.triggers.iter().any(|t| summary.contains(t.as_str()))
    }

    /// `"<glyph> <summary with rewrites>"`
    pub fn decorate(&self, summary: &str) -> String {
        let body = self
            .rewrites
            .iter()
            .fold(summary.to_string(), |acc, r| acc.replace(&r.from, &r.to));
        format!("{} {}", self.glyph, body)
    }
}

/// First category whose triggers match, if any.
pub fn find_category<'a>(
    summary: &str,
    categories: &'a [AllDayCategory],
) -> Option<&'a AllDayCategory> {
    categories.iter().find(|c| c.matches(summary))
}

/// Case-insensitive replace that leaves the rest of the text untouched.
fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return haystack.to_string();
    }

    let mut out = String::with_capacity(haystack.len());
    let mut rest = haystack;
    while !rest.is_empty() {
        if let Some(len) = match_len(rest, &needle) {
            out.push_str(replacement);
            rest = &rest[len..];
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    out
}

/// Byte length of the prefix of `text` that lowercases to `needle`.
fn match_len(text: &str, needle: &[char]) -> Option<usize> {
    let mut pos = 0;
    let mut consumed = 0;
    for (idx, c) in text.char_indices() {
        for lower in c.to_lowercase() {
            if pos >= needle.len() || needle[pos] != lower {
                return None;
            }
            pos += 1;
        }
        if pos == needle.len() {
            consumed = idx + c.len_utf8();
            break;
        }
    }
    (pos == needle.len()).then_some(consumed)
}
