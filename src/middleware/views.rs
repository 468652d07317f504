//! Minimal HTML templates for `Response::render`.
//!
//! Supported syntax:
//! - `{{ path.to.value }}` substitutes an HTML-escaped value
//! - `{{{ path }}}` substitutes the raw value
//! - `{{#each list}} ... {{/each}}` repeats its body per element; lookups
//!   inside the body resolve against the element first, then the root.
//!   `{{ this }}` is the element itself. Blocks do not nest.

use serde_json::Value;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed tag starting at byte {0}")]
    UnclosedTag(usize),

    #[error("unclosed each block for `{0}`")]
    UnclosedBlock(String),
}

/// Resolve `<views_dir>/<name>.html`.
pub fn view_path(views_dir: &Path, name: &str) -> std::path::PathBuf {
    views_dir.join(format!("{name}.html"))
}

/// Render `src` against `data`.
pub fn render_template(src: &str, data: &Value) -> Result<String, TemplateError> {
    render_scoped(src, &[data])
}

fn render_scoped(src: &str, scopes: &[&Value]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let offset = src.len() - rest.len() + start;
        let tag = &rest[start..];

        if let Some(inner) = tag.strip_prefix("{{{") {
            let end = inner.find("}}}").ok_or(TemplateError::UnclosedTag(offset))?;
            if let Some(value) = lookup(scopes, inner[..end].trim()) {
                out.push_str(&stringify(value));
            }
            rest = &inner[end + 3..];
        } else if let Some(inner) = tag.strip_prefix("{{#each") {
            let end = inner.find("}}").ok_or(TemplateError::UnclosedTag(offset))?;
            let name = inner[..end].trim();
            let after_open = &inner[end + 2..];
            let close = after_open
                .find("{{/each}}")
                .ok_or_else(|| TemplateError::UnclosedBlock(name.to_string()))?;
            let body = &after_open[..close];

            if let Some(Value::Array(items)) = lookup(scopes, name) {
                for item in items {
                    let mut inner_scopes = Vec::with_capacity(scopes.len() + 1);
                    inner_scopes.push(item);
                    inner_scopes.extend_from_slice(scopes);
                    out.push_str(&render_scoped(body, &inner_scopes)?);
                }
            }
            rest = &after_open[close + "{{/each}}".len()..];
        } else {
            let inner = &tag[2..];
            let end = inner.find("}}").ok_or(TemplateError::UnclosedTag(offset))?;
            if let Some(value) = lookup(scopes, inner[..end].trim()) {
                out.push_str(&escape_html(&stringify(value)));
            }
            rest = &inner[end + 2..];
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn lookup<'v>(scopes: &[&'v Value], path: &str) -> Option<&'v Value> {
    if path == "this" || path == "." {
        return scopes.first().copied();
    }

    scopes.iter().find_map(|scope| {
        path.split('.')
            .try_fold(*scope, |value, key| match value {
                Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                other => other.get(key),
            })
    })
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escaped_and_raw_substitution() {
        let data = json!({ "title": "<b>Items</b>", "user": { "name": "ana" } });
        let out = render_template("<h1>{{ title }}</h1>{{{title}}} {{user.name}}", &data).unwrap();
        assert_eq!(out, "<h1>&lt;b&gt;Items&lt;/b&gt;</h1><b>Items</b> ana");
    }

    #[test]
    fn test_missing_values_render_empty() {
        let out = render_template("[{{ nope }}]", &json!({})).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_each_block_scopes() {
        let data = json!({
            "heading": "All",
            "items": [{ "name": "pen", "count": 2 }, { "name": "cup", "count": 0 }],
        });
        let out = render_template(
            "{{#each items}}<li>{{heading}}: {{name}} ({{count}})</li>{{/each}}",
            &data,
        )
        .unwrap();
        assert_eq!(out, "<li>All: pen (2)</li><li>All: cup (0)</li>");

        let out = render_template("{{#each tags}}{{this}},{{/each}}", &json!({ "tags": ["a", "b"] })).unwrap();
        assert_eq!(out, "a,b,");
    }

    #[test]
    fn test_malformed_templates() {
        assert!(matches!(
            render_template("{{ open", &json!({})),
            Err(TemplateError::UnclosedTag(0))
        ));
        assert!(matches!(
            render_template("{{#each xs}}never closed", &json!({})),
            Err(TemplateError::UnclosedBlock(name)) if name == "xs"
        ));
    }
}
