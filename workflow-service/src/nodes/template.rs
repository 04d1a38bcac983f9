// Template Node
// Fills {{token}} placeholders from the input and the variable store

use crate::error::HandlerError;
use crate::execution::context::VariableStore;
use crate::expression::compare::to_display;
use crate::expression::resolve_path;
use crate::parser::models::Node;

use serde_json::{json, Value};

pub fn render(node: &Node, input: &Value, variables: &VariableStore) -> Result<Value, HandlerError> {
    let template = node
        .config_str("template")
        .ok_or_else(|| HandlerError::missing("template"))?;

    let result = substitute(template, |token| {
        let value = match token.strip_prefix('$') {
            Some(name) => variables.get(name),
            None => resolve_path(input, token),
        };
        value.filter(|v| !v.is_null()).map(to_display)
    });

    Ok(json!({
        "result": result,
        "input": input,
    }))
}

/// Replace each `{{token}}` whose body is non-empty and free of `}`.
///
/// `lookup` receives the trimmed token. Tokens it cannot resolve stay in the
/// output exactly as written.
pub fn substitute<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let body_len = after.find('}').unwrap_or(0);
        if body_len > 0 && after[body_len..].starts_with("}}") {
            let raw = &rest[start..start + 2 + body_len + 2];
            let token = after[..body_len].trim();
            match lookup(token) {
                Some(text) => out.push_str(&text),
                None => out.push_str(raw),
            }
            rest = &after[body_len + 2..];
        } else {
            // Not a placeholder here; emit one brace and rescan
            out.push('{');
            rest = &rest[start + 1..];
        }
    }

    out.push_str(rest);
    out
}
