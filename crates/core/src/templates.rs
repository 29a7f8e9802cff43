//! Message template rendering using `{{variable}}` syntax.

use regex::{Captures, Regex};
use std::collections::HashMap;

/// Render a campaign message for one recipient.
///
/// Every `{{ key }}` placeholder (whitespace inside the braces is optional)
/// whose key appears in `variables` is replaced by its value. Keys are
/// matched literally and case-sensitively; placeholders with unknown keys are
/// left as they are. Substitution is a single pass over the template, so a
/// value that itself contains `{{...}}` is never expanded again.
pub fn render_template(template: &str, variables: Option<&HashMap<String, String>>) -> String {
    let variables = match variables {
        Some(vars) if !vars.is_empty() => vars,
        _ => return template.to_string(),
    };

    // Longest keys first keeps the alternation independent of map order.
    let mut keys: Vec<&str> = variables.keys().map(String::as_str).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"\{{\{{\s*({alternation})\s*\}}\}}");

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(error = %e, "template placeholder pattern rejected, rendering verbatim");
            return template.to_string();
        }
    };

    re.replace_all(template, |caps: &Captures<'_>| {
        variables
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}
