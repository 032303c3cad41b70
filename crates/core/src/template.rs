// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource unit expression rendering and the unresolved-expression check

use crate::error::ConstraintError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// Regex pattern for {variable_name} and <+variable.path>
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_.]*)\}|<\+([a-zA-Z_][a-zA-Z0-9_.]*)>")
        .expect("constant regex pattern is valid")
});

// Regex pattern for ${VAR:-default} environment variable expansion
#[allow(clippy::expect_used)]
static ENV_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+):-([^}]*)\}").expect("constant regex pattern is valid"));

// Anything that still looks like an expression after rendering
#[allow(clippy::expect_used)]
static UNRESOLVED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\+[^>]*>|\$\{[^}]*\}|\{[a-zA-Z_][a-zA-Z0-9_.]*\}")
        .expect("constant regex pattern is valid")
});

/// Interpolate `{name}` and `<+name>` placeholders with values from the vars map
///
/// Also expands `${VAR:-default}` patterns from environment variables first.
/// Unknown variables are left as-is so the unresolved check can catch them.
pub fn interpolate(template: &str, vars: &HashMap<String, String>) -> String {
    let result = ENV_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = &caps[2];
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .to_string();

    VAR_PATTERN
        .replace_all(&result, |caps: &regex::Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            vars.get(name)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}

/// Expression fragments still present in `value`
pub fn unresolved_expressions(value: &str) -> Vec<String> {
    UNRESOLVED_PATTERN
        .find_iter(value)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Fail if a rendered resource unit still carries expression syntax
pub fn ensure_resolved(unit: &str) -> Result<(), ConstraintError> {
    if unit.trim().is_empty() {
        return Err(ConstraintError::InvalidRequest(
            "resource unit must not be empty".to_string(),
        ));
    }
    let leftover = unresolved_expressions(unit);
    if !leftover.is_empty() {
        return Err(ConstraintError::InvalidRequest(format!(
            "resource unit {unit} contains unresolved expressions: {}",
            leftover.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
