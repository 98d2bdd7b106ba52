use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::env;
use tracing::{debug, warn};

const PLACEHOLDER_PATTERN: &str = r"\$\{(\w+)\}|\$([A-Za-z_]\w*)";

fn placeholder_regex() -> Result<Regex> {
    Regex::new(PLACEHOLDER_PATTERN).context("Invalid placeholder pattern")
}

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
///
/// Unset variables keep their placeholder so validation can report them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = placeholder_regex()?;
    let mut missing_vars = Vec::new();

    let result = re.replace_all(content, |caps: &Captures| {
        let placeholder = &caps[0];
        let Some(var_name) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            return placeholder.to_string();
        };
        match env::var(var_name) {
            Ok(value) => {
                debug!(var = var_name, "Substituting environment variable");
                value
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name);
                missing_vars.push(var_name.to_string());
                placeholder.to_string()
            }
        }
    });
    let result = result.into_owned();

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (may use defaults or fail validation): {:?}",
            missing_vars
        );
    }

    Ok(result)
}

/// Names of the placeholders still present in `content`
pub fn unresolved_env_vars(content: &str) -> Result<Vec<String>> {
    let re = placeholder_regex()?;
    Ok(re
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_both_forms() {
        env::set_var("FAIRVAL_TEST_SCORING_HOST", "scoring.internal");
        env::set_var("FAIRVAL_TEST_SCORING_PORT", "8100");

        let out = substitute_env_vars(
            "base_url: http://${FAIRVAL_TEST_SCORING_HOST}:$FAIRVAL_TEST_SCORING_PORT",
        )
        .unwrap();
        assert_eq!(out, "base_url: http://scoring.internal:8100");
    }

    #[test]
    fn test_missing_vars_keep_placeholder() {
        let input = "path: ${FAIRVAL_TEST_DEFINITELY_UNSET}/out.json";
        let out = substitute_env_vars(input).unwrap();
        assert_eq!(out, input);
        assert_eq!(
            unresolved_env_vars(&out).unwrap(),
            vec!["FAIRVAL_TEST_DEFINITELY_UNSET"]
        );
    }

    #[test]
    fn test_dollar_amounts_are_not_placeholders() {
        assert!(unresolved_env_vars("note: costs $5").unwrap().is_empty());
    }
}
