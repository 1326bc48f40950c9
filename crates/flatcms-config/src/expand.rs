//! Environment variable expansion for configuration strings.

use std::env::VarError;

use crate::ConfigError;

/// Expand `${VAR}` references in a configuration value.
///
/// `${VAR}` errors when VAR is unset; `${VAR:-default}` falls back to the
/// default instead. Bare `$VAR` (no braces) passes through verbatim, so
/// literal tokens containing a dollar sign survive. Values without a
/// `${` pattern are returned unchanged.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| std::env::var(var).map(Some))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: match e.cause {
                VarError::NotPresent => format!("${{{}}} is not set", e.var_name),
                VarError::NotUnicode(_) => {
                    format!("${{{}}} is not valid unicode", e.var_name)
                }
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("FLATCMS_TEST_TOKEN", "tok123");
        }
        let result = expand_env("${FLATCMS_TEST_TOKEN}", "github.token").unwrap();
        assert_eq!(result, "tok123");
        unsafe {
            std::env::remove_var("FLATCMS_TEST_TOKEN");
        }
    }

    #[test]
    fn test_expand_inside_larger_value() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("FLATCMS_TEST_OWNER", "acme");
        }
        let result = expand_env("prefix-${FLATCMS_TEST_OWNER}-suffix", "github.token").unwrap();
        assert_eq!(result, "prefix-acme-suffix");
        unsafe {
            std::env::remove_var("FLATCMS_TEST_OWNER");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FLATCMS_UNSET_VAR");
        }
        let result = expand_env("${FLATCMS_UNSET_VAR:-fallback}", "github.token").unwrap();
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FLATCMS_MISSING_VAR");
        }
        let err = expand_env("${FLATCMS_MISSING_VAR}", "github.token").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("FLATCMS_MISSING_VAR"));
        assert!(err.to_string().contains("github.token"));
    }

    #[test]
    fn test_expand_literal_unchanged() {
        let result = expand_env("ghp_literal_token", "github.token").unwrap();
        assert_eq!(result, "ghp_literal_token");
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("$VAR", "github.token").unwrap();
        assert_eq!(result, "$VAR");
    }
}
