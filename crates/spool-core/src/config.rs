//! Environment-variable helpers shared by the per-crate `from_env()` loaders.
//!
//! Business logic never reads the environment. Each configuration struct
//! exposes a `from_env()` constructor built on these helpers, and services
//! call it once at startup.

use std::str::FromStr;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(String),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Raw value of `var`, treating blank values as unset.
pub fn env_opt(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Raw value of `var`, or [`ConfigError::Missing`].
pub fn env_required(var: &str) -> Result<String, ConfigError> {
    env_opt(var).ok_or_else(|| ConfigError::Missing(var.to_string()))
}

/// Parse `var` if set, else return `default`. A set but unparseable value
/// is an error rather than a silent default.
pub fn env_parse<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: var.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Comma-separated list from `var`, or `default` when unset.
pub fn env_list(var: &str, default: &[&str]) -> Vec<String> {
    match env_opt(var) {
        None => default.iter().map(|s| s.to_string()).collect(),
        Some(raw) => split_list(&raw),
    }
}

/// Split `"a, b,,c"` into `["a", "b", "c"]`.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `"key=value,key=value"` pairs.
pub fn split_pairs(var: &str, raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
            _ => Err(ConfigError::Invalid {
                var: var.to_string(),
                reason: format!("expected key=value, got {pair:?}"),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_uses_default_when_var_absent() {
        assert_eq!(env_parse("SPOOL_TEST_ABSENT_51234", 30u64).unwrap(), 30);
    }

    #[test]
    fn env_parse_rejects_garbage() {
        std::env::set_var("SPOOL_TEST_BAD_NUMBER", "thirty");
        let result = env_parse("SPOOL_TEST_BAD_NUMBER", 30u64);
        std::env::remove_var("SPOOL_TEST_BAD_NUMBER");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn env_required_treats_blank_as_missing() {
        std::env::set_var("SPOOL_TEST_BLANK", "   ");
        let result = env_required("SPOOL_TEST_BLANK");
        std::env::remove_var("SPOOL_TEST_BLANK");
        assert_eq!(result, Err(ConfigError::Missing("SPOOL_TEST_BLANK".into())));
    }

    #[test]
    fn split_list_drops_empty_items() {
        assert_eq!(split_list("ethereum, polygon,,"), vec!["ethereum", "polygon"]);
    }

    #[test]
    fn split_pairs_parses_and_rejects() {
        let pairs = split_pairs("X", "kyc-tier=kyc, shield = shield_v2").unwrap();
        assert_eq!(pairs[1], ("shield".to_string(), "shield_v2".to_string()));
        assert!(split_pairs("X", "kyc-tier").is_err());
    }
}
