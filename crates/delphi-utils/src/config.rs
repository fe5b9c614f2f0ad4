//! Environment configuration helpers
//!
//! Configuration is read once at startup. Unset and blank variables are
//! treated the same way, so `NEWS_API_KEY=` in a `.env` file disables the
//! component just like leaving it out.

use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading typed environment values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// The variable is set but does not parse as the expected type
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

/// Load a `.env` file from the working directory if one exists
///
/// Returns `true` when a file was found and applied. Variables already
/// present in the process environment are not overridden.
pub fn load_dotenv() -> bool {
    dotenv::dotenv().is_ok()
}

/// Read a variable, treating blank values as unset
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a variable or fall back to a default
pub fn env_or(name: &str, default: &str) -> String {
    env_var(name).unwrap_or_else(|| default.to_string())
}

/// Read and parse a variable; `Ok(None)` when unset
pub fn env_parse<T>(name: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(name)
        .map(|value| {
            value.parse::<T>().map_err(|e| EnvError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_blank_is_unset() {
        // SAFETY: test-local env mutation, variable names unique to this test
        unsafe {
            std::env::set_var("DELPHI_UTILS_TEST_BLANK", "   ");
            std::env::set_var("DELPHI_UTILS_TEST_SET", " value ");
        }

        assert_eq!(env_var("DELPHI_UTILS_TEST_BLANK"), None);
        assert_eq!(env_var("DELPHI_UTILS_TEST_SET"), Some("value".to_string()));
        assert_eq!(env_or("DELPHI_UTILS_TEST_MISSING", "fallback"), "fallback");

        unsafe {
            std::env::remove_var("DELPHI_UTILS_TEST_BLANK");
            std::env::remove_var("DELPHI_UTILS_TEST_SET");
        }
    }

    #[test]
    fn test_env_parse() {
        unsafe {
            std::env::set_var("DELPHI_UTILS_TEST_PORT", "8080");
            std::env::set_var("DELPHI_UTILS_TEST_BAD_PORT", "eighty");
        }

        assert_eq!(env_parse::<u16>("DELPHI_UTILS_TEST_PORT"), Ok(Some(8080)));
        assert_eq!(env_parse::<u16>("DELPHI_UTILS_TEST_UNSET_PORT"), Ok(None));

        let err = env_parse::<u16>("DELPHI_UTILS_TEST_BAD_PORT").unwrap_err();
        assert!(err.to_string().contains("DELPHI_UTILS_TEST_BAD_PORT"));

        unsafe {
            std::env::remove_var("DELPHI_UTILS_TEST_PORT");
            std::env::remove_var("DELPHI_UTILS_TEST_BAD_PORT");
        }
    }
}
