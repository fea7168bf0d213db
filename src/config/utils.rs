//! Helpers for reading typed values from environment variables.

use std::env;
use std::str::FromStr;

/// Read a non-empty, trimmed environment variable.
pub(crate) fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable, returning `Ok(None)` when it is unset.
///
/// # Errors
/// Returns a message naming the variable when the value does not parse.
pub(crate) fn env_parse<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: '{raw}' ({e})")),
        None => Ok(None),
    }
}

/// Parse a boolean flag. Accepts true/false, 1/0, yes/no and on/off.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean environment variable.
pub(crate) fn env_bool(name: &str) -> Result<Option<bool>, String> {
    match env_string(name) {
        Some(raw) => parse_bool(&raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid boolean for {name}: '{raw}'")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" YES "), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    #[serial]
    fn test_env_parse() {
        unsafe {
            env::set_var("TILAWA_TEST_NUMBER", " 42 ");
            env::set_var("TILAWA_TEST_BAD", "forty");
            env::remove_var("TILAWA_TEST_MISSING");
        }

        assert_eq!(env_parse::<u16>("TILAWA_TEST_NUMBER").unwrap(), Some(42));
        assert_eq!(env_parse::<u16>("TILAWA_TEST_MISSING").unwrap(), None);

        let err = env_parse::<u16>("TILAWA_TEST_BAD").unwrap_err();
        assert!(err.contains("TILAWA_TEST_BAD"));

        unsafe {
            env::remove_var("TILAWA_TEST_NUMBER");
            env::remove_var("TILAWA_TEST_BAD");
        }
    }

    #[test]
    #[serial]
    fn test_env_string_ignores_blank() {
        unsafe {
            env::set_var("TILAWA_TEST_BLANK", "   ");
        }
        assert_eq!(env_string("TILAWA_TEST_BLANK"), None);
        unsafe {
            env::remove_var("TILAWA_TEST_BLANK");
        }
    }
}
