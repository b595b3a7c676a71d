use std::time::Duration;

use crate::error::ConfigLoadError;

/// Parse a boolean value from a raw string, accepting common env-style forms.
///
/// Accepted truthy values (case-insensitive): `"1"`, `"true"`, `"yes"`, `"on"`.
/// Accepted falsy values: `"0"`, `"false"`, `"no"`, `"off"`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Humantime duration such as `"5m"` or `"90s"`.
pub fn parse_duration(key: &'static str, raw: &str) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| ConfigLoadError::InvalidDuration {
        key,
        value: raw.to_string(),
        source,
    })
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools_accept_env_spellings() {
        assert_eq!(parse_bool(" YES "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn durations_use_humantime() {
        assert_eq!(
            parse_duration("SPEC_CACHE_TTL", "5m").unwrap(),
            Duration::from_secs(300)
        );
        assert!(matches!(
            parse_duration("SPEC_CACHE_TTL", "soon"),
            Err(ConfigLoadError::InvalidDuration {
                key: "SPEC_CACHE_TTL",
                ..
            })
        ));
    }
}
