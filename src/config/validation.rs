//! Per-field validation.
//!
//! Every configuration field is parsed and range-checked on its own, so one bad
//! value never invalidates its neighbours. `FieldReader` applies the
//! validate-or-default policy and collects the errors as warnings.

use super::error::{ConfigResult, ConfigurationError};
use std::collections::HashMap;
use tracing::warn;

/// Parse an unsigned integer and check it against an inclusive range
pub fn parse_ranged_u64(field: &str, raw: &str, min: u64, max: u64) -> ConfigResult<u64> {
    let trimmed = raw.trim();
    let value: i128 = trimmed.parse().map_err(|_| {
        ConfigurationError::invalid_value(field, raw, "expected an integer")
    })?;

    if value < i128::from(min) || value > i128::from(max) {
        return Err(ConfigurationError::out_of_range(field, trimmed, min, max));
    }

    // In range implies it fits
    Ok(value as u64)
}

/// Check an already-typed value against an inclusive range
pub fn check_range(field: &str, value: u64, min: u64, max: u64) -> ConfigResult<u64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigurationError::out_of_range(field, value, min, max))
    }
}

/// Parse a boolean flag (`true/false/1/0/yes/no/on/off`, case-insensitive)
pub fn parse_bool(field: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::invalid_value(
            field,
            raw,
            "expected a boolean (true/false)",
        )),
    }
}

/// Validate a non-empty name
pub fn parse_name(field: &str, raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigurationError::invalid_value(
            field,
            raw,
            "name must not be empty",
        ));
    }
    Ok(trimmed.to_string())
}

/// Reads typed fields out of a string map, substituting defaults for missing
/// or invalid entries and remembering every rejected value.
#[derive(Debug)]
pub struct FieldReader<'a> {
    values: &'a HashMap<String, String>,
    warnings: Vec<ConfigurationError>,
}

impl<'a> FieldReader<'a> {
    /// Keys of `values` must already be upper-cased
    pub fn new(values: &'a HashMap<String, String>) -> Self {
        Self {
            values,
            warnings: Vec::new(),
        }
    }

    fn raw(&self, key: &str) -> Option<&'a str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn fallback<T: std::fmt::Debug>(&mut self, error: ConfigurationError, default: T) -> T {
        warn!(
            error = %error,
            default = ?default,
            "Invalid configuration value, using default"
        );
        self.warnings.push(error);
        default
    }

    pub fn ranged_u64(&mut self, key: &str, min: u64, max: u64, default: u64) -> u64 {
        match self.raw(key) {
            None => default,
            Some(raw) => match parse_ranged_u64(key, raw, min, max) {
                Ok(value) => value,
                Err(e) => self.fallback(e, default),
            },
        }
    }

    pub fn ranged_u32(&mut self, key: &str, min: u32, max: u32, default: u32) -> u32 {
        // Bounds are u32, so the checked value always fits
        self.ranged_u64(key, u64::from(min), u64::from(max), u64::from(default)) as u32
    }

    pub fn ranged_usize(&mut self, key: &str, min: usize, max: usize, default: usize) -> usize {
        self.ranged_u64(key, min as u64, max as u64, default as u64) as usize
    }

    pub fn boolean(&mut self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            None => default,
            Some(raw) => match parse_bool(key, raw) {
                Ok(value) => value,
                Err(e) => self.fallback(e, default),
            },
        }
    }

    pub fn name(&mut self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            None => default.to_string(),
            Some(raw) => match parse_name(key, raw) {
                Ok(value) => value,
                Err(e) => self.fallback(e, default.to_string()),
            },
        }
    }

    /// Warnings collected so far
    pub fn finish(self) -> Vec<ConfigurationError> {
        self.warnings
    }
}

/// Upper-case every key so lookups match the env-style constants
pub fn normalize_keys<I, K, V>(entries: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.as_ref().trim().to_ascii_uppercase(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranged_u64() {
        assert_eq!(parse_ranged_u64("F", "5", 1, 100), Ok(5));
        assert_eq!(parse_ranged_u64("F", " 100 ", 1, 100), Ok(100));

        assert!(matches!(
            parse_ranged_u64("F", "0", 1, 100),
            Err(ConfigurationError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_ranged_u64("F", "-3", 1, 100),
            Err(ConfigurationError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_ranged_u64("F", "abc", 1, 100),
            Err(ConfigurationError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_ranged_u64("F", "2.5", 1, 100),
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_bool_variants() {
        for raw in ["true", "TRUE", "1", "yes", "On"] {
            assert_eq!(parse_bool("ENABLED", raw), Ok(true), "{raw}");
        }
        for raw in ["false", "0", "No", "off"] {
            assert_eq!(parse_bool("ENABLED", raw), Ok(false), "{raw}");
        }
        assert!(parse_bool("ENABLED", "maybe").is_err());
    }

    #[test]
    fn test_field_reader_collects_warnings() {
        let values = normalize_keys([
            ("failure_threshold", "500"),
            ("enabled", "nope"),
            ("timeout_ms", "2000"),
            ("name", "   "),
        ]);
        let mut reader = FieldReader::new(&values);

        assert_eq!(reader.ranged_u32("FAILURE_THRESHOLD", 1, 100, 5), 5);
        assert!(reader.boolean("ENABLED", true));
        assert_eq!(reader.ranged_u64("TIMEOUT_MS", 1000, 300_000, 30_000), 2000);
        assert_eq!(reader.name("NAME", "default"), "default");
        assert_eq!(reader.ranged_u32("SUCCESS_THRESHOLD", 1, 20, 3), 3);

        let warnings = reader.finish();
        let fields: Vec<_> = warnings.iter().filter_map(|w| w.field()).collect();
        assert_eq!(fields, vec!["FAILURE_THRESHOLD", "ENABLED", "NAME"]);
    }

    #[test]
    fn test_blank_values_are_treated_as_missing() {
        let values = normalize_keys([("TIMEOUT_MS", "")]);
        let mut reader = FieldReader::new(&values);
        assert_eq!(reader.ranged_u64("TIMEOUT_MS", 1000, 300_000, 30_000), 30_000);
        assert!(reader.finish().is_empty());
    }
}
