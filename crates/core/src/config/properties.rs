use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Resolved key to string property map
///
/// Keys are matched case-insensitively; the original spelling is kept for
/// iteration and for exporting properties to scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PtfConfig {
    entries: BTreeMap<String, (String, String)>,
}

impl PtfConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.entries
            .insert(key.to_lowercase(), (key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::Config(format!("Missing required property '{key}'")))
    }

    /// Parse a property, reporting the key on failure.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| Error::Config(format!("Invalid value '{raw}' for '{key}': {e}"))),
        }
    }

    /// Properties in key order, with their original spelling.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for PtfConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = PtfConfig::new();
        for (key, value) in iter {
            config.insert(key, value);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let config = PtfConfig::new().with("ServerName", "sut01");

        assert_eq!(config.get("servername"), Some("sut01"));
        assert_eq!(config.get("SERVERNAME"), Some("sut01"));
        assert_eq!(config.iter().next(), Some(("ServerName", "sut01")));
    }

    #[test]
    fn test_later_insert_wins() {
        let config: PtfConfig = [("Port", "445"), ("port", "139")].into_iter().collect();

        assert_eq!(config.len(), 1);
        assert_eq!(config.get("Port"), Some("139"));
    }

    #[test]
    fn test_get_parsed_reports_key() {
        let config = PtfConfig::new().with("Timeout", "soon");

        assert_eq!(config.get_parsed::<u64>("Missing").unwrap(), None);
        let err = config.get_parsed::<u64>("Timeout").unwrap_err();
        assert!(err.to_string().contains("'Timeout'"));
        assert!(config.require("Missing").is_err());
    }
}
