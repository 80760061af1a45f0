//! Read-only operations over loaded settings and their result type.
//!
//! Provides the logic behind listing every setting and looking one up by key,
//! plus the `ConfigResult` enum callers use to display results.

use std::fmt;

use serde::Serialize;

use crate::error::ScanfigError;
use crate::naming::dotted_name;
use crate::setting::Setting;

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigResult {
    /// One setting's current value, its type and its help text.
    KeyValue {
        key: String,
        value: String,
        type_name: String,
        usage: Option<String>,
    },
    /// Every setting with its current value.
    Listing { entries: Vec<(String, String)> },
    /// Help text describing how to set values.
    Usage { text: String },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::KeyValue {
                key,
                value,
                type_name,
                usage,
            } => {
                if let Some(usage) = usage {
                    writeln!(f, "# {usage}")?;
                }
                write!(f, "{key} = {value} ({type_name})")
            }
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
            ConfigResult::Usage { text } => write!(f, "{text}"),
        }
    }
}

/// Find a setting by its `->` path or its dotted name (`database.url`).
pub fn get_value(settings: &[Setting], key: &str) -> Result<ConfigResult, ScanfigError> {
    let setting = settings
        .iter()
        .find(|s| s.path().to_string() == key || dotted_name(s.path()) == key)
        .ok_or_else(|| ScanfigError::KeyNotFound(key.to_string()))?;
    Ok(ConfigResult::KeyValue {
        key: key.to_string(),
        value: setting.setter().render(),
        type_name: setting.type_name().to_string(),
        usage: setting.tags().usage_text().map(str::to_string),
    })
}

pub fn list_values(settings: &[Setting]) -> ConfigResult {
    ConfigResult::Listing {
        entries: settings
            .iter()
            .map(|s| (s.path().to_string(), s.setter().render()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fixtures::test::TestConfig;
    use crate::slot::Slot;

    fn scanned() -> Config {
        let mut config = Config::new().with_sources(Vec::new());
        config.scan(&Slot::new(TestConfig::default())).unwrap();
        config
    }

    #[test]
    fn get_by_arrow_path() {
        let config = scanned();
        match get_value(config.settings(), "port").unwrap() {
            ConfigResult::KeyValue {
                value, type_name, ..
            } => {
                assert_eq!(value, "8080");
                assert_eq!(type_name, "u16");
            }
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn get_by_dotted_name() {
        let config = scanned();
        let result = get_value(config.settings(), "database.pool_size").unwrap();
        assert_eq!(result.to_string(), "# Connection pool size.\ndatabase.pool_size = 5 (usize)");
    }

    #[test]
    fn get_unknown_key_fails() {
        let config = scanned();
        let err = get_value(config.settings(), "nope").unwrap_err();
        assert!(matches!(err, ScanfigError::KeyNotFound(ref k) if k == "nope"));
    }

    #[test]
    fn listing_display() {
        let result = ConfigResult::Listing {
            entries: vec![
                ("a".into(), "1".into()),
                ("b->c".into(), "x, y".into()),
            ],
        };
        assert_eq!(result.to_string(), "a = 1\nb->c = x, y");
    }

    #[test]
    fn list_values_is_sorted() {
        let config = scanned();
        let ConfigResult::Listing { entries } = list_values(config.settings()) else {
            panic!("Expected Listing");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(ConfigResult::Usage {
            text: "help".into(),
        }).unwrap();
        assert_eq!(json["kind"], "usage");
    }
}
