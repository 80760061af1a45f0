//! Programmatic overrides keyed by dotted path.
//!
//! `("database.url", "pg://")` sets the setting at `database->url`. Values
//! are typed [`serde_json::Value`]s and reach the setter through the method
//! matching their type, so `20` goes through `set_int` rather than being
//! parsed from text. Objects expand into one entry per leaf, which is how
//! [`OverrideSource::from_serialize`] turns a whole struct into overrides.

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{Errors, ScanfigError};
use crate::naming::dotted_name;
use crate::setter::Setter;
use crate::setting::Setting;
use crate::source::Source;

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: Value,
    /// Named by the caller rather than produced by flattening a struct.
    explicit: bool,
}

#[derive(Debug, Default)]
pub struct OverrideSource {
    entries: Vec<Entry>,
    settings: Vec<Setting>,
}

impl OverrideSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `key`. Later entries for the same key win.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key.into(), value.into(), true);
        self
    }

    /// Override every field `value` serializes to. Keys that match no
    /// setting are skipped, as are `null`s.
    pub fn from_serialize<S: Serialize>(value: &S) -> Result<Self, ScanfigError> {
        let mut source = Self::new();
        source.push(String::new(), serde_json::to_value(value)?, false);
        Ok(source)
    }

    fn push(&mut self, key: String, value: Value, explicit: bool) {
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (name, value) in map {
                    let key = if key.is_empty() {
                        name
                    } else {
                        format!("{key}.{name}")
                    };
                    self.push(key, value, explicit);
                }
            }
            value => self.entries.push(Entry {
                key,
                value,
                explicit,
            }),
        }
    }

    /// Append `other`'s entries after this source's own.
    pub fn extend(&mut self, other: OverrideSource) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, key: &str) -> Option<&Setting> {
        self.settings
            .iter()
            .find(|s| dotted_name(s.path()) == key || s.path().to_string() == key)
    }
}

fn apply(setter: &dyn Setter, value: &Value) -> Result<(), ScanfigError> {
    match value {
        Value::Bool(b) => setter.set_bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                setter.set_int(i)
            } else if let Some(u) = n.as_u64() {
                setter.set_uint(u)
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| ScanfigError::conversion(n, "number"))?;
                setter.set_float(f)
            }
        }
        Value::String(s) => setter.set_str(s),
        Value::Array(items) => {
            let mut errors = Errors::new();
            for item in items {
                errors.check(apply(setter, item));
            }
            errors.into_result()
        }
        Value::Null | Value::Object(_) => Ok(()),
    }
}

impl Source for OverrideSource {
    fn name(&self) -> &str {
        "override"
    }

    fn init(&mut self, settings: Vec<Setting>) {
        self.settings = settings;
    }

    fn load(&mut self) -> Result<(), ScanfigError> {
        let mut errors = Errors::new();
        for entry in &self.entries {
            let Some(setting) = self.find(&entry.key) else {
                if entry.explicit {
                    errors.push(ScanfigError::KeyNotFound(entry.key.clone()));
                }
                continue;
            };
            trace!(key = %entry.key, "applying override");
            errors.check(apply(setting.setter(), &entry.value).map_err(|err| err.at(setting.path())));
        }
        errors.into_result()
    }

    fn usage(&self) -> String {
        let keys: Vec<_> = self.settings.iter().map(|s| dotted_name(s.path())).collect();
        format!("Overridable keys:\n  {}\n", keys.join("\n  "))
    }
}
