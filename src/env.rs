use std::collections::HashMap;

use tracing::trace;

use crate::error::{Errors, ScanfigError};
use crate::naming::env_name;
use crate::setting::Setting;
use crate::source::Source;

/// Loads settings from environment variables.
///
/// Each path element is split into words, uppercased and joined with `_`:
/// `server->maxConns` is read from `SERVER_MAX_CONNS`, or from
/// `APP_SERVER_MAX_CONNS` with prefix `APP`.
///
/// Variables are read from the process environment unless a fixed set is
/// given with [`EnvSource::with_vars`], so tests can pass synthetic data.
#[derive(Debug, Default)]
pub struct EnvSource {
    prefix: Option<String>,
    vars: Option<HashMap<String, String>>,
    settings: Vec<Setting>,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// The variable name read for `setting`.
    pub fn var_name(&self, setting: &Setting) -> String {
        env_name(self.prefix.as_deref(), setting.path())
    }
}

impl Source for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn init(&mut self, settings: Vec<Setting>) {
        self.settings = settings;
    }

    fn load(&mut self) -> Result<(), ScanfigError> {
        let process;
        let vars = match &self.vars {
            Some(vars) => vars,
            None => {
                process = std::env::vars().collect::<HashMap<_, _>>();
                &process
            }
        };

        let mut errors = Errors::new();
        for setting in &self.settings {
            let name = self.var_name(setting);
            let Some(value) = vars.get(&name) else {
                continue;
            };
            trace!(var = %name, path = %setting.path(), "setting from environment");
            errors.check(
                setting
                    .setter()
                    .set_str(value)
                    .map_err(|err| err.at(setting.path())),
            );
        }
        errors.into_result()
    }

    fn usage(&self) -> String {
        let mut out = String::from("Environment variables:\n");
        for setting in &self.settings {
            out.push_str(&format!("  {}={}\n", self.var_name(setting), setting.type_name()));
            if let Some(text) = setting.tags().usage_text() {
                out.push_str(&format!("        {text}\n"));
            }
        }
        out
    }
}
