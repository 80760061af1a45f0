use std::marker::PhantomData;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::env::EnvSource;
use crate::error::ScanfigError;
use crate::ops::ConfigResult;
use crate::overrides::OverrideSource;
use crate::scan::Record;
use crate::setter::Registry;
use crate::slot::Slot;
use crate::source::Source;
use crate::types::ConfigAction;

/// Entry point for building a scanfig configuration.
pub struct Scanfig;

impl Scanfig {
    pub fn builder<R: Record>() -> ScanfigBuilder<R> {
        ScanfigBuilder::new()
    }
}

/// Builder for loading a record from layered sources.
///
/// Sources are loaded in a fixed order, each one overriding the last:
///
/// 1. environment variables ([`env_prefix()`](Self::env_prefix), [`no_env()`](Self::no_env))
/// 2. command-line flags ([`args()`](Self::args), [`no_flags()`](Self::no_flags))
/// 3. custom sources, in the order given to [`source()`](Self::source)
/// 4. programmatic overrides ([`override_value()`](Self::override_value),
///    [`overrides_from()`](Self::overrides_from))
pub struct ScanfigBuilder<R: Record> {
    env_prefix: Option<String>,
    env_vars: Option<Vec<(String, String)>>,
    env_enabled: bool,
    args: Option<Vec<String>>,
    program: Option<String>,
    flags_enabled: bool,
    sources: Vec<Box<dyn Source>>,
    registry: Option<Registry>,
    overrides: OverrideSource,
    _phantom: PhantomData<R>,
}

impl<R: Record> ScanfigBuilder<R> {
    fn new() -> Self {
        Self {
            env_prefix: None,
            env_vars: None,
            env_enabled: true,
            args: None,
            program: None,
            flags_enabled: true,
            sources: Vec::new(),
            registry: None,
            overrides: OverrideSource::new(),
            _phantom: PhantomData,
        }
    }

    /// Prefix every environment variable name: `APP` reads `APP_PORT`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Read these variables instead of the process environment.
    pub fn env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Parse these arguments (without the program name) instead of the
    /// process arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Program name shown in flag help.
    pub fn program(mut self, name: &str) -> Self {
        self.program = Some(name.to_string());
        self
    }

    /// Disable command-line flag parsing entirely.
    pub fn no_flags(mut self) -> Self {
        self.flags_enabled = false;
        self
    }

    /// Add a source after the builtin ones.
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Use `registry` instead of the process-wide default.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override one key. `None` values are ignored (useful for optional clap
    /// args).
    pub fn override_value<V: Into<serde_json::Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.overrides = self.overrides.with_value(key, v);
        }
        self
    }

    /// Add overrides from any serializable value, matched by dotted key.
    ///
    /// `None` fields are skipped and keys that match no setting are ignored,
    /// so a clap-derived struct can be passed as is: its `command` or
    /// `verbose` fields simply fall through. Later calls take precedence.
    pub fn overrides_from<S: Serialize>(mut self, source: &S) -> Result<Self, ScanfigError> {
        self.overrides.extend(OverrideSource::from_serialize(source)?);
        Ok(self)
    }

    /// Assemble the sources into an unscanned [`Config`].
    pub fn build(self) -> Config {
        let mut sources: Vec<Box<dyn Source>> = Vec::new();
        if self.env_enabled {
            let mut env = EnvSource::new();
            if let Some(prefix) = self.env_prefix {
                env = env.with_prefix(prefix);
            }
            if let Some(vars) = self.env_vars {
                env = env.with_vars(vars);
            }
            sources.push(Box::new(env));
        }
        #[cfg(feature = "clap")]
        if self.flags_enabled {
            let mut flags = crate::cli::FlagSource::new();
            if let Some(args) = self.args {
                flags = flags.with_args(args);
            }
            if let Some(program) = self.program {
                flags = flags.with_program(program);
            }
            sources.push(Box::new(flags));
        }
        sources.extend(self.sources);
        if !self.overrides.is_empty() {
            sources.push(Box::new(self.overrides));
        }
        debug!(
            sources = ?sources.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            "built config"
        );

        let config = Config::new().with_sources(sources);
        match self.registry {
            Some(registry) => config.with_registry(registry),
            None => config,
        }
    }

    /// Load a record starting from its defaults.
    pub fn load(self) -> Result<R, ScanfigError> {
        self.load_from(R::default())
    }

    /// Load a record starting from `initial`. Fields no source sets keep
    /// their initial values.
    pub fn load_from(self, initial: R) -> Result<R, ScanfigError> {
        let mut config = self.build();
        let mut record = initial;
        config.configure(&mut record)?;
        Ok(record)
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(self, action: &ConfigAction) -> Result<(), ScanfigError> {
        let result = self.handle(action)?;
        print!("{result}");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / get / usage) against the loaded
    /// defaults of `R`.
    pub fn handle(self, action: &ConfigAction) -> Result<ConfigResult, ScanfigError> {
        let mut config = self.build();
        let record = Slot::new(R::default());
        config.scan(&record)?;
        match action {
            ConfigAction::Usage => {
                config.init();
                Ok(ConfigResult::Usage {
                    text: config.usage(),
                })
            }
            ConfigAction::List => {
                config.load()?;
                Ok(config.list())
            }
            ConfigAction::Get { key } => {
                config.load()?;
                config.get(key)
            }
        }
    }
}
