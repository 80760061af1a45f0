//! The load orchestrator.
//!
//! A [`Config`] collects settings from scanned records and single variables,
//! hands each configured [`Source`] the settings it is eligible for, loads
//! the sources in order, and finally materializes optional records that
//! received a value.

use tracing::debug;

use crate::env::EnvSource;
use crate::error::{Errors, ScanfigError};
use crate::ops::{self, ConfigResult};
use crate::path::NodePath;
use crate::scan::{Deferred, Record, Scanner};
use crate::setter::{Configurable, Registry, default_registry};
use crate::setting::{Setting, Settings};
use crate::slot::Slot;
use crate::source::Source;
use crate::types::{Stage, Tags, keys};

/// The default sources: environment variables, then command-line flags.
pub fn default_sources() -> Vec<Box<dyn Source>> {
    let mut sources: Vec<Box<dyn Source>> = vec![Box::new(EnvSource::new())];
    #[cfg(feature = "clap")]
    sources.push(Box::new(crate::cli::FlagSource::new()));
    sources
}

pub struct Config {
    root: NodePath,
    settings: Settings,
    deferred: Vec<Deferred>,
    sources: Option<Vec<Box<dyn Source>>>,
    registry: Option<Registry>,
    active: Vec<bool>,
    stage: Stage,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Config {
            root: NodePath::root(""),
            settings: Settings::default(),
            deferred: Vec::new(),
            sources: None,
            registry: None,
            active: Vec::new(),
            stage: Stage::Unscanned,
        }
    }

    /// Use `registry` instead of the process-wide default.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the source list. Order matters: later sources win.
    pub fn with_sources(mut self, sources: Vec<Box<dyn Source>>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Append a source after the current ones (the defaults, if none were set).
    pub fn add_source(&mut self, source: impl Source + 'static) {
        self.sources
            .get_or_insert_with(default_sources)
            .push(Box::new(source));
    }

    pub fn registry(&self) -> Registry {
        self.registry.clone().unwrap_or_else(default_registry)
    }

    pub fn settings(&self) -> &[Setting] {
        self.settings.as_slice()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The node all settings hang off.
    pub fn root(&self) -> &NodePath {
        &self.root
    }

    /// Scan `record` and add its settings.
    ///
    /// Fields that cannot be configured are reported together; every other
    /// field is still registered.
    ///
    /// # Panics
    ///
    /// Panics if two settings end up with the same path.
    pub fn scan<R: Record>(&mut self, record: &Slot<R>) -> Result<(), ScanfigError> {
        let root = self.root.clone();
        self.scan_with(|scanner| scanner.scan_fields(record.clone(), root))
    }

    /// Register a single value under `names`.
    ///
    /// Leading names become intermediate nodes; the last one names the
    /// setting (or the node, if `value` is a record). Name and prefix tags are
    /// ignored.
    ///
    /// # Panics
    ///
    /// Panics if `names` is empty or the setting already exists.
    pub fn var<T: Configurable>(
        &mut self,
        value: &Slot<T>,
        tags: Tags,
        names: &[&str],
    ) -> Result<(), ScanfigError> {
        let Some((last, prefixes)) = names.split_last() else {
            panic!("scanfig: var needs at least one name");
        };
        let node = prefixes
            .iter()
            .fold(self.root.clone(), |node, name| node.node(name));
        let tags = tags.without(&[keys::NAME, keys::PREFIX]);
        self.scan_with(|scanner| scanner.scan_field(&node, last, tags, value.clone()))
    }

    fn scan_with(&mut self, f: impl FnOnce(&mut Scanner)) -> Result<(), ScanfigError> {
        let mut scanner = Scanner::new(
            self.registry(),
            std::mem::take(&mut self.settings),
            std::mem::take(&mut self.deferred),
        );
        f(&mut scanner);
        let (settings, deferred, errors) = scanner.finish();
        self.settings = settings;
        self.deferred = deferred;
        self.stage = Stage::Scanned;
        debug!(
            settings = self.settings.len(),
            deferred = self.deferred.len(),
            errors = errors.len(),
            "scanned"
        );
        errors.into_result()
    }

    /// Hand every source the settings it is eligible for. Sources with no
    /// eligible settings are left out of the next [`load`](Self::load),
    /// except those that take arguments: they still run so positionals are
    /// collected and unknown flags rejected.
    ///
    /// Called by `load`; call it directly to render [`usage`](Self::usage)
    /// without loading anything.
    pub fn init(&mut self) {
        let partitions = self.partition();
        let sources = self.sources.get_or_insert_with(default_sources);
        self.active = sources
            .iter_mut()
            .zip(partitions)
            .map(|(source, partition)| {
                if partition.is_empty() && source.remaining_args().is_none() {
                    debug!(source = source.name(), "no eligible settings, skipping source");
                    return false;
                }
                debug!(source = source.name(), settings = partition.len(), "initialising source");
                source.init(partition);
                true
            })
            .collect();
        self.stage = Stage::Partitioned;
    }

    /// Load every source in order, then materialize optional records that
    /// received a value.
    ///
    /// Errors from all sources are returned together; values that could be
    /// set are set regardless.
    pub fn load(&mut self) -> Result<(), ScanfigError> {
        self.init();

        self.stage = Stage::Loading;
        let mut errors = Errors::new();
        let sources = self.sources.get_or_insert_with(default_sources);
        for (source, active) in sources.iter_mut().zip(&self.active) {
            if !active {
                continue;
            }
            if let Err(err) = source.load() {
                debug!(source = source.name(), error = %err, "source reported errors");
                errors.push(err);
            }
        }

        self.finalize();
        self.stage = Stage::Finalized;
        errors.into_result()
    }

    fn partition(&mut self) -> Vec<Vec<Setting>> {
        let settings = &self.settings;
        self.sources
            .get_or_insert_with(default_sources)
            .iter()
            .map(|source| {
                settings
                    .iter()
                    .filter(|setting| setting.accepts(source.name()))
                    .cloned()
                    .collect()
            })
            .collect()
    }

    /// Innermost entries were queued last, so walking backwards decides
    /// nested records before the records containing them.
    fn finalize(&mut self) {
        let deferred = std::mem::take(&mut self.deferred);
        let total = deferred.len();
        let mut committed = 0;
        for entry in deferred.into_iter().rev() {
            if !entry.is_set() {
                continue;
            }
            if entry.commit() {
                committed += 1;
            } else {
                debug!("optional record destination is gone, dropping its values");
            }
        }
        debug!(total, committed, "materialized optional records");
    }

    /// Scan `record`, load all sources into it, and write the result back.
    ///
    /// Settings stay bound to an internal copy holding the loaded values, so
    /// [`list`](Self::list) and [`get`](Self::get) report what `record`
    /// received; later writes through them do not reach `record`. Call
    /// [`reset`](Self::reset) before configuring again.
    pub fn configure<R: Record>(&mut self, record: &mut R) -> Result<(), ScanfigError> {
        let slot = Slot::new(record.clone());
        let mut errors = Errors::new();
        errors.check(self.scan(&slot));
        errors.check(self.load());
        if let Some(value) = slot.get() {
            *record = value;
        }
        errors.into_result()
    }

    /// Drop all settings and pending state to start a fresh cycle. Sources
    /// and the registry are kept.
    pub fn reset(&mut self) {
        self.root = NodePath::root("");
        self.settings = Settings::default();
        self.deferred.clear();
        self.active.clear();
        self.stage = Stage::Unscanned;
    }

    /// Usage text of every source, separated by blank lines.
    pub fn usage(&self) -> String {
        let render = |sources: &[Box<dyn Source>]| {
            sources
                .iter()
                .map(|source| source.usage())
                .filter(|usage| !usage.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        };
        match &self.sources {
            Some(sources) => render(sources),
            None => render(&default_sources()),
        }
    }

    /// Positional arguments left over by the first source that takes
    /// arguments.
    pub fn args(&self) -> &[String] {
        self.sources
            .iter()
            .flatten()
            .find_map(|source| source.remaining_args())
            .unwrap_or(&[])
    }

    /// Every setting with its current value, sorted by path.
    pub fn list(&self) -> ConfigResult {
        ops::list_values(self.settings())
    }

    /// One setting's current value, by `->` path or dotted name.
    pub fn get(&self, key: &str) -> Result<ConfigResult, ScanfigError> {
        ops::get_value(self.settings(), key)
    }
}
