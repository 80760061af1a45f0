use std::fmt;

use crate::error::ScanfigError;

/// Tag keys interpreted by the scanner and the orchestrator.
pub mod keys {
    pub const NAME: &str = "config";
    pub const PREFIX: &str = "prefix";
    pub const FROM: &str = "from";
    pub const APPEND: &str = "append";
    pub const SEP: &str = "sep";
    pub const USAGE: &str = "usage";
    pub const LE: &str = "le";
    pub const MAX: &str = "max";
    pub const GE: &str = "ge";
    pub const MIN: &str = "min";
    pub const LT: &str = "lt";
    pub const GT: &str = "gt";
    pub const REGEXP: &str = "regexp";
    pub const VERSION: &str = "version";
    pub const IS: &str = "is";
    pub const NET: &str = "net";
    pub const SCHEME: &str = "scheme";
    pub const HOST: &str = "host";
    pub const PATH: &str = "path";
}

/// Name and prefix value meaning "skip this field" and "flatten", respectively.
pub const SKIP: &str = "-";

/// Declarative per-field options.
///
/// Keys keep their insertion order; setting a key again replaces its value.
/// Leaf converters may read keys the core does not know about (`regexp`,
/// `is`, `net`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: Vec<(String, String)>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse annotation text of the form `key:"value" other:"value"`.
    ///
    /// Values are double-quoted; `\\`, `\"`, `\n`, `\r` and `\t` are the
    /// recognised escapes.
    pub fn parse(text: &str) -> Result<Self, ScanfigError> {
        let invalid = |reason: &str| ScanfigError::InvalidTags {
            tags: text.to_string(),
            reason: reason.to_string(),
        };

        let mut tags = Tags::new();
        let mut rest = text.trim_start();
        while !rest.is_empty() {
            let colon = rest.find(':').ok_or_else(|| invalid("missing ':'"))?;
            let key = &rest[..colon];
            if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '"') {
                return Err(invalid("malformed key"));
            }
            let mut chars = rest[colon + 1..].char_indices();
            if !matches!(chars.next(), Some((_, '"'))) {
                return Err(invalid("value must be quoted"));
            }

            let mut value = String::new();
            let mut end = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '"' => {
                        end = Some(colon + 1 + i + 1);
                        break;
                    }
                    '\\' => match chars.next() {
                        Some((_, '\\')) => value.push('\\'),
                        Some((_, '"')) => value.push('"'),
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 'r')) => value.push('\r'),
                        Some((_, 't')) => value.push('\t'),
                        _ => return Err(invalid("unsupported escape")),
                    },
                    c => value.push(c),
                }
            }
            let end = end.ok_or_else(|| invalid("unterminated value"))?;
            tags.insert(key, value);
            rest = rest[end..].trim_start();
        }
        Ok(tags)
    }

    /// Set `key` to `value`, keeping the key's original position.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// A copy of these tags without `keys`.
    pub fn without(&self, keys: &[&str]) -> Self {
        Tags {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// The raw value of `key`, including empty values.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The value of `key`; an empty value counts as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup(key).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // --- Builders for the core vocabulary ---

    /// Override the setting name.
    pub fn name(self, name: impl Into<String>) -> Self {
        self.with(keys::NAME, name)
    }

    /// Skip the field entirely.
    pub fn skip(self) -> Self {
        self.with(keys::NAME, SKIP)
    }

    /// Group a nested record's settings under `prefix` instead of the field
    /// name.
    pub fn prefix(self, prefix: impl Into<String>) -> Self {
        self.with(keys::PREFIX, prefix)
    }

    /// Place a nested record's settings directly under the enclosing node.
    pub fn flatten(self) -> Self {
        self.with(keys::PREFIX, SKIP)
    }

    /// Restrict the setting to the named sources (comma separated).
    pub fn from(self, sources: impl Into<String>) -> Self {
        self.with(keys::FROM, sources)
    }

    pub fn append(self, append: bool) -> Self {
        self.with(keys::APPEND, append.to_string())
    }

    pub fn sep(self, separator: impl Into<String>) -> Self {
        self.with(keys::SEP, separator)
    }

    /// Help text shown by sources that render usage.
    pub fn usage(self, text: impl Into<String>) -> Self {
        self.with(keys::USAGE, text)
    }

    pub fn le(self, bound: impl Into<String>) -> Self {
        self.with(keys::LE, bound)
    }

    pub fn ge(self, bound: impl Into<String>) -> Self {
        self.with(keys::GE, bound)
    }

    pub fn lt(self, bound: impl Into<String>) -> Self {
        self.with(keys::LT, bound)
    }

    pub fn gt(self, bound: impl Into<String>) -> Self {
        self.with(keys::GT, bound)
    }

    pub fn regexp(self, pattern: impl Into<String>) -> Self {
        self.with(keys::REGEXP, pattern)
    }

    // --- Readers for the core vocabulary ---

    pub fn name_override(&self) -> Option<&str> {
        self.get(keys::NAME)
    }

    pub fn prefix_override(&self) -> Option<&str> {
        self.get(keys::PREFIX)
    }

    /// Source names this setting is restricted to; `None` means every source.
    pub fn sources(&self) -> Option<Vec<&str>> {
        match self.get(keys::FROM) {
            None | Some("*") => None,
            Some(list) => Some(list.split(',').map(str::trim).collect()),
        }
    }

    /// Whether sequence sets append. Defaults to `true`; an unparsable value
    /// turns appending off.
    pub fn appends(&self) -> bool {
        match self.lookup(keys::APPEND) {
            None => true,
            Some(value) => parse_bool(value).unwrap_or(false),
        }
    }

    pub fn separator(&self) -> Option<&str> {
        self.get(keys::SEP)
    }

    pub fn usage_text(&self) -> Option<&str> {
        self.get(keys::USAGE)
    }

    /// The declared value of `bound`, honouring its alias.
    pub fn bound(&self, bound: Bound) -> Option<(&'static str, &str)> {
        bound
            .keys()
            .iter()
            .find_map(|key| self.get(key).map(|value| (*key, value)))
    }
}

/// Parse the boolean spellings accepted throughout the crate.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Range constraints, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// `le`, alias `max`.
    AtMost,
    /// `ge`, alias `min`.
    AtLeast,
    /// `lt`.
    Below,
    /// `gt`.
    Above,
}

impl Bound {
    pub const ALL: [Bound; 4] = [Bound::AtMost, Bound::AtLeast, Bound::Below, Bound::Above];

    fn keys(self) -> &'static [&'static str] {
        match self {
            Bound::AtMost => &[keys::LE, keys::MAX],
            Bound::AtLeast => &[keys::GE, keys::MIN],
            Bound::Below => &[keys::LT],
            Bound::Above => &[keys::GT],
        }
    }

    pub fn holds<T: PartialOrd>(self, value: &T, bound: &T) -> bool {
        match self {
            Bound::AtMost => value <= bound,
            Bound::AtLeast => value >= bound,
            Bound::Below => value < bound,
            Bound::Above => value > bound,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Bound::AtMost => "less than or equal to",
            Bound::AtLeast => "greater than or equal to",
            Bound::Below => "less than",
            Bound::Above => "greater than",
        }
    }
}

/// Where a [`Config`](crate::Config) is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Unscanned,
    Scanned,
    Partitioned,
    Loading,
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unscanned => "unscanned",
            Stage::Scanned => "scanned",
            Stage::Partitioned => "partitioned",
            Stage::Loading => "loading",
            Stage::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// A read-only operation on a loaded configuration.
///
/// This is the framework-agnostic surface behind
/// [`ScanfigBuilder::handle`](crate::ScanfigBuilder::handle); wire it to
/// whatever subcommands your CLI exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Every setting with its value.
    List,
    /// One setting, by `->` path or dotted name.
    Get { key: String },
    /// Help text for every source.
    Usage,
}
