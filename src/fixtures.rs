#[cfg(test)]
pub mod test {
    use std::any::Any;
    use std::cell::Cell;
    use std::fmt;
    use std::rc::Rc;

    use serde::Serialize;

    use crate::error::{Errors, ScanfigError};
    use crate::naming::friendly_type_name;
    use crate::native::Native;
    use crate::path::NodePath;
    use crate::scan::{Fields, Record};
    use crate::setter::{Configurable, Registry, Setter, SetterCreator};
    use crate::setting::Setting;
    use crate::slot::Slot;
    use crate::source::Source;
    use crate::types::Tags;
    use crate::validate::check_bounds;

    /// A setting for `slot` at `node->name`, using the builtin converters.
    pub fn setting<T: Configurable>(node: &NodePath, name: &str, slot: &Slot<T>, tags: Tags) -> Setting {
        let setter = Registry::with_defaults()
            .setter(slot, &tags)
            .unwrap_or_else(|| panic!("no setter for {}", std::any::type_name::<T>()));
        Setting::new(node.leaf(name), tags, setter, friendly_type_name::<T>())
    }

    // -- Application-shaped record ------------------------------------------

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct TestConfig {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub database: TestDbConfig,
        pub auth: Option<Auth>,
        pub tags: Vec<String>,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            TestConfig {
                host: "localhost".into(),
                port: 8080,
                debug: false,
                database: TestDbConfig::default(),
                auth: None,
                tags: Vec::new(),
            }
        }
    }

    impl Record for TestConfig {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields
                .field("host", |c| &mut c.host)
                .field("port", |c| &mut c.port)
                .field("debug", |c| &mut c.debug)
                .field("database", |c| &mut c.database)
                .field("auth", |c| &mut c.auth)
                .field("tags", |c| &mut c.tags);
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct TestDbConfig {
        pub url: Option<String>,
        pub pool_size: usize,
    }

    impl Default for TestDbConfig {
        fn default() -> Self {
            TestDbConfig {
                url: None,
                pool_size: 5,
            }
        }
    }

    impl Record for TestDbConfig {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields.field("url", |d| &mut d.url).field_with(
                "pool_size",
                Tags::new().usage("Connection pool size."),
                |d| &mut d.pool_size,
            );
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Auth {
        pub user: String,
        pub password: String,
    }

    impl Record for Auth {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields
                .field("user", |a| &mut a.user)
                .field("password", |a| &mut a.password);
        }
    }

    // -- Nested optional records --------------------------------------------

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Credentials {
        pub token: String,
    }

    impl Record for Credentials {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields.field("token", |c| &mut c.token);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Inner {
        pub name: String,
        pub credentials: Option<Credentials>,
    }

    impl Record for Inner {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields
                .field("name", |i| &mut i.name)
                .field("credentials", |i| &mut i.credentials);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Outer {
        pub inner: Option<Option<Inner>>,
    }

    impl Record for Outer {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields.field("inner", |o| &mut o.inner);
        }
    }

    // -- Naming rules -------------------------------------------------------

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Widget {
        pub title: String,
        pub level: Level,
        pub hidden: Hidden,
        pub network: NetSettings,
        pub sizing: Sizing,
    }

    impl Record for Widget {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields
                .field_with("title", Tags::new().name("label"), |w| &mut w.title)
                .field("level", |w| &mut w.level)
                .field_with("hidden", Tags::new().skip(), |w| &mut w.hidden)
                .field_with("network", Tags::new().prefix("net"), |w| &mut w.network)
                .field_with("sizing", Tags::new().flatten(), |w| &mut w.sizing);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Hidden {
        pub secret: String,
    }

    impl Record for Hidden {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields.field("secret", |h| &mut h.secret);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct NetSettings {
        pub address: String,
    }

    impl Record for NetSettings {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields.field("address", |n| &mut n.address);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Sizing {
        pub size: u32,
    }

    impl Record for Sizing {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields.field("size", |s| &mut s.size);
        }
    }

    // -- Unknown field types ------------------------------------------------

    /// Configurable, but nothing knows how to set it.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Opaque;

    impl Configurable for Opaque {
        fn zero() -> Self {
            Opaque
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Gadget {
        pub before: u8,
        pub broken: Opaque,
        pub after: u8,
    }

    impl Record for Gadget {
        fn scan(fields: &mut Fields<'_, Self>) {
            fields
                .field("before", |g| &mut g.before)
                .field("broken", |g| &mut g.broken)
                .field("after", |g| &mut g.after);
        }
    }

    crate::record!(TestConfig, TestDbConfig, Auth, Credentials, Inner, Outer);
    crate::record!(Widget, Hidden, NetSettings, Sizing, Gadget);

    // -- Custom leaf types --------------------------------------------------

    /// Registered by hand in the tests that need it.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Celsius(pub f64);

    impl Configurable for Celsius {
        fn zero() -> Self {
            Celsius(0.0)
        }
    }

    pub struct CelsiusCreator;

    impl SetterCreator<Celsius> for CelsiusCreator {
        fn create(&self, slot: Slot<Celsius>, _tags: &Tags) -> Box<dyn Setter> {
            Box::new(CelsiusSetter(slot))
        }
    }

    struct CelsiusSetter(Slot<Celsius>);

    impl Setter for CelsiusSetter {
        fn render(&self) -> String {
            self.0.get().map(|c| c.0).unwrap_or_default().to_string()
        }

        fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
            let degrees: f64 = value
                .parse()
                .map_err(|_| ScanfigError::conversion(value, "celsius"))?;
            self.set_float(degrees)
        }

        fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
            self.set_float(value as f64)
        }

        fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
            self.set_float(value as f64)
        }

        fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
            if value < -273.15 {
                return Err(ScanfigError::validation(value, "below absolute zero"));
            }
            self.0.store(Celsius(value))
        }

        fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
            Err(ScanfigError::conversion(value, "celsius"))
        }

        fn get(&self) -> Box<dyn Any> {
            Box::new(self.0.get().unwrap_or(Celsius(0.0)))
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
    pub enum Level {
        Debug,
        #[default]
        Info,
        Warn,
        Error,
    }

    impl Level {
        const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

        fn parse(text: &str) -> Option<Level> {
            if let Ok(index) = text.parse::<usize>() {
                return Self::ALL.get(index).copied();
            }
            Self::ALL
                .into_iter()
                .find(|level| level.to_string().eq_ignore_ascii_case(text))
        }
    }

    impl fmt::Display for Level {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Level::Debug => "debug",
                Level::Info => "info",
                Level::Warn => "warn",
                Level::Error => "error",
            })
        }
    }

    impl Native for Level {
        fn set_str(&mut self, value: &str, tags: &Tags) -> Result<(), ScanfigError> {
            let level = Level::parse(value).ok_or_else(|| ScanfigError::conversion(value, "level"))?;
            check_bounds(&level, tags, "level", Level::parse, Level::to_string)?;
            *self = level;
            Ok(())
        }
    }

    crate::native!(Level);

    // -- Sources ------------------------------------------------------------

    /// A source with fixed values keyed by `->` path.
    pub struct FixedSource {
        name: String,
        values: Vec<(String, String)>,
        settings: Vec<Setting>,
        initialised: Rc<Cell<bool>>,
        loaded: Rc<Cell<bool>>,
    }

    impl FixedSource {
        pub fn new(name: &str, values: &[(&str, &str)]) -> Self {
            FixedSource {
                name: name.to_string(),
                values: values
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                settings: Vec::new(),
                initialised: Rc::default(),
                loaded: Rc::default(),
            }
        }

        /// Flags raised by `init` and `load`.
        pub fn probes(&self) -> (Rc<Cell<bool>>, Rc<Cell<bool>>) {
            (Rc::clone(&self.initialised), Rc::clone(&self.loaded))
        }
    }

    impl Source for FixedSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn init(&mut self, settings: Vec<Setting>) {
            self.initialised.set(true);
            self.settings = settings;
        }

        fn load(&mut self) -> Result<(), ScanfigError> {
            self.loaded.set(true);
            let mut errors = Errors::new();
            for (key, value) in &self.values {
                if let Some(setting) = self.settings.iter().find(|s| s.path().to_string() == *key) {
                    errors.check(
                        setting
                            .setter()
                            .set_str(value)
                            .map_err(|err| err.at(setting.path())),
                    );
                }
            }
            errors.into_result()
        }

        fn usage(&self) -> String {
            let mut out = format!("{}:\n", self.name);
            for setting in &self.settings {
                out.push_str(&format!("  {}\n", setting.path()));
            }
            out
        }
    }
}
