//! Struct-scanning configuration for Rust applications. Describe your
//! record's fields once, and every source can set them.
//!
//! Scanfig walks a record into a flat list of settings, each with a path, a
//! set of tags and a setter bound to the field's storage. Sources (environment
//! variables, command-line flags, programmatic overrides, or your own) then
//! set values through those setters, in order, each overriding the last.
//!
//! ```ignore
//! #[derive(Clone, Default, PartialEq)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     timeout: Duration,
//!     tls: Option<Tls>,
//! }
//!
//! impl Record for Server {
//!     fn scan(fields: &mut Fields<'_, Self>) {
//!         fields
//!             .field("host", |s| &mut s.host)
//!             .field_with("port", Tags::new().ge("1024"), |s| &mut s.port)
//!             .field("timeout", |s| &mut s.timeout)
//!             .field("tls", |s| &mut s.tls);
//!     }
//! }
//! scanfig::record!(Server);
//!
//! let server: Server = Scanfig::builder().env_prefix("app").load()?;
//! ```
//!
//! That call reads `APP_HOST`, `APP_PORT`, `APP_TIMEOUT` and `APP_TLS_*`,
//! then `--host`, `--port`, `--timeout` and `--tls-*` flags, and hands back
//! the record with everything converted and validated.
//!
//! # Paths and names
//!
//! Every setting has a path such as `server->maxConns`. Sources derive their
//! own names from it: the environment source splits each element into words
//! and joins them with `_` (`SERVER_MAX_CONNS`), the flag source with `-`
//! (`--server-max-conns`), and overrides accept the dotted form
//! (`server.maxConns`). Tags adjust the path while scanning:
//!
//! - **`name`** renames the field; `"-"` skips it entirely.
//! - **`prefix`** renames the node a nested record is scanned under;
//!   `"-"` (see [`Tags::flatten`]) scans it into the parent.
//!
//! Two settings with the same path are a programming error and panic.
//!
//! # Leaf types
//!
//! The default [`Registry`] converts booleans, all integer and float widths,
//! strings, [`Duration`](std::time::Duration)s (`1h30m`), timestamps, IP
//! addresses, IP networks and URLs. `Option<T>` and `Vec<T>` of any of these
//! work without registration. Integers, floats, durations and timestamps
//! accept `le`/`ge`/`lt`/`gt` bounds; strings accept a `regexp`; addresses
//! accept `version`, `is` and `net` constraints.
//!
//! Register your own converters with [`register`] (process-wide) or
//! [`Registry::add`], or let a type convert itself with [`Native`] and
//! [`native!`].
//!
//! # Optional records
//!
//! An `Option<Record>` field that is `None` stays `None` unless some source
//! sets one of its settings. Only then is the record created, starting from
//! its `Default`.
//!
//! # Sources and filtering
//!
//! Sources implement [`Source`]. A setting tagged with `from` is only given
//! to the sources it names (`Tags::new().from("env")`), and a source with no
//! settings is never initialised or loaded. Sources that take arguments are
//! the exception, so positional arguments are always collected.
//!
//! # Error handling
//!
//! All fallible operations return [`ScanfigError`]. Loading does not stop at
//! the first failure: every source is loaded, and all failures come back
//! together as [`ScanfigError::Multiple`], each carrying the path of the
//! setting it belongs to. A failed conversion never touches the field.

pub mod error;
pub mod types;
pub mod validate;
pub mod values;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod config;
mod env;
mod naming;
mod native;
mod ops;
mod overrides;
mod path;
mod pointer;
mod scan;
mod sequence;
mod setter;
mod setting;
mod slot;
mod source;

#[cfg(test)]
mod fixtures;

pub use builder::{Scanfig, ScanfigBuilder};
#[cfg(feature = "clap")]
pub use cli::FlagSource;
pub use config::{Config, default_sources};
pub use env::EnvSource;
pub use error::{Errors, ScanfigError};
pub use naming::{dotted_name, env_name, flag_name, split_name};
pub use native::{Native, NativeCreator};
pub use ops::ConfigResult;
pub use overrides::OverrideSource;
pub use path::{NodePath, Path};
pub use pointer::PointerCreator;
pub use scan::{FieldInfo, Fields, Materializer, Record, Scanner};
pub use sequence::SequenceCreator;
pub use setter::{Configurable, Registry, Setter, SetterCreator, default_registry, register};
pub use setting::Setting;
pub use slot::Slot;
pub use source::Source;
pub use types::{ConfigAction, Stage, Tags};
