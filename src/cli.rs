//! Command-line flags, parsed with [clap](https://docs.rs/clap).
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! Every setting becomes a long flag named after its path, words lowercased
//! and joined with `-`: `server->maxConns` is `--server-max-conns`. The
//! command is built at load time from the settings the source was given, so
//! there is nothing to derive.
//!
//! Parsing stops at the first positional argument; it and everything after
//! it are kept as [`Source::remaining_args`].

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command, value_parser};
use tracing::trace;

use crate::error::{Errors, ScanfigError};
use crate::naming::flag_name;
use crate::setting::Setting;
use crate::source::Source;

const REMAINING: &str = "__remaining";

#[derive(Debug, Default)]
pub struct FlagSource {
    program: Option<String>,
    args: Option<Vec<String>>,
    settings: Vec<Setting>,
    remaining: Vec<String>,
}

impl FlagSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `args` (without the program name) instead of the process
    /// arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Program name shown in help output.
    pub fn with_program(mut self, name: impl Into<String>) -> Self {
        self.program = Some(name.into());
        self
    }

    fn program(&self) -> String {
        self.program.clone().unwrap_or_else(|| {
            std::env::args()
                .next()
                .and_then(|arg0| {
                    std::path::Path::new(&arg0)
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                })
                .unwrap_or_else(|| "app".to_string())
        })
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.program())
            .no_binary_name(true)
            .disable_version_flag(true);
        for setting in &self.settings {
            command = command.arg(flag(setting));
        }
        command.arg(
            Arg::new(REMAINING)
                .value_name("ARGS")
                .action(ArgAction::Append)
                .num_args(1..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .value_parser(value_parser!(String)),
        )
    }
}

fn flag(setting: &Setting) -> Arg {
    let name = flag_name(setting.path());
    let mut arg = Arg::new(name.clone())
        .long(name)
        .value_name(setting.type_name().to_string())
        .action(ArgAction::Append)
        .value_parser(value_parser!(String));
    if setting.setter().is_bool_flag() {
        arg = arg
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true");
    }
    match setting.tags().usage_text() {
        Some(text) => arg.help(text.to_string()),
        None => arg,
    }
}

impl Source for FlagSource {
    fn name(&self) -> &str {
        "flag"
    }

    fn init(&mut self, settings: Vec<Setting>) {
        self.settings = settings;
        self.remaining.clear();
    }

    fn load(&mut self) -> Result<(), ScanfigError> {
        let args = self
            .args
            .clone()
            .unwrap_or_else(|| std::env::args().skip(1).collect());
        let matches = self.command().try_get_matches_from(args).map_err(|err| {
            let text = err.render().to_string();
            match err.kind() {
                ErrorKind::DisplayHelp => ScanfigError::HelpRequested(text),
                _ => ScanfigError::CommandLine(text.trim_end().to_string()),
            }
        })?;

        let mut errors = Errors::new();
        for setting in &self.settings {
            let name = flag_name(setting.path());
            let Some(values) = matches.get_many::<String>(&name) else {
                continue;
            };
            for value in values {
                trace!(flag = %name, path = %setting.path(), "setting from flag");
                errors.check(
                    setting
                        .setter()
                        .set_str(value)
                        .map_err(|err| err.at(setting.path())),
                );
            }
        }
        self.remaining = matches
            .get_many::<String>(REMAINING)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        errors.into_result()
    }

    fn usage(&self) -> String {
        self.command().render_help().to_string()
    }

    fn remaining_args(&self) -> Option<&[String]> {
        Some(&self.remaining)
    }
}
