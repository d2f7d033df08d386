//! Command registry - the fixed set of subcommands and their flags
//!
//! Arguments follow the `dfs <command> [-option value]...` convention:
//! single-dash long flags, `-name=value`, `--` as terminator, and
//! parsing stops at the first token that is not a flag. Flags are
//! normalized into clap's `--name` form and validated by a clap
//! `Command` built from each descriptor.

use clap::error::ContextKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt::Write as _;
use thiserror::Error;

/// Source path option
pub const SRC: &str = "src";

/// Destination path option
pub const DES: &str = "des";

/// Read mode option
pub const MODE: &str = "mode";

/// Default read mode (stale read)
pub const DEFAULT_MODE: &str = "s";

const DEFAULT_VALUE: &str = "";

const TRAILING: &str = "__trailing";

const MODE_HELP: &str =
    "(optional) the read mode, l means latest, s means stale(about 50ms delay).";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("subcommand already registered: {0}")]
    Duplicate(String),

    #[error("no command given")]
    MissingCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: {reason}")]
    Parse { command: String, reason: String },

    #[error("{command}: -{option} is required")]
    Missing { command: String, option: String },
}

/// A named option accepted by a subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: &'static str,
    pub help: &'static str,
}

impl OptionSpec {
    pub const fn new(name: &'static str, default: &'static str, help: &'static str) -> Self {
        Self {
            name,
            default,
            help,
        }
    }

    fn arg(&self) -> Arg {
        let arg = Arg::new(self.name)
            .long(self.name)
            .action(ArgAction::Set)
            .num_args(1)
            .allow_hyphen_values(true)
            .help(self.help);

        if self.default.is_empty() {
            arg
        } else {
            arg.default_value(self.default)
        }
    }
}

/// Immutable description of one subcommand
#[derive(Debug, Clone)]
pub struct Subcommand {
    pub name: &'static str,
    pub usage: &'static str,
    pub options: Vec<OptionSpec>,
}

impl Subcommand {
    fn command(&self) -> Command {
        let command = Command::new(self.name)
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true)
            .args(self.options.iter().map(OptionSpec::arg));

        command.arg(
            Arg::new(TRAILING)
                .action(ArgAction::Append)
                .num_args(1..)
                .hide(true),
        )
    }

    fn parse(&self, tokens: Vec<String>) -> Result<Invocation, RegistryError> {
        let matches = self
            .command()
            .try_get_matches_from(normalize_flags(tokens))
            .map_err(|err| RegistryError::Parse {
                command: self.name.to_string(),
                reason: describe(&err),
            })?;

        Ok(self.invocation(&matches))
    }

    fn invocation(&self, matches: &ArgMatches) -> Invocation {
        let values = self
            .options
            .iter()
            .map(|opt| {
                let value = matches
                    .get_one::<String>(opt.name)
                    .cloned()
                    .unwrap_or_else(|| opt.default.to_string());
                (opt.name, value)
            })
            .collect();

        let args = matches
            .get_many::<String>(TRAILING)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        Invocation {
            command: self.name,
            values,
            args,
        }
    }

    fn write_usage(&self, out: &mut String) {
        let _ = writeln!(out, "{} {}", self.name, self.usage);
        for opt in &self.options {
            let _ = writeln!(out, "  -{} string", opt.name);
            if opt.default.is_empty() {
                let _ = writeln!(out, "    \t{}", opt.help);
            } else {
                let _ = writeln!(out, "    \t{} (default {:?})", opt.help, opt.default);
            }
        }
    }
}

/// The subcommand and option values selected for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    command: &'static str,
    values: BTreeMap<&'static str, String>,
    args: Vec<String>,
}

impl Invocation {
    pub fn command(&self) -> &'static str {
        self.command
    }

    /// Resolved value of a recognized option (its default when unset)
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Resolved value of an option that must be non-empty
    pub fn require(&self, name: &str) -> Result<&str, RegistryError> {
        match self.value(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(RegistryError::Missing {
                command: self.command.to_string(),
                option: name.to_string(),
            }),
        }
    }

    /// Positional arguments left over once flag parsing stopped
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Subcommands in registration order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    commands: Vec<Subcommand>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The command set of the `dfs` binary
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        registry.register(
            "get",
            "Get the remote file(src) and download to local file(des).",
            vec![
                OptionSpec::new(SRC, DEFAULT_VALUE, "(required) the remote file on chunk server."),
                OptionSpec::new(DES, DEFAULT_VALUE, "(required) the local file."),
            ],
        )?;
        registry.register(
            "add",
            "Put the local file(src) and upload to remote file(des).",
            vec![
                OptionSpec::new(SRC, DEFAULT_VALUE, "(required) the local file."),
                OptionSpec::new(DES, DEFAULT_VALUE, "(required) the remote path on chunk server."),
            ],
        )?;
        registry.register(
            "mkdir",
            "Make a directory at target path.",
            vec![OptionSpec::new(
                DES,
                DEFAULT_VALUE,
                "(required) the remote path on chunk server.",
            )],
        )?;
        registry.register(
            "remove",
            "Remove the remote file(des).",
            vec![OptionSpec::new(DES, DEFAULT_VALUE, "(required) the remote file.")],
        )?;
        registry.register(
            "move",
            "Move the remote file(src) to another remote file(des).",
            vec![
                OptionSpec::new(SRC, DEFAULT_VALUE, "(required) the remote file on chunk server."),
                OptionSpec::new(DES, DEFAULT_VALUE, "(required) the remote file that src moved to."),
            ],
        )?;
        registry.register(
            "list",
            "List the all files in the remote Directory(des).",
            vec![
                OptionSpec::new(DES, DEFAULT_VALUE, "(required) the remote Directory."),
                OptionSpec::new(MODE, DEFAULT_MODE, MODE_HELP),
            ],
        )?;
        registry.register(
            "stat",
            "Get the specified file's information.",
            vec![
                OptionSpec::new(DES, DEFAULT_VALUE, "(required) the remote file."),
                OptionSpec::new(MODE, DEFAULT_MODE, MODE_HELP),
            ],
        )?;
        registry.register(
            "rename",
            "Rename the specified file to a new name.",
            vec![
                OptionSpec::new(SRC, DEFAULT_VALUE, "(required) the specified file path."),
                OptionSpec::new(DES, DEFAULT_VALUE, "(required) the new name."),
            ],
        )?;

        Ok(registry)
    }

    /// Add a subcommand; names must be unique
    pub fn register(
        &mut self,
        name: &'static str,
        usage: &'static str,
        options: Vec<OptionSpec>,
    ) -> Result<(), RegistryError> {
        if self.get(name).is_some() {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        self.commands.push(Subcommand {
            name,
            usage,
            options,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Subcommand> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }

    pub fn commands(&self) -> &[Subcommand] {
        &self.commands
    }

    /// Resolve `[program, command, flags...]` into an invocation
    pub fn try_resolve<I, T>(&self, args: I) -> Result<Invocation, RegistryError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        args.next().ok_or(RegistryError::MissingCommand)?;

        let name = args
            .next()
            .ok_or(RegistryError::MissingCommand)?
            .into_string()
            .map_err(|raw| RegistryError::UnknownCommand(raw.to_string_lossy().into_owned()))?;
        let command = self
            .get(&name)
            .ok_or_else(|| RegistryError::UnknownCommand(name.clone()))?;

        let tokens = args
            .map(|arg| {
                arg.into_string().map_err(|raw| RegistryError::Parse {
                    command: command.name.to_string(),
                    reason: format!("invalid UTF-8 in argument {:?}", raw),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        command.parse(tokens)
    }

    /// Resolve process arguments, or print usage and exit with status 2
    pub fn resolve<I, T>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

        match self.try_resolve(args.iter().cloned()) {
            Ok(invocation) => invocation,
            Err(err) => {
                if !matches!(err, RegistryError::MissingCommand) {
                    eprintln!("{}", err);
                }
                print!("{}", self.usage(program_name(&args)));
                std::process::exit(2);
            }
        }
    }

    /// Full usage listing for every registered subcommand
    pub fn usage(&self, program: &str) -> String {
        let mut out = format!("Usage: {} COMMAND\n\n", program);
        for command in &self.commands {
            command.write_usage(&mut out);
            out.push('\n');
        }
        out
    }
}

fn program_name(args: &[OsString]) -> &str {
    args.first()
        .and_then(|arg| std::path::Path::new(arg).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("dfs")
}

/// Rewrite flag tokens into clap's long form.
///
/// Every option takes exactly one value, so the token after a flag without
/// an inline `=value` is passed through untouched. The first non-flag
/// token ends flag parsing and everything from it on becomes trailing.
fn normalize_flags(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len() + 1);
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        if token == "--" {
            out.push(token);
            out.extend(tokens);
            break;
        }

        if token.len() < 2 || !token.starts_with('-') {
            out.push("--".to_string());
            out.push(token);
            out.extend(tokens);
            break;
        }

        let name = token.strip_prefix("--").unwrap_or(&token[1..]);
        let inline = name.contains('=');
        out.push(format!("--{}", name));

        if !inline {
            if let Some(value) = tokens.next() {
                out.push(value);
            }
        }
    }

    out
}

fn describe(err: &clap::Error) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(arg) => format!("{} ({})", err.kind(), arg),
        None => err.kind().to_string(),
    }
}
