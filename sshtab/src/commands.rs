//! Subcommand implementations.
//!
//! Results go to the writer passed in (stdout in the binary); diagnostics
//! are left to the caller, which prefixes them with the subcommand name.

use crate::cli::{Command, PickArgs};
use crate::items::{self, PickItem};
use crate::picker::{AliasUpdate, PickOutcome, PickerConfig, run_picker};
use anyhow::{Context as _, anyhow};
use nix::unistd::execvp;
use sshtab_store::{AliasLog, AliasMap, Config, StoreError, merge_recent};
use sshtab_types::PolicyError;
use sshtab_types::normalize::{
    extract_args, normalize_alias_name, normalize_args_input, normalize_command_raw,
    normalize_command_tokens, normalize_ssh_command,
};
use sshtab_types::text::trim_space;
use sshtab_types::validate::{
    contains_control_chars, contains_forbidden_metachars, validate_exec_args,
};
use std::convert::Infallible;
use std::ffi::CString;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, warn};

const SSH_PROGRAM: &str = "ssh";
const SELF_PREFIX: &str = "sshtab ";

#[derive(Error, Debug)]
pub enum Failure {
    /// Exit non-zero without a message: nothing to pick, or canceled.
    #[error("no selection")]
    Quiet,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CommandResult = Result<(), Failure>;

pub fn run<W: Write>(command: Command, config: &Config, out: &mut W) -> CommandResult {
    match command {
        Command::Record { exit_code, raw } => record(config, exit_code, &raw),
        Command::Add { command } => add(config, &command),
        Command::List { limit, with_ids } => list(config, limit, with_ids, out),
        Command::Pick(args) => pick(config, &args, out),
        Command::PickCommand(args) => pick_command(config, &args, out),
        Command::Alias {
            name,
            id,
            address,
            limit,
        } => alias(config, &name, id, address.as_deref(), limit),
        Command::Delete { index, pick, limit } => delete(config, index, pick, limit),
        Command::Exec { args_string } => match exec(&args_string)? {},
    }
}

/// Shell hook entry point. Anything that is not a successful ssh command
/// is silently ignored; only an empty `raw` is an error.
pub fn record(config: &Config, exit_code: i32, raw: &str) -> CommandResult {
    if raw.is_empty() {
        return Err(anyhow!("--raw is required").into());
    }
    if exit_code != 0 || contains_control_chars(raw) {
        return Ok(());
    }
    let Some(command) = normalize_ssh_command(raw) else {
        debug!("record: not an ssh command: {:?}", raw);
        return Ok(());
    };
    config.ssh_history().append(&command, 0)?;
    config.command_history().append(&command, 0)?;
    Ok(())
}

pub fn add(config: &Config, words: &[String]) -> CommandResult {
    let command = match words {
        [single] => normalize_command_raw(single)?,
        _ => normalize_command_tokens(words)?,
    };
    let command = match command.strip_prefix(SELF_PREFIX) {
        Some(rest) => {
            let rest = trim_space(rest);
            if rest.is_empty() {
                return Err(anyhow!("command empty after stripping sshtab prefix").into());
            }
            rest.to_string()
        }
        None => command,
    };
    config.command_history().append(&command, 0)?;
    Ok(())
}

pub fn list<W: Write>(
    config: &Config,
    limit: usize,
    with_ids: bool,
    out: &mut W,
) -> CommandResult {
    let entries = config.ssh_history().load_recent_unique(limit)?;
    for (idx, entry) in entries.iter().enumerate() {
        if with_ids {
            writeln!(out, "{}\t{}", idx, entry.command).context("write failed")?;
        } else {
            writeln!(out, "{}", entry.command).context("write failed")?;
        }
    }
    Ok(())
}

/// Resolve `--select` or run the interactive picker.
fn choose<'a>(
    items: &'a mut [PickItem],
    args: &PickArgs,
    title: &str,
    alias_update: AliasUpdate<'a>,
) -> Result<&'a PickItem, Failure> {
    if items.is_empty() {
        return Err(Failure::Quiet);
    }
    let index = if args.non_interactive {
        args.select.ok_or(Failure::Quiet)?
    } else {
        match run_picker(items, title, PickerConfig::default(), Some(alias_update))? {
            PickOutcome::Selected(index) => index,
            PickOutcome::Canceled => return Err(Failure::Quiet),
        }
    };
    items.get(index).ok_or(Failure::Quiet)
}

pub fn pick<W: Write>(config: &Config, args: &PickArgs, out: &mut W) -> CommandResult {
    let entries = config.ssh_history().load_recent_unique(args.limit)?;
    let aliases = config.ssh_aliases();
    let mut items = items::ssh_items(&entries, &load_aliases(&aliases));

    let update: AliasUpdate = Box::new(|item, input| set_ssh_alias(&aliases, &item.args, input));
    let item = choose(&mut items, args, "sshtab pick", update)?;
    if contains_control_chars(&item.args) {
        return Err(Failure::Quiet);
    }
    writeln!(out, "{}", item.args).context("write failed")?;
    Ok(())
}

pub fn pick_command<W: Write>(config: &Config, args: &PickArgs, out: &mut W) -> CommandResult {
    let entries = merge_recent(
        config.command_history().load_recent_unique(0)?,
        config.ssh_history().load_recent_unique(0)?,
        args.limit,
    );
    let command_aliases = config.command_aliases();
    let mut items = items::command_items(
        &entries,
        &load_aliases(&command_aliases),
        &load_aliases(&config.ssh_aliases()),
    );

    let update: AliasUpdate = Box::new(|item, input| {
        let alias = normalize_alias_name(input)?;
        if contains_control_chars(&item.args) || contains_forbidden_metachars(&item.args) {
            return Err(anyhow!("command contains invalid characters"));
        }
        command_aliases.set_or_clear(&item.args, &alias)?;
        Ok(())
    });
    let item = choose(&mut items, args, "sshtab pick-command", update)?;
    if contains_control_chars(&item.args) || contains_forbidden_metachars(&item.args) {
        return Err(Failure::Quiet);
    }
    writeln!(out, "{}", item.args).context("write failed")?;
    Ok(())
}

/// Aliases only decorate rows, so an unreadable alias log is not fatal.
fn load_aliases(log: &AliasLog) -> AliasMap {
    log.load().unwrap_or_else(|err| {
        warn!("ignoring aliases in {}: {}", log.path().display(), err);
        AliasMap::new()
    })
}

fn set_ssh_alias(aliases: &AliasLog, args: &str, input: &str) -> anyhow::Result<()> {
    let alias = normalize_alias_name(input)?;
    if contains_control_chars(args) {
        return Err(anyhow!("args contain control characters"));
    }
    aliases.set_or_clear(args, &alias)?;
    Ok(())
}

pub fn alias(
    config: &Config,
    name: &str,
    id: Option<usize>,
    address: Option<&str>,
    limit: usize,
) -> CommandResult {
    let args = match (id, address) {
        (Some(id), _) => {
            let entries = config.ssh_history().load_recent_unique(limit)?;
            if entries.is_empty() {
                return Err(anyhow!("history is empty").into());
            }
            let entry = entries.get(id).ok_or_else(|| anyhow!("id out of range"))?;
            let args = extract_args(&entry.command);
            if args.is_empty() {
                return Err(anyhow!("empty args").into());
            }
            args.to_string()
        }
        (None, Some(address)) => normalize_args_input(address)?,
        (None, None) => return Err(anyhow!("--id or --address is required").into()),
    };
    set_ssh_alias(&config.ssh_aliases(), &args, name)?;
    Ok(())
}

pub fn delete(
    config: &Config,
    index: Option<usize>,
    use_pick: bool,
    limit: usize,
) -> CommandResult {
    let log = config.ssh_history();
    let entries = log.load_recent_unique(limit)?;
    if entries.is_empty() {
        return Err(anyhow!("history is empty").into());
    }

    let command = if use_pick {
        let mut items = items::delete_items(&entries, &load_aliases(&config.ssh_aliases()));
        if items.is_empty() {
            return Err(anyhow!("no deletable entries").into());
        }
        match run_picker(&mut items, "sshtab delete", PickerConfig::default(), None)? {
            PickOutcome::Selected(index) => match items.get(index) {
                Some(item) => item.display.clone(),
                None => return Err(Failure::Quiet),
            },
            PickOutcome::Canceled => return Err(Failure::Quiet),
        }
    } else {
        let index = index.ok_or_else(|| anyhow!("--index or --pick is required"))?;
        match entries.get(index) {
            Some(entry) => entry.command.clone(),
            None => return Err(anyhow!("index out of range").into()),
        }
    };

    let removed = log.delete_command(&command)?;
    debug!("deleted {} lines of {:?}", removed, command);
    Ok(())
}

/// `ssh` followed by the validated tokens of `args_string`.
pub fn exec_argv(args_string: &str) -> Result<Vec<CString>, Failure> {
    let tokens = validate_exec_args(args_string)?;
    std::iter::once(SSH_PROGRAM.to_string())
        .chain(tokens)
        .map(|arg| CString::new(arg).map_err(|err| Failure::Other(err.into())))
        .collect()
}

/// Replace the current process with `ssh`. Returns only on failure.
pub fn exec(args_string: &str) -> Result<Infallible, Failure> {
    let argv = exec_argv(args_string)?;
    let errno = match execvp(&argv[0], &argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    Err(anyhow!(std::io::Error::from(errno)).into())
}
