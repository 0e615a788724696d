//! Projection of ranked history onto picker rows.

use sshtab_store::{AliasMap, HistoryEntry};
use sshtab_types::SshMeta;
use sshtab_types::normalize::extract_args;
use sshtab_types::validate::{contains_control_chars, contains_forbidden_metachars};

/// One row of the picker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickItem {
    /// Full command as recorded.
    pub display: String,
    /// Display alias, empty when none is set.
    pub alias: String,
    /// Text emitted when the row is chosen.
    pub args: String,
    pub last_used: i64,
    pub count: u64,
    pub meta: SshMeta,
}

impl PickItem {
    /// The label shown in the list for the current display mode.
    pub fn label(&self, show_alias: bool) -> &str {
        if show_alias && !self.alias.is_empty() {
            &self.alias
        } else {
            &self.display
        }
    }
}

fn lookup_alias(aliases: &AliasMap, key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    aliases
        .get(key)
        .filter(|alias| !contains_control_chars(alias))
        .cloned()
}

fn ssh_item(entry: &HistoryEntry, aliases: &AliasMap) -> PickItem {
    let args = extract_args(&entry.command).to_string();
    PickItem {
        display: entry.command.clone(),
        alias: lookup_alias(aliases, &args).unwrap_or_default(),
        meta: SshMeta::from_args(&args),
        args,
        last_used: entry.last_used,
        count: entry.count,
    }
}

/// Rows for `pick`: ssh commands with a non-empty argument string.
pub fn ssh_items(entries: &[HistoryEntry], aliases: &AliasMap) -> Vec<PickItem> {
    entries
        .iter()
        .filter(|entry| !contains_control_chars(&entry.command))
        .map(|entry| ssh_item(entry, aliases))
        .filter(|item| !item.args.is_empty())
        .collect()
}

/// Rows for `delete --pick`. Bare `ssh` lines stay deletable; the command
/// to remove is the row's `display`.
pub fn delete_items(entries: &[HistoryEntry], aliases: &AliasMap) -> Vec<PickItem> {
    entries
        .iter()
        .filter(|entry| !contains_control_chars(&entry.command))
        .map(|entry| ssh_item(entry, aliases))
        .collect()
}

/// Rows for `pick-command`: any command that is safe to print back to the
/// shell. The command alias wins over the ssh alias of its arguments.
pub fn command_items(
    entries: &[HistoryEntry],
    command_aliases: &AliasMap,
    ssh_aliases: &AliasMap,
) -> Vec<PickItem> {
    entries
        .iter()
        .filter(|entry| {
            !contains_control_chars(&entry.command)
                && !contains_forbidden_metachars(&entry.command)
        })
        .map(|entry| {
            let ssh_args = extract_args(&entry.command);
            let alias = lookup_alias(command_aliases, &entry.command)
                .or_else(|| lookup_alias(ssh_aliases, ssh_args))
                .unwrap_or_default();
            PickItem {
                display: entry.command.clone(),
                alias,
                args: entry.command.clone(),
                last_used: entry.last_used,
                count: entry.count,
                meta: SshMeta::from_args(ssh_args),
            }
        })
        .collect()
}
