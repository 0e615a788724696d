//! Data directory configuration.
//!
//! The directory is resolved once at startup and handed to every store
//! call, so tests can point the stores at a temporary directory.

use crate::alias::AliasLog;
use crate::error::{StoreError, StoreResult};
use crate::history::HistoryLog;
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "sshtab";

/// Normalized `ssh` commands recorded by the shell hook.
pub const SSH_HISTORY_FILE: &str = "history.log";
/// Arbitrary command lines (`add`, plus every recorded ssh command).
pub const COMMAND_HISTORY_FILE: &str = "commands.log";
/// Aliases keyed by ssh argument string.
pub const SSH_ALIAS_FILE: &str = "aliases.log";
/// Aliases keyed by full command line.
pub const COMMAND_ALIAS_FILE: &str = "aliases_cmd.log";

#[derive(Debug, Clone)]
pub struct Config {
    data_dir: PathBuf,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
        }
    }

    /// `$XDG_DATA_HOME/sshtab`, or `$HOME/.local/share/sshtab`.
    pub fn from_env() -> StoreResult<Self> {
        let xdg_dir = xdg::BaseDirectories::with_prefix(APP_NAME)
            .map_err(|err| StoreError::Config(format!("failed get xdg directory: {err}")))?;
        Ok(Config::new(xdg_dir.get_data_home()))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn ssh_history(&self) -> HistoryLog {
        HistoryLog::new(self.data_dir.join(SSH_HISTORY_FILE))
    }

    pub fn command_history(&self) -> HistoryLog {
        HistoryLog::new(self.data_dir.join(COMMAND_HISTORY_FILE))
    }

    pub fn ssh_aliases(&self) -> AliasLog {
        AliasLog::new(self.data_dir.join(SSH_ALIAS_FILE))
    }

    pub fn command_aliases(&self) -> AliasLog {
        AliasLog::new(self.data_dir.join(COMMAND_ALIAS_FILE))
    }
}

/// Create the parent directory of a log file (mode 0700) if missing.
pub(crate) fn ensure_parent_dir(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)
            .map_err(StoreError::io("mkdir")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_paths_live_in_data_dir() {
        let config = Config::new("/tmp/sshtab-test");
        assert_eq!(config.data_dir(), Path::new("/tmp/sshtab-test"));
        assert_eq!(
            config.ssh_history().path(),
            Path::new("/tmp/sshtab-test/history.log")
        );
        assert_eq!(
            config.command_history().path(),
            Path::new("/tmp/sshtab-test/commands.log")
        );
        assert_eq!(
            config.ssh_aliases().path(),
            Path::new("/tmp/sshtab-test/aliases.log")
        );
        assert_eq!(
            config.command_aliases().path(),
            Path::new("/tmp/sshtab-test/aliases_cmd.log")
        );
    }

    #[test]
    fn ensure_parent_dir_creates_private_dir() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("nested/deeper/history.log");
        ensure_parent_dir(&log).unwrap();
        let meta = std::fs::metadata(tmp.path().join("nested/deeper")).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o777, 0o700);
        // Second call is a no-op.
        ensure_parent_dir(&log).unwrap();
    }
}
