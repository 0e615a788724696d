//! Persistent storage for sshtab.
//!
//! Two kinds of flat, line-oriented logs live in the data directory:
//!
//! - history logs: `epoch<TAB>exit_code<TAB>base64(command)`, append-only
//! - alias logs: `base64(key)<TAB>base64(alias)`, rewritten whole on change
//!
//! Every operation holds a `flock` on the log for its whole duration, so
//! independent shell sessions can record and read concurrently.
//!
//! # Module Structure
//!
//! - [`config`] - data directory resolution and log file names
//! - [`history`] - ranked history logs ([`HistoryLog`])
//! - [`alias`] - alias maps ([`AliasLog`])
//! - `lock` / `replace` - locking the live file behind a path, and atomic file replacement

pub mod alias;
pub mod config;
mod error;
pub mod history;
mod lock;
mod replace;

pub use alias::{AliasLog, AliasMap};
pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use history::{HistoryEntry, HistoryLog, merge_recent};
