use std::io;
use thiserror::Error;

/// Store failures.
///
/// Malformed log lines are never reported here; they are skipped while
/// reading.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("command not found in history")]
    NotFound,

    #[error("{0}")]
    Policy(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn io(op: &'static str) -> impl FnOnce(io::Error) -> StoreError {
        move |source| StoreError::Io { op, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}
