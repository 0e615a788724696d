//! Recall and safely re-run successful ssh commands.
//!
//! # Module Structure
//!
//! - [`cli`] - command line definition
//! - [`commands`] - subcommand implementations
//! - [`items`] - history entries projected onto picker rows
//! - [`picker`] - raw-mode terminal picker
//! - [`logging`] - `tracing` setup

pub mod cli;
pub mod commands;
pub mod items;
pub mod logging;
pub mod picker;
