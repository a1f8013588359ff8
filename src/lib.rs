//! Core of the psmux session/window chooser: scoped options, the session
//! registry, the command layer and the interactive tree chooser.

pub mod choose;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod options;
pub mod server;
pub mod tree;
pub mod types;

pub use choose::{ChooseAction, ChooseMode, SelectionEntry, SelectorSession};
pub use commands::{CmdCtx, CmdRetval};
pub use error::{CmdError, OptionError};
pub use options::{OptionValue, Options, SharedOptions};
pub use server::Server;
pub use tree::{build_tree, ChooseTemplates, ChooseTree, TreeMode};

/// Send `tracing` output to stderr when `PSMUX_LOG` is set (same syntax as
/// `RUST_LOG`, e.g. `PSMUX_LOG=psmux_core=debug`). Does nothing otherwise,
/// or when a subscriber is already installed.
pub fn init_logging() {
    let Ok(filter) = tracing_subscriber::EnvFilter::try_from_env("PSMUX_LOG") else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
