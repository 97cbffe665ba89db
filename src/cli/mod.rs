//! Command-line interface components
//!
//! This module contains CLI-specific code for the CelesTrak Fetcher
//! application, including argument parsing, command handlers and the
//! progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    CatalogArgs, Cli, Commands, ConfigAction, ConfigArgs, FetchArgs, GlobalArgs, ListArgs,
};
pub use commands::{
    handle_catalog, handle_config, handle_fetch, handle_list, handle_rotate, load_config,
    EXIT_UNIT_FAILURES,
};
pub use progress::ProgressDisplay;
