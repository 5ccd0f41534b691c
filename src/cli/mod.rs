//! # Command-Line Interface
//!
//! A terminal front end over the store: it starts a session, drives it
//! with scripted operations and prints the resulting state.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `show` | Print the session a fresh start produces |
//! | `run <script>` | Apply a TOML/YAML/JSON script of store operations |
//! | `defaults <kind>` | Print the catalog template for a kind |
//! | `measure ...` | Imperial/metric and polar conversions |
//! | `config` | Print the effective configuration |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! `--verbose` (or `-v`) logs store activity to stderr; `RUST_LOG` takes
//! any tracing filter.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod script;
mod session;
mod measure;
mod catalog_cmd;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
pub use script::{RunReport, Script, ScriptError, Step};
