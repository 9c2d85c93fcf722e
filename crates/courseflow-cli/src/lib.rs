//! # courseflow-cli: command-line interface
//!
//! The `courseflow` binary wires the `courseflow-pipeline` orchestrator
//! to a small `clap`-derive CLI: `run` executes the full pipeline for a
//! request file, `validate` and `inspect` give read-only access to the
//! loaders without running any engine (spec §3 "CLI").

pub mod cli;
pub mod commands;

pub use cli::{build_cli_command, Cli, Commands};
