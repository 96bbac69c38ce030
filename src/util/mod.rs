//! Formatting helpers shared by the CLI subcommands.

pub mod hex;
