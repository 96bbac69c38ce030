//! CLI subcommand implementations.
//!
//! Each subcommand has an `Options` struct and a
//! `pub fn execute(opts, writer) -> Result<()>` entry point. The
//! `writer: &mut dyn Write` parameter allows output to be captured in tests
//! or redirected as needed.

pub mod app;
pub mod btree;
pub mod extents;
pub mod inodes;
pub mod lists;
pub mod log;
pub mod page;
pub mod pages;
pub mod summary;

/// Write a line to the given writer, converting io::Error to InnoError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::InnoError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::InnoError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;

use crate::innodb::space::Space;
use crate::Result;

/// Open a space honoring an optional `--page-size` override.
pub(crate) fn open_space(file: &str, page_size: Option<u32>) -> Result<Space> {
    match page_size {
        Some(ps) => Space::open_with_page_size(file, ps),
        None => Space::open(file),
    }
}

/// Render a serializable value as pretty JSON to the writer.
pub(crate) fn write_json<T: serde::Serialize>(
    value: &T,
    writer: &mut dyn std::io::Write,
) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| crate::InnoError::Io(format!("cannot serialize output: {}", e)))?;
    writeln!(writer, "{}", text).map_err(|e| crate::InnoError::Io(e.to_string()))
}
