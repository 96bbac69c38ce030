#[cfg(feature = "cli")]
pub mod cli;
pub mod innodb;
pub mod util;

use thiserror::Error;

/// Errors produced while opening or decoding InnoDB files.
#[derive(Error, Debug)]
pub enum InnoError {
    /// The underlying file could not be opened, read, or seeked.
    #[error("I/O error: {0}")]
    Io(String),

    /// On-disk bytes violate the format: impossible offsets, broken
    /// linked-list invariants, an index page claiming a foreign index id.
    #[error("Corruption: {0}")]
    Corrupt(String),

    /// A record describer is missing or disagrees with the page being decoded.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The caller asked for something the file does not have (page number out
    /// of range, unknown list name).
    #[error("Invalid argument: {0}")]
    Usage(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, InnoError>;
