use std::path::PathBuf;

use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    /// Source binary or DFU file is missing
    #[error("Input file {} doesn't exist", .0.display())]
    InputNotFound(PathBuf),
    /// Destination exists and overwriting wasn't requested
    #[error("Refusing to overwrite existing file {}. Use --overwrite to force.", .0.display())]
    OutputExists(PathBuf),
    /// dfu-util returned a failure
    #[error("{0} exited with {1}")]
    DfuUtil(String, std::process::ExitStatus),

    /// dfuse-builder error
    #[error("dfuse-builder error: {0}")]
    Builder(#[from] dfuse_builder::err::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other error
    #[error("{0}")]
    Custom(#[from] Box<dyn std::error::Error>),
}
