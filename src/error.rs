use std::{io, path::PathBuf};
use thiserror::Error;

use crate::format::FileFormat;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read source file '{}': {source}", .path.display())]
    SourceNotFound { path: PathBuf, source: io::Error },
    #[error("Failed {format} deserialization of '{}': {msg}", .path.display())]
    MalformedSource {
        path: PathBuf,
        format: FileFormat,
        msg: String,
    },
    #[error("Value not representable: {0}")]
    Unrepresentable(String),
    #[error("Failed {0} serialization: {1}")]
    Serialization(FileFormat, String),
    #[error("Failed to write destination file '{}': {source}", .path.display())]
    DestinationUnwritable { path: PathBuf, source: io::Error },
}
