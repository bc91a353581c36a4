use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop the dataset from loading at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("malformed CSV: {0}")]
    Parse(#[from] csv::Error),
}
