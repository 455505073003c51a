use std::path::PathBuf;

use thiserror::Error;

/// Failure of one extraction unit (a single input file).
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot extract text from {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("question {id} not found in {category}")]
    UnknownQuestion { category: String, id: String },

    #[error("cannot read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
