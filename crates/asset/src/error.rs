use std::{io, path::PathBuf};

use thiserror::Error;

/// A malformed directive in an OBJ or MTL text, with its 1-based line number.
#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseErrorKind {
    #[error("missing {what} for '{keyword}'")]
    MissingValue {
        keyword: &'static str,
        what: &'static str,
    },
    #[error("invalid number '{token}'")]
    InvalidNumber { token: String },
    #[error("invalid index '{token}' (OBJ indices are 1-based and non-zero)")]
    InvalidIndex { token: String },
    #[error("index {index} out of range, {len} declared so far")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("face needs at least 3 vertices, got {count}")]
    IncompleteFace { count: usize },
    #[error("'{keyword}' before any 'newmtl'")]
    NoActiveMaterial { keyword: String },
}

impl ParseError {
    pub(crate) fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("asset not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure of the one-time model load. Never retried.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch '{path}'")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to parse '{path}'")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },
    #[error("'{path}' is not valid UTF-8")]
    Encoding { path: String },
}
