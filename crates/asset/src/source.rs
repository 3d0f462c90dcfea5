//! Where asset bytes come from.

use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
};

use crate::error::FetchError;

/// Fetches raw asset bytes by relative path.
pub trait AssetSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

/// Reads assets from the local filesystem, relative to `root`.
#[derive(Clone, Debug)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let full = self.root.join(path);
        log::debug!("Reading {}", full.display());
        std::fs::read(&full).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound { path: full },
            _ => FetchError::Io { path: full, source },
        })
    }
}

/// Resolve `file` against the directory containing `base`, the way a
/// relative link in `base` would be followed.
pub fn resolve_relative(base: &str, file: &str) -> String {
    let dir = Path::new(base).parent().unwrap_or(Path::new(""));
    dir.join(file).to_string_lossy().into_owned()
}
