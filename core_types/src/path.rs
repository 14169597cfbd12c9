//! Paths inside an archive
//!
//! An [`FsPath`] is an absolute, normalized path such as `/saves/slot1.dat`.
//! Parsing rejects anything the service would have to guess about, so every
//! `FsPath` that exists is well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing a path
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path is empty
    #[error("Empty path")]
    Empty,

    /// Path does not start at the archive root
    #[error("Path must be absolute: {0}")]
    NotAbsolute(String),

    /// Path contains an empty, `.` or `..` component
    #[error("Invalid path component in {0}")]
    InvalidComponent(String),

    /// Path contains a NUL byte
    #[error("Path contains NUL byte")]
    ContainsNul,

    /// Path exceeds [`FsPath::MAX_LEN`]
    #[error("Path too long: {len} bytes (max {max})")]
    TooLong { len: usize, max: usize },
}

/// A validated absolute path inside an archive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FsPath(String);

impl FsPath {
    /// Longest accepted path, in bytes
    pub const MAX_LEN: usize = 255;

    /// Returns the archive root (`/`)
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parses and validates a path
    ///
    /// A single trailing slash is accepted and dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::FsPath;
    ///
    /// let path = FsPath::parse("/saves/slot1.dat").unwrap();
    /// assert_eq!(path.components().collect::<Vec<_>>(), vec!["saves", "slot1.dat"]);
    ///
    /// assert!(FsPath::parse("saves/slot1.dat").is_err());
    /// assert!(FsPath::parse("/saves/../etc").is_err());
    /// ```
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        if path.len() > Self::MAX_LEN {
            return Err(PathError::TooLong {
                len: path.len(),
                max: Self::MAX_LEN,
            });
        }
        if path.contains('\0') {
            return Err(PathError::ContainsNul);
        }
        if !path.starts_with('/') {
            return Err(PathError::NotAbsolute(path.to_string()));
        }
        if path == "/" {
            return Ok(Self::root());
        }

        let body = path[1..].strip_suffix('/').unwrap_or(&path[1..]);
        for component in body.split('/') {
            if !Self::is_valid_name(component) {
                return Err(PathError::InvalidComponent(path.to_string()));
            }
        }

        Ok(Self(format!("/{}", body)))
    }

    /// Validates a single path component name
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\0')
    }

    /// Returns true for the archive root
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Iterates over the path components (empty for the root)
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Returns the final component, or `None` for the root
    pub fn file_name(&self) -> Option<&str> {
        self.components().last()
    }

    /// Returns the parent directory, or `None` for the root
    pub fn parent(&self) -> Option<FsPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Returns the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FsPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for FsPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FsPath> for String {
    fn from(path: FsPath) -> Self {
        path.0
    }
}
