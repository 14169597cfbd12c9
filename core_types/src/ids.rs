//! Opaque handles issued by the filesystem service

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Handle for an open connection to the filesystem service
///
/// A session is acquired once at initialization and released at shutdown.
/// Archives and files opened through a session become unusable once the
/// session is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceHandle(Uuid);

impl ServiceHandle {
    /// Creates a new random service handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a service handle from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ServiceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

/// Handle for an opened archive (mounted storage volume)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchiveHandle(Uuid);

impl ArchiveHandle {
    /// Creates a new random archive handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an archive handle from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ArchiveHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArchiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Archive({})", self.0)
    }
}

/// Handle for a file opened inside an archive
///
/// File handles never outlive a single shim call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileHandle(Uuid);

impl FileHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FileHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}
