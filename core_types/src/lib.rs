//! # Core Types
//!
//! This crate defines the value types shared by the filesystem shim and the
//! services it talks to.
//!
//! ## Philosophy
//!
//! - **Handles are opaque**: a handle names something the service owns; it
//!   carries no data and cannot be forged from a path.
//! - **Paths are validated once**: an [`FsPath`] is always well-formed, so the
//!   layers below never re-check syntax.
//! - **Pure data**: nothing in this crate performs I/O.
//!
//! ## Key Types
//!
//! - [`ServiceHandle`]: the open connection to the filesystem service
//! - [`ArchiveHandle`]: an opened storage volume
//! - [`FileHandle`]: an open file inside an archive
//! - [`ArchiveId`] / [`ArchivePath`]: what to open
//! - [`UserSaveDataLocator`]: which save-data archive to open
//! - [`FsPath`]: a path inside an archive

pub mod archive;
pub mod ids;
pub mod path;

pub use archive::{ArchiveId, ArchivePath, MediaType, UserSaveDataLocator};
pub use ids::{ArchiveHandle, FileHandle, ServiceHandle};
pub use path::{FsPath, PathError};
