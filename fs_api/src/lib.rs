//! # Filesystem Service API
//!
//! This crate defines the interface between the filesystem shim and the
//! platform filesystem service.
//!
//! ## Philosophy
//!
//! The service provides **primitives**, not conveniences:
//! - Sessions (connect / disconnect)
//! - Archives (open / close / control)
//! - Files (open / read / write / set size / close)
//! - Namespace changes (delete file / create directory)
//!
//! Everything composite (read a whole file, write then commit) lives in the
//! shim on top of this trait.
//!
//! ## Design Goals
//!
//! 1. **Testability**: the whole service can be replaced by a simulation
//! 2. **Explicitness**: every request names its session and archive
//! 3. **No exceptions**: every failure is an [`FsError`] value

pub mod error;
pub mod flags;
pub mod service;

pub use error::{FsError, FsResult};
pub use flags::{ArchiveAction, OpenFlags, WriteFlags};
pub use service::FsService;
