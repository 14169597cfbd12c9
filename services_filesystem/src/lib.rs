//! # Filesystem Service Shim
//!
//! This crate wraps the platform filesystem service in a handful of
//! whole-file helpers.
//!
//! ## Philosophy
//!
//! **The shim adds shape, not policy.**
//!
//! Each helper expands into the service's own open / operate / close
//! sequence. There is no caching, no retry and no recovery: whatever the
//! service reports is what the caller gets.
//!
//! ## Design
//!
//! - **FsContext**: the initialized session plus its two well-known archives
//!   (SD card and the application's save data). It exists only between a
//!   successful init and the matching exit.
//! - **Commit variants**: `write_s_file` / `delete_s_file` commit the archive
//!   after the change, and never when the change itself failed.
//! - **FsConfig**: which archives init opens, loadable from JSON.

pub mod config;
pub mod context;

pub use config::{ConfigError, FsConfig};
pub use context::FsContext;
