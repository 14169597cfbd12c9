//! The filesystem service trait

use crate::{ArchiveAction, FsResult, OpenFlags, WriteFlags};
use core_types::{ArchiveHandle, ArchiveId, ArchivePath, FileHandle, FsPath, ServiceHandle};

/// The filesystem service trait
///
/// This is the boundary between the shim and the platform's filesystem
/// service. Multiple implementations are possible:
/// - Simulated service (for testing)
/// - The platform service reached through its IPC handle
///
/// # Design Principles
///
/// **Explicit sessions**: every request names the session it belongs to.
/// A released session invalidates everything opened through it.
///
/// **Opaque handles**: archives and files are referred to by handles the
/// service issued. Handles carry no authority once closed.
///
/// **Blocking**: every method returns only once the service has answered.
///
/// # Example
///
/// ```
/// use core_types::{ArchiveId, ArchivePath};
/// use fs_api::{FsResult, FsService};
///
/// fn probe_sdmc<S: FsService>(service: &mut S) -> FsResult<()> {
///     let session = service.connect()?;
///     let sdmc = service.open_archive(session, ArchiveId::Sdmc, &ArchivePath::Empty)?;
///     service.close_archive(session, sdmc)?;
///     service.disconnect(session)
/// }
/// ```
pub trait FsService {
    /// Opens a session with the service
    ///
    /// Fails with `ServiceUnavailable` if the service is not running.
    fn connect(&mut self) -> FsResult<ServiceHandle>;

    /// Releases a session
    fn disconnect(&mut self, session: ServiceHandle) -> FsResult<()>;

    /// Opens (mounts) an archive
    ///
    /// # Arguments
    ///
    /// * `id` - Kind of archive to open
    /// * `path` - Archive path; empty for most archives, binary for user save data
    fn open_archive(
        &mut self,
        session: ServiceHandle,
        id: ArchiveId,
        path: &ArchivePath,
    ) -> FsResult<ArchiveHandle>;

    /// Closes an archive
    ///
    /// Uncommitted changes of a journaled archive are discarded once its last
    /// handle is closed.
    fn close_archive(&mut self, session: ServiceHandle, archive: ArchiveHandle) -> FsResult<()>;

    /// Opens a file inside an archive
    fn open_file(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
        flags: OpenFlags,
    ) -> FsResult<FileHandle>;

    /// Reads from `offset` into `buffer`
    ///
    /// Returns the number of bytes read, which is short at end of file.
    fn read(
        &mut self,
        session: ServiceHandle,
        file: FileHandle,
        offset: u64,
        buffer: &mut [u8],
    ) -> FsResult<usize>;

    /// Writes `data` at `offset`
    ///
    /// Returns the number of bytes written.
    fn write(
        &mut self,
        session: ServiceHandle,
        file: FileHandle,
        offset: u64,
        data: &[u8],
        flags: WriteFlags,
    ) -> FsResult<usize>;

    /// Truncates or extends a file
    fn set_size(&mut self, session: ServiceHandle, file: FileHandle, size: u64) -> FsResult<()>;

    /// Closes a file handle
    fn close_file(&mut self, session: ServiceHandle, file: FileHandle) -> FsResult<()>;

    /// Removes a file
    fn delete_file(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()>;

    /// Creates a single directory; the parent must already exist
    fn create_directory(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()>;

    /// Issues a control request on an archive
    fn control_archive(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        action: ArchiveAction,
    ) -> FsResult<()>;
}

impl<S: FsService + ?Sized> FsService for &mut S {
    fn connect(&mut self) -> FsResult<ServiceHandle> {
        (**self).connect()
    }

    fn disconnect(&mut self, session: ServiceHandle) -> FsResult<()> {
        (**self).disconnect(session)
    }

    fn open_archive(
        &mut self,
        session: ServiceHandle,
        id: ArchiveId,
        path: &ArchivePath,
    ) -> FsResult<ArchiveHandle> {
        (**self).open_archive(session, id, path)
    }

    fn close_archive(&mut self, session: ServiceHandle, archive: ArchiveHandle) -> FsResult<()> {
        (**self).close_archive(session, archive)
    }

    fn open_file(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
        flags: OpenFlags,
    ) -> FsResult<FileHandle> {
        (**self).open_file(session, archive, path, flags)
    }

    fn read(
        &mut self,
        session: ServiceHandle,
        file: FileHandle,
        offset: u64,
        buffer: &mut [u8],
    ) -> FsResult<usize> {
        (**self).read(session, file, offset, buffer)
    }

    fn write(
        &mut self,
        session: ServiceHandle,
        file: FileHandle,
        offset: u64,
        data: &[u8],
        flags: WriteFlags,
    ) -> FsResult<usize> {
        (**self).write(session, file, offset, data, flags)
    }

    fn set_size(&mut self, session: ServiceHandle, file: FileHandle, size: u64) -> FsResult<()> {
        (**self).set_size(session, file, size)
    }

    fn close_file(&mut self, session: ServiceHandle, file: FileHandle) -> FsResult<()> {
        (**self).close_file(session, file)
    }

    fn delete_file(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()> {
        (**self).delete_file(session, archive, path)
    }

    fn create_directory(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()> {
        (**self).create_directory(session, archive, path)
    }

    fn control_archive(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        action: ArchiveAction,
    ) -> FsResult<()> {
        (**self).control_archive(session, archive, action)
    }
}
