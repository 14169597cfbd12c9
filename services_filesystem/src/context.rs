//! The initialized filesystem context
//!
//! An [`FsContext`] is the Ready state: a session with the service plus the
//! SD card and save archives opened at init. `exit` consumes it, so no
//! operation can be issued outside the init/exit window. Dropping a context
//! without calling `exit` runs the same teardown.

use crate::FsConfig;
use core_types::{ArchiveHandle, ArchiveId, ArchivePath, FileHandle, FsPath, ServiceHandle};
use fs_api::{ArchiveAction, FsError, FsResult, FsService, OpenFlags, WriteFlags};

/// Session and well-known archives of an initialized filesystem service
///
/// `S` may be an owned service or `&mut` one.
///
/// ## Example
///
/// ```
/// use services_filesystem::{FsConfig, FsContext};
/// use sim_fs::test_utils::{standard_service, TEST_SAVE_LOCATOR};
///
/// let mut service = standard_service(TEST_SAVE_LOCATOR);
/// let mut fs = FsContext::init(&mut service, &FsConfig::new(TEST_SAVE_LOCATOR)).unwrap();
///
/// let save = fs.save();
/// fs.write_s_file("/save.dat", b"hello", 5, save).unwrap();
///
/// let mut buf = [0u8; 16];
/// let read = fs.read_file("/save.dat", &mut buf, save, 16).unwrap();
/// assert_eq!(&buf[..read], b"hello");
///
/// fs.exit().unwrap();
/// ```
pub struct FsContext<S: FsService> {
    service: S,
    session: ServiceHandle,
    sdmc: ArchiveHandle,
    save: ArchiveHandle,
    released: bool,
}

impl<S: FsService> FsContext<S> {
    /// Connects to the service and opens the SD card and save archives
    ///
    /// On failure every step already taken is undone, newest first, and the
    /// error of the failing step is returned.
    pub fn init(mut service: S, config: &FsConfig) -> FsResult<Self> {
        let session = service.connect()?;

        let sdmc = match service.open_archive(session, config.sdmc_archive, &ArchivePath::Empty) {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("fs init: opening {} failed: {}", config.sdmc_archive, err);
                release_session(&mut service, session);
                return Err(err);
            }
        };

        let save_path = config.save_archive_path();
        let save = match service.open_archive(session, config.save_archive, &save_path) {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("fs init: opening {} failed: {}", config.save_archive, err);
                if let Err(close_err) = service.close_archive(session, sdmc) {
                    log::warn!("fs init: closing {} during unwind: {}", sdmc, close_err);
                }
                release_session(&mut service, session);
                return Err(err);
            }
        };

        log::info!("fs init: {} ready (sdmc {}, save {})", session, sdmc, save);
        Ok(Self {
            service,
            session,
            sdmc,
            save,
            released: false,
        })
    }

    /// Closes both well-known archives, then releases the session
    ///
    /// Every step is attempted; the first error is returned.
    pub fn exit(mut self) -> FsResult<()> {
        self.shutdown()
    }

    /// Removable storage archive
    pub fn sdmc(&self) -> ArchiveHandle {
        self.sdmc
    }

    /// The application's save archive
    pub fn save(&self) -> ArchiveHandle {
        self.save
    }

    pub fn session(&self) -> ServiceHandle {
        self.session
    }

    /// Returns the underlying service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Reads up to `max_size` bytes of `path` into `dst`
    ///
    /// Returns the number of bytes read. `max_size` larger than `dst` is an
    /// `InvalidArgument` error.
    pub fn read_file(
        &mut self,
        path: &str,
        dst: &mut [u8],
        archive: ArchiveHandle,
        max_size: u64,
    ) -> FsResult<usize> {
        let path = FsPath::parse(path)?;
        let len = checked_len(max_size, dst.len(), "max_size")?;
        let dst = &mut dst[..len];

        let result = self.with_file(archive, &path, OpenFlags::READ, |svc, session, file| {
            svc.read(session, file, 0, dst)
        });
        log::debug!("read_file {}: {:?}", path, result);
        result
    }

    /// Writes `src[..size]` to `path`, creating it if needed
    ///
    /// The file ends up exactly as long as the bytes the service accepted, so
    /// a short write never leaves padding behind. Returns that count.
    pub fn write_file(
        &mut self,
        path: &str,
        src: &[u8],
        size: u64,
        archive: ArchiveHandle,
    ) -> FsResult<usize> {
        let path = FsPath::parse(path)?;
        let len = checked_len(size, src.len(), "size")?;
        let data = &src[..len];

        let result = self.with_file(
            archive,
            &path,
            OpenFlags::WRITE | OpenFlags::CREATE,
            |svc, session, file| {
                let flags = WriteFlags::FLUSH | WriteFlags::UPDATE_TIME;
                let written = svc.write(session, file, 0, data, flags)?;
                svc.set_size(session, file, written as u64)?;
                Ok(written)
            },
        );
        log::debug!("write_file {}: {:?}", path, result);
        result
    }

    /// [`write_file`](Self::write_file), then commits the archive
    ///
    /// The commit is only issued when the write succeeded.
    pub fn write_s_file(
        &mut self,
        path: &str,
        src: &[u8],
        size: u64,
        archive: ArchiveHandle,
    ) -> FsResult<usize> {
        let written = self.write_file(path, src, size, archive)?;
        self.control_archive(archive)?;
        Ok(written)
    }

    /// Removes a file
    pub fn delete_file(&mut self, path: &str, archive: ArchiveHandle) -> FsResult<()> {
        let path = FsPath::parse(path)?;
        let result = self.service.delete_file(self.session, archive, &path);
        log::debug!("delete_file {}: {:?}", path, result);
        result
    }

    /// [`delete_file`](Self::delete_file), then commits the archive
    ///
    /// The commit is only issued when the delete succeeded.
    pub fn delete_s_file(&mut self, path: &str, archive: ArchiveHandle) -> FsResult<()> {
        self.delete_file(path, archive)?;
        self.control_archive(archive)
    }

    /// Creates one directory; the parent must already exist
    pub fn create_directory(&mut self, path: &str, archive: ArchiveHandle) -> FsResult<()> {
        let path = FsPath::parse(path)?;
        let result = self.service.create_directory(self.session, archive, &path);
        log::debug!("create_directory {}: {:?}", path, result);
        result
    }

    /// Commits pending changes of `archive`
    pub fn control_archive(&mut self, archive: ArchiveHandle) -> FsResult<()> {
        let action = ArchiveAction::CommitSaveData;
        let result = self.service.control_archive(self.session, archive, action);
        log::debug!("control_archive {}: {:?}", archive, result);
        result
    }

    /// Opens an additional archive on this session
    ///
    /// The caller must close it with [`close_archive`](Self::close_archive)
    /// before `exit`.
    pub fn open_archive(&mut self, id: ArchiveId, path: &ArchivePath) -> FsResult<ArchiveHandle> {
        self.service.open_archive(self.session, id, path)
    }

    /// Closes an archive opened with [`open_archive`](Self::open_archive)
    ///
    /// The well-known archives are closed by `exit` and cannot be closed here.
    pub fn close_archive(&mut self, archive: ArchiveHandle) -> FsResult<()> {
        if archive == self.sdmc || archive == self.save {
            return Err(FsError::InvalidArgument(format!(
                "{} is closed by exit",
                archive
            )));
        }
        self.service.close_archive(self.session, archive)
    }

    /// Opens a file, runs `op`, and closes the file whatever `op` returned
    ///
    /// If both `op` and the close fail, the error from `op` is returned.
    fn with_file<T>(
        &mut self,
        archive: ArchiveHandle,
        path: &FsPath,
        flags: OpenFlags,
        op: impl FnOnce(&mut S, ServiceHandle, FileHandle) -> FsResult<T>,
    ) -> FsResult<T> {
        let session = self.session;
        let file = self.service.open_file(session, archive, path, flags)?;
        let result = op(&mut self.service, session, file);
        let closed = self.service.close_file(session, file);

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                log::warn!("closing {} after failed request: {}", path, close_err);
                Err(err)
            }
        }
    }

    fn shutdown(&mut self) -> FsResult<()> {
        self.released = true;
        let save = self.service.close_archive(self.session, self.save);
        let sdmc = self.service.close_archive(self.session, self.sdmc);
        let session = self.service.disconnect(self.session);

        let result = save.and(sdmc).and(session);
        match &result {
            Ok(()) => log::info!("fs exit: {} released", self.session),
            Err(err) => log::warn!("fs exit: {}: {}", self.session, err),
        }
        result
    }
}

impl<S: FsService> Drop for FsContext<S> {
    fn drop(&mut self) {
        if !self.released {
            log::warn!("fs context dropped without exit; releasing {}", self.session);
            let _ = self.shutdown();
        }
    }
}

fn release_session<S: FsService>(service: &mut S, session: ServiceHandle) {
    if let Err(err) = service.disconnect(session) {
        log::warn!("fs init: releasing {} during unwind: {}", session, err);
    }
}

fn checked_len(requested: u64, available: usize, what: &str) -> FsResult<usize> {
    usize::try_from(requested)
        .ok()
        .filter(|&len| len <= available)
        .ok_or_else(|| {
            FsError::InvalidArgument(format!(
                "{} {} exceeds buffer of {} bytes",
                what, requested, available
            ))
        })
}
