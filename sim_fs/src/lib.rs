//! # Simulated Filesystem Service
//!
//! A deterministic, in-memory implementation of [`FsService`] for tests and
//! host-side development.
//!
//! ## Design
//!
//! - **Volumes** are provisioned up front and keyed by [`VolumeKey`]
//!   (archive kind plus archive path). Opening anything else is `NotFound`.
//! - **Journaled volumes** behave like save data: changes are visible at once
//!   but only survive closing the archive if they were committed.
//! - **Sessions** gate everything: after `disconnect`, every request naming
//!   that session fails with `ServiceUnavailable`.
//! - **Fault injection** and a **request audit log** make failure paths and
//!   request ordering observable.

pub mod fault_injection;
pub mod request_audit;
pub mod test_utils;
pub mod volume;

pub use fault_injection::{FaultInjector, FaultPlan, RequestFault};
pub use request_audit::{RequestAuditLog, RequestKind, RequestRecord};
pub use volume::{MAX_FILE_LEN, Node, Volume, VolumeConfig};

use core_types::{
    ArchiveHandle, ArchiveId, ArchivePath, FileHandle, FsPath, ServiceHandle, UserSaveDataLocator,
};
use fs_api::{ArchiveAction, FsError, FsResult, FsService, OpenFlags, WriteFlags};
use std::collections::{BTreeMap, BTreeSet};

/// Identifies a provisioned volume
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeKey {
    pub id: ArchiveId,
    pub path: ArchivePath,
}

impl VolumeKey {
    pub fn new(id: ArchiveId, path: ArchivePath) -> Self {
        Self { id, path }
    }

    /// The removable storage volume
    pub fn sdmc() -> Self {
        Self::new(ArchiveId::Sdmc, ArchivePath::Empty)
    }

    /// The user save-data volume named by `locator`
    pub fn user_save_data(locator: UserSaveDataLocator) -> Self {
        Self::new(ArchiveId::UserSaveData, locator.to_archive_path())
    }
}

#[derive(Debug, Clone)]
struct OpenArchive {
    session: ServiceHandle,
    key: VolumeKey,
}

#[derive(Debug, Clone)]
struct OpenFile {
    session: ServiceHandle,
    archive: ArchiveHandle,
    path: FsPath,
    flags: OpenFlags,
}

/// In-memory filesystem service
#[derive(Debug)]
pub struct MemoryFsService {
    available: bool,
    sessions: BTreeSet<ServiceHandle>,
    volumes: BTreeMap<VolumeKey, Volume>,
    archives: BTreeMap<ArchiveHandle, OpenArchive>,
    files: BTreeMap<FileHandle, OpenFile>,
    faults: FaultInjector,
    audit: RequestAuditLog,
    leaked_archives: usize,
}

impl MemoryFsService {
    /// Creates a running service with no volumes
    pub fn new() -> Self {
        Self {
            available: true,
            sessions: BTreeSet::new(),
            volumes: BTreeMap::new(),
            archives: BTreeMap::new(),
            files: BTreeMap::new(),
            faults: FaultInjector::default(),
            audit: RequestAuditLog::new(),
            leaked_archives: 0,
        }
    }

    /// Provisions a volume
    ///
    /// Journaling always follows the archive kind; the rest of `config` is
    /// taken as given.
    pub fn with_volume(mut self, key: VolumeKey, mut config: VolumeConfig) -> Self {
        let journaled = key.id.is_journaled();
        if config.journaled != journaled {
            log::debug!(
                "sim_fs: {} volume is {}journaled regardless of config",
                key.id,
                if journaled { "" } else { "not " }
            );
            config.journaled = journaled;
        }
        self.volumes.insert(key, Volume::new(config));
        self
    }

    /// Provisions a volume with the defaults for its archive kind
    pub fn with_archive(self, key: VolumeKey) -> Self {
        let config = VolumeConfig::for_archive(key.id);
        self.with_volume(key, config)
    }

    /// Provisions a write-through SD card volume
    pub fn with_sdmc(self) -> Self {
        self.with_archive(VolumeKey::sdmc())
    }

    /// Provisions a journaled user save-data volume
    pub fn with_user_save_data(self, locator: UserSaveDataLocator) -> Self {
        self.with_archive(VolumeKey::user_save_data(locator))
    }

    /// Replaces the fault plan
    pub fn with_fault_plan(mut self, plan: FaultPlan) -> Self {
        self.faults = FaultInjector::new(plan);
        self
    }

    pub fn set_fault_plan(&mut self, plan: FaultPlan) {
        self.faults = FaultInjector::new(plan);
    }

    /// Starts or stops the service; a stopped service refuses `connect`
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Places a committed file into a volume, creating parent directories
    pub fn seed_file(&mut self, key: &VolumeKey, path: &str, data: &[u8]) -> FsResult<()> {
        let path = FsPath::parse(path)?;
        let volume = self
            .volumes
            .get_mut(key)
            .ok_or_else(|| FsError::NotFound(format!("volume {}", key.id)))?;
        volume.seed_file(&path, data);
        Ok(())
    }

    pub fn volume(&self, key: &VolumeKey) -> Option<&Volume> {
        self.volumes.get(key)
    }

    pub fn audit(&self) -> &RequestAuditLog {
        &self.audit
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn open_archive_count(&self) -> usize {
        self.archives.len()
    }

    pub fn open_file_count(&self) -> usize {
        self.files.len()
    }

    /// Archives that were still open when their session was released
    pub fn leaked_archive_count(&self) -> usize {
        self.leaked_archives
    }

    fn dispatch<T>(
        &mut self,
        kind: RequestKind,
        op: impl FnOnce(&mut Self) -> FsResult<T>,
    ) -> FsResult<T> {
        let result = match self.faults.check(kind) {
            Some(error) => Err(error),
            None => op(self),
        };
        if let Err(error) = &result {
            log::trace!("sim_fs: {:?} failed: {}", kind, error);
        }
        self.audit.record(kind, &result);
        result
    }

    fn check_session(&self, session: ServiceHandle) -> FsResult<()> {
        if self.sessions.contains(&session) {
            Ok(())
        } else {
            Err(FsError::ServiceUnavailable(format!(
                "{} is not connected",
                session
            )))
        }
    }

    fn resolve_archive(
        &self,
        session: ServiceHandle,
        archive: ArchiveHandle,
    ) -> FsResult<VolumeKey> {
        self.check_session(session)?;
        match self.archives.get(&archive) {
            Some(open) if open.session == session => Ok(open.key.clone()),
            _ => Err(FsError::InvalidHandle(archive.to_string())),
        }
    }

    fn resolve_file(&self, session: ServiceHandle, file: FileHandle) -> FsResult<OpenFile> {
        self.check_session(session)?;
        match self.files.get(&file) {
            Some(open) if open.session == session => {
                if !self.archives.contains_key(&open.archive) {
                    return Err(FsError::InvalidHandle(open.archive.to_string()));
                }
                Ok(open.clone())
            }
            _ => Err(FsError::InvalidHandle(file.to_string())),
        }
    }

    fn volume_mut(&mut self, key: &VolumeKey) -> FsResult<&mut Volume> {
        self.volumes
            .get_mut(key)
            .ok_or_else(|| FsError::Io(format!("volume {} is gone", key.id)))
    }

    fn file_volume(&mut self, open: &OpenFile) -> FsResult<&mut Volume> {
        let key = self
            .archives
            .get(&open.archive)
            .map(|archive| archive.key.clone())
            .ok_or_else(|| FsError::InvalidHandle(open.archive.to_string()))?;
        self.volume_mut(&key)
    }

    fn do_connect(&mut self) -> FsResult<ServiceHandle> {
        if !self.available {
            return Err(FsError::ServiceUnavailable(
                "filesystem service is not running".to_string(),
            ));
        }
        let session = ServiceHandle::new();
        self.sessions.insert(session);
        Ok(session)
    }

    fn do_disconnect(&mut self, session: ServiceHandle) -> FsResult<()> {
        if !self.sessions.remove(&session) {
            return Err(FsError::InvalidHandle(session.to_string()));
        }

        self.files.retain(|_, file| file.session != session);
        let leaked: Vec<ArchiveHandle> = self
            .archives
            .iter()
            .filter(|(_, archive)| archive.session == session)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in leaked {
            if let Some(archive) = self.archives.remove(&handle) {
                log::warn!("sim_fs: {} released with {} still open", session, handle);
                self.leaked_archives += 1;
                if let Some(volume) = self.volumes.get_mut(&archive.key) {
                    volume.detach();
                }
            }
        }
        Ok(())
    }

    fn do_open_archive(
        &mut self,
        session: ServiceHandle,
        id: ArchiveId,
        path: &ArchivePath,
    ) -> FsResult<ArchiveHandle> {
        self.check_session(session)?;
        if id == ArchiveId::UserSaveData && UserSaveDataLocator::from_archive_path(path).is_none() {
            return Err(FsError::InvalidArgument(format!(
                "malformed save-data path {:?}",
                path
            )));
        }

        let key = VolumeKey::new(id, path.clone());
        let volume = self
            .volumes
            .get_mut(&key)
            .ok_or_else(|| FsError::NotFound(format!("archive {}", id)))?;
        volume.attach();

        let handle = ArchiveHandle::new();
        self.archives.insert(handle, OpenArchive { session, key });
        Ok(handle)
    }

    fn do_close_archive(&mut self, session: ServiceHandle, archive: ArchiveHandle) -> FsResult<()> {
        let key = self.resolve_archive(session, archive)?;
        self.archives.remove(&archive);
        self.files.retain(|_, file| file.archive != archive);
        self.volume_mut(&key)?.detach();
        Ok(())
    }

    fn do_open_file(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
        flags: OpenFlags,
    ) -> FsResult<FileHandle> {
        let key = self.resolve_archive(session, archive)?;
        if !flags.intersects(OpenFlags::READ | OpenFlags::WRITE) {
            return Err(FsError::InvalidArgument(format!(
                "open flags {:?} grant no access",
                flags
            )));
        }

        let volume = self.volume_mut(&key)?;
        if flags.contains(OpenFlags::WRITE) {
            volume.ensure_writable()?;
        }
        match volume.node(path) {
            Some(Node::File(_)) => {}
            Some(Node::Directory) => {
                return Err(FsError::NotFound(format!("{} is a directory", path)));
            }
            None if flags.contains(OpenFlags::CREATE) => volume.create_file(path)?,
            None => return Err(FsError::NotFound(path.to_string())),
        }

        let handle = FileHandle::new();
        self.files.insert(
            handle,
            OpenFile {
                session,
                archive,
                path: path.clone(),
                flags,
            },
        );
        Ok(handle)
    }

    fn do_read(
        &mut self,
        session: ServiceHandle,
        file: FileHandle,
        offset: u64,
        buffer: &mut [u8],
    ) -> FsResult<usize> {
        let open = self.resolve_file(session, file)?;
        if !open.flags.contains(OpenFlags::READ) {
            return Err(FsError::PermissionDenied(format!(
                "{} not opened for reading",
                open.path
            )));
        }
        self.file_volume(&open)?.read(&open.path, offset, buffer)
    }

    fn do_write(
        &mut self,
        session: ServiceHandle,
        file: FileHandle,
        offset: u64,
        data: &[u8],
    ) -> FsResult<usize> {
        let open = self.resolve_file(session, file)?;
        if !open.flags.contains(OpenFlags::WRITE) {
            return Err(FsError::PermissionDenied(format!(
                "{} not opened for writing",
                open.path
            )));
        }
        self.file_volume(&open)?.write(&open.path, offset, data)
    }

    fn do_set_size(&mut self, session: ServiceHandle, file: FileHandle, size: u64) -> FsResult<()> {
        let open = self.resolve_file(session, file)?;
        if !open.flags.contains(OpenFlags::WRITE) {
            return Err(FsError::PermissionDenied(format!(
                "{} not opened for writing",
                open.path
            )));
        }
        self.file_volume(&open)?.set_size(&open.path, size)
    }

    fn do_close_file(&mut self, session: ServiceHandle, file: FileHandle) -> FsResult<()> {
        self.check_session(session)?;
        match self.files.get(&file) {
            Some(open) if open.session == session => {
                self.files.remove(&file);
                Ok(())
            }
            _ => Err(FsError::InvalidHandle(file.to_string())),
        }
    }
}

impl Default for MemoryFsService {
    fn default() -> Self {
        Self::new()
    }
}

impl FsService for MemoryFsService {
    fn connect(&mut self) -> FsResult<ServiceHandle> {
        self.dispatch(RequestKind::Connect, |svc| svc.do_connect())
    }

    fn disconnect(&mut self, session: ServiceHandle) -> FsResult<()> {
        self.dispatch(RequestKind::Disconnect, |svc| svc.do_disconnect(session))
    }

    fn open_archive(
        &mut self,
        session: ServiceHandle,
        id: ArchiveId,
        path: &ArchivePath,
    ) -> FsResult<ArchiveHandle> {
        self.dispatch(RequestKind::OpenArchive, |svc| {
            svc.do_open_archive(session, id, path)
        })
    }

    fn close_archive(&mut self, session: ServiceHandle, archive: ArchiveHandle) -> FsResult<()> {
        self.dispatch(RequestKind::CloseArchive, |svc| {
            svc.do_close_archive(session, archive)
        })
    }

    fn open_file(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
        flags: OpenFlags,
    ) -> FsResult<FileHandle> {
        self.dispatch(RequestKind::OpenFile, |svc| {
            svc.do_open_file(session, archive, path, flags)
        })
    }

    fn read(
        &mut self,
        session: ServiceHandle,
        file: FileHandle,
        offset: u64,
        buffer: &mut [u8],
    ) -> FsResult<usize> {
        self.dispatch(RequestKind::Read, |svc| {
            svc.do_read(session, file, offset, buffer)
        })
    }

    fn write(
        &mut self,
        session: ServiceHandle,
        file: FileHandle,
        offset: u64,
        data: &[u8],
        _flags: WriteFlags,
    ) -> FsResult<usize> {
        // Volumes are synchronous, so FLUSH needs no extra work.
        self.dispatch(RequestKind::Write, |svc| {
            svc.do_write(session, file, offset, data)
        })
    }

    fn set_size(&mut self, session: ServiceHandle, file: FileHandle, size: u64) -> FsResult<()> {
        self.dispatch(RequestKind::SetSize, |svc| {
            svc.do_set_size(session, file, size)
        })
    }

    fn close_file(&mut self, session: ServiceHandle, file: FileHandle) -> FsResult<()> {
        self.dispatch(RequestKind::CloseFile, |svc| svc.do_close_file(session, file))
    }

    fn delete_file(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()> {
        self.dispatch(RequestKind::DeleteFile, |svc| {
            let key = svc.resolve_archive(session, archive)?;
            svc.volume_mut(&key)?.delete_file(path)
        })
    }

    fn create_directory(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        path: &FsPath,
    ) -> FsResult<()> {
        self.dispatch(RequestKind::CreateDirectory, |svc| {
            let key = svc.resolve_archive(session, archive)?;
            svc.volume_mut(&key)?.create_directory(path)
        })
    }

    fn control_archive(
        &mut self,
        session: ServiceHandle,
        archive: ArchiveHandle,
        action: ArchiveAction,
    ) -> FsResult<()> {
        self.dispatch(RequestKind::ControlArchive, |svc| {
            let key = svc.resolve_archive(session, archive)?;
            match action {
                ArchiveAction::CommitSaveData => svc.volume_mut(&key)?.commit(),
            }
            Ok(())
        })
    }
}
