//! In-memory storage volumes
//!
//! A volume is the storage behind an archive. Journaled volumes keep the last
//! committed tree next to the working tree, so uncommitted changes can be
//! discarded when the archive is closed.

use core_types::{ArchiveId, FsPath};
use fs_api::{FsError, FsResult};
use std::collections::BTreeMap;

/// Behaviour of a provisioned volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeConfig {
    /// Changes need an explicit commit to survive closing the archive
    pub journaled: bool,
    /// Mutations fail with `PermissionDenied`
    pub read_only: bool,
    /// Maximum total file bytes (`None` = unlimited)
    pub capacity: Option<u64>,
}

impl VolumeConfig {
    /// Write-through, writable, unlimited
    pub const fn plain() -> Self {
        Self {
            journaled: false,
            read_only: false,
            capacity: None,
        }
    }

    /// Journaled, writable, unlimited
    pub const fn journaled() -> Self {
        Self {
            journaled: true,
            read_only: false,
            capacity: None,
        }
    }

    /// Default behaviour for an archive kind; save data is journaled
    pub const fn for_archive(id: ArchiveId) -> Self {
        if id.is_journaled() {
            Self::journaled()
        } else {
            Self::plain()
        }
    }

    pub fn with_capacity(mut self, bytes: u64) -> Self {
        self.capacity = Some(bytes);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self::plain()
    }
}

/// A node in a volume's namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(Vec<u8>),
    Directory,
}

type Tree = BTreeMap<FsPath, Node>;

static ROOT: Node = Node::Directory;

/// Largest file a volume will hold
pub const MAX_FILE_LEN: u64 = u32::MAX as u64;

/// Storage behind one archive
#[derive(Debug, Clone)]
pub struct Volume {
    config: VolumeConfig,
    tree: Tree,
    committed: Option<Tree>,
    open_handles: usize,
}

impl Volume {
    pub fn new(config: VolumeConfig) -> Self {
        Self {
            config,
            tree: Tree::new(),
            committed: config.journaled.then(Tree::new),
            open_handles: 0,
        }
    }

    pub fn config(&self) -> VolumeConfig {
        self.config
    }

    /// Number of archive handles currently open on this volume
    pub fn open_handles(&self) -> usize {
        self.open_handles
    }

    /// Returns the node at `path` in the working tree
    pub fn node(&self, path: &FsPath) -> Option<&Node> {
        if path.is_root() {
            return Some(&ROOT);
        }
        self.tree.get(path)
    }

    /// Returns the contents of a file in the working tree
    pub fn file(&self, path: &FsPath) -> Option<&[u8]> {
        match self.tree.get(path) {
            Some(Node::File(data)) => Some(data),
            _ => None,
        }
    }

    /// Returns the contents of a file as of the last commit
    ///
    /// For write-through volumes this is the working tree.
    pub fn committed_file(&self, path: &FsPath) -> Option<&[u8]> {
        let tree = self.committed.as_ref().unwrap_or(&self.tree);
        match tree.get(path) {
            Some(Node::File(data)) => Some(data),
            _ => None,
        }
    }

    /// Returns true if the working tree differs from the last commit
    pub fn has_uncommitted_changes(&self) -> bool {
        match &self.committed {
            Some(committed) => committed != &self.tree,
            None => false,
        }
    }

    /// Number of entries (files and directories) in the working tree
    pub fn entry_count(&self) -> usize {
        self.tree.len()
    }

    /// Total bytes held by files in the working tree
    pub fn used_bytes(&self) -> u64 {
        self.tree
            .values()
            .map(|node| match node {
                Node::File(data) => data.len() as u64,
                Node::Directory => 0,
            })
            .sum()
    }

    pub(crate) fn attach(&mut self) {
        self.open_handles += 1;
    }

    /// Drops one archive handle; the last one discards uncommitted changes
    pub(crate) fn detach(&mut self) {
        self.open_handles = self.open_handles.saturating_sub(1);
        if self.open_handles == 0 {
            if let Some(committed) = &self.committed {
                self.tree = committed.clone();
            }
        }
    }

    /// Publishes the working tree; a no-op for write-through volumes
    pub(crate) fn commit(&mut self) {
        if self.committed.is_some() {
            self.committed = Some(self.tree.clone());
        }
    }

    pub(crate) fn ensure_writable(&self) -> FsResult<()> {
        if self.config.read_only {
            return Err(FsError::PermissionDenied("volume is read-only".to_string()));
        }
        Ok(())
    }

    fn ensure_parent_dir(&self, path: &FsPath) -> FsResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| FsError::InvalidArgument("root has no parent".to_string()))?;
        match self.node(&parent) {
            Some(Node::Directory) => Ok(()),
            _ => Err(FsError::NotFound(parent.to_string())),
        }
    }

    fn ensure_capacity(&self, old_len: u64, new_len: u64) -> FsResult<()> {
        if let Some(capacity) = self.config.capacity {
            let used = self.used_bytes() - old_len + new_len;
            if used > capacity {
                return Err(FsError::NoSpace);
            }
        }
        Ok(())
    }

    fn file_mut(&mut self, path: &FsPath) -> FsResult<&mut Vec<u8>> {
        match self.tree.get_mut(path) {
            Some(Node::File(data)) => Ok(data),
            _ => Err(FsError::NotFound(path.to_string())),
        }
    }

    /// Creates an empty file; the parent directory must exist
    pub(crate) fn create_file(&mut self, path: &FsPath) -> FsResult<()> {
        self.ensure_writable()?;
        if self.node(path).is_some() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        self.ensure_parent_dir(path)?;
        self.tree.insert(path.clone(), Node::File(Vec::new()));
        Ok(())
    }

    pub(crate) fn read(&self, path: &FsPath, offset: u64, buffer: &mut [u8]) -> FsResult<usize> {
        let data = self
            .file(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        let start = file_offset(offset)?;
        if start >= data.len() {
            return Ok(0);
        }
        let count = buffer.len().min(data.len() - start);
        buffer[..count].copy_from_slice(&data[start..start + count]);
        Ok(count)
    }

    /// Writes at `offset`, zero-filling any gap past the end of the file
    pub(crate) fn write(&mut self, path: &FsPath, offset: u64, data: &[u8]) -> FsResult<usize> {
        self.ensure_writable()?;
        let start = file_offset(offset)?;
        let end = start
            .checked_add(data.len())
            .ok_or_else(|| FsError::InvalidArgument(format!("offset {} overflows", offset)))?;
        ensure_file_len(end as u64)?;
        let old_len = self
            .file(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?
            .len();
        let new_len = old_len.max(end);
        self.ensure_capacity(old_len as u64, new_len as u64)?;

        let file = self.file_mut(path)?;
        if file.len() < new_len {
            file.resize(new_len, 0);
        }
        file[start..end].copy_from_slice(data);
        Ok(data.len())
    }

    pub(crate) fn set_size(&mut self, path: &FsPath, size: u64) -> FsResult<()> {
        self.ensure_writable()?;
        ensure_file_len(size)?;
        let new_len = file_offset(size)?;
        let old_len = self
            .file(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?
            .len();
        self.ensure_capacity(old_len as u64, size)?;
        self.file_mut(path)?.resize(new_len, 0);
        Ok(())
    }

    pub(crate) fn delete_file(&mut self, path: &FsPath) -> FsResult<()> {
        self.ensure_writable()?;
        match self.tree.get(path) {
            Some(Node::File(_)) => {
                self.tree.remove(path);
                Ok(())
            }
            _ => Err(FsError::NotFound(path.to_string())),
        }
    }

    pub(crate) fn create_directory(&mut self, path: &FsPath) -> FsResult<()> {
        self.ensure_writable()?;
        if self.node(path).is_some() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        self.ensure_parent_dir(path)?;
        self.tree.insert(path.clone(), Node::Directory);
        Ok(())
    }

    /// Places a file directly into the committed state, creating parents
    ///
    /// Other uncommitted changes stay uncommitted.
    pub(crate) fn seed_file(&mut self, path: &FsPath, data: &[u8]) {
        seed_into(&mut self.tree, path, data);
        if let Some(committed) = &mut self.committed {
            seed_into(committed, path, data);
        }
    }
}

fn seed_into(tree: &mut Tree, path: &FsPath, data: &[u8]) {
    let mut ancestor = path.parent();
    while let Some(dir) = ancestor {
        if !dir.is_root() {
            tree.entry(dir.clone()).or_insert(Node::Directory);
        }
        ancestor = dir.parent();
    }
    tree.insert(path.clone(), Node::File(data.to_vec()));
}

fn file_offset(value: u64) -> FsResult<usize> {
    usize::try_from(value).map_err(|_| FsError::InvalidArgument(format!("offset {}", value)))
}

/// Files are limited to 32-bit sizes
fn ensure_file_len(len: u64) -> FsResult<()> {
    if len > MAX_FILE_LEN {
        return Err(FsError::NoSpace);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> FsPath {
        FsPath::parse(p).unwrap()
    }

    #[test]
    fn test_write_and_read() {
        let mut volume = Volume::new(VolumeConfig::plain());
        volume.create_file(&path("/a.bin")).unwrap();
        assert_eq!(volume.write(&path("/a.bin"), 0, b"hello").unwrap(), 5);

        let mut buf = [0u8; 16];
        assert_eq!(volume.read(&path("/a.bin"), 0, &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(volume.read(&path("/a.bin"), 3, &mut buf).unwrap(), 2);
        assert_eq!(volume.read(&path("/a.bin"), 10, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_write_past_end_zero_fills() {
        let mut volume = Volume::new(VolumeConfig::plain());
        volume.create_file(&path("/a.bin")).unwrap();
        volume.write(&path("/a.bin"), 2, b"x").unwrap();
        assert_eq!(volume.file(&path("/a.bin")), Some(&[0u8, 0, b'x'][..]));
    }

    #[test]
    fn test_create_file_missing_parent() {
        let mut volume = Volume::new(VolumeConfig::plain());
        let result = volume.create_file(&path("/dir/a.bin"));
        assert_eq!(result, Err(FsError::NotFound("/dir".to_string())));
    }

    #[test]
    fn test_create_directory_rules() {
        let mut volume = Volume::new(VolumeConfig::plain());
        volume.create_directory(&path("/saves")).unwrap();
        assert!(matches!(
            volume.create_directory(&path("/saves")),
            Err(FsError::AlreadyExists(_))
        ));
        assert!(matches!(
            volume.create_directory(&path("/x/y")),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_parent_must_be_directory() {
        let mut volume = Volume::new(VolumeConfig::plain());
        volume.create_file(&path("/file")).unwrap();
        assert!(matches!(
            volume.create_directory(&path("/file/sub")),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_file_only_removes_files() {
        let mut volume = Volume::new(VolumeConfig::plain());
        volume.create_directory(&path("/dir")).unwrap();
        assert!(matches!(
            volume.delete_file(&path("/dir")),
            Err(FsError::NotFound(_))
        ));
        assert!(matches!(
            volume.delete_file(&path("/missing")),
            Err(FsError::NotFound(_))
        ));
        assert_eq!(volume.entry_count(), 1);
    }

    #[test]
    fn test_read_only_volume() {
        let mut volume = Volume::new(VolumeConfig::plain().read_only());
        assert!(matches!(
            volume.create_file(&path("/a")),
            Err(FsError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut volume = Volume::new(VolumeConfig::plain().with_capacity(4));
        volume.create_file(&path("/a")).unwrap();
        volume.write(&path("/a"), 0, b"abcd").unwrap();
        assert_eq!(volume.write(&path("/a"), 4, b"e"), Err(FsError::NoSpace));
        // Overwriting in place does not grow usage
        volume.write(&path("/a"), 0, b"wxyz").unwrap();
        assert_eq!(volume.set_size(&path("/a"), 5), Err(FsError::NoSpace));
        volume.set_size(&path("/a"), 2).unwrap();
        assert_eq!(volume.used_bytes(), 2);
    }

    #[test]
    fn test_journaled_commit_and_discard() {
        let mut volume = Volume::new(VolumeConfig::journaled());
        volume.attach();
        volume.create_file(&path("/kept")).unwrap();
        volume.commit();
        volume.create_file(&path("/dropped")).unwrap();
        assert!(volume.has_uncommitted_changes());

        volume.detach();
        assert!(volume.node(&path("/kept")).is_some());
        assert!(volume.node(&path("/dropped")).is_none());
        assert!(!volume.has_uncommitted_changes());
    }

    #[test]
    fn test_plain_volume_is_write_through() {
        let mut volume = Volume::new(VolumeConfig::plain());
        volume.attach();
        volume.create_file(&path("/a")).unwrap();
        volume.write(&path("/a"), 0, b"1").unwrap();
        volume.detach();
        assert_eq!(volume.committed_file(&path("/a")), Some(&b"1"[..]));
        assert!(!volume.has_uncommitted_changes());
    }

    #[test]
    fn test_seed_file_creates_parents() {
        let mut volume = Volume::new(VolumeConfig::journaled());
        volume.seed_file(&path("/a/b/c.txt"), b"data");
        assert_eq!(volume.node(&path("/a")), Some(&Node::Directory));
        assert_eq!(volume.node(&path("/a/b")), Some(&Node::Directory));
        assert_eq!(volume.committed_file(&path("/a/b/c.txt")), Some(&b"data"[..]));
    }

    #[test]
    fn test_config_for_archive_kind() {
        assert!(VolumeConfig::for_archive(ArchiveId::UserSaveData).journaled);
        assert!(VolumeConfig::for_archive(ArchiveId::SystemSaveData).journaled);
        assert!(!VolumeConfig::for_archive(ArchiveId::Sdmc).journaled);
        assert!(!VolumeConfig::for_archive(ArchiveId::ExtData).journaled);
    }

    #[test]
    fn test_write_offset_overflow() {
        let mut volume = Volume::new(VolumeConfig::plain());
        volume.create_file(&path("/a.bin")).unwrap();
        assert!(matches!(
            volume.write(&path("/a.bin"), u64::MAX, b"x"),
            Err(FsError::InvalidArgument(_))
        ));
        assert_eq!(
            volume.write(&path("/a.bin"), MAX_FILE_LEN, b"x"),
            Err(FsError::NoSpace)
        );
        assert_eq!(volume.file(&path("/a.bin")), Some(&[][..]));
    }

    #[test]
    fn test_set_size_beyond_max_file_len() {
        let mut volume = Volume::new(VolumeConfig::plain());
        volume.create_file(&path("/a.bin")).unwrap();
        assert_eq!(volume.set_size(&path("/a.bin"), u64::MAX), Err(FsError::NoSpace));
        assert_eq!(
            volume.set_size(&path("/a.bin"), MAX_FILE_LEN + 1),
            Err(FsError::NoSpace)
        );
        assert_eq!(volume.used_bytes(), 0);
    }

    #[test]
    fn test_seed_file_keeps_pending_changes_uncommitted() {
        let mut volume = Volume::new(VolumeConfig::journaled());
        volume.attach();
        volume.create_file(&path("/draft")).unwrap();
        volume.seed_file(&path("/seeded"), b"s");

        assert_eq!(volume.committed_file(&path("/seeded")), Some(&b"s"[..]));
        assert_eq!(volume.committed_file(&path("/draft")), None);
        assert!(volume.has_uncommitted_changes());

        volume.detach();
        assert!(volume.node(&path("/draft")).is_none());
        assert_eq!(volume.file(&path("/seeded")), Some(&b"s"[..]));
    }
}
