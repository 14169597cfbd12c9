//! Request flags, with the platform's bit values

use bitflags::bitflags;

bitflags! {
    /// Mode bits for opening a file
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        /// Create the file if it does not exist
        const CREATE = 1 << 2;
    }
}

bitflags! {
    /// Options for a write request
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WriteFlags: u32 {
        /// Flush to the backing store before returning
        const FLUSH = 1 << 0;
        const UPDATE_TIME = 1 << 8;
    }
}

/// Control request on an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveAction {
    /// Publish pending changes of a journaled save archive
    CommitSaveData,
}

impl ArchiveAction {
    pub const fn raw(self) -> u32 {
        match self {
            ArchiveAction::CommitSaveData => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_flag_bits() {
        assert_eq!(OpenFlags::READ.bits(), 1);
        assert_eq!(OpenFlags::WRITE.bits(), 2);
        assert_eq!(OpenFlags::CREATE.bits(), 4);
        assert_eq!((OpenFlags::WRITE | OpenFlags::CREATE).bits(), 6);
    }

    #[test]
    fn test_write_flag_bits() {
        assert_eq!(WriteFlags::FLUSH.bits(), 1);
        assert_eq!(WriteFlags::UPDATE_TIME.bits(), 0x100);
    }

    #[test]
    fn test_commit_action_raw() {
        assert_eq!(ArchiveAction::CommitSaveData.raw(), 0);
    }
}
