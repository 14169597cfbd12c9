//! Archive identification
//!
//! An archive is opened from an [`ArchiveId`] and an [`ArchivePath`]. Most
//! archives take an empty path; user save data takes a binary path built from
//! a [`UserSaveDataLocator`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of archive to open, with the platform's raw identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArchiveId {
    /// The running application's own save data
    SaveData,
    /// Extra data
    ExtData,
    /// System save data
    SystemSaveData,
    /// Removable SD card
    Sdmc,
    /// Removable SD card, write-only view
    SdmcWriteOnly,
    /// Save data of a title identified by a [`UserSaveDataLocator`]
    UserSaveData,
}

impl ArchiveId {
    /// Returns the raw archive identifier
    pub const fn raw(self) -> u32 {
        match self {
            ArchiveId::SaveData => 0x4,
            ArchiveId::ExtData => 0x6,
            ArchiveId::SystemSaveData => 0x8,
            ArchiveId::Sdmc => 0x9,
            ArchiveId::SdmcWriteOnly => 0xA,
            ArchiveId::UserSaveData => 0x2345_678A,
        }
    }

    /// Looks up an archive kind from its raw identifier
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0x4 => Some(ArchiveId::SaveData),
            0x6 => Some(ArchiveId::ExtData),
            0x8 => Some(ArchiveId::SystemSaveData),
            0x9 => Some(ArchiveId::Sdmc),
            0xA => Some(ArchiveId::SdmcWriteOnly),
            0x2345_678A => Some(ArchiveId::UserSaveData),
            _ => None,
        }
    }

    /// Returns true if changes to this archive need an explicit commit
    pub const fn is_journaled(self) -> bool {
        matches!(
            self,
            ArchiveId::SaveData | ArchiveId::SystemSaveData | ArchiveId::UserSaveData
        )
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:X})", self, self.raw())
    }
}

/// Storage tier an archive lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum MediaType {
    /// Internal NAND
    Nand = 0,
    /// SD card
    Sd = 1,
    /// Game card
    GameCard = 2,
}

impl MediaType {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MediaType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MediaType::Nand),
            1 => Ok(MediaType::Sd),
            2 => Ok(MediaType::GameCard),
            other => Err(other),
        }
    }
}

/// Low-level path used when opening an archive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArchivePath {
    Empty,
    Binary(Vec<u8>),
}

impl ArchivePath {
    pub fn is_empty(&self) -> bool {
        match self {
            ArchivePath::Empty => true,
            ArchivePath::Binary(bytes) => bytes.is_empty(),
        }
    }
}

/// Locator of a user save-data archive
///
/// Encodes to the three-byte binary archive path `[media, lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserSaveDataLocator {
    /// Storage tier holding the save data
    pub media_type: MediaType,
    /// Lower half of the save identifier
    pub lower_save_id: u8,
    /// Upper half of the save identifier
    pub upper_save_id: u8,
}

impl UserSaveDataLocator {
    /// Encoded length of the binary archive path
    pub const ENCODED_LEN: usize = 3;

    pub const fn new(media_type: MediaType, lower_save_id: u8, upper_save_id: u8) -> Self {
        Self {
            media_type,
            lower_save_id,
            upper_save_id,
        }
    }

    /// Builds the archive path used to open this save data
    pub fn to_archive_path(&self) -> ArchivePath {
        ArchivePath::Binary(vec![
            self.media_type.as_u8(),
            self.lower_save_id,
            self.upper_save_id,
        ])
    }

    /// Decodes a locator from an archive path
    ///
    /// Returns `None` unless the path is exactly three bytes with a known
    /// media type.
    pub fn from_archive_path(path: &ArchivePath) -> Option<Self> {
        match path {
            ArchivePath::Binary(bytes) if bytes.len() == Self::ENCODED_LEN => {
                let media_type = MediaType::try_from(bytes[0]).ok()?;
                Some(Self::new(media_type, bytes[1], bytes[2]))
            }
            _ => None,
        }
    }
}

impl Default for UserSaveDataLocator {
    fn default() -> Self {
        Self::new(MediaType::Sd, 0, 0)
    }
}
