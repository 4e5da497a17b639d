//! Index file format
//!
//! The index (also called staging area or cache) records what the next commit's
//! tree will contain, together with the stat data used to notice edits cheaply.
//!
//! ## File Format (Version 2)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length):
//!   - 62 bytes of stat data, object id and flags
//!   - NUL-terminated path, padded to 8-byte alignment
//!
//! Extensions (optional, skipped on read)
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

use bitflags::bitflags;

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12; // 4 bytes for marker, 4 for version, 4 for entries_count

/// Magic signature identifying index files
pub const SIGNATURE: &str = "DIRC";

/// Index file format version
pub const VERSION: u32 = 2;

bitflags! {
    /// The 16-bit flags field of an index entry.
    ///
    /// The low 12 bits hold the path length (capped at `NAME_MASK`), the
    /// stage bits are non-zero only for unmerged entries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct EntryFlags: u16 {
        const ASSUME_VALID = 0x8000;
        const EXTENDED = 0x4000;
        const STAGE_MASK = 0x3000;
        const NAME_MASK = 0x0fff;
    }
}

impl EntryFlags {
    const STAGE_SHIFT: u16 = 12;

    /// Flags for a stage-0 entry whose path is `name_len` bytes long.
    pub fn for_name(name_len: usize) -> Self {
        Self::from_bits_retain(name_len.min(Self::NAME_MASK.bits() as usize) as u16)
    }

    pub fn with_name_len(self, name_len: usize) -> Self {
        self.difference(Self::NAME_MASK) | Self::for_name(name_len)
    }

    pub fn stage(&self) -> u8 {
        ((self.bits() & Self::STAGE_MASK.bits()) >> Self::STAGE_SHIFT) as u8
    }

    pub fn name_len(&self) -> usize {
        (self.bits() & Self::NAME_MASK.bits()) as usize
    }

    /// An entry is staged for commit when it sits at stage 0.
    pub fn is_staged(&self) -> bool {
        self.stage() == 0
    }
}
