//! InnoDB page type definitions.
//!
//! Maps the 2-byte page type field (bytes 24-25 of the FIL header) to a
//! [`PageType`] enum. Values are from fil0fil.h in the MySQL source.

use serde::Serialize;
use std::fmt;

/// Page types relevant to tablespace navigation.
///
/// Codes that do not map to a known variant are preserved in
/// [`PageType::Unknown`] so they survive a round trip through the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PageType {
    /// Freshly allocated, type field not initialized
    Allocated,
    /// Undo log page
    UndoLog,
    /// File segment inode page
    Inode,
    /// Insert buffer free list bookkeeping
    IbufFreeList,
    /// Insert buffer bitmap
    IbufBitmap,
    /// System internal page (data dictionary header among others)
    Sys,
    /// Transaction system header
    TrxSys,
    /// File space header (page 0 of each tablespace)
    FspHdr,
    /// Extent descriptor page
    Xdes,
    /// Externally stored uncompressed BLOB data
    Blob,
    /// First compressed BLOB page
    ZBlob,
    /// Subsequent compressed BLOB page
    ZBlob2,
    /// B+Tree index page
    Index,
    /// R-tree spatial index page
    Rtree,
    /// Any other code
    Unknown(u16),
}

impl PageType {
    /// Parse a page type from the u16 value in the FIL header.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => PageType::Allocated,
            2 => PageType::UndoLog,
            3 => PageType::Inode,
            4 => PageType::IbufFreeList,
            5 => PageType::IbufBitmap,
            6 => PageType::Sys,
            7 => PageType::TrxSys,
            8 => PageType::FspHdr,
            9 => PageType::Xdes,
            10 => PageType::Blob,
            11 => PageType::ZBlob,
            12 => PageType::ZBlob2,
            17855 => PageType::Index,
            17856 => PageType::Rtree,
            other => PageType::Unknown(other),
        }
    }

    /// The raw u16 code for this page type.
    pub fn as_u16(self) -> u16 {
        match self {
            PageType::Allocated => 0,
            PageType::UndoLog => 2,
            PageType::Inode => 3,
            PageType::IbufFreeList => 4,
            PageType::IbufBitmap => 5,
            PageType::Sys => 6,
            PageType::TrxSys => 7,
            PageType::FspHdr => 8,
            PageType::Xdes => 9,
            PageType::Blob => 10,
            PageType::ZBlob => 11,
            PageType::ZBlob2 => 12,
            PageType::Index => 17855,
            PageType::Rtree => 17856,
            PageType::Unknown(code) => code,
        }
    }

    /// The name used in the MySQL source.
    pub fn name(self) -> &'static str {
        match self {
            PageType::Allocated => "ALLOCATED",
            PageType::UndoLog => "UNDO_LOG",
            PageType::Inode => "INODE",
            PageType::IbufFreeList => "IBUF_FREE_LIST",
            PageType::IbufBitmap => "IBUF_BITMAP",
            PageType::Sys => "SYS",
            PageType::TrxSys => "TRX_SYS",
            PageType::FspHdr => "FSP_HDR",
            PageType::Xdes => "XDES",
            PageType::Blob => "BLOB",
            PageType::ZBlob => "ZBLOB",
            PageType::ZBlob2 => "ZBLOB2",
            PageType::Index => "INDEX",
            PageType::Rtree => "RTREE",
            PageType::Unknown(_) => "UNKNOWN",
        }
    }

    /// Short human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            PageType::Allocated => "Freshly allocated",
            PageType::UndoLog => "Undo log",
            PageType::Inode => "File segment inode",
            PageType::IbufFreeList => "Insert buffer free list",
            PageType::IbufBitmap => "Insert buffer bitmap",
            PageType::Sys => "System internal",
            PageType::TrxSys => "Transaction system header",
            PageType::FspHdr => "File space header",
            PageType::Xdes => "Extent descriptor",
            PageType::Blob => "Uncompressed BLOB",
            PageType::ZBlob => "First compressed BLOB",
            PageType::ZBlob2 => "Subsequent compressed BLOB",
            PageType::Index => "B+Tree index",
            PageType::Rtree => "R-tree index",
            PageType::Unknown(_) => "Unknown page type",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageType::Unknown(code) => write!(f, "UNKNOWN({})", code),
            other => write!(f, "{}", other.name()),
        }
    }
}
