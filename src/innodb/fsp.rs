//! File-space header and extent descriptors.
//!
//! Page 0 of every tablespace is an FSP_HDR page: the [`FspHeader`] at byte
//! 38 carries the space id, size, and the space-level extent lists, followed
//! by an array of 40-byte extent descriptors ([`XdesEntry`]). Later
//! descriptor pages (type XDES) repeat the same array layout with the header
//! area unused. Each descriptor covers one 64-page extent and tracks per-page
//! free/clean bits plus the owning file segment, if any.

use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::cursor::Cursor;
use crate::innodb::list::{FilAddr, ListBaseNode, ListNode};
use crate::innodb::page::Page;
use crate::innodb::page_types::PageType;
use crate::{InnoError, Result};

/// Parsed FSP header (112 bytes at offset 38 of page 0).
#[derive(Debug, Clone, Serialize)]
pub struct FspHeader {
    /// Space ID.
    pub space_id: u32,
    /// Size of the tablespace in pages.
    pub size: u32,
    /// Lowest page number not yet initialized.
    pub free_limit: u32,
    /// Space flags (page size, format).
    pub flags: u32,
    /// Used pages within the FREE_FRAG extents.
    pub frag_n_used: u32,
    /// Completely free extents.
    pub free: ListBaseNode,
    /// Partially used extents not owned by any segment.
    pub free_frag: ListBaseNode,
    /// Completely used extents not owned by any segment.
    pub full_frag: ListBaseNode,
    /// First unused segment id.
    pub seg_id: u64,
    /// Inode pages with every slot in use.
    pub full_inodes: ListBaseNode,
    /// Inode pages with at least one free slot.
    pub free_inodes: ListBaseNode,
}

impl FspHeader {
    /// Decode the FSP header from a full page-0 buffer.
    pub fn parse(page_data: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(page_data, FIL_PAGE_DATA);
        c.name("fsp", |c| {
            let space_id = c.name("space_id", |c| c.read_u32())?;
            c.adjust(4)?; // unused
            Ok(FspHeader {
                space_id,
                size: c.name("size", |c| c.read_u32())?,
                free_limit: c.name("free_limit", |c| c.read_u32())?,
                flags: c.name("flags", |c| c.read_u32())?,
                frag_n_used: c.name("frag_n_used", |c| c.read_u32())?,
                free: c.name("free", ListBaseNode::read)?,
                free_frag: c.name("free_frag", ListBaseNode::read)?,
                full_frag: c.name("full_frag", ListBaseNode::read)?,
                seg_id: c.name("seg_id", |c| c.read_u64())?,
                full_inodes: c.name("full_inodes", ListBaseNode::read)?,
                free_inodes: c.name("free_inodes", ListBaseNode::read)?,
            })
        })
    }

    /// Page size encoded in the flags, in bytes.
    ///
    /// An ssize of zero means the 16 KiB default; otherwise the size is
    /// `512 << ssize`.
    pub fn page_size_from_flags(&self) -> u32 {
        let ssize = (self.flags & FSP_FLAGS_MASK_PAGE_SSIZE) >> FSP_FLAGS_POS_PAGE_SSIZE;
        if ssize == 0 {
            SIZE_PAGE_DEFAULT
        } else {
            512u32 << ssize
        }
    }

    /// The space-level extent lists by name, in on-disk order.
    pub fn each_list(&self) -> [(&'static str, &ListBaseNode); 5] {
        [
            ("free", &self.free),
            ("free_frag", &self.free_frag),
            ("full_frag", &self.full_frag),
            ("full_inodes", &self.full_inodes),
            ("free_inodes", &self.free_inodes),
        ]
    }

    /// Look up one of the space-level lists by name.
    pub fn list(&self, name: &str) -> Option<&ListBaseNode> {
        self.each_list()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, l)| l)
    }
}

/// Allocation state of one extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum XdesState {
    /// Descriptor past the initialized region; all fields zero.
    Unused,
    /// On the space FREE list.
    Free,
    /// On the space FREE_FRAG list.
    FreeFrag,
    /// On the space FULL_FRAG list.
    FullFrag,
    /// Owned by a file segment.
    Fseg,
    Unknown(u32),
}

impl XdesState {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => XdesState::Unused,
            1 => XdesState::Free,
            2 => XdesState::FreeFrag,
            3 => XdesState::FullFrag,
            4 => XdesState::Fseg,
            other => XdesState::Unknown(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            XdesState::Unused => "UNUSED",
            XdesState::Free => "FREE",
            XdesState::FreeFrag => "FREE_FRAG",
            XdesState::FullFrag => "FULL_FRAG",
            XdesState::Fseg => "FSEG",
            XdesState::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Free/clean bits for one page of an extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageStatus {
    pub free: bool,
    pub clean: bool,
}

/// One 40-byte extent descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct XdesEntry {
    /// Owning segment id; 0 when the extent belongs to no segment.
    pub fseg_id: u64,
    /// Node linking this descriptor into a space or segment list.
    pub node: ListNode,
    pub state: XdesState,
    /// Two bits per page: free (low) and clean (high).
    pub bitmap: Vec<u8>,
}

impl XdesEntry {
    /// Decode a descriptor at the cursor.
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        c.name("xdes", |c| {
            Ok(XdesEntry {
                fseg_id: c.name("fseg_id", |c| c.read_u64())?,
                node: c.name("node", ListNode::read)?,
                state: XdesState::from_u32(c.name("state", |c| c.read_u32())?),
                bitmap: c.name("bitmap", |c| c.read_bytes(XDES_BITMAP_SIZE))?.to_vec(),
            })
        })
    }

    /// Status bits of the `index`-th page of this extent.
    ///
    /// Pairs are packed least-significant-first within each bitmap byte.
    pub fn page_status(&self, index: usize) -> Result<PageStatus> {
        if index >= PAGES_PER_EXTENT {
            return Err(InnoError::Usage(format!(
                "page index {} exceeds extent size {}",
                index, PAGES_PER_EXTENT
            )));
        }
        let bits = self.bitmap[index / 4] >> ((index % 4) * 2) & 0x3;
        Ok(PageStatus {
            free: bits & XDES_BIT_FREE != 0,
            clean: bits & XDES_BIT_CLEAN != 0,
        })
    }

    /// Number of free pages in the extent.
    pub fn free_pages(&self) -> usize {
        (0..PAGES_PER_EXTENT)
            .filter(|&i| self.page_status(i).map(|s| s.free).unwrap_or(false))
            .count()
    }

    /// Is this extent allocated to a file segment?
    pub fn allocated_to_fseg(&self) -> bool {
        self.state == XdesState::Fseg && self.fseg_id != 0
    }
}

/// An extent descriptor located within the space.
#[derive(Debug, Clone, Serialize)]
pub struct Xdes {
    /// Descriptor page holding the entry.
    pub page_number: u32,
    /// Byte offset of the entry within that page.
    pub offset: u16,
    /// First page of the described extent.
    pub start_page: u32,
    pub entry: XdesEntry,
}

impl Xdes {
    /// Address of the entry's embedded list node.
    pub fn node_addr(&self) -> FilAddr {
        FilAddr {
            page: self.page_number,
            offset: self.offset + XDES_FLST_NODE as u16,
        }
    }

    /// Does this extent cover the given page number?
    pub fn contains(&self, page_no: u64) -> bool {
        let start = self.start_page as u64;
        page_no >= start && page_no < start + PAGES_PER_EXTENT as u64
    }

    /// Status bits of an absolute page number within this extent.
    pub fn status_of(&self, page_no: u64) -> Result<PageStatus> {
        if !self.contains(page_no) {
            return Err(InnoError::Usage(format!(
                "page {} is not in the extent starting at {}",
                page_no, self.start_page
            )));
        }
        self.entry.page_status((page_no - self.start_page as u64) as usize)
    }
}

/// Decode descriptor `index` (0..64) of a descriptor page.
pub fn xdes_at(page: &Page, index: usize) -> Result<Xdes> {
    if index >= XDES_PER_PAGE {
        return Err(InnoError::Usage(format!(
            "descriptor index {} exceeds {} per page",
            index, XDES_PER_PAGE
        )));
    }
    let offset = XDES_ARRAY_OFFSET + index * XDES_ENTRY_SIZE;
    let entry = XdesEntry::read(&mut page.cursor(offset))?;
    Ok(Xdes {
        page_number: page.number() as u32,
        offset: offset as u16,
        start_page: page.number() as u32 + (index * PAGES_PER_EXTENT) as u32,
        entry,
    })
}

/// Typed view of an FSP_HDR page.
pub struct FspHdrPage<'a> {
    page: &'a Page,
    header: FspHeader,
}

impl<'a> FspHdrPage<'a> {
    pub fn new(page: &'a Page) -> Result<Self> {
        if page.fil().page_type != PageType::FspHdr {
            return Err(InnoError::Corrupt(format!(
                "page {} is {} not FSP_HDR",
                page.number(),
                page.fil().page_type
            )));
        }
        let header = FspHeader::parse(page.data())?;
        Ok(FspHdrPage { page, header })
    }

    pub fn header(&self) -> &FspHeader {
        &self.header
    }

    /// Descriptor `index` of this page's XDES array.
    pub fn xdes(&self, index: usize) -> Result<Xdes> {
        xdes_at(self.page, index)
    }
}

/// Typed view of an XDES page (descriptor array only, header area unused).
pub struct XdesPage<'a> {
    page: &'a Page,
}

impl<'a> XdesPage<'a> {
    pub fn new(page: &'a Page) -> Result<Self> {
        if page.fil().page_type != PageType::Xdes {
            return Err(InnoError::Corrupt(format!(
                "page {} is {} not XDES",
                page.number(),
                page.fil().page_type
            )));
        }
        Ok(XdesPage { page })
    }

    /// Descriptor `index` of this page's XDES array.
    pub fn xdes(&self, index: usize) -> Result<Xdes> {
        xdes_at(self.page, index)
    }
}
