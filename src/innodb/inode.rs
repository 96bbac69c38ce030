//! File-segment inode pages.
//!
//! A file segment (FSEG) is one half of an index's storage — its leaf pages
//! or its internal pages. Each segment is described by a 192-byte
//! [`InodeEntry`]: up to 32 fragment pages allocated singly, plus three
//! extent lists (FREE, NOT_FULL, FULL). INODE pages hold an array of such
//! entries (85 at the 16 KiB page size) behind a 12-byte node linking the
//! inode pages themselves into the space's inode-page lists.

use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::cursor::Cursor;
use crate::innodb::list::{ListBaseNode, ListNode};
use crate::innodb::page::Page;
use crate::innodb::page_types::PageType;
use crate::{InnoError, Result};

/// One 192-byte file-segment descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct InodeEntry {
    /// Segment id; 0 marks a free slot.
    pub fseg_id: u64,
    /// Used pages within the NOT_FULL extents.
    pub not_full_n_used: u32,
    /// Extents with no page in use.
    pub free: ListBaseNode,
    /// Partially used extents.
    pub not_full: ListBaseNode,
    /// Completely used extents.
    pub full: ListBaseNode,
    /// `FSEG_MAGIC_VALUE` on an initialized slot.
    pub magic: u32,
    /// Singly allocated fragment pages; nil slots are `None`.
    pub frag_array: Vec<Option<u32>>,
}

impl InodeEntry {
    /// Decode an inode entry at the cursor.
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        c.name("inode", |c| {
            let fseg_id = c.name("fseg_id", |c| c.read_u64())?;
            let not_full_n_used = c.name("not_full_n_used", |c| c.read_u32())?;
            let free = c.name("free", ListBaseNode::read)?;
            let not_full = c.name("not_full", ListBaseNode::read)?;
            let full = c.name("full", ListBaseNode::read)?;
            let magic = c.name("magic", |c| c.read_u32())?;
            let frag_array = c.name("frag_array", |c| {
                let mut slots = Vec::with_capacity(FSEG_FRAG_SLOTS);
                for _ in 0..FSEG_FRAG_SLOTS {
                    let page = c.read_u32()?;
                    slots.push((page != FIL_NULL).then_some(page));
                }
                Ok(slots)
            })?;
            Ok(InodeEntry {
                fseg_id,
                not_full_n_used,
                free,
                not_full,
                full,
                magic,
                frag_array,
            })
        })
    }

    /// Is this slot describing a live segment?
    pub fn is_used(&self) -> bool {
        self.fseg_id != 0 && self.magic == FSEG_MAGIC_VALUE
    }

    /// Occupied fragment-array slots.
    pub fn frag_used(&self) -> usize {
        self.frag_array.iter().flatten().count()
    }

    /// Pages allocated to the segment: fragments plus every page of every
    /// extent on the three lists.
    pub fn total_pages(&self) -> u64 {
        self.frag_used() as u64
            + (self.free.length + self.not_full.length + self.full.length) as u64
                * PAGES_PER_EXTENT as u64
    }

    /// Pages actually carrying data: fragments, full extents, and the used
    /// portion of the NOT_FULL extents.
    pub fn used_pages(&self) -> u64 {
        self.frag_used() as u64
            + self.full.length as u64 * PAGES_PER_EXTENT as u64
            + self.not_full_n_used as u64
    }

    /// `used_pages / total_pages`, or 1.0 for an empty segment.
    pub fn fill_factor(&self) -> f64 {
        let total = self.total_pages();
        if total == 0 {
            1.0
        } else {
            self.used_pages() as f64 / total as f64
        }
    }

    /// The segment's extent lists by name, in on-disk order.
    pub fn each_list(&self) -> [(&'static str, &ListBaseNode); 3] {
        [
            ("free", &self.free),
            ("not_full", &self.not_full),
            ("full", &self.full),
        ]
    }

    /// Look up one of the segment's lists by name.
    pub fn list(&self, name: &str) -> Option<&ListBaseNode> {
        self.each_list()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, l)| l)
    }
}

/// Inode slots per page at the given page size.
pub fn entries_per_page(page_size: u32) -> usize {
    (page_size as usize - INODE_ARRAY_OFFSET - SIZE_FIL_TRAILER) / INODE_ENTRY_SIZE
}

/// Typed view of an INODE page.
pub struct InodePage<'a> {
    page: &'a Page,
    /// Node linking this page into the space's inode-page lists.
    pub list_node: ListNode,
}

impl<'a> InodePage<'a> {
    pub fn new(page: &'a Page) -> Result<Self> {
        if page.fil().page_type != PageType::Inode {
            return Err(InnoError::Corrupt(format!(
                "page {} is {} not INODE",
                page.number(),
                page.fil().page_type
            )));
        }
        let list_node = ListNode::parse_at(page.data(), INODE_FLST_NODE_OFFSET)?;
        Ok(InodePage { page, list_node })
    }

    /// Inode slots on this page.
    pub fn entries(&self) -> usize {
        entries_per_page(self.page.page_size())
    }

    /// Decode slot `index`.
    pub fn entry(&self, index: usize) -> Result<InodeEntry> {
        if index >= self.entries() {
            return Err(InnoError::Usage(format!(
                "inode slot {} exceeds {} per page",
                index,
                self.entries()
            )));
        }
        let offset = INODE_ARRAY_OFFSET + index * INODE_ENTRY_SIZE;
        InodeEntry::read(&mut self.page.cursor(offset))
    }

    /// Byte offset of slot `index`.
    pub fn entry_offset(&self, index: usize) -> u16 {
        (INODE_ARRAY_OFFSET + index * INODE_ENTRY_SIZE) as u16
    }

    /// Decode the entry stored at a byte offset (as referenced by an inline
    /// segment pointer).
    pub fn entry_at(&self, offset: u16) -> Result<InodeEntry> {
        let offset = offset as usize;
        if offset < INODE_ARRAY_OFFSET
            || (offset - INODE_ARRAY_OFFSET) % INODE_ENTRY_SIZE != 0
            || (offset - INODE_ARRAY_OFFSET) / INODE_ENTRY_SIZE >= self.entries()
        {
            return Err(InnoError::Corrupt(format!(
                "offset {} is not an inode slot on page {}",
                offset,
                self.page.number()
            )));
        }
        InodeEntry::read(&mut self.page.cursor(offset))
    }

    /// Iterate the used slots as `(slot_offset, entry)`.
    pub fn used_entries(&self) -> impl Iterator<Item = Result<(u16, InodeEntry)>> + '_ {
        (0..self.entries()).filter_map(move |i| match self.entry(i) {
            Ok(entry) if entry.is_used() => Some(Ok((self.entry_offset(i), entry))),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
    }
}
