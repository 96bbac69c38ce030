//! INDEX page internals.
//!
//! INDEX pages are the B+Tree nodes. After the FIL header comes the 36-byte
//! [`IndexHeader`], two inline 10-byte segment pointers (meaningful on root
//! pages only), and the record heap opened by the infimum and supremum
//! sentinels. User records form a singly linked chain from infimum to
//! supremum via relative `next_record` offsets; the page directory at the
//! tail of the page maps key order onto the chain for binary search, each
//! slot owning 4-8 records.

use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::cursor::Cursor;
use crate::innodb::page::Page;
use crate::innodb::page_types::PageType;
use crate::innodb::record::{self, Record, RecordDescriber, RecordHeader, RecordKind};
use crate::{InnoError, Result};

/// Row format of an INDEX page, from the high bit of `PAGE_N_HEAP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageFormat {
    /// Pre-5.0 redundant format. Recognized but not decoded.
    Redundant,
    /// Compact format (MySQL 5.0+).
    Compact,
}

/// Parsed INDEX page header (36 bytes at offset 38).
#[derive(Debug, Clone, Serialize)]
pub struct IndexHeader {
    /// Slots in the page directory.
    pub n_dir_slots: u16,
    /// First byte past the record heap.
    pub heap_top: u16,
    /// Records in the heap, including sentinels and deleted records.
    pub n_heap: u16,
    pub format: PageFormat,
    /// Head of the deleted-record free list, 0 when empty.
    pub free: u16,
    /// Bytes held by deleted records.
    pub garbage: u16,
    /// Origin of the last inserted record, 0 after a reorganize.
    pub last_insert: u16,
    /// Direction of the most recent inserts.
    pub direction: u16,
    /// Consecutive inserts in the same direction.
    pub n_direction: u16,
    /// Live user records on the page.
    pub n_recs: u16,
    /// Highest transaction id that touched the page (secondary indexes).
    pub max_trx_id: u64,
    /// B+Tree level; 0 is a leaf.
    pub level: u16,
    /// Owning index id.
    pub index_id: u64,
}

impl IndexHeader {
    /// Decode the index header from a full page buffer.
    pub fn parse(page_data: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(page_data, FIL_PAGE_DATA);
        c.name("index", |c| {
            let n_dir_slots = c.name("n_dir_slots", |c| c.read_u16())?;
            let heap_top = c.name("heap_top", |c| c.read_u16())?;
            let n_heap_raw = c.name("n_heap", |c| c.read_u16())?;
            Ok(IndexHeader {
                n_dir_slots,
                heap_top,
                n_heap: n_heap_raw & 0x7FFF,
                format: if n_heap_raw & 0x8000 != 0 {
                    PageFormat::Compact
                } else {
                    PageFormat::Redundant
                },
                free: c.name("free", |c| c.read_u16())?,
                garbage: c.name("garbage", |c| c.read_u16())?,
                last_insert: c.name("last_insert", |c| c.read_u16())?,
                direction: c.name("direction", |c| c.read_u16())?,
                n_direction: c.name("n_direction", |c| c.read_u16())?,
                n_recs: c.name("n_recs", |c| c.read_u16())?,
                max_trx_id: c.name("max_trx_id", |c| c.read_u64())?,
                level: c.name("level", |c| c.read_u16())?,
                index_id: c.name("index_id", |c| c.read_u64())?,
            })
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    /// Human-readable insert direction.
    pub fn direction_name(&self) -> &'static str {
        match self.direction {
            PAGE_LEFT => "left",
            PAGE_RIGHT => "right",
            PAGE_SAME_REC => "same_rec",
            PAGE_SAME_PAGE => "same_page",
            PAGE_NO_DIRECTION => "no_direction",
            _ => "unknown",
        }
    }
}

/// Inline pointer to a file segment inode: space, page, byte offset.
///
/// Two of these follow the index header; they are written on the root page
/// only and zeroed everywhere else.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FsegPointer {
    pub space_id: u32,
    pub page_number: u32,
    pub offset: u16,
}

impl FsegPointer {
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        Ok(FsegPointer {
            space_id: c.name("space_id", |c| c.read_u32())?,
            page_number: c.name("page_number", |c| c.read_u32())?,
            offset: c.name("offset", |c| c.read_u16())?,
        })
    }

    /// A zero offset means the pointer was never written.
    pub fn is_set(&self) -> bool {
        self.offset != 0
    }
}

/// A child link discovered on an internal page.
#[derive(Debug, Clone, Serialize)]
pub struct ChildLink {
    pub child_page: u32,
    /// The minimum key of the child's subtree.
    pub min_key: Record,
}

/// Typed view of an INDEX page.
pub struct IndexPage<'a> {
    page: &'a Page,
    header: IndexHeader,
}

impl<'a> IndexPage<'a> {
    pub fn new(page: &'a Page) -> Result<Self> {
        if page.fil().page_type != PageType::Index {
            return Err(InnoError::Corrupt(format!(
                "page {} is {} not INDEX",
                page.number(),
                page.fil().page_type
            )));
        }
        let header = IndexHeader::parse(page.data())?;
        Ok(IndexPage { page, header })
    }

    pub fn page(&self) -> &'a Page {
        self.page
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn is_leaf(&self) -> bool {
        self.header.is_leaf()
    }

    /// Does this page carry the inline segment pointers, i.e. is it a root?
    pub fn is_root(&self) -> bool {
        self.leaf_fseg().map(|p| p.is_set()).unwrap_or(false)
    }

    /// Inline pointer to the leaf segment inode (root pages only).
    pub fn leaf_fseg(&self) -> Result<FsegPointer> {
        FsegPointer::read(&mut self.page.cursor(PAGE_BTR_SEG_LEAF))
    }

    /// Inline pointer to the internal segment inode (root pages only).
    pub fn internal_fseg(&self) -> Result<FsegPointer> {
        FsegPointer::read(&mut self.page.cursor(PAGE_BTR_SEG_TOP))
    }

    /// The infimum sentinel's header.
    pub fn infimum(&self) -> Result<RecordHeader> {
        self.require_compact()?;
        RecordHeader::parse_before(self.page.data(), PAGE_INFIMUM)
    }

    /// The supremum sentinel's header.
    pub fn supremum(&self) -> Result<RecordHeader> {
        self.require_compact()?;
        RecordHeader::parse_before(self.page.data(), PAGE_SUPREMUM)
    }

    /// Page directory slots in ascending slot order.
    ///
    /// Slot 0 owns infimum; the last slot owns supremum. Slots hold the page
    /// offset of their owning record's origin.
    pub fn directory(&self) -> Result<Vec<u16>> {
        let data = self.page.data();
        let n = self.header.n_dir_slots as usize;
        let first = data.len() - SIZE_FIL_TRAILER;
        if n * PAGE_DIR_SLOT_SIZE > first {
            return Err(InnoError::Corrupt(format!(
                "page {} directory of {} slots does not fit",
                self.page.number(),
                n
            )));
        }
        let mut slots = Vec::with_capacity(n);
        let mut c = self.page.cursor(first);
        for _ in 0..n {
            c.adjust(-(PAGE_DIR_SLOT_SIZE as i64))?;
            slots.push(c.peek(|c| c.read_u16())?);
        }
        Ok(slots)
    }

    /// Iterate the user record chain from infimum to supremum.
    ///
    /// Yields `(origin, header)` for every user record including
    /// delete-marked ones; the sentinels are not yielded.
    pub fn record_chain(&self) -> Result<RecordChain<'a>> {
        self.require_compact()?;
        let data = self.page.data();
        let infimum = RecordHeader::parse_before(data, PAGE_INFIMUM)?;
        if infimum.kind != RecordKind::Infimum {
            return Err(InnoError::Corrupt(format!(
                "page {} infimum area holds a {:?} record",
                self.page.number(),
                infimum.kind
            )));
        }
        Ok(RecordChain {
            data,
            page_number: self.page.number(),
            next_origin: chain_step(data, PAGE_INFIMUM, infimum.next_offset)?,
            remaining: self.header.n_recs as usize,
        })
    }

    /// Decode every user record on the page in chain order.
    pub fn records(
        &self,
        describer: &'a dyn RecordDescriber,
    ) -> Result<impl Iterator<Item = Result<Record>> + 'a> {
        let data = self.page.data();
        let chain = self.record_chain()?;
        Ok(chain.map(move |item| {
            let (origin, _) = item?;
            record::decode(data, origin, describer)
        }))
    }

    /// Yield `(child_page_number, min_key)` for every record of an internal
    /// page, in key order.
    pub fn child_links(&self, describer: &dyn RecordDescriber) -> Result<Vec<ChildLink>> {
        if self.is_leaf() {
            return Err(InnoError::Usage(format!(
                "page {} is a leaf; it has no child pages",
                self.page.number()
            )));
        }
        let mut links = Vec::with_capacity(self.header.n_recs as usize);
        for item in self.record_chain()? {
            let (origin, header) = item?;
            if header.kind != RecordKind::NodePointer {
                return Err(InnoError::Corrupt(format!(
                    "internal page {} carries a {:?} record",
                    self.page.number(),
                    header.kind
                )));
            }
            let rec = record::decode(self.page.data(), origin, describer)?;
            let child_page = rec.child_page.ok_or_else(|| {
                InnoError::Corrupt(format!(
                    "node pointer at {} of page {} has no child",
                    origin,
                    self.page.number()
                ))
            })?;
            links.push(ChildLink {
                child_page,
                min_key: rec,
            });
        }
        Ok(links)
    }

    fn require_compact(&self) -> Result<()> {
        if self.header.format != PageFormat::Compact {
            return Err(InnoError::Schema(format!(
                "page {} uses the redundant row format, which is not supported",
                self.page.number()
            )));
        }
        Ok(())
    }
}

/// Iterator over a page's user record chain.
pub struct RecordChain<'a> {
    data: &'a [u8],
    page_number: u64,
    next_origin: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for RecordChain<'a> {
    type Item = Result<(usize, RecordHeader)>;

    fn next(&mut self) -> Option<Self::Item> {
        let origin = self.next_origin.take()?;
        let header = match RecordHeader::parse_before(self.data, origin) {
            Ok(h) => h,
            Err(e) => return Some(Err(e)),
        };
        match header.kind {
            RecordKind::Supremum => None,
            RecordKind::Infimum => Some(Err(InnoError::Corrupt(format!(
                "record chain of page {} loops back to infimum",
                self.page_number
            )))),
            _ => {
                if self.remaining == 0 {
                    return Some(Err(InnoError::Corrupt(format!(
                        "record chain of page {} exceeds its record count",
                        self.page_number
                    ))));
                }
                self.remaining -= 1;
                match chain_step(self.data, origin, header.next_offset) {
                    Ok(next) => self.next_origin = next,
                    Err(e) => return Some(Err(e)),
                }
                Some(Ok((origin, header)))
            }
        }
    }
}

/// Resolve a relative next-record offset, `None` at a zero link.
fn chain_step(data: &[u8], origin: usize, next_offset: i16) -> Result<Option<usize>> {
    if next_offset == 0 {
        return Ok(None);
    }
    let next = origin as i64 + next_offset as i64;
    if next < REC_EXTRA_BYTES as i64 || next as usize >= data.len() {
        return Err(InnoError::Corrupt(format!(
            "next-record offset {} from {} leaves the page",
            next_offset, origin
        )));
    }
    Ok(Some(next as usize))
}
