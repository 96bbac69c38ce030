//! Tablespace files.
//!
//! A [`Space`] wraps one tablespace file — the shared system space or a
//! per-table file — as an addressable sequence of fixed-size pages, and
//! composes the lower layers into a file-scoped API: typed page reads,
//! extent and inode enumeration, list walking, index discovery, and per-page
//! accounting.
//!
//! The page size is autodetected from the FSP header flags of page 0, with a
//! fallback that retries the smaller supported sizes when the flags are
//! impossible for the file at hand. All reads go through an interior-mutable
//! file handle so iterators can share a `&Space`; a `Space` is meant to be
//! used from one thread.

use serde::Serialize;
use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::innodb::btree::Btree;
use crate::innodb::constants::*;
use crate::innodb::dict::{self, DictHeader, TrxSysHeader, TrxSysPage};
use crate::innodb::fsp::{self, FspHeader, Xdes, XdesEntry};
use crate::innodb::index::IndexPage;
use crate::innodb::inode::{InodeEntry, InodePage};
use crate::innodb::list::{ListBaseNode, ListIter, ListNode};
use crate::innodb::page::{Page, PageView};
use crate::innodb::page_types::PageType;
use crate::innodb::record::FieldValue;
use crate::{InnoError, Result};

/// An open tablespace file.
pub struct Space {
    path: PathBuf,
    file: RefCell<File>,
    file_size: u64,
    page_size: u32,
    page_count: u64,
    fsp: FspHeader,
}

/// One index discovered in a space.
#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    pub index_id: u64,
    pub root_page: u32,
    /// Index name, known only when discovered through the data dictionary.
    pub name: Option<String>,
}

/// A located file-segment inode entry.
#[derive(Debug, Clone, Serialize)]
pub struct InodeRef {
    /// INODE page holding the entry.
    pub page_number: u32,
    /// Byte offset of the entry within that page.
    pub offset: u16,
    pub entry: InodeEntry,
}

/// A run of consecutive pages sharing one page type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageTypeRegion {
    pub start: u64,
    pub end: u64,
    pub count: u64,
    pub page_type: PageType,
}

/// Everything the space knows about one page's allocation.
#[derive(Debug, Clone, Serialize)]
pub struct PageAccount {
    pub page: u64,
    pub page_type: PageType,
    /// Descriptor page and entry offset covering this page.
    pub xdes_page: u32,
    pub xdes_offset: u16,
    pub extent_state: fsp::XdesState,
    pub free: bool,
    pub clean: bool,
    /// Owning segment, when the extent or fragment belongs to one.
    pub fseg_id: Option<u64>,
    /// Location of the owning segment's inode entry.
    pub inode_page: Option<u32>,
    pub inode_offset: Option<u16>,
    /// How the page is reachable: `"fragment array"`, an fseg list name, or
    /// a space list name.
    pub membership: Option<String>,
    /// Index owning the segment, when it could be identified.
    pub index: Option<IndexInfo>,
}

impl Space {
    /// Open a tablespace and autodetect its page size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_impl(path.as_ref(), None)
    }

    /// Open with an explicit page size, bypassing autodetection.
    pub fn open_with_page_size<P: AsRef<Path>>(path: P, page_size: u32) -> Result<Self> {
        if !SUPPORTED_PAGE_SIZES.contains(&page_size) {
            return Err(InnoError::Usage(format!(
                "unsupported page size {} (supported: {:?})",
                page_size, SUPPORTED_PAGE_SIZES
            )));
        }
        Self::open_impl(path.as_ref(), Some(page_size))
    }

    fn open_impl(path: &Path, explicit: Option<u32>) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| InnoError::Io(format!("cannot open {}: {}", path.display(), e)))?;
        let file_size = file
            .metadata()
            .map_err(|e| InnoError::Io(format!("cannot stat {}: {}", path.display(), e)))?
            .len();

        if file_size < SIZE_PAGE_MIN as u64 {
            return Err(InnoError::Corrupt(format!(
                "{} is {} bytes, smaller than any supported page",
                path.display(),
                file_size
            )));
        }

        // Page 0 starts at byte 0 at every page size; the FSP header only
        // needs the first 150 bytes.
        let head_len = std::cmp::min(file_size, SIZE_PAGE_DEFAULT as u64) as usize;
        let mut head = vec![0u8; head_len];
        file.read_exact(&mut head)
            .map_err(|e| InnoError::Io(format!("cannot read page 0: {}", e)))?;
        let fsp = FspHeader::parse(&head)?;

        let page_size = match explicit {
            Some(ps) => {
                if file_size % ps as u64 != 0 {
                    return Err(InnoError::Corrupt(format!(
                        "file size {} is not a multiple of page size {}",
                        file_size, ps
                    )));
                }
                ps
            }
            None => Self::detect_page_size(&fsp, file_size)?,
        };

        Ok(Space {
            path: path.to_path_buf(),
            file: RefCell::new(file),
            file_size,
            page_size,
            page_count: file_size / page_size as u64,
            fsp,
        })
    }

    /// Choose a page size: trust the FSP flags when they describe a shape
    /// this file can have, otherwise retry the smaller sizes.
    fn detect_page_size(fsp: &FspHeader, file_size: u64) -> Result<u32> {
        // A size is plausible when it divides the file evenly and the FSP
        // header's own page count fits inside the file.
        let fits = |ps: u32| {
            file_size % ps as u64 == 0
                && (fsp.size == 0 || fsp.size as u64 * ps as u64 <= file_size)
        };
        let flagged = fsp.page_size_from_flags();
        if SUPPORTED_PAGE_SIZES.contains(&flagged) && fits(flagged) {
            return Ok(flagged);
        }
        log::debug!(
            "FSP flags 0x{:x} give impossible page size {}; retrying smaller sizes",
            fsp.flags,
            flagged
        );
        for &ps in &SUPPORTED_PAGE_SIZES {
            if ps < flagged && fits(ps) {
                return Ok(ps);
            }
        }
        Err(InnoError::Corrupt(format!(
            "no supported page size fits a {}-byte file with FSP flags 0x{:x}",
            file_size, fsp.flags
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Total pages in the file.
    pub fn pages(&self) -> u64 {
        self.page_count
    }

    /// The FSP header from page 0.
    pub fn fsp(&self) -> &FspHeader {
        &self.fsp
    }

    pub fn space_id(&self) -> u32 {
        self.fsp.space_id
    }

    /// Is this the system tablespace (space id 0)?
    pub fn is_system_space(&self) -> bool {
        self.fsp.space_id == 0
    }

    /// Read and frame page `n`.
    pub fn page(&self, n: u64) -> Result<Page> {
        if n >= self.page_count {
            return Err(InnoError::Usage(format!(
                "page {} out of range (space has {} pages)",
                n, self.page_count
            )));
        }
        let mut buf = vec![0u8; self.page_size as usize];
        {
            let mut file = self.file.borrow_mut();
            file.seek(SeekFrom::Start(n * self.page_size as u64))
                .map_err(|e| InnoError::Io(format!("cannot seek to page {}: {}", n, e)))?;
            file.read_exact(&mut buf)
                .map_err(|e| InnoError::Io(format!("cannot read page {}: {}", n, e)))?;
        }
        Page::parse(n, buf, self.page_size)
    }

    /// Iterate pages from `start` in page-number order.
    ///
    /// Unreadable pages are skipped with a logged diagnostic rather than
    /// ending the iteration.
    pub fn each_page(&self, start: u64) -> PageIter<'_> {
        PageIter { space: self, next: start }
    }

    /// Collapse the page sequence into runs of equal page type.
    pub fn each_page_type_region(&self) -> RegionIter<'_> {
        RegionIter {
            pages: self.each_page(0),
            current: None,
        }
    }

    /// Descriptor page covering page `n`.
    pub fn xdes_page_for(&self, n: u64) -> u64 {
        n / PAGES_PER_XDES_PAGE * PAGES_PER_XDES_PAGE
    }

    /// The extent descriptor covering page `n`.
    pub fn xdes_for_page(&self, n: u64) -> Result<Xdes> {
        if n >= self.page_count {
            return Err(InnoError::Usage(format!(
                "page {} out of range (space has {} pages)",
                n, self.page_count
            )));
        }
        let desc = self.page(self.xdes_page_for(n))?;
        let index = (n % PAGES_PER_XDES_PAGE) as usize / PAGES_PER_EXTENT;
        match desc.view()? {
            PageView::FspHdr(v) => v.xdes(index),
            PageView::Xdes(v) => v.xdes(index),
            _ => Err(InnoError::Corrupt(format!(
                "page {} should be a descriptor page but is {}",
                desc.number(),
                desc.fil().page_type
            ))),
        }
    }

    /// Iterate every extent descriptor covering the file, in extent order.
    pub fn each_xdes(&self) -> XdesIter<'_> {
        XdesIter {
            space: self,
            desc_page: None,
            desc_no: 0,
            index: 0,
        }
    }

    /// The space-level lists, `(name, base)`, in on-disk order.
    pub fn each_xdes_list(&self) -> [(&'static str, &ListBaseNode); 5] {
        self.fsp.each_list()
    }

    /// Look up a space-level list by name.
    pub fn list(&self, name: &str) -> Result<&ListBaseNode> {
        self.fsp.list(name).ok_or_else(|| {
            let names: Vec<&str> = self.fsp.each_list().iter().map(|(n, _)| *n).collect();
            InnoError::Usage(format!(
                "no list named {:?} (space lists: {})",
                name,
                names.join(", ")
            ))
        })
    }

    /// Walk a list of extent descriptors (the space lists or an fseg's).
    pub fn each_list_xdes<'s>(
        &'s self,
        base: &ListBaseNode,
    ) -> ListIter<'s, Xdes, impl FnMut(&Page, u16) -> Result<(Xdes, ListNode)> + 's> {
        ListIter::forward(self, base, xdes_node_decoder())
    }

    /// Walk a list of extent descriptors from `last` to `first`.
    pub fn each_list_xdes_reverse<'s>(
        &'s self,
        base: &ListBaseNode,
    ) -> ListIter<'s, Xdes, impl FnMut(&Page, u16) -> Result<(Xdes, ListNode)> + 's> {
        ListIter::backward(self, base, xdes_node_decoder())
    }

    /// Walk a list of INODE pages (the space's inode-page lists), yielding
    /// page numbers.
    pub fn each_list_inode_pages<'s>(
        &'s self,
        base: &ListBaseNode,
    ) -> ListIter<'s, u32, impl FnMut(&Page, u16) -> Result<(u32, ListNode)> + 's> {
        ListIter::forward(self, base, |page, offset| {
            if offset as usize != INODE_FLST_NODE_OFFSET {
                return Err(InnoError::Corrupt(format!(
                    "inode list points at offset {} of page {}, not the page node",
                    offset,
                    page.number()
                )));
            }
            let node = ListNode::parse_at(page.data(), offset as usize)?;
            Ok((page.number() as u32, node))
        })
    }

    /// Iterate every used file-segment inode entry, walking the space's
    /// inode-page lists.
    pub fn each_inode(&self) -> Result<Vec<InodeRef>> {
        let mut out = Vec::new();
        for base in [&self.fsp.full_inodes, &self.fsp.free_inodes] {
            for item in self.each_list_inode_pages(base) {
                let (_, page_no) = item?;
                let page = self.page(page_no as u64)?;
                let inode = InodePage::new(&page)?;
                for entry in inode.used_entries() {
                    let (offset, entry) = entry?;
                    out.push(InodeRef {
                        page_number: page_no,
                        offset,
                        entry,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Resolve an inline segment pointer to its inode entry.
    pub fn inode_at(&self, ptr: &crate::innodb::index::FsegPointer) -> Result<InodeEntry> {
        let page = self.page(ptr.page_number as u64)?;
        let inode = InodePage::new(&page)?;
        inode.entry_at(ptr.offset)
    }

    /// The transaction system header (system space only).
    pub fn trx_sys(&self) -> Result<TrxSysHeader> {
        self.require_system("the transaction system page")?;
        let page = self.page(TRX_SYS_PAGE_NO)?;
        Ok(TrxSysPage::new(&page)?.header().clone())
    }

    /// The data-dictionary header (system space only).
    pub fn dict_header(&self) -> Result<DictHeader> {
        self.require_system("the data dictionary")?;
        let page = self.page(DICT_HDR_PAGE_NO)?;
        DictHeader::parse(page.data())
    }

    /// Enumerate the indexes stored in this space.
    ///
    /// In the system space the SYS_INDEXES dictionary index is walked with
    /// the built-in describer; elsewhere the file is scanned for root pages
    /// (INDEX pages with nil siblings and a populated leaf segment pointer).
    pub fn each_index(&self) -> Result<Vec<IndexInfo>> {
        if self.is_system_space() {
            self.indexes_from_dictionary()
        } else {
            self.indexes_from_scan()
        }
    }

    fn indexes_from_dictionary(&self) -> Result<Vec<IndexInfo>> {
        let dict = self.dict_header()?;
        let describer = dict::SysIndexesDescriber;
        let btree = Btree::new(self, dict.sys_indexes_root as u64)?;
        let mut out = Vec::new();
        for record in btree.each_record(&describer)? {
            let record = record?;
            let space = match field_u64(&record.row, "SPACE") {
                Some(v) => v as u32,
                None => continue,
            };
            if space != self.space_id() {
                continue;
            }
            let root = match field_u64(&record.row, "PAGE_NO") {
                Some(v) => v as u32,
                None => continue,
            };
            let index_id = field_u64(&record.key, "ID").unwrap_or(0);
            let name = record.row.iter().find(|f| f.name == "NAME").and_then(|f| {
                match &f.value {
                    FieldValue::Str(s) => Some(s.clone()),
                    _ => None,
                }
            });
            out.push(IndexInfo {
                index_id,
                root_page: root,
                name,
            });
        }
        Ok(out)
    }

    fn indexes_from_scan(&self) -> Result<Vec<IndexInfo>> {
        let mut out: Vec<IndexInfo> = Vec::new();
        for (n, page) in self.each_page(0) {
            if page.fil().page_type != PageType::Index {
                continue;
            }
            if page.fil().prev().is_some() || page.fil().next().is_some() {
                continue;
            }
            let view = IndexPage::new(&page)?;
            if !view.is_root() {
                continue;
            }
            if out.iter().any(|i| i.index_id == view.header().index_id) {
                continue;
            }
            out.push(IndexInfo {
                index_id: view.header().index_id,
                root_page: n as u32,
                name: None,
            });
        }
        Ok(out)
    }

    /// Full space-management accounting for one page.
    pub fn page_account(&self, n: u64) -> Result<PageAccount> {
        let page = self.page(n)?;
        let xdes = self.xdes_for_page(n)?;
        let status = xdes.status_of(n)?;
        let mut account = PageAccount {
            page: n,
            page_type: page.fil().page_type,
            xdes_page: xdes.page_number,
            xdes_offset: xdes.offset,
            extent_state: xdes.entry.state,
            free: status.free,
            clean: status.clean,
            fseg_id: xdes.entry.allocated_to_fseg().then_some(xdes.entry.fseg_id),
            inode_page: None,
            inode_offset: None,
            membership: None,
            index: None,
        };

        self.account_segment(n, &xdes, &mut account)?;
        if account.membership.is_none() {
            self.account_space_lists(&xdes, &mut account)?;
        }
        if let (Some(fseg_id), None) = (account.fseg_id, account.index.as_ref()) {
            account.index = self.index_for_fseg(fseg_id)?;
        }
        Ok(account)
    }

    fn account_segment(&self, n: u64, xdes: &Xdes, account: &mut PageAccount) -> Result<()> {
        for inode in self.each_inode()? {
            if inode.entry.frag_array.contains(&Some(n as u32)) {
                account.fseg_id = Some(inode.entry.fseg_id);
                account.inode_page = Some(inode.page_number);
                account.inode_offset = Some(inode.offset);
                account.membership = Some("fragment array".to_string());
                return Ok(());
            }
            if account.fseg_id == Some(inode.entry.fseg_id) {
                account.inode_page = Some(inode.page_number);
                account.inode_offset = Some(inode.offset);
                for (name, list) in inode.entry.each_list() {
                    if crate::innodb::list::contains(self, list, xdes.node_addr())? {
                        account.membership = Some(name.to_string());
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    fn account_space_lists(&self, xdes: &Xdes, account: &mut PageAccount) -> Result<()> {
        for (name, list) in [
            ("free", &self.fsp.free),
            ("free_frag", &self.fsp.free_frag),
            ("full_frag", &self.fsp.full_frag),
        ] {
            if crate::innodb::list::contains(self, list, xdes.node_addr())? {
                account.membership = Some(name.to_string());
                return Ok(());
            }
        }
        Ok(())
    }

    /// Find the index whose leaf or internal segment is `fseg_id`, by
    /// inspecting each discovered root's inline pointers.
    fn index_for_fseg(&self, fseg_id: u64) -> Result<Option<IndexInfo>> {
        for info in self.each_index()? {
            let root = self.page(info.root_page as u64)?;
            let view = IndexPage::new(&root)?;
            for ptr in [view.leaf_fseg()?, view.internal_fseg()?] {
                if !ptr.is_set() {
                    continue;
                }
                if let Ok(entry) = self.inode_at(&ptr) {
                    if entry.fseg_id == fseg_id {
                        return Ok(Some(info));
                    }
                }
            }
        }
        Ok(None)
    }

    fn require_system(&self, what: &str) -> Result<()> {
        if !self.is_system_space() {
            return Err(InnoError::Usage(format!(
                "space {} is not the system space; it has no {}",
                self.space_id(),
                what
            )));
        }
        Ok(())
    }
}

fn field_u64(fields: &[crate::innodb::record::Field], name: &str) -> Option<u64> {
    fields.iter().find(|f| f.name == name).and_then(|f| match f.value {
        FieldValue::Uint(v) => Some(v),
        FieldValue::Int(v) if v >= 0 => Some(v as u64),
        _ => None,
    })
}

/// Decoder mapping a list node address back to its extent descriptor.
fn xdes_node_decoder() -> impl FnMut(&Page, u16) -> Result<(Xdes, ListNode)> {
    |page, node_offset| {
        let entry_offset = (node_offset as usize)
            .checked_sub(XDES_FLST_NODE)
            .ok_or_else(|| {
                InnoError::Corrupt(format!(
                    "xdes list address {} of page {} is before any entry",
                    node_offset,
                    page.number()
                ))
            })?;
        if entry_offset < XDES_ARRAY_OFFSET
            || (entry_offset - XDES_ARRAY_OFFSET) % XDES_ENTRY_SIZE != 0
        {
            return Err(InnoError::Corrupt(format!(
                "xdes list address {} of page {} is not an entry node",
                node_offset,
                page.number()
            )));
        }
        let index = (entry_offset - XDES_ARRAY_OFFSET) / XDES_ENTRY_SIZE;
        let entry = XdesEntry::read(&mut page.cursor(entry_offset))?;
        let node = entry.node.clone();
        let located = Xdes {
            page_number: page.number() as u32,
            offset: entry_offset as u16,
            start_page: page.number() as u32 + (index * PAGES_PER_EXTENT) as u32,
            entry,
        };
        Ok((located, node))
    }
}

/// Iterator over readable pages; unreadable ones are skipped with a logged
/// diagnostic.
pub struct PageIter<'s> {
    space: &'s Space,
    next: u64,
}

impl<'s> Iterator for PageIter<'s> {
    type Item = (u64, Page);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.space.pages() {
            let n = self.next;
            self.next += 1;
            match self.space.page(n) {
                Ok(page) => return Some((n, page)),
                Err(e) => log::warn!("skipping unreadable page {}: {}", n, e),
            }
        }
        None
    }
}

/// Iterator collapsing the page sequence into type runs.
pub struct RegionIter<'s> {
    pages: PageIter<'s>,
    current: Option<PageTypeRegion>,
}

impl<'s> Iterator for RegionIter<'s> {
    type Item = PageTypeRegion;

    fn next(&mut self) -> Option<Self::Item> {
        for (n, page) in self.pages.by_ref() {
            let t = page.fil().page_type;
            match &mut self.current {
                Some(region) if region.page_type == t && region.end + 1 == n => {
                    region.end = n;
                    region.count += 1;
                }
                Some(_) => {
                    let done = self.current.take();
                    self.current = Some(PageTypeRegion {
                        start: n,
                        end: n,
                        count: 1,
                        page_type: t,
                    });
                    return done;
                }
                None => {
                    self.current = Some(PageTypeRegion {
                        start: n,
                        end: n,
                        count: 1,
                        page_type: t,
                    });
                }
            }
        }
        self.current.take()
    }
}

/// Iterator over every extent descriptor of the space.
pub struct XdesIter<'s> {
    space: &'s Space,
    desc_page: Option<Page>,
    desc_no: u64,
    index: usize,
}

impl<'s> Iterator for XdesIter<'s> {
    type Item = Result<Xdes>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.desc_page.is_none() {
                if self.desc_no >= self.space.pages() {
                    return None;
                }
                match self.space.page(self.desc_no) {
                    Ok(page) => self.desc_page = Some(page),
                    Err(e) => {
                        self.desc_no += PAGES_PER_XDES_PAGE;
                        return Some(Err(e));
                    }
                }
                self.index = 0;
            }
            let start = self.desc_no + (self.index * PAGES_PER_EXTENT) as u64;
            if self.index >= XDES_PER_PAGE || start >= self.space.pages() {
                self.desc_page = None;
                self.desc_no += PAGES_PER_XDES_PAGE;
                continue;
            }
            let out = match self.desc_page.as_ref() {
                Some(page) => fsp::xdes_at(page, self.index),
                None => continue,
            };
            self.index += 1;
            return Some(out);
        }
    }
}
