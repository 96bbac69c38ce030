//! B+Tree traversal.
//!
//! A [`Btree`] wraps a root page number within a [`Space`] and walks the
//! tree through the page factory: depth-first recursion with page and link
//! callbacks, per-level walks along the FIL sibling chain, and in-order
//! record iteration over the leaf level. Every page visited must carry the
//! root's `index_id`; a mismatch stops the traversal with a corruption
//! error.

use crate::innodb::index::{FsegPointer, IndexHeader, IndexPage};
use crate::innodb::inode::InodeEntry;
use crate::innodb::page::Page;
use crate::innodb::record::{Record, RecordDescriber};
use crate::innodb::space::Space;
use crate::{InnoError, Result};

use std::collections::VecDeque;

/// Defensive bound on descent depth; a legitimate tree is never this deep.
const MAX_DEPTH: usize = 64;

/// One index tree rooted at a known page.
pub struct Btree<'s> {
    space: &'s Space,
    root_page: u64,
    index_id: u64,
    root_level: u16,
}

impl<'s> Btree<'s> {
    /// Wrap the tree rooted at `root_page`.
    pub fn new(space: &'s Space, root_page: u64) -> Result<Self> {
        let page = space.page(root_page)?;
        let view = IndexPage::new(&page)?;
        Ok(Btree {
            space,
            root_page,
            index_id: view.header().index_id,
            root_level: view.header().level,
        })
    }

    pub fn root_page(&self) -> u64 {
        self.root_page
    }

    pub fn index_id(&self) -> u64 {
        self.index_id
    }

    /// Level of the root; 0 means the whole tree is a single leaf.
    pub fn root_level(&self) -> u16 {
        self.root_level
    }

    /// Depth-first preorder traversal.
    ///
    /// `on_page(page, header, depth)` fires for every page, the root at
    /// depth 0; `on_link(parent, child, min_key, depth)` fires for every
    /// child pointer in key order before the child is descended.
    pub fn recurse(
        &self,
        describer: &dyn RecordDescriber,
        on_page: &mut dyn FnMut(&Page, &IndexHeader, usize),
        on_link: &mut dyn FnMut(u64, u32, &Record, usize),
    ) -> Result<()> {
        self.visit(self.root_page, 0, describer, on_page, on_link)
    }

    fn visit(
        &self,
        page_no: u64,
        depth: usize,
        describer: &dyn RecordDescriber,
        on_page: &mut dyn FnMut(&Page, &IndexHeader, usize),
        on_link: &mut dyn FnMut(u64, u32, &Record, usize),
    ) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(InnoError::Corrupt(format!(
                "descent past depth {} below page {}",
                MAX_DEPTH, self.root_page
            )));
        }
        let page = self.space.page(page_no)?;
        let view = self.checked_view(&page)?;
        on_page(&page, view.header(), depth);
        if view.is_leaf() {
            return Ok(());
        }
        for link in view.child_links(describer)? {
            on_link(page_no, link.child_page, &link.min_key, depth);
            self.visit(link.child_page as u64, depth + 1, describer, on_page, on_link)?;
        }
        Ok(())
    }

    /// Walk the pages of one level left to right.
    ///
    /// The leftmost page is found by descending through the first child at
    /// each step; the walk then follows FIL `next` pointers until the chain
    /// ends or leaves the level.
    pub fn each_page_at_level(
        &self,
        level: u16,
        describer: &dyn RecordDescriber,
    ) -> Result<LevelIter<'s>> {
        if level > self.root_level {
            return Err(InnoError::Usage(format!(
                "level {} exceeds the root level {}",
                level, self.root_level
            )));
        }
        let leftmost = self.leftmost_page_at_level(level, describer)?;
        Ok(LevelIter {
            space: self.space,
            index_id: self.index_id,
            level,
            next: Some(leftmost),
        })
    }

    /// Descend through first children to the leftmost page of `level`.
    pub fn leftmost_page_at_level(
        &self,
        level: u16,
        describer: &dyn RecordDescriber,
    ) -> Result<u64> {
        let mut page_no = self.root_page;
        for _ in 0..=MAX_DEPTH {
            let page = self.space.page(page_no)?;
            let view = self.checked_view(&page)?;
            if view.header().level == level {
                return Ok(page_no);
            }
            if view.is_leaf() {
                return Err(InnoError::Corrupt(format!(
                    "hit a leaf at page {} while looking for level {}",
                    page_no, level
                )));
            }
            let links = view.child_links(describer)?;
            let first = links.first().ok_or_else(|| {
                InnoError::Corrupt(format!("internal page {} has no children", page_no))
            })?;
            page_no = first.child_page as u64;
        }
        Err(InnoError::Corrupt(format!(
            "descent past depth {} below page {}",
            MAX_DEPTH, self.root_page
        )))
    }

    /// Iterate every user record of the tree in key order, walking the leaf
    /// level left to right.
    pub fn each_record<'d>(
        &self,
        describer: &'d dyn RecordDescriber,
    ) -> Result<RecordIter<'s, 'd>> {
        let leftmost = self.leftmost_page_at_level(0, describer)?;
        Ok(RecordIter {
            space: self.space,
            describer,
            index_id: self.index_id,
            next_page: Some(leftmost),
            pending: VecDeque::new(),
        })
    }

    /// The root's inline leaf-segment pointer and its inode entry.
    pub fn leaf_fseg(&self) -> Result<(FsegPointer, InodeEntry)> {
        self.fseg(|view| view.leaf_fseg())
    }

    /// The root's inline internal-segment pointer and its inode entry.
    pub fn internal_fseg(&self) -> Result<(FsegPointer, InodeEntry)> {
        self.fseg(|view| view.internal_fseg())
    }

    fn fseg(
        &self,
        pick: impl Fn(&IndexPage<'_>) -> Result<FsegPointer>,
    ) -> Result<(FsegPointer, InodeEntry)> {
        let page = self.space.page(self.root_page)?;
        let view = IndexPage::new(&page)?;
        let ptr = pick(&view)?;
        if !ptr.is_set() {
            return Err(InnoError::Corrupt(format!(
                "page {} carries no inline segment pointer; not a root",
                self.root_page
            )));
        }
        let entry = self.space.inode_at(&ptr)?;
        Ok((ptr, entry))
    }

    fn checked_view<'p>(&self, page: &'p Page) -> Result<IndexPage<'p>> {
        let view = IndexPage::new(page)?;
        if view.header().index_id != self.index_id {
            return Err(InnoError::Corrupt(format!(
                "page {} belongs to index {} but the root {} is index {}",
                page.number(),
                view.header().index_id,
                self.root_page,
                self.index_id
            )));
        }
        Ok(view)
    }
}

/// Left-to-right walk of one tree level.
pub struct LevelIter<'s> {
    space: &'s Space,
    index_id: u64,
    level: u16,
    next: Option<u64>,
}

impl<'s> Iterator for LevelIter<'s> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        let page_no = self.next.take()?;
        let page = match self.space.page(page_no) {
            Ok(p) => p,
            Err(e) => return Some(Err(e)),
        };
        let view = match IndexPage::new(&page) {
            Ok(v) => v,
            Err(e) => return Some(Err(e)),
        };
        if view.header().index_id != self.index_id {
            return Some(Err(InnoError::Corrupt(format!(
                "page {} belongs to index {}, expected {}",
                page_no,
                view.header().index_id,
                self.index_id
            ))));
        }
        if view.header().level != self.level {
            // The sibling chain left the level; the walk is over.
            return None;
        }
        self.next = page.fil().next().map(u64::from);
        drop(view);
        Some(Ok(page))
    }
}

/// In-order record iteration over the leaf chain.
pub struct RecordIter<'s, 'd> {
    space: &'s Space,
    describer: &'d dyn RecordDescriber,
    index_id: u64,
    next_page: Option<u64>,
    pending: VecDeque<Result<Record>>,
}

impl<'s, 'd> Iterator for RecordIter<'s, 'd> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            let page_no = self.next_page.take()?;
            let page = match self.space.page(page_no) {
                Ok(p) => p,
                Err(e) => return Some(Err(e)),
            };
            let view = match IndexPage::new(&page) {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            if view.header().index_id != self.index_id {
                return Some(Err(InnoError::Corrupt(format!(
                    "leaf {} belongs to index {}, expected {}",
                    page_no,
                    view.header().index_id,
                    self.index_id
                ))));
            }
            match view.records(self.describer) {
                Ok(records) => self.pending.extend(records),
                Err(e) => return Some(Err(e)),
            }
            self.next_page = page.fil().next().map(u64::from);
        }
    }
}
