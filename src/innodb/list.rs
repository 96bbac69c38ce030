//! Doubly linked lists embedded in pages.
//!
//! InnoDB threads the space-management structures together with intrusive
//! lists (fut0lst.h): a 16-byte base node (length + first/last address) lives
//! in some owning structure, and each member carries a 12-byte node
//! (prev/next address). Addresses are [`FilAddr`]s — a page number and a byte
//! offset pointing directly *at the member's node*, not at the member.
//!
//! Nodes are owned by their pages; a list is a lookup protocol, not an
//! ownership relation. [`ListIter`] walks members through a caller-supplied
//! decoder and bounds the walk by the base node's stored length, which is
//! also what makes accidental cycles terminate.

use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::cursor::Cursor;
use crate::innodb::page::Page;
use crate::innodb::space::Space;
use crate::Result;

/// A (page, offset) file address. 6 bytes on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilAddr {
    /// Page number; `FIL_NULL` marks a nil address.
    pub page: u32,
    /// Byte offset within that page.
    pub offset: u16,
}

impl FilAddr {
    /// Decode an address at the cursor.
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        Ok(FilAddr {
            page: c.name("page", |c| c.read_u32())?,
            offset: c.name("offset", |c| c.read_u16())?,
        })
    }

    /// Nil when the page number is `FIL_NULL`; the offset is ignored.
    pub fn is_null(&self) -> bool {
        self.page == FIL_NULL
    }

    /// `Some(self)` for a real address, `None` for nil.
    pub fn some(self) -> Option<FilAddr> {
        (!self.is_null()).then_some(self)
    }
}

/// List base node: length plus first/last member addresses. 16 bytes.
#[derive(Debug, Clone, Serialize)]
pub struct ListBaseNode {
    pub length: u32,
    pub first: FilAddr,
    pub last: FilAddr,
}

impl ListBaseNode {
    /// Decode a base node at the cursor.
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        Ok(ListBaseNode {
            length: c.name("length", |c| c.read_u32())?,
            first: c.name("first", FilAddr::read)?,
            last: c.name("last", FilAddr::read)?,
        })
    }

    /// Decode a base node at a byte offset of a page buffer.
    pub fn parse_at(data: &[u8], offset: usize) -> Result<Self> {
        Self::read(&mut Cursor::new(data, offset))
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// List member node: prev/next addresses. 12 bytes.
#[derive(Debug, Clone, Serialize)]
pub struct ListNode {
    pub prev: FilAddr,
    pub next: FilAddr,
}

impl ListNode {
    /// Decode a member node at the cursor.
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        Ok(ListNode {
            prev: c.name("prev", FilAddr::read)?,
            next: c.name("next", FilAddr::read)?,
        })
    }

    /// Decode a member node at a byte offset of a page buffer.
    pub fn parse_at(data: &[u8], offset: usize) -> Result<Self> {
        Self::read(&mut Cursor::new(data, offset))
    }
}

/// Walk direction for [`ListIter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    FirstToLast,
    LastToFirst,
}

/// Lazy walk over a list's members.
///
/// The decoder receives the page holding the member and the byte offset of
/// the member's *node*, and returns the typed entry together with that node.
/// Iteration ends at a nil link or after `length` members, whichever comes
/// first.
pub struct ListIter<'s, T, D>
where
    D: FnMut(&Page, u16) -> Result<(T, ListNode)>,
{
    space: &'s Space,
    decode: D,
    next: Option<FilAddr>,
    remaining: u32,
    walk: Walk,
    failed: bool,
}

impl<'s, T, D> ListIter<'s, T, D>
where
    D: FnMut(&Page, u16) -> Result<(T, ListNode)>,
{
    /// Walk from `first` following `next` links.
    pub fn forward(space: &'s Space, base: &ListBaseNode, decode: D) -> Self {
        ListIter {
            space,
            decode,
            next: base.first.some(),
            remaining: base.length,
            walk: Walk::FirstToLast,
            failed: false,
        }
    }

    /// Walk from `last` following `prev` links.
    pub fn backward(space: &'s Space, base: &ListBaseNode, decode: D) -> Self {
        ListIter {
            space,
            decode,
            next: base.last.some(),
            remaining: base.length,
            walk: Walk::LastToFirst,
            failed: false,
        }
    }
}

impl<'s, T, D> Iterator for ListIter<'s, T, D>
where
    D: FnMut(&Page, u16) -> Result<(T, ListNode)>,
{
    type Item = Result<(FilAddr, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        let addr = self.next?;
        let page = match self.space.page(addr.page as u64) {
            Ok(p) => p,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };
        let (entry, node) = match (self.decode)(&page, addr.offset) {
            Ok(out) => out,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };
        self.remaining -= 1;
        self.next = match self.walk {
            Walk::FirstToLast => node.next.some(),
            Walk::LastToFirst => node.prev.some(),
        };
        Some(Ok((addr, entry)))
    }
}

/// Does the list contain the given node address? O(length).
pub fn contains(space: &Space, base: &ListBaseNode, target: FilAddr) -> Result<bool> {
    let iter = ListIter::forward(space, base, |page, offset| {
        Ok(((), ListNode::parse_at(page.data(), offset as usize)?))
    });
    for item in iter {
        let (addr, ()) = item?;
        if addr == target {
            return Ok(true);
        }
    }
    Ok(false)
}
