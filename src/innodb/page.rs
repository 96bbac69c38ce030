//! FIL page framing and the typed page factory.
//!
//! Every InnoDB page begins with a 38-byte FIL header ([`FilHeader`]) and
//! ends with an 8-byte trailer ([`FilTrailer`]). [`Page`] owns one page's
//! buffer together with its decoded header; [`Page::view`] dispatches on the
//! header's type field and returns the matching specialized view
//! ([`PageView`]). Views borrow the page buffer and never copy it.

use serde::Serialize;

use crate::innodb::checksum;
use crate::innodb::constants::*;
use crate::innodb::cursor::Cursor;
use crate::innodb::dict::TrxSysPage;
use crate::innodb::fsp::{FspHdrPage, XdesPage};
use crate::innodb::index::IndexPage;
use crate::innodb::inode::InodePage;
use crate::innodb::page_types::PageType;
use crate::{InnoError, Result};

/// Parsed FIL header (38 bytes, at the start of every page).
#[derive(Debug, Clone, Serialize)]
pub struct FilHeader {
    /// Stored checksum (or space id in ancient formats). Bytes 0-3.
    pub checksum: u32,
    /// Page number within the tablespace. Bytes 4-7.
    pub page_number: u32,
    /// Previous page in this page's chain; `FIL_NULL` when unused. Bytes 8-11.
    pub prev_page: u32,
    /// Next page in this page's chain; `FIL_NULL` when unused. Bytes 12-15.
    pub next_page: u32,
    /// LSN of the newest modification. Bytes 16-23.
    pub lsn: u64,
    /// Page type. Bytes 24-25.
    pub page_type: PageType,
    /// Flush LSN; only meaningful on page 0 of the system space. Bytes 26-33.
    pub flush_lsn: u64,
    /// Owning space id. Bytes 34-37.
    pub space_id: u32,
}

impl FilHeader {
    /// Decode the FIL header at the cursor.
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        c.name("fil", |c| {
            Ok(FilHeader {
                checksum: c.name("checksum", |c| c.read_u32())?,
                page_number: c.name("offset", |c| c.read_u32())?,
                prev_page: c.name("prev", |c| c.read_u32())?,
                next_page: c.name("next", |c| c.read_u32())?,
                lsn: c.name("lsn", |c| c.read_u64())?,
                page_type: PageType::from_u16(c.name("type", |c| c.read_u16())?),
                flush_lsn: c.name("flush_lsn", |c| c.read_u64())?,
                space_id: c.name("space_id", |c| c.read_u32())?,
            })
        })
    }

    /// Previous page in the chain, `None` when nil.
    pub fn prev(&self) -> Option<u32> {
        (self.prev_page != FIL_NULL).then_some(self.prev_page)
    }

    /// Next page in the chain, `None` when nil.
    pub fn next(&self) -> Option<u32> {
        (self.next_page != FIL_NULL).then_some(self.next_page)
    }
}

/// Parsed FIL trailer (last 8 bytes of every page).
#[derive(Debug, Clone, Serialize)]
pub struct FilTrailer {
    /// Old-style checksum.
    pub checksum: u32,
    /// Low 32 bits of the header LSN, repeated as a torn-write check.
    pub lsn_low32: u32,
}

/// One page, owned buffer plus decoded FIL framing.
#[derive(Debug)]
pub struct Page {
    number: u64,
    page_size: u32,
    fil: FilHeader,
    data: Vec<u8>,
}

impl Page {
    /// Frame a raw page buffer.
    ///
    /// `data` must be exactly `page_size` bytes.
    pub fn parse(number: u64, data: Vec<u8>, page_size: u32) -> Result<Self> {
        if data.len() != page_size as usize {
            return Err(InnoError::Corrupt(format!(
                "page {} buffer is {} bytes, expected {}",
                number,
                data.len(),
                page_size
            )));
        }
        let fil = FilHeader::read(&mut Cursor::new(&data, 0))?;
        Ok(Page {
            number,
            page_size,
            fil,
            data,
        })
    }

    /// Page number this buffer was read as.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Page size in bytes.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Decoded FIL header.
    pub fn fil(&self) -> &FilHeader {
        &self.fil
    }

    /// The full page buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The page body between FIL header and trailer.
    pub fn body(&self) -> &[u8] {
        &self.data[FIL_PAGE_DATA..self.data.len() - SIZE_FIL_TRAILER]
    }

    /// Decode the FIL trailer.
    pub fn trailer(&self) -> FilTrailer {
        let mut c = Cursor::new(&self.data, self.data.len() - SIZE_FIL_TRAILER);
        // Infallible: the buffer length was checked at parse time.
        FilTrailer {
            checksum: c.read_u32().unwrap_or(0),
            lsn_low32: c.read_u32().unwrap_or(0),
        }
    }

    /// A cursor over this page's buffer.
    pub fn cursor(&self, pos: usize) -> Cursor<'_> {
        Cursor::new(&self.data, pos)
    }

    /// Does the stored checksum match either supported algorithm?
    ///
    /// Advisory only; stale checksums are common in copied files.
    pub fn checksum_ok(&self) -> bool {
        checksum::validate(&self.data).valid
    }

    /// Does the trailer repeat the low 32 bits of the header LSN?
    pub fn lsn_consistent(&self) -> bool {
        checksum::lsn_consistent(&self.data)
    }

    /// Construct the typed view for this page.
    ///
    /// Pages with no specialized decoder come back as [`PageView::Other`];
    /// that is not an error.
    pub fn view(&self) -> Result<PageView<'_>> {
        Ok(match self.fil.page_type {
            PageType::FspHdr => PageView::FspHdr(FspHdrPage::new(self)?),
            PageType::Xdes => PageView::Xdes(XdesPage::new(self)?),
            PageType::Inode => PageView::Inode(InodePage::new(self)?),
            PageType::Index => PageView::Index(IndexPage::new(self)?),
            PageType::TrxSys => PageView::TrxSys(TrxSysPage::new(self)?),
            _ => PageView::Other(self),
        })
    }
}

/// Typed view over a framed page, selected by the FIL header type field.
pub enum PageView<'a> {
    FspHdr(FspHdrPage<'a>),
    Xdes(XdesPage<'a>),
    Inode(InodePage<'a>),
    Index(IndexPage<'a>),
    TrxSys(TrxSysPage<'a>),
    /// A valid framed page with no specialized decoder.
    Other(&'a Page),
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, ByteOrder};

    fn raw_page(page_type: u16) -> Vec<u8> {
        let mut buf = vec![0u8; 16384];
        BigEndian::write_u32(&mut buf[FIL_PAGE_SPACE_OR_CHKSUM..], 0xC0FFEE);
        BigEndian::write_u32(&mut buf[FIL_PAGE_OFFSET..], 3);
        BigEndian::write_u32(&mut buf[FIL_PAGE_PREV..], FIL_NULL);
        BigEndian::write_u32(&mut buf[FIL_PAGE_NEXT..], 4);
        BigEndian::write_u64(&mut buf[FIL_PAGE_LSN..], 0x0000_0001_0000_002A);
        BigEndian::write_u16(&mut buf[FIL_PAGE_TYPE..], page_type);
        BigEndian::write_u32(&mut buf[FIL_PAGE_SPACE_ID..], 9);
        let trailer = buf.len() - SIZE_FIL_TRAILER;
        BigEndian::write_u32(&mut buf[trailer..], 0xC0FFEE);
        BigEndian::write_u32(&mut buf[trailer + 4..], 0x0000_002A);
        buf
    }

    #[test]
    fn test_fil_framing() {
        let page = Page::parse(3, raw_page(17855), 16384).unwrap();
        let fil = page.fil();
        assert_eq!(fil.page_number, 3);
        assert_eq!(fil.prev(), None);
        assert_eq!(fil.next(), Some(4));
        assert_eq!(fil.page_type, PageType::Index);
        assert_eq!(fil.space_id, 9);
        assert_eq!(page.trailer().lsn_low32, 0x2A);
        assert!(page.lsn_consistent());
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = Page::parse(0, vec![0u8; 100], 16384).unwrap_err();
        assert!(matches!(err, InnoError::Corrupt(_)));
    }

    #[test]
    fn test_unknown_type_yields_generic_view() {
        let page = Page::parse(3, raw_page(4242), 16384).unwrap();
        match page.view().unwrap() {
            PageView::Other(p) => assert_eq!(p.fil().page_type, PageType::Unknown(4242)),
            _ => panic!("expected generic view"),
        }
    }

    #[test]
    fn test_lsn_mismatch_detected() {
        let mut buf = raw_page(0);
        let trailer = buf.len() - SIZE_FIL_TRAILER;
        BigEndian::write_u32(&mut buf[trailer + 4..], 0xBEEF);
        let page = Page::parse(3, buf, 16384).unwrap();
        assert!(!page.lsn_consistent());
    }
}
