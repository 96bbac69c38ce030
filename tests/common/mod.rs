//! Synthetic tablespace construction for integration tests.
//!
//! Builds byte-exact page images — FIL framing with CRC-32C checksums, FSP
//! headers with embedded lists, XDES arrays, inode pages, and compact INDEX
//! pages with chained records and page directories — and writes them to temp
//! files for the public API to chew on.

#![allow(dead_code)]

use byteorder::{BigEndian, ByteOrder};
use std::io::Write;
use tempfile::NamedTempFile;

use innospect::innodb::checksum;
use innospect::innodb::constants::*;

pub const PS: usize = 16384;

/// A zeroed page with FIL page number, type, and nil siblings.
pub fn blank_page(number: u32, page_type: u16) -> Vec<u8> {
    let mut buf = vec![0u8; PS];
    BigEndian::write_u32(&mut buf[FIL_PAGE_OFFSET..], number);
    BigEndian::write_u32(&mut buf[FIL_PAGE_PREV..], FIL_NULL);
    BigEndian::write_u32(&mut buf[FIL_PAGE_NEXT..], FIL_NULL);
    BigEndian::write_u16(&mut buf[FIL_PAGE_TYPE..], page_type);
    buf
}

/// Stamp LSN (header + trailer) and a valid CRC-32C checksum.
pub fn stamp(page: &mut [u8], space_id: u32, lsn: u64) {
    BigEndian::write_u32(&mut page[FIL_PAGE_SPACE_ID..], space_id);
    BigEndian::write_u64(&mut page[FIL_PAGE_LSN..], lsn);
    let trailer = page.len() - SIZE_FIL_TRAILER;
    BigEndian::write_u32(&mut page[trailer + 4..], lsn as u32);
    let crc = checksum::crc32c_checksum(page);
    BigEndian::write_u32(&mut page[FIL_PAGE_SPACE_OR_CHKSUM..], crc);
}

/// Write pages to a temp file, stamping each along the way.
pub fn write_space(space_id: u32, mut pages: Vec<Vec<u8>>) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    for (i, page) in pages.iter_mut().enumerate() {
        stamp(page, space_id, 1000 + i as u64);
        tmp.write_all(page).expect("write page");
    }
    tmp.flush().expect("flush");
    tmp
}

/// Write a 6-byte file address; `None` writes the nil address.
pub fn put_addr(buf: &mut [u8], offset: usize, addr: Option<(u32, u16)>) {
    match addr {
        Some((page, boffset)) => {
            BigEndian::write_u32(&mut buf[offset..], page);
            BigEndian::write_u16(&mut buf[offset + 4..], boffset);
        }
        None => {
            BigEndian::write_u32(&mut buf[offset..], FIL_NULL);
            BigEndian::write_u16(&mut buf[offset + 4..], 0);
        }
    }
}

/// Write a 16-byte list base node.
pub fn put_base_node(
    buf: &mut [u8],
    offset: usize,
    length: u32,
    first: Option<(u32, u16)>,
    last: Option<(u32, u16)>,
) {
    BigEndian::write_u32(&mut buf[offset..], length);
    put_addr(buf, offset + 4, first);
    put_addr(buf, offset + 10, last);
}

/// Write a 12-byte list node.
pub fn put_list_node(
    buf: &mut [u8],
    offset: usize,
    prev: Option<(u32, u16)>,
    next: Option<(u32, u16)>,
) {
    put_addr(buf, offset, prev);
    put_addr(buf, offset + 6, next);
}

/// Byte offset of XDES entry `index` on a descriptor page.
pub fn xdes_offset(index: usize) -> usize {
    XDES_ARRAY_OFFSET + index * XDES_ENTRY_SIZE
}

/// Write an XDES entry. All pages start free+clean; `used` clears both bits
/// for the listed extent-relative page indexes.
pub fn put_xdes(buf: &mut [u8], index: usize, fseg_id: u64, state: u32, used: &[usize]) {
    let base = xdes_offset(index);
    BigEndian::write_u64(&mut buf[base + XDES_ID..], fseg_id);
    put_list_node(buf, base + XDES_FLST_NODE, None, None);
    BigEndian::write_u32(&mut buf[base + XDES_STATE..], state);
    for b in &mut buf[base + XDES_BITMAP..base + XDES_BITMAP + XDES_BITMAP_SIZE] {
        *b = 0xFF;
    }
    for &page in used {
        assert!(page < PAGES_PER_EXTENT);
        buf[base + XDES_BITMAP + page / 4] &= !(0x3 << ((page % 4) * 2));
    }
}

/// Byte offset of inode slot `slot` on an INODE page.
pub fn inode_offset(slot: usize) -> usize {
    INODE_ARRAY_OFFSET + slot * INODE_ENTRY_SIZE
}

/// Write an inode entry with the given fragment pages; the extent lists
/// start empty and can be overwritten with [`put_base_node`].
pub fn put_inode(buf: &mut [u8], slot: usize, fseg_id: u64, frag: &[u32]) {
    let base = inode_offset(slot);
    BigEndian::write_u64(&mut buf[base + FSEG_ID..], fseg_id);
    BigEndian::write_u32(&mut buf[base + FSEG_MAGIC..], FSEG_MAGIC_VALUE);
    for s in 0..FSEG_FRAG_SLOTS {
        let page = frag.get(s).copied().unwrap_or(FIL_NULL);
        BigEndian::write_u32(&mut buf[base + FSEG_FRAG_ARR + s * 4..], page);
    }
}

/// A minimal FSP_HDR page 0.
pub fn fsp_page(space_id: u32, size: u32) -> Vec<u8> {
    let mut buf = blank_page(0, 8);
    let fsp = FIL_PAGE_DATA;
    BigEndian::write_u32(&mut buf[fsp + FSP_SPACE_ID..], space_id);
    BigEndian::write_u32(&mut buf[fsp + FSP_SIZE..], size);
    BigEndian::write_u32(&mut buf[fsp + FSP_FREE_LIMIT..], size);
    buf
}

// ── Integer encodings as stored in records ─────────────────────────

pub fn enc_i32(v: i32) -> [u8; 4] {
    ((v as u32) ^ 0x8000_0000).to_be_bytes()
}

pub fn enc_i64(v: i64) -> [u8; 8] {
    ((v as u64) ^ 0x8000_0000_0000_0000).to_be_bytes()
}

pub fn enc_u32(v: u32) -> [u8; 4] {
    v.to_be_bytes()
}

pub fn enc_u64(v: u64) -> [u8; 8] {
    v.to_be_bytes()
}

pub fn enc_u48(v: u64) -> [u8; 6] {
    let b = v.to_be_bytes();
    [b[2], b[3], b[4], b[5], b[6], b[7]]
}

pub fn enc_u56(v: u64) -> [u8; 7] {
    let b = v.to_be_bytes();
    [b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

// ── Compact INDEX page construction ────────────────────────────────

/// One record to place on an INDEX page.
#[derive(Default, Clone)]
pub struct RecordSpec {
    /// Node pointer instead of conventional.
    pub node_ptr: bool,
    pub deleted: bool,
    pub min_rec: bool,
    /// Null bitmap bytes in the order the decoder reads them (first byte is
    /// nearest the record header).
    pub null_bitmap: Vec<u8>,
    /// Length-vector bytes per variable column, each in decoder read order.
    pub var_lens: Vec<Vec<u8>>,
    /// Column data from the origin forward (child page included for node
    /// pointers).
    pub data: Vec<u8>,
}

impl RecordSpec {
    pub fn plain(data: Vec<u8>) -> Self {
        RecordSpec {
            data,
            ..Default::default()
        }
    }

    fn extra_size(&self) -> usize {
        REC_EXTRA_BYTES
            + self.null_bitmap.len()
            + self.var_lens.iter().map(|v| v.len()).sum::<usize>()
    }
}

/// Build a compact INDEX page: sentinels, chained records, page directory
/// with 4-record ownership groups, and heap bookkeeping.
pub fn index_page(
    number: u32,
    index_id: u64,
    level: u16,
    prev: Option<u32>,
    next: Option<u32>,
    records: &[RecordSpec],
) -> Vec<u8> {
    let mut buf = blank_page(number, 17855);
    if let Some(p) = prev {
        BigEndian::write_u32(&mut buf[FIL_PAGE_PREV..], p);
    }
    if let Some(n) = next {
        BigEndian::write_u32(&mut buf[FIL_PAGE_NEXT..], n);
    }

    // Sentinels.
    put_rec_header(&mut buf, PAGE_INFIMUM, 2, 0, 1, 0, 0);
    buf[PAGE_INFIMUM..PAGE_INFIMUM + 8].copy_from_slice(b"infimum\0");
    buf[PAGE_SUPREMUM..PAGE_SUPREMUM + 8].copy_from_slice(b"supremum");

    // Lay records into the heap.
    let mut heap_top = PAGE_SUPREMUM_END;
    let mut origins = Vec::with_capacity(records.len());
    for rec in records {
        let origin = heap_top + rec.extra_size();
        let mut pos = origin - REC_EXTRA_BYTES;
        for b in &rec.null_bitmap {
            pos -= 1;
            buf[pos] = *b;
        }
        for entry in &rec.var_lens {
            for b in entry {
                pos -= 1;
                buf[pos] = *b;
            }
        }
        buf[origin..origin + rec.data.len()].copy_from_slice(&rec.data);
        origins.push(origin);
        heap_top = origin + rec.data.len();
    }

    // Ownership groups of four; the supremum owns the remainder.
    let n = records.len();
    let full_groups = n / 4;
    for (i, (rec, &origin)) in records.iter().zip(&origins).enumerate() {
        let mut info = 0u8;
        if rec.deleted {
            info |= 0x02;
        }
        if rec.min_rec {
            info |= 0x01;
        }
        let n_owned = if i % 4 == 3 && i / 4 < full_groups { 4 } else { 0 };
        let kind = if rec.node_ptr { 1 } else { 0 };
        put_rec_header(&mut buf, origin, kind, info, n_owned, (2 + i) as u16, 0);
    }
    put_rec_header(
        &mut buf,
        PAGE_SUPREMUM,
        3,
        0,
        (n - full_groups * 4 + 1) as u8,
        1,
        0,
    );

    // Chain: infimum -> records -> supremum.
    let mut prev_origin = PAGE_INFIMUM;
    for &origin in &origins {
        set_next(&mut buf, prev_origin, origin);
        prev_origin = origin;
    }
    set_next(&mut buf, prev_origin, PAGE_SUPREMUM);

    // Directory: infimum slot, one slot per full group owner, supremum slot.
    let mut slots = vec![PAGE_INFIMUM as u16];
    for g in 0..full_groups {
        slots.push(origins[g * 4 + 3] as u16);
    }
    slots.push(PAGE_SUPREMUM as u16);
    for (i, slot) in slots.iter().enumerate() {
        let at = PS - SIZE_FIL_TRAILER - PAGE_DIR_SLOT_SIZE * (i + 1);
        BigEndian::write_u16(&mut buf[at..], *slot);
    }

    // Index header.
    let h = FIL_PAGE_DATA;
    BigEndian::write_u16(&mut buf[h + PAGE_N_DIR_SLOTS..], slots.len() as u16);
    BigEndian::write_u16(&mut buf[h + PAGE_HEAP_TOP..], heap_top as u16);
    BigEndian::write_u16(&mut buf[h + PAGE_N_HEAP..], 0x8000 | (2 + n as u16));
    BigEndian::write_u16(&mut buf[h + PAGE_N_RECS..], n as u16);
    BigEndian::write_u16(&mut buf[h + PAGE_LEVEL..], level);
    BigEndian::write_u64(&mut buf[h + PAGE_INDEX_ID..], index_id);
    BigEndian::write_u16(&mut buf[h + PAGE_DIRECTION..], PAGE_NO_DIRECTION);
    buf
}

/// Mark a page as an index root by writing its inline segment pointers.
pub fn set_root_fsegs(
    buf: &mut [u8],
    space_id: u32,
    leaf: (u32, u16),
    internal: (u32, u16),
) {
    BigEndian::write_u32(&mut buf[PAGE_BTR_SEG_LEAF..], space_id);
    BigEndian::write_u32(&mut buf[PAGE_BTR_SEG_LEAF + 4..], leaf.0);
    BigEndian::write_u16(&mut buf[PAGE_BTR_SEG_LEAF + 8..], leaf.1);
    BigEndian::write_u32(&mut buf[PAGE_BTR_SEG_TOP..], space_id);
    BigEndian::write_u32(&mut buf[PAGE_BTR_SEG_TOP + 4..], internal.0);
    BigEndian::write_u16(&mut buf[PAGE_BTR_SEG_TOP + 8..], internal.1);
}

fn put_rec_header(
    buf: &mut [u8],
    origin: usize,
    kind: u8,
    info: u8,
    n_owned: u8,
    heap_no: u16,
    next: i16,
) {
    buf[origin - 5] = (info << 4) | (n_owned & 0x0F);
    BigEndian::write_u16(&mut buf[origin - 4..], (heap_no << 3) | kind as u16);
    BigEndian::write_i16(&mut buf[origin - 2..], next);
}

fn set_next(buf: &mut [u8], from_origin: usize, to_origin: usize) {
    BigEndian::write_i16(
        &mut buf[from_origin - 2..],
        (to_origin as i64 - from_origin as i64) as i16,
    );
}
