//! Page checksum validation.
//!
//! InnoDB has stored page checksums with several algorithms over its history;
//! the two that matter for modern files are CRC-32C (MySQL 5.7.7+ default)
//! and the legacy folded checksum (`buf_calc_page_new_checksum`). Both cover
//! the same two byte ranges: bytes 4..26 (page number through LSN) and bytes
//! 38..(page_size - 8) (the page body before the trailer). Bytes 26..38 are
//! skipped because the flush LSN and space id are written outside the buffer
//! pool.
//!
//! A mismatch is not treated as fatal anywhere in this crate: many legitimate
//! captures are checksum-stale. [`validate`] reports which algorithm matched
//! so callers can decide.

use byteorder::{BigEndian, ByteOrder};

use crate::innodb::constants::*;

/// Checksum algorithms used by InnoDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// CRC-32C over the two page ranges.
    Crc32c,
    /// Legacy folded checksum.
    Legacy,
    /// No checksum stored (`innodb_checksum_algorithm=none` magic, or an
    /// all-zero page).
    None,
}

/// Outcome of checking a page's stored checksum.
#[derive(Debug, Clone)]
pub struct Validation {
    /// Algorithm that matched, or the expected one on failure.
    pub algorithm: Algorithm,
    pub valid: bool,
    pub stored: u32,
    pub calculated: u32,
}

/// Check the stored checksum of a full page buffer.
///
/// Tries CRC-32C first, then the legacy algorithm. The `0xDEADBEEF` magic and
/// all-zero pages are valid by definition.
pub fn validate(page: &[u8]) -> Validation {
    let stored = BigEndian::read_u32(&page[FIL_PAGE_SPACE_OR_CHKSUM..]);

    if stored == BUF_NO_CHECKSUM_MAGIC {
        return Validation {
            algorithm: Algorithm::None,
            valid: true,
            stored,
            calculated: BUF_NO_CHECKSUM_MAGIC,
        };
    }

    if stored == 0 && page.iter().all(|&b| b == 0) {
        return Validation {
            algorithm: Algorithm::None,
            valid: true,
            stored: 0,
            calculated: 0,
        };
    }

    let crc = crc32c_checksum(page);
    if stored == crc {
        return Validation {
            algorithm: Algorithm::Crc32c,
            valid: true,
            stored,
            calculated: crc,
        };
    }

    let legacy = legacy_checksum(page);
    if stored == legacy {
        return Validation {
            algorithm: Algorithm::Legacy,
            valid: true,
            stored,
            calculated: legacy,
        };
    }

    Validation {
        algorithm: Algorithm::Crc32c,
        valid: false,
        stored,
        calculated: crc,
    }
}

/// CRC-32C page checksum: CRC of bytes 4..26 continued over bytes
/// 38..(page_size - 8).
pub fn crc32c_checksum(page: &[u8]) -> u32 {
    let end = page.len() - SIZE_FIL_TRAILER;
    let crc = crc32c::crc32c(&page[FIL_PAGE_OFFSET..FIL_PAGE_FILE_FLUSH_LSN]);
    crc32c::crc32c_append(crc, &page[FIL_PAGE_DATA..end])
}

/// Legacy folded page checksum (`buf_calc_page_new_checksum`): the two
/// ranges folded separately, summed, truncated to 32 bits.
pub fn legacy_checksum(page: &[u8]) -> u32 {
    let end = page.len() - SIZE_FIL_TRAILER;
    let fold1 = fold_bytes(&page[FIL_PAGE_OFFSET..FIL_PAGE_FILE_FLUSH_LSN]);
    let fold2 = fold_bytes(&page[FIL_PAGE_DATA..end]);
    fold1.wrapping_add(fold2) as u32
}

/// Do the stored and header LSN fields agree?
///
/// The trailer repeats the low 32 bits of the header LSN; a mismatch usually
/// means a torn write.
pub fn lsn_consistent(page: &[u8]) -> bool {
    let header_low = BigEndian::read_u64(&page[FIL_PAGE_LSN..]) as u32;
    let trailer = page.len() - SIZE_FIL_TRAILER;
    let trailer_low = BigEndian::read_u32(&page[trailer + 4..]);
    header_low == trailer_low
}

/// MySQL's `ut_fold_ulint_pair`, on u64 to match `ulint` on LP64 platforms.
#[inline]
fn fold_pair(n1: u64, n2: u64) -> u64 {
    let mask = UT_HASH_RANDOM_MASK as u64;
    let mask2 = UT_HASH_RANDOM_MASK2 as u64;
    ((((n1 ^ n2 ^ mask2) << 8).wrapping_add(n1)) ^ mask).wrapping_add(n2)
}

/// MySQL's `ut_fold_binary`: fold u32 words in 8-byte strides, then the tail
/// as single bytes with any final aligned 4-byte word folded whole.
fn fold_bytes(data: &[u8]) -> u64 {
    let mut fold: u64 = 0;
    let aligned = data.len() & !7;
    let mut i = 0;
    while i < aligned {
        fold = fold_pair(fold, BigEndian::read_u32(&data[i..]) as u64);
        fold = fold_pair(fold, BigEndian::read_u32(&data[i + 4..]) as u64);
        i += 8;
    }
    let remainder = data.len() - aligned;
    let singles = if remainder >= 4 { remainder - 4 } else { remainder };
    for _ in 0..singles {
        fold = fold_pair(fold, data[i] as u64);
        i += 1;
    }
    if remainder >= 4 {
        fold = fold_pair(fold, BigEndian::read_u32(&data[i..]) as u64);
    }
    fold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped_page(fill: u8) -> Vec<u8> {
        let mut page = vec![fill; 16384];
        BigEndian::write_u64(&mut page[FIL_PAGE_LSN..], 0x1234_5678);
        BigEndian::write_u32(&mut page[16384 - 4..], 0x1234_5678);
        page
    }

    #[test]
    fn test_all_zero_page_is_valid() {
        let page = vec![0u8; 16384];
        let v = validate(&page);
        assert!(v.valid);
        assert_eq!(v.algorithm, Algorithm::None);
    }

    #[test]
    fn test_no_checksum_magic() {
        let mut page = vec![0u8; 16384];
        BigEndian::write_u32(&mut page[0..], BUF_NO_CHECKSUM_MAGIC);
        let v = validate(&page);
        assert!(v.valid);
        assert_eq!(v.algorithm, Algorithm::None);
    }

    #[test]
    fn test_crc32c_roundtrip() {
        let mut page = stamped_page(0xAB);
        let crc = crc32c_checksum(&page);
        BigEndian::write_u32(&mut page[0..], crc);
        let v = validate(&page);
        assert!(v.valid);
        assert_eq!(v.algorithm, Algorithm::Crc32c);
    }

    #[test]
    fn test_legacy_roundtrip() {
        let mut page = stamped_page(0xCD);
        let sum = legacy_checksum(&page);
        BigEndian::write_u32(&mut page[0..], sum);
        let v = validate(&page);
        assert!(v.valid);
        assert_eq!(v.algorithm, Algorithm::Legacy);
    }

    #[test]
    fn test_mismatch_reported_not_fatal() {
        let mut page = stamped_page(0x11);
        BigEndian::write_u32(&mut page[0..], 0x1BAD_C0DE);
        let v = validate(&page);
        assert!(!v.valid);
        assert_eq!(v.stored, 0x1BAD_C0DE);
        assert_eq!(v.calculated, crc32c_checksum(&page));
    }

    #[test]
    fn test_fold_tail_handling() {
        // Byte-tail lengths 0..8 all fold without panicking and differ.
        let data: Vec<u8> = (0u8..32).collect();
        let mut seen = Vec::new();
        for len in 24..32 {
            let f = fold_bytes(&data[..len]);
            assert!(!seen.contains(&f));
            seen.push(f);
        }
    }

    #[test]
    fn test_lsn_consistency() {
        let page = stamped_page(0);
        assert!(lsn_consistent(&page));
        let mut torn = stamped_page(0);
        BigEndian::write_u32(&mut torn[16384 - 4..], 0xAAAA_AAAA);
        assert!(!lsn_consistent(&torn));
    }
}
