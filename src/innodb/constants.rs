/// InnoDB page and file structure constants.
///
/// Values are derived from the MySQL/InnoDB source code headers:
/// - fil0fil.h (FIL header/trailer)
/// - fsp0fsp.h (FSP header, XDES, FSEG inodes)
/// - fut0lst.h (embedded list nodes)
/// - page0page.h (index page header)
/// - rem0rec.h (record header)
/// - trx0sys.h / dict0boot.h (system tablespace fixed pages)
// Page sizes
pub const SIZE_PAGE_DEFAULT: u32 = 16384;
pub const SIZE_PAGE_MIN: u32 = 1024;
/// Page sizes the opener will consider, largest first.
pub const SUPPORTED_PAGE_SIZES: [u32; 5] = [16384, 8192, 4096, 2048, 1024];

// FIL Header (38 bytes total)
pub const SIZE_FIL_HEAD: usize = 38;
pub const FIL_PAGE_SPACE_OR_CHKSUM: usize = 0; // 4 bytes - checksum or space id
pub const FIL_PAGE_OFFSET: usize = 4; // 4 bytes - page number
pub const FIL_PAGE_PREV: usize = 8; // 4 bytes - previous page
pub const FIL_PAGE_NEXT: usize = 12; // 4 bytes - next page
pub const FIL_PAGE_LSN: usize = 16; // 8 bytes - LSN of newest modification
pub const FIL_PAGE_TYPE: usize = 24; // 2 bytes - page type
pub const FIL_PAGE_FILE_FLUSH_LSN: usize = 26; // 8 bytes - flush LSN (page 0 of system space only)
pub const FIL_PAGE_SPACE_ID: usize = 34; // 4 bytes - space id

// FIL Trailer (8 bytes at page_size - 8)
pub const SIZE_FIL_TRAILER: usize = 8;
// old-style checksum: offset 0 within trailer (4 bytes)
// low 32 bits of LSN: offset 4 within trailer (4 bytes)

// Start of page data (immediately after FIL header)
pub const FIL_PAGE_DATA: usize = 38;

/// "null" page reference (4294967295)
pub const FIL_NULL: u32 = 0xFFFFFFFF;

// Embedded list nodes (fut0lst.h)
pub const FLST_BASE_NODE_SIZE: usize = 16; // length(4) + first(6) + last(6)
pub const FLST_NODE_SIZE: usize = 12; // prev(6) + next(6)
pub const FIL_ADDR_SIZE: usize = 6; // page(4) + offset(2)

// FSP Header (112 bytes, starts at FIL_PAGE_DATA on page 0)
pub const FSP_HEADER_SIZE: usize = 112;
pub const FSP_SPACE_ID: usize = 0; // 4 bytes - space id
pub const FSP_NOT_USED: usize = 4; // 4 bytes - unused
pub const FSP_SIZE: usize = 8; // 4 bytes - tablespace size in pages
pub const FSP_FREE_LIMIT: usize = 12; // 4 bytes - minimum page not yet initialized
pub const FSP_SPACE_FLAGS: usize = 16; // 4 bytes - flags
pub const FSP_FRAG_N_USED: usize = 20; // 4 bytes - used pages in FSP_FREE_FRAG list
pub const FSP_FREE: usize = 24; // 16 bytes - list of free extents
pub const FSP_FREE_FRAG: usize = 40; // 16 bytes - partially-used fragment extents
pub const FSP_FULL_FRAG: usize = 56; // 16 bytes - full fragment extents
pub const FSP_SEG_ID: usize = 72; // 8 bytes - first unused segment id
pub const FSP_SEG_INODES_FULL: usize = 80; // 16 bytes - inode pages with no free slot
pub const FSP_SEG_INODES_FREE: usize = 96; // 16 bytes - inode pages with free slots

// FSP flags bit positions for page size detection
pub const FSP_FLAGS_POS_PAGE_SSIZE: u32 = 6;
pub const FSP_FLAGS_MASK_PAGE_SSIZE: u32 = 0xF << FSP_FLAGS_POS_PAGE_SSIZE;

// Extent descriptors (XDES)
/// Pages per extent.
pub const PAGES_PER_EXTENT: usize = 64;
/// XDES entries carried by each descriptor page (FSP_HDR or XDES).
pub const XDES_PER_PAGE: usize = 64;
/// Pages whose descriptors live on one descriptor page.
pub const PAGES_PER_XDES_PAGE: u64 = (PAGES_PER_EXTENT * XDES_PER_PAGE) as u64;
/// First XDES entry, immediately after the FSP header area.
pub const XDES_ARRAY_OFFSET: usize = FIL_PAGE_DATA + FSP_HEADER_SIZE; // 150
pub const XDES_ENTRY_SIZE: usize = 40;
pub const XDES_ID: usize = 0; // 8 bytes - owning fseg id (0 = none)
pub const XDES_FLST_NODE: usize = 8; // 12 bytes - list node
pub const XDES_STATE: usize = 20; // 4 bytes - extent state
pub const XDES_BITMAP: usize = 24; // 16 bytes - 2 bits per page
pub const XDES_BITMAP_SIZE: usize = 16;
/// Low bit of each 2-bit bitmap pair: page is free.
pub const XDES_BIT_FREE: u8 = 1;
/// High bit of each 2-bit bitmap pair: page is clean.
pub const XDES_BIT_CLEAN: u8 = 2;

// FSEG inode pages
/// List node linking inode pages, at FIL_PAGE_DATA.
pub const INODE_FLST_NODE_OFFSET: usize = FIL_PAGE_DATA;
/// First inode entry, after the page list node.
pub const INODE_ARRAY_OFFSET: usize = FIL_PAGE_DATA + FLST_NODE_SIZE; // 50
pub const INODE_ENTRY_SIZE: usize = 192;
pub const FSEG_ID: usize = 0; // 8 bytes
pub const FSEG_NOT_FULL_N_USED: usize = 8; // 4 bytes
pub const FSEG_FREE: usize = 12; // 16 bytes
pub const FSEG_NOT_FULL: usize = 28; // 16 bytes
pub const FSEG_FULL: usize = 44; // 16 bytes
pub const FSEG_MAGIC: usize = 60; // 4 bytes
pub const FSEG_FRAG_ARR: usize = 64; // 32 * 4 bytes
pub const FSEG_FRAG_SLOTS: usize = 32;
pub const FSEG_MAGIC_VALUE: u32 = 97_937_874;

// Index page header (at FIL_PAGE_DATA on INDEX pages)
pub const PAGE_N_DIR_SLOTS: usize = 0; // 2 bytes
pub const PAGE_HEAP_TOP: usize = 2; // 2 bytes
pub const PAGE_N_HEAP: usize = 4; // 2 bytes (bit 15 = compact flag)
pub const PAGE_FREE: usize = 6; // 2 bytes
pub const PAGE_GARBAGE: usize = 8; // 2 bytes
pub const PAGE_LAST_INSERT: usize = 10; // 2 bytes
pub const PAGE_DIRECTION: usize = 12; // 2 bytes
pub const PAGE_N_DIRECTION: usize = 14; // 2 bytes
pub const PAGE_N_RECS: usize = 16; // 2 bytes
pub const PAGE_MAX_TRX_ID: usize = 18; // 8 bytes
pub const PAGE_LEVEL: usize = 26; // 2 bytes (0 = leaf)
pub const PAGE_INDEX_ID: usize = 28; // 8 bytes
pub const INDEX_HEADER_SIZE: usize = 36;
/// Inline leaf segment pointer (root pages only).
pub const PAGE_BTR_SEG_LEAF: usize = FIL_PAGE_DATA + INDEX_HEADER_SIZE; // 74
/// Inline internal segment pointer (root pages only).
pub const PAGE_BTR_SEG_TOP: usize = PAGE_BTR_SEG_LEAF + FSEG_POINTER_SIZE; // 84

// Inline file segment pointer: space(4) + page(4) + offset(2)
pub const FSEG_POINTER_SIZE: usize = 10;

// Compact records
pub const REC_EXTRA_BYTES: usize = 5;
/// First byte past the index header and the two inline segment pointers.
pub const PAGE_RECORD_AREA: usize = PAGE_BTR_SEG_TOP + FSEG_POINTER_SIZE; // 94
/// Origin of the infimum system record on compact pages.
pub const PAGE_INFIMUM: usize = PAGE_RECORD_AREA + REC_EXTRA_BYTES; // 99
/// Origin of the supremum system record on compact pages.
pub const PAGE_SUPREMUM: usize = PAGE_INFIMUM + 8 + REC_EXTRA_BYTES; // 112
/// First heap byte available to user records.
pub const PAGE_SUPREMUM_END: usize = PAGE_SUPREMUM + 8; // 120
/// Page directory slot width.
pub const PAGE_DIR_SLOT_SIZE: usize = 2;

// Insert direction values
pub const PAGE_LEFT: u16 = 1;
pub const PAGE_RIGHT: u16 = 2;
pub const PAGE_SAME_REC: u16 = 3;
pub const PAGE_SAME_PAGE: u16 = 4;
pub const PAGE_NO_DIRECTION: u16 = 5;

// Transaction system page (page 5 of the system space)
pub const TRX_SYS_PAGE_NO: u64 = 5;
pub const TRX_SYS: usize = FIL_PAGE_DATA;
pub const TRX_SYS_TRX_ID_STORE: usize = 0; // 8 bytes - max assigned trx id
pub const TRX_SYS_FSEG_HEADER: usize = 8; // 10 bytes
pub const TRX_SYS_RSEGS: usize = 18; // 128 * 8 bytes
pub const TRX_SYS_N_RSEGS: usize = 128;
pub const TRX_SYS_RSEG_SLOT_SIZE: usize = 8; // space(4) + page(4)
/// Doublewrite info lives this many bytes before the end of the page.
pub const TRX_SYS_DOUBLEWRITE_FROM_END: usize = 200;
pub const TRX_SYS_DOUBLEWRITE_FSEG: usize = 0; // 10 bytes
pub const TRX_SYS_DOUBLEWRITE_MAGIC: usize = 10; // 4 bytes
pub const TRX_SYS_DOUBLEWRITE_BLOCK1: usize = 14; // 4 bytes
pub const TRX_SYS_DOUBLEWRITE_BLOCK2: usize = 18; // 4 bytes
pub const TRX_SYS_DOUBLEWRITE_MAGIC_VALUE: u32 = 536_853_855;

// Data dictionary header (page 7 of the system space)
pub const DICT_HDR_PAGE_NO: u64 = 7;
pub const DICT_HDR: usize = FIL_PAGE_DATA;
pub const DICT_HDR_ROW_ID: usize = 0; // 8 bytes
pub const DICT_HDR_TABLE_ID: usize = 8; // 8 bytes
pub const DICT_HDR_INDEX_ID: usize = 16; // 8 bytes
pub const DICT_HDR_MAX_SPACE_ID: usize = 24; // 4 bytes
pub const DICT_HDR_MIX_ID_LOW: usize = 28; // 4 bytes
pub const DICT_HDR_TABLES: usize = 32; // 4 bytes - SYS_TABLES clustered root
pub const DICT_HDR_TABLE_IDS: usize = 36; // 4 bytes - SYS_TABLE_IDS root
pub const DICT_HDR_COLUMNS: usize = 40; // 4 bytes - SYS_COLUMNS root
pub const DICT_HDR_INDEXES: usize = 44; // 4 bytes - SYS_INDEXES root
pub const DICT_HDR_FIELDS: usize = 48; // 4 bytes - SYS_FIELDS root

// Checksum constants (ut0rnd.h)
pub const UT_HASH_RANDOM_MASK: u32 = 1_463_735_687;
pub const UT_HASH_RANDOM_MASK2: u32 = 1_653_893_711;
pub const BUF_NO_CHECKSUM_MAGIC: u32 = 0xDEADBEEF;

// Redo log (log0log.h)
pub const LOG_BLOCK_SIZE: usize = 512;
pub const LOG_BLOCK_HDR_SIZE: usize = 12;
pub const LOG_BLOCK_TRL_SIZE: usize = 4;
pub const LOG_BLOCK_CHECKSUM_OFFSET: usize = LOG_BLOCK_SIZE - LOG_BLOCK_TRL_SIZE; // 508
pub const LOG_BLOCK_FLUSH_BIT_MASK: u32 = 0x8000_0000;
/// Reserved header + checkpoint blocks at the start of a log file.
pub const LOG_FILE_HDR_BLOCKS: u64 = 4;
pub const LOG_HEADER_GROUP_ID: usize = 0; // 4 bytes
pub const LOG_HEADER_START_LSN: usize = 4; // 8 bytes
pub const LOG_HEADER_CREATED_BY: usize = 16; // 32 bytes
pub const LOG_HEADER_CREATED_BY_LEN: usize = 32;
pub const LOG_CHECKPOINT_NO: usize = 0; // 8 bytes
pub const LOG_CHECKPOINT_LSN: usize = 8; // 8 bytes
/// Bit masking out the single-record flag on a log record type byte.
pub const MLOG_SINGLE_REC_FLAG: u8 = 0x80;
