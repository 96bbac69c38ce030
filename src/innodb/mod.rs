//! InnoDB on-disk format parsing.
//!
//! Read-only decoding of the physical structures InnoDB writes to tablespace
//! files (`.ibd` / `ibdata*`) and redo logs: FIL-framed pages, the file-space
//! header and extent descriptors, file-segment inodes, B+Tree index pages and
//! compact-format records, and 512-byte redo log blocks.
//!
//! Start with [`space::Space`] to open a tablespace, then navigate through
//! typed page views ([`page::PageView`]) or B-trees ([`btree::Btree`]).
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`space`] | File-scoped API: page reads, size autodetection, enumeration, accounting |
//! | [`page`] | FIL header/trailer framing and the typed page factory |
//! | [`page_types`] | Page type enum mapping `u16` codes to names |
//! | [`cursor`] | Positioned big-endian reader with compressed-integer support |
//! | [`checksum`] | CRC-32C and legacy InnoDB page checksums |
//! | [`list`] | Doubly linked lists embedded in pages (base nodes, nodes, walkers) |
//! | [`fsp`] | File-space header and extent descriptors (XDES) |
//! | [`inode`] | File-segment inode pages and FSEG entries |
//! | [`index`] | INDEX page internals: header, directory, record chain |
//! | [`record`] | Compact record decoding against a caller-supplied describer |
//! | [`btree`] | Recursive B-tree traversal and per-level walks |
//! | [`dict`] | Transaction system page and data-dictionary bootstrap indexes |
//! | [`log`] | Redo log blocks and first-record previews |
//! | [`constants`] | Byte offsets from the MySQL source headers |

pub mod btree;
pub mod checksum;
pub mod constants;
pub mod cursor;
pub mod dict;
pub mod fsp;
pub mod index;
pub mod inode;
pub mod list;
pub mod log;
pub mod page;
pub mod page_types;
pub mod record;
pub mod space;
