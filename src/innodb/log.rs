//! Redo log files.
//!
//! A redo log file is a sequence of 512-byte blocks. The first four blocks
//! are reserved: block 0 is the file header ([`LogFileHeader`]) and blocks 1
//! and 3 hold the two checkpoint slots ([`LogCheckpoint`]). Every following
//! data block carries a 12-byte header ([`LogBlockHeader`]), up to 496 bytes
//! of log record data, and a 4-byte checksum trailer. By convention data
//! blocks are numbered from 1 at the file's logical start, after the header
//! blocks.
//!
//! Log records themselves are a dense stream that crosses block boundaries;
//! this module decodes only the head of the first record *group* starting in
//! each block — its type and the (space, page) it applies to — which is
//! enough to scan a log for activity against a given page.

use serde::Serialize;
use std::fs::File;
use std::io::{Cursor as IoCursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::innodb::constants::*;
use crate::innodb::cursor::Cursor;
use crate::{InnoError, Result};

/// Supertrait combining `Read + Seek` for type-erased readers.
trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Log record types, from the mtr0mtr.h taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MlogType {
    OneByte,
    TwoBytes,
    FourBytes,
    EightBytes,
    RecInsert,
    RecClustDeleteMark,
    RecSecDeleteMark,
    RecUpdateInPlace,
    RecDelete,
    ListEndDelete,
    ListStartDelete,
    ListEndCopyCreated,
    PageReorganize,
    PageCreate,
    UndoInsert,
    UndoEraseEnd,
    UndoInit,
    UndoHdrDiscard,
    UndoHdrReuse,
    UndoHdrCreate,
    RecMinMark,
    IbufBitmapInit,
    InitFilePage,
    WriteString,
    MultiRecEnd,
    DummyRecord,
    FileCreate,
    FileRename,
    FileDelete,
    CompRecMinMark,
    CompPageCreate,
    CompRecInsert,
    CompRecClustDeleteMark,
    CompRecSecDeleteMark,
    CompRecUpdateInPlace,
    CompRecDelete,
    CompListEndDelete,
    CompListStartDelete,
    CompListEndCopyCreated,
    CompPageReorganize,
    FileCreate2,
    ZipWriteNodePtr,
    ZipWriteBlobPtr,
    ZipWriteHeader,
    ZipPageCompress,
    Unknown(u8),
}

impl MlogType {
    /// Map a type code (single-record flag already masked) to a type.
    pub fn from_u8(code: u8) -> Self {
        use MlogType::*;
        match code {
            1 => OneByte,
            2 => TwoBytes,
            4 => FourBytes,
            8 => EightBytes,
            9 => RecInsert,
            10 => RecClustDeleteMark,
            11 => RecSecDeleteMark,
            13 => RecUpdateInPlace,
            14 => RecDelete,
            15 => ListEndDelete,
            16 => ListStartDelete,
            17 => ListEndCopyCreated,
            18 => PageReorganize,
            19 => PageCreate,
            20 => UndoInsert,
            21 => UndoEraseEnd,
            22 => UndoInit,
            23 => UndoHdrDiscard,
            24 => UndoHdrReuse,
            25 => UndoHdrCreate,
            26 => RecMinMark,
            27 => IbufBitmapInit,
            29 => InitFilePage,
            30 => WriteString,
            31 => MultiRecEnd,
            32 => DummyRecord,
            33 => FileCreate,
            34 => FileRename,
            35 => FileDelete,
            36 => CompRecMinMark,
            37 => CompPageCreate,
            38 => CompRecInsert,
            39 => CompRecClustDeleteMark,
            40 => CompRecSecDeleteMark,
            41 => CompRecUpdateInPlace,
            42 => CompRecDelete,
            43 => CompListEndDelete,
            44 => CompListStartDelete,
            45 => CompListEndCopyCreated,
            46 => CompPageReorganize,
            47 => FileCreate2,
            48 => ZipWriteNodePtr,
            49 => ZipWriteBlobPtr,
            50 => ZipWriteHeader,
            51 => ZipPageCompress,
            other => Unknown(other),
        }
    }

    /// Does this record type carry no (space, page) payload?
    pub fn is_marker(self) -> bool {
        matches!(self, MlogType::MultiRecEnd | MlogType::DummyRecord)
    }

    /// The MLOG_* name used in the MySQL source.
    pub fn name(self) -> &'static str {
        use MlogType::*;
        match self {
            OneByte => "MLOG_1BYTE",
            TwoBytes => "MLOG_2BYTES",
            FourBytes => "MLOG_4BYTES",
            EightBytes => "MLOG_8BYTES",
            RecInsert => "MLOG_REC_INSERT",
            RecClustDeleteMark => "MLOG_REC_CLUST_DELETE_MARK",
            RecSecDeleteMark => "MLOG_REC_SEC_DELETE_MARK",
            RecUpdateInPlace => "MLOG_REC_UPDATE_IN_PLACE",
            RecDelete => "MLOG_REC_DELETE",
            ListEndDelete => "MLOG_LIST_END_DELETE",
            ListStartDelete => "MLOG_LIST_START_DELETE",
            ListEndCopyCreated => "MLOG_LIST_END_COPY_CREATED",
            PageReorganize => "MLOG_PAGE_REORGANIZE",
            PageCreate => "MLOG_PAGE_CREATE",
            UndoInsert => "MLOG_UNDO_INSERT",
            UndoEraseEnd => "MLOG_UNDO_ERASE_END",
            UndoInit => "MLOG_UNDO_INIT",
            UndoHdrDiscard => "MLOG_UNDO_HDR_DISCARD",
            UndoHdrReuse => "MLOG_UNDO_HDR_REUSE",
            UndoHdrCreate => "MLOG_UNDO_HDR_CREATE",
            RecMinMark => "MLOG_REC_MIN_MARK",
            IbufBitmapInit => "MLOG_IBUF_BITMAP_INIT",
            InitFilePage => "MLOG_INIT_FILE_PAGE",
            WriteString => "MLOG_WRITE_STRING",
            MultiRecEnd => "MLOG_MULTI_REC_END",
            DummyRecord => "MLOG_DUMMY_RECORD",
            FileCreate => "MLOG_FILE_CREATE",
            FileRename => "MLOG_FILE_RENAME",
            FileDelete => "MLOG_FILE_DELETE",
            CompRecMinMark => "MLOG_COMP_REC_MIN_MARK",
            CompPageCreate => "MLOG_COMP_PAGE_CREATE",
            CompRecInsert => "MLOG_COMP_REC_INSERT",
            CompRecClustDeleteMark => "MLOG_COMP_REC_CLUST_DELETE_MARK",
            CompRecSecDeleteMark => "MLOG_COMP_REC_SEC_DELETE_MARK",
            CompRecUpdateInPlace => "MLOG_COMP_REC_UPDATE_IN_PLACE",
            CompRecDelete => "MLOG_COMP_REC_DELETE",
            CompListEndDelete => "MLOG_COMP_LIST_END_DELETE",
            CompListStartDelete => "MLOG_COMP_LIST_START_DELETE",
            CompListEndCopyCreated => "MLOG_COMP_LIST_END_COPY_CREATED",
            CompPageReorganize => "MLOG_COMP_PAGE_REORGANIZE",
            FileCreate2 => "MLOG_FILE_CREATE2",
            ZipWriteNodePtr => "MLOG_ZIP_WRITE_NODE_PTR",
            ZipWriteBlobPtr => "MLOG_ZIP_WRITE_BLOB_PTR",
            ZipWriteHeader => "MLOG_ZIP_WRITE_HEADER",
            ZipPageCompress => "MLOG_ZIP_PAGE_COMPRESS",
            Unknown(_) => "MLOG_UNKNOWN",
        }
    }
}

/// Log file header (block 0).
#[derive(Debug, Clone, Serialize)]
pub struct LogFileHeader {
    /// Log group id (or format version in later formats).
    pub group_id: u32,
    /// LSN at which this file starts.
    pub start_lsn: u64,
    /// Creator string (e.g. the server version).
    pub created_by: String,
}

impl LogFileHeader {
    /// Parse the file header from a 512-byte block.
    pub fn parse(block: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(block, 0);
        c.name("log_header", |c| {
            let group_id = c.name("group_id", |c| c.read_u32())?;
            let start_lsn = c.name("start_lsn", |c| c.read_u64())?;
            c.seek(LOG_HEADER_CREATED_BY)?;
            let raw = c.read_bytes(LOG_HEADER_CREATED_BY_LEN)?;
            let created_by = raw
                .iter()
                .take_while(|&&b| b != 0)
                .map(|&b| b as char)
                .collect();
            Ok(LogFileHeader {
                group_id,
                start_lsn,
                created_by,
            })
        })
    }
}

/// Checkpoint record (blocks 1 and 3).
#[derive(Debug, Clone, Serialize)]
pub struct LogCheckpoint {
    /// Checkpoint sequence number.
    pub number: u64,
    /// LSN at the time of the checkpoint.
    pub lsn: u64,
}

impl LogCheckpoint {
    /// Parse a checkpoint from a 512-byte block.
    pub fn parse(block: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(block, 0);
        c.name("checkpoint", |c| {
            Ok(LogCheckpoint {
                number: c.name("number", |c| c.read_u64())?,
                lsn: c.name("lsn", |c| c.read_u64())?,
            })
        })
    }
}

/// Log block header (first 12 bytes of each block).
#[derive(Debug, Clone, Serialize)]
pub struct LogBlockHeader {
    /// Block number with the flush bit masked out.
    pub block_number: u32,
    /// Was this block the first of a flush batch (bit 31)?
    pub flush_flag: bool,
    /// Bytes of log data in the block, header included; 12 means empty.
    pub data_length: u16,
    /// Offset of the first record group starting in this block; 0 if none.
    pub first_rec_group: u16,
    /// Checkpoint number at write time.
    pub checkpoint_no: u32,
}

impl LogBlockHeader {
    /// Parse a block header.
    pub fn parse(block: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(block, 0);
        c.name("block", |c| {
            let raw = c.name("number", |c| c.read_u32())?;
            Ok(LogBlockHeader {
                block_number: raw & !LOG_BLOCK_FLUSH_BIT_MASK,
                flush_flag: raw & LOG_BLOCK_FLUSH_BIT_MASK != 0,
                data_length: c.name("data_length", |c| c.read_u16())?,
                first_rec_group: c.name("first_rec_group", |c| c.read_u16())?,
                checkpoint_no: c.name("checkpoint_no", |c| c.read_u32())?,
            })
        })
    }

    /// Does the block hold any record bytes?
    pub fn has_data(&self) -> bool {
        self.data_length as usize > LOG_BLOCK_HDR_SIZE
    }
}

/// Log block trailer (last 4 bytes).
#[derive(Debug, Clone, Serialize)]
pub struct LogBlockTrailer {
    pub checksum: u32,
}

/// Validate a block's stored checksum (CRC-32C over bytes 0..508).
pub fn block_checksum_ok(block: &[u8]) -> bool {
    if block.len() < LOG_BLOCK_SIZE {
        return false;
    }
    let mut c = Cursor::new(block, LOG_BLOCK_CHECKSUM_OFFSET);
    match c.read_u32() {
        Ok(stored) => stored == crc32c::crc32c(&block[..LOG_BLOCK_CHECKSUM_OFFSET]),
        Err(_) => false,
    }
}

/// The head of the first record group in a block: what it is and which page
/// it touches.
#[derive(Debug, Clone, Serialize)]
pub struct RecordPreview {
    pub record_type: MlogType,
    /// Space id; absent on marker records.
    pub space: Option<u32>,
    /// Page number; absent on marker records.
    pub page_number: Option<u32>,
}

impl RecordPreview {
    /// Decode the record group head at `offset` within a block.
    ///
    /// The type byte's high bit (the single-record flag) is masked off; the
    /// space id and page number follow as compressed integers.
    pub fn parse(block: &[u8], offset: u16) -> Result<Self> {
        let mut c = Cursor::new(block, offset as usize);
        c.name("record", |c| {
            let type_byte = c.name("type", |c| c.read_u8())?;
            let record_type = MlogType::from_u8(type_byte & !MLOG_SINGLE_REC_FLAG);
            if record_type.is_marker() {
                return Ok(RecordPreview {
                    record_type,
                    space: None,
                    page_number: None,
                });
            }
            Ok(RecordPreview {
                record_type,
                space: Some(c.name("space", |c| c.read_ic_u32())?),
                page_number: Some(c.name("page_number", |c| c.read_ic_u32())?),
            })
        })
    }
}

/// One decoded data block.
#[derive(Debug, Clone, Serialize)]
pub struct LogBlock {
    /// Data block number, counting from 1 after the file header blocks.
    pub block_number: u64,
    pub header: LogBlockHeader,
    pub trailer: LogBlockTrailer,
    pub checksum_valid: bool,
    /// First record group of the block, when one starts here.
    pub record: Option<RecordPreview>,
}

/// An open redo log file.
pub struct LogFile {
    reader: Box<dyn ReadSeek>,
    file_size: u64,
}

impl LogFile {
    /// Open a redo log file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| InnoError::Io(format!("cannot open {}: {}", path.display(), e)))?;
        let file_size = file
            .metadata()
            .map_err(|e| InnoError::Io(format!("cannot stat {}: {}", path.display(), e)))?
            .len();
        Self::validate_size(file_size)?;
        Ok(LogFile {
            reader: Box::new(file),
            file_size,
        })
    }

    /// Wrap an in-memory log image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let file_size = data.len() as u64;
        Self::validate_size(file_size)?;
        Ok(LogFile {
            reader: Box::new(IoCursor::new(data)),
            file_size,
        })
    }

    fn validate_size(file_size: u64) -> Result<()> {
        if file_size < LOG_FILE_HDR_BLOCKS * LOG_BLOCK_SIZE as u64 {
            return Err(InnoError::Corrupt(format!(
                "log file of {} bytes is smaller than its {}-block header",
                file_size, LOG_FILE_HDR_BLOCKS
            )));
        }
        if file_size % LOG_BLOCK_SIZE as u64 != 0 {
            return Err(InnoError::Corrupt(format!(
                "log file size {} is not a multiple of the block size",
                file_size
            )));
        }
        Ok(())
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Total 512-byte blocks, header blocks included.
    pub fn block_count(&self) -> u64 {
        self.file_size / LOG_BLOCK_SIZE as u64
    }

    /// Data blocks after the file header.
    pub fn data_block_count(&self) -> u64 {
        self.block_count().saturating_sub(LOG_FILE_HDR_BLOCKS)
    }

    /// Read raw block `block_no` (0-based from the file start).
    pub fn read_block(&mut self, block_no: u64) -> Result<Vec<u8>> {
        if block_no >= self.block_count() {
            return Err(InnoError::Usage(format!(
                "block {} out of range ({} blocks)",
                block_no,
                self.block_count()
            )));
        }
        let offset = block_no * LOG_BLOCK_SIZE as u64;
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| InnoError::Io(format!("cannot seek to block {}: {}", block_no, e)))?;
        let mut buf = vec![0u8; LOG_BLOCK_SIZE];
        self.reader
            .read_exact(&mut buf)
            .map_err(|e| InnoError::Io(format!("cannot read block {}: {}", block_no, e)))?;
        Ok(buf)
    }

    /// Read and parse the file header (block 0).
    pub fn read_header(&mut self) -> Result<LogFileHeader> {
        let block = self.read_block(0)?;
        LogFileHeader::parse(&block)
    }

    /// Read and parse checkpoint slot 0 (block 1) or 1 (block 3).
    pub fn read_checkpoint(&mut self, slot: u8) -> Result<LogCheckpoint> {
        let block_no = match slot {
            0 => 1,
            1 => 3,
            other => {
                return Err(InnoError::Usage(format!(
                    "checkpoint slot {} (must be 0 or 1)",
                    other
                )))
            }
        };
        let block = self.read_block(block_no)?;
        LogCheckpoint::parse(&block)
    }

    /// Decode one data block, `block_number` counting from 1 past the file
    /// header.
    pub fn data_block(&mut self, block_number: u64) -> Result<LogBlock> {
        if block_number == 0 || block_number > self.data_block_count() {
            return Err(InnoError::Usage(format!(
                "data block {} out of range (1..={})",
                block_number,
                self.data_block_count()
            )));
        }
        let raw = self.read_block(LOG_FILE_HDR_BLOCKS + block_number - 1)?;
        let header = LogBlockHeader::parse(&raw)?;
        let mut c = Cursor::new(&raw, LOG_BLOCK_CHECKSUM_OFFSET);
        let trailer = LogBlockTrailer {
            checksum: c.read_u32()?,
        };
        let record = if header.first_rec_group == 0
            || header.data_length as usize <= LOG_BLOCK_HDR_SIZE
        {
            None
        } else if (header.first_rec_group as usize) < LOG_BLOCK_HDR_SIZE
            || header.first_rec_group as usize >= LOG_BLOCK_CHECKSUM_OFFSET
        {
            return Err(InnoError::Corrupt(format!(
                "block {} puts its first record group at {}",
                block_number, header.first_rec_group
            )));
        } else {
            Some(RecordPreview::parse(&raw, header.first_rec_group)?)
        };
        Ok(LogBlock {
            block_number,
            checksum_valid: block_checksum_ok(&raw),
            header,
            trailer,
            record,
        })
    }

    /// Iterate every data block in file order.
    pub fn each_block(&mut self) -> BlockIter<'_> {
        BlockIter {
            log: self,
            next: 1,
        }
    }
}

/// Iterator over a log file's data blocks.
pub struct BlockIter<'f> {
    log: &'f mut LogFile,
    next: u64,
}

impl<'f> Iterator for BlockIter<'f> {
    type Item = Result<LogBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.log.data_block_count() {
            return None;
        }
        let block = self.log.data_block(self.next);
        self.next += 1;
        Some(block)
    }
}
