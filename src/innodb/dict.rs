//! System-tablespace fixed pages and the bootstrap data dictionary.
//!
//! The system space reserves page 5 for the transaction system header
//! ([`TrxSysPage`]: rollback segment slots and the doublewrite buffer
//! pointers) and page 7 for the data-dictionary header ([`DictHeader`]),
//! which records the root pages of the dictionary's own indexes. Those
//! indexes have schemas fixed by the server since the beginning, so this
//! module bundles describers for the four that matter when attributing pages:
//! SYS_TABLES, SYS_COLUMNS, SYS_INDEXES, SYS_FIELDS.

use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::cursor::Cursor;
use crate::innodb::index::FsegPointer;
use crate::innodb::page::Page;
use crate::innodb::page_types::PageType;
use crate::innodb::record::{Column, ColumnType, RecordDescriber};
use crate::{InnoError, Result};

/// One rollback segment slot: where the segment's header page lives.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RsegSlot {
    pub space_id: u32,
    pub page_number: u32,
}

/// Doublewrite buffer bookkeeping at the tail of the TRX_SYS page.
#[derive(Debug, Clone, Serialize)]
pub struct Doublewrite {
    pub fseg: FsegPointer,
    /// Magic marker; valid when it equals the creation constant.
    pub magic: u32,
    /// First page of the first doublewrite block.
    pub block1: u32,
    /// First page of the second doublewrite block.
    pub block2: u32,
}

impl Doublewrite {
    pub fn created(&self) -> bool {
        self.magic == TRX_SYS_DOUBLEWRITE_MAGIC_VALUE
    }
}

/// Parsed transaction system header (page 5 of the system space).
#[derive(Debug, Clone, Serialize)]
pub struct TrxSysHeader {
    /// Highest assigned transaction id, rounded up.
    pub trx_id: u64,
    pub fseg: FsegPointer,
    /// 128 rollback segment slots; unused slots are `None`.
    pub rsegs: Vec<Option<RsegSlot>>,
    pub doublewrite: Doublewrite,
}

/// Typed view of the TRX_SYS page.
pub struct TrxSysPage<'a> {
    #[allow(dead_code)]
    page: &'a Page,
    header: TrxSysHeader,
}

impl<'a> TrxSysPage<'a> {
    pub fn new(page: &'a Page) -> Result<Self> {
        if page.fil().page_type != PageType::TrxSys {
            return Err(InnoError::Corrupt(format!(
                "page {} is {} not TRX_SYS",
                page.number(),
                page.fil().page_type
            )));
        }
        let data = page.data();
        let mut c = Cursor::new(data, TRX_SYS);
        let header = c.name("trx_sys", |c| {
            let trx_id = c.name("trx_id", |c| c.read_u64())?;
            let fseg = c.name("fseg", FsegPointer::read)?;
            let rsegs = c.name("rsegs", |c| {
                let mut slots = Vec::with_capacity(TRX_SYS_N_RSEGS);
                for _ in 0..TRX_SYS_N_RSEGS {
                    let space_id = c.read_u32()?;
                    let page_number = c.read_u32()?;
                    slots.push((page_number != FIL_NULL).then_some(RsegSlot {
                        space_id,
                        page_number,
                    }));
                }
                Ok(slots)
            })?;
            let mut dw = Cursor::new(data, data.len() - TRX_SYS_DOUBLEWRITE_FROM_END);
            let doublewrite = dw.name("doublewrite", |c| {
                Ok(Doublewrite {
                    fseg: c.name("fseg", FsegPointer::read)?,
                    magic: c.name("magic", |c| c.read_u32())?,
                    block1: c.name("block1", |c| c.read_u32())?,
                    block2: c.name("block2", |c| c.read_u32())?,
                })
            })?;
            Ok(TrxSysHeader {
                trx_id,
                fseg,
                rsegs,
                doublewrite,
            })
        })?;
        Ok(TrxSysPage { page, header })
    }

    pub fn header(&self) -> &TrxSysHeader {
        &self.header
    }

    /// Occupied rollback segment slots as `(slot_index, slot)`.
    pub fn used_rsegs(&self) -> impl Iterator<Item = (usize, RsegSlot)> + '_ {
        self.header
            .rsegs
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
    }
}

/// Parsed data-dictionary header (page 7 of the system space).
#[derive(Debug, Clone, Serialize)]
pub struct DictHeader {
    /// Highest assigned row id, rounded up.
    pub max_row_id: u64,
    pub max_table_id: u64,
    pub max_index_id: u64,
    pub max_space_id: u32,
    /// Root page of the SYS_TABLES clustered index.
    pub sys_tables_root: u32,
    /// Root page of the SYS_TABLE_IDS secondary index.
    pub sys_table_ids_root: u32,
    /// Root page of the SYS_COLUMNS clustered index.
    pub sys_columns_root: u32,
    /// Root page of the SYS_INDEXES clustered index.
    pub sys_indexes_root: u32,
    /// Root page of the SYS_FIELDS clustered index.
    pub sys_fields_root: u32,
}

impl DictHeader {
    /// Decode the dictionary header from the full page-7 buffer.
    pub fn parse(page_data: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(page_data, DICT_HDR);
        c.name("dict", |c| {
            let max_row_id = c.name("row_id", |c| c.read_u64())?;
            let max_table_id = c.name("table_id", |c| c.read_u64())?;
            let max_index_id = c.name("index_id", |c| c.read_u64())?;
            let max_space_id = c.name("max_space_id", |c| c.read_u32())?;
            c.adjust(4)?; // mix id, unused
            Ok(DictHeader {
                max_row_id,
                max_table_id,
                max_index_id,
                max_space_id,
                sys_tables_root: c.name("tables", |c| c.read_u32())?,
                sys_table_ids_root: c.name("table_ids", |c| c.read_u32())?,
                sys_columns_root: c.name("columns", |c| c.read_u32())?,
                sys_indexes_root: c.name("indexes", |c| c.read_u32())?,
                sys_fields_root: c.name("fields", |c| c.read_u32())?,
            })
        })
    }

    /// The bootstrap indexes with built-in describers, as
    /// `(name, root_page)`.
    pub fn bootstrap_indexes(&self) -> [(&'static str, u32); 4] {
        [
            ("SYS_TABLES", self.sys_tables_root),
            ("SYS_COLUMNS", self.sys_columns_root),
            ("SYS_INDEXES", self.sys_indexes_root),
            ("SYS_FIELDS", self.sys_fields_root),
        ]
    }
}

fn unsigned(bits: u16) -> ColumnType {
    ColumnType::Int {
        bits,
        unsigned: true,
    }
}

/// The hidden transaction system columns carried by every clustered leaf
/// record, in storage order.
fn system_columns() -> Vec<Column> {
    vec![
        Column::new("DB_TRX_ID", unsigned(48), false),
        Column::new("DB_ROLL_PTR", unsigned(56), false),
    ]
}

/// Describer for the SYS_TABLES clustered index.
pub struct SysTablesDescriber;

impl RecordDescriber for SysTablesDescriber {
    fn key_columns(&self) -> Vec<Column> {
        vec![Column::new(
            "NAME",
            ColumnType::Varchar { max_length: 100 },
            false,
        )]
    }

    fn row_columns(&self) -> Vec<Column> {
        let mut cols = system_columns();
        cols.extend([
            Column::new("ID", unsigned(64), false),
            Column::new("N_COLS", unsigned(32), false),
            Column::new("TYPE", unsigned(32), false),
            Column::new("MIX_ID", unsigned(64), false),
            Column::new("MIX_LEN", unsigned(32), false),
            Column::new(
                "CLUSTER_NAME",
                ColumnType::Varchar { max_length: 100 },
                true,
            ),
            Column::new("SPACE", unsigned(32), false),
        ]);
        cols
    }
}

/// Describer for the SYS_COLUMNS clustered index.
pub struct SysColumnsDescriber;

impl RecordDescriber for SysColumnsDescriber {
    fn key_columns(&self) -> Vec<Column> {
        vec![
            Column::new("TABLE_ID", unsigned(64), false),
            Column::new("POS", unsigned(32), false),
        ]
    }

    fn row_columns(&self) -> Vec<Column> {
        let mut cols = system_columns();
        cols.extend([
            Column::new("NAME", ColumnType::Varchar { max_length: 100 }, false),
            Column::new("MTYPE", unsigned(32), false),
            Column::new("PRTYPE", unsigned(32), false),
            Column::new("LEN", unsigned(32), false),
            Column::new("PREC", unsigned(32), false),
        ]);
        cols
    }
}

/// Describer for the SYS_INDEXES clustered index.
pub struct SysIndexesDescriber;

impl RecordDescriber for SysIndexesDescriber {
    fn key_columns(&self) -> Vec<Column> {
        vec![
            Column::new("TABLE_ID", unsigned(64), false),
            Column::new("ID", unsigned(64), false),
        ]
    }

    fn row_columns(&self) -> Vec<Column> {
        let mut cols = system_columns();
        cols.extend([
            Column::new("NAME", ColumnType::Varchar { max_length: 100 }, false),
            Column::new("N_FIELDS", unsigned(32), false),
            Column::new("TYPE", unsigned(32), false),
            Column::new("SPACE", unsigned(32), false),
            Column::new("PAGE_NO", unsigned(32), false),
        ]);
        cols
    }
}

/// Describer for the SYS_FIELDS clustered index.
pub struct SysFieldsDescriber;

impl RecordDescriber for SysFieldsDescriber {
    fn key_columns(&self) -> Vec<Column> {
        vec![
            Column::new("INDEX_ID", unsigned(64), false),
            Column::new("POS", unsigned(32), false),
        ]
    }

    fn row_columns(&self) -> Vec<Column> {
        let mut cols = system_columns();
        cols.push(Column::new(
            "COL_NAME",
            ColumnType::Varchar { max_length: 100 },
            false,
        ));
        cols
    }
}

/// Look up the built-in describer for a bootstrap index by name.
pub fn describer_for(name: &str) -> Option<Box<dyn RecordDescriber>> {
    match name {
        "SYS_TABLES" => Some(Box::new(SysTablesDescriber)),
        "SYS_COLUMNS" => Some(Box::new(SysColumnsDescriber)),
        "SYS_INDEXES" => Some(Box::new(SysIndexesDescriber)),
        "SYS_FIELDS" => Some(Box::new(SysFieldsDescriber)),
        _ => None,
    }
}
