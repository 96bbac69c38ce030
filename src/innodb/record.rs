//! Compact-format record decoding.
//!
//! A compact record is laid out around its *origin*, the first byte of column
//! data. Immediately before the origin sits a 5-byte bit-packed header
//! ([`RecordHeader`]); before that, growing toward lower addresses, a NULL
//! bitmap (one bit per nullable column) and a length vector (one or two bytes
//! per variable-length non-NULL column). InnoDB stores no column types on the
//! page, so decoding needs a caller-supplied [`RecordDescriber`].
//!
//! Integer columns are big-endian with the sign bit XOR'd on disk so that
//! memcmp order equals numeric order; byte-string columns are raw bytes.
//! Node-pointer records carry their child page number in the four bytes after
//! the key columns.

use serde::Serialize;
use std::fmt;

use crate::innodb::constants::*;
use crate::innodb::cursor::Cursor;
use crate::{InnoError, Result};

/// Record type from the low three bits of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    /// User record on a leaf page.
    Conventional,
    /// Key + child page number on an internal page.
    NodePointer,
    Infimum,
    Supremum,
    Unknown(u8),
}

impl RecordKind {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => RecordKind::Conventional,
            1 => RecordKind::NodePointer,
            2 => RecordKind::Infimum,
            3 => RecordKind::Supremum,
            other => RecordKind::Unknown(other),
        }
    }

    /// Is this one of the two sentinel records?
    pub fn is_system(self) -> bool {
        matches!(self, RecordKind::Infimum | RecordKind::Supremum)
    }
}

/// Parsed 5-byte record header.
///
/// Layout, bit-packed little-endian within each byte:
/// - byte 0: info flags (high nibble: bit 5 = delete-marked, bit 4 = min-rec)
///   and `n_owned` (low nibble)
/// - bytes 1-2 (big-endian u16): heap number (high 13 bits), type (low 3)
/// - bytes 3-4: signed relative offset of the next record's origin
#[derive(Debug, Clone, Serialize)]
pub struct RecordHeader {
    /// Info flags, 4 bits.
    pub info_flags: u8,
    /// Records owned through the page directory; 0 for non-owning records.
    pub n_owned: u8,
    /// Position in the page heap.
    pub heap_number: u16,
    pub kind: RecordKind,
    /// Relative offset from this record's origin to the next record's origin.
    pub next_offset: i16,
}

impl RecordHeader {
    /// Decode the header of the record whose origin is at `origin`.
    pub fn parse_before(page_data: &[u8], origin: usize) -> Result<Self> {
        if origin < REC_EXTRA_BYTES {
            return Err(InnoError::Corrupt(format!(
                "record origin {} leaves no room for a header",
                origin
            )));
        }
        let mut c = Cursor::new(page_data, origin - REC_EXTRA_BYTES);
        c.name("record", |c| {
            let byte0 = c.name("flags", |c| c.read_u8())?;
            let packed = c.name("heap_and_type", |c| c.read_u16())?;
            let next_offset = c.name("next", |c| c.read_i16())?;
            Ok(RecordHeader {
                info_flags: byte0 >> 4,
                n_owned: byte0 & 0x0F,
                heap_number: packed >> 3,
                kind: RecordKind::from_bits((packed & 0x07) as u8),
                next_offset,
            })
        })
    }

    /// Delete-marked flag (info bit 0).
    pub fn deleted(&self) -> bool {
        self.info_flags & 0x02 != 0
    }

    /// Minimum-record flag: leftmost node pointer of its level.
    pub fn min_rec(&self) -> bool {
        self.info_flags & 0x01 != 0
    }
}

/// Physical type of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    /// Fixed-width integer; `bits` in {8, 16, 24, 32, 48, 56, 64}.
    Int { bits: u16, unsigned: bool },
    /// Fixed-length character data.
    Char { length: u16 },
    /// Variable-length character data.
    Varchar { max_length: u16 },
    /// Fixed-length binary data.
    Binary { length: u16 },
    /// Variable-length binary data.
    Varbinary { max_length: u16 },
}

impl ColumnType {
    /// Does the column contribute to the length vector?
    pub fn is_variable(self) -> bool {
        matches!(self, ColumnType::Varchar { .. } | ColumnType::Varbinary { .. })
    }

    /// Stored size for fixed columns.
    pub fn fixed_size(self) -> Option<u16> {
        match self {
            ColumnType::Int { bits, .. } => Some(bits / 8),
            ColumnType::Char { length } => Some(length),
            ColumnType::Binary { length } => Some(length),
            _ => None,
        }
    }

    /// Largest number of bytes a value can occupy.
    pub fn max_size(self) -> u16 {
        match self {
            ColumnType::Varchar { max_length } => max_length,
            ColumnType::Varbinary { max_length } => max_length,
            other => other.fixed_size().unwrap_or(0),
        }
    }
}

/// One column's metadata as supplied by a describer.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: &str, column_type: ColumnType, nullable: bool) -> Self {
        Column {
            name: name.to_string(),
            column_type,
            nullable,
        }
    }
}

/// Caller-supplied schema for one index.
///
/// InnoDB does not store column types inline, so every record decode goes
/// through one of these. Built-in describers for the data-dictionary
/// bootstrap indexes live in [`crate::innodb::dict`].
pub trait RecordDescriber {
    /// Ordered metadata for the key columns.
    fn key_columns(&self) -> Vec<Column>;
    /// Ordered metadata for the non-key columns stored with leaf records.
    fn row_columns(&self) -> Vec<Column>;
}

/// A decoded column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Int(i64),
    Uint(u64),
    Str(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Uint(v) => write!(f, "{}", v),
            FieldValue::Str(v) => write!(f, "{:?}", v),
            FieldValue::Bytes(v) => {
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// A named decoded value.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// One fully decoded record.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Origin offset within the page.
    pub origin: usize,
    pub header: RecordHeader,
    pub key: Vec<Field>,
    pub row: Vec<Field>,
    /// Child page number; only on node-pointer records.
    pub child_page: Option<u32>,
}

impl Record {
    /// Delete-marked records stay in the chain; callers filter on this.
    pub fn deleted(&self) -> bool {
        self.header.deleted()
    }

    /// The key as a compact `(name=value, ...)` string.
    pub fn key_string(&self) -> String {
        let parts: Vec<String> = self
            .key
            .iter()
            .map(|f| format!("{}={}", f.name, f.value))
            .collect();
        format!("({})", parts.join(", "))
    }
}

/// Decode the record whose origin is at `origin`, using `describer`.
///
/// Conventional records decode key and row columns; node pointers decode key
/// columns plus the trailing child page number. Asking for a sentinel is a
/// usage error — infimum and supremum carry no user data.
pub fn decode(
    page_data: &[u8],
    origin: usize,
    describer: &dyn RecordDescriber,
) -> Result<Record> {
    let header = RecordHeader::parse_before(page_data, origin)?;
    let key_columns = describer.key_columns();
    let row_columns = match header.kind {
        RecordKind::Conventional => describer.row_columns(),
        RecordKind::NodePointer => Vec::new(),
        other => {
            return Err(InnoError::Usage(format!(
                "cannot decode {:?} record at {} as user data",
                other, origin
            )))
        }
    };

    // Nullable columns in declaration order, key first.
    let columns: Vec<&Column> = key_columns.iter().chain(row_columns.iter()).collect();
    let nullable: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, col)| col.nullable)
        .map(|(i, _)| i)
        .collect();

    let mut back = Cursor::new(page_data, origin - REC_EXTRA_BYTES).backward();
    let mut nulls = vec![false; columns.len()];
    back.name("null_bitmap", |c| {
        let n_bytes = nullable.len().div_ceil(8);
        for byte_index in 0..n_bytes {
            let byte = c.read_u8()?;
            for bit in 0..8 {
                if let Some(&col) = nullable.get(byte_index * 8 + bit) {
                    nulls[col] = byte >> bit & 1 != 0;
                }
            }
        }
        Ok(())
    })?;

    // Length vector: one entry per variable-length non-NULL column.
    let mut var_lengths = vec![None; columns.len()];
    back.name("length_vector", |c| {
        for (i, col) in columns.iter().enumerate() {
            if !col.column_type.is_variable() || nulls[i] {
                continue;
            }
            let first = c.read_u8()? as usize;
            let length = if col.column_type.max_size() <= 127 || first & 0x80 == 0 {
                first
            } else {
                // Two-byte form; bit 6 flags off-page overflow storage.
                let second = c.read_u8()? as usize;
                (first & 0x3F) << 8 | second
            };
            var_lengths[i] = Some(length);
        }
        Ok(())
    })?;

    let mut fwd = Cursor::new(page_data, origin);
    let mut fields = Vec::with_capacity(columns.len());
    for (i, col) in columns.iter().enumerate() {
        let value = if nulls[i] {
            FieldValue::Null
        } else {
            decode_value(&mut fwd, col, var_lengths[i])?
        };
        fields.push(Field {
            name: col.name.clone(),
            value,
        });
    }

    let row = fields.split_off(key_columns.len());
    let child_page = match header.kind {
        RecordKind::NodePointer => Some(fwd.name("child_page", |c| c.read_u32())?),
        _ => None,
    };

    Ok(Record {
        origin,
        header,
        key: fields,
        row,
        child_page,
    })
}

fn decode_value(c: &mut Cursor<'_>, col: &Column, var_length: Option<usize>) -> Result<FieldValue> {
    c.name(&col.name, |c| match col.column_type {
        ColumnType::Int { bits, unsigned } => {
            let n = (bits / 8) as usize;
            let mut raw: u64 = 0;
            for b in c.read_bytes(n)? {
                raw = raw << 8 | *b as u64;
            }
            if unsigned {
                Ok(FieldValue::Uint(raw))
            } else {
                // The sign bit is stored flipped; undo and sign-extend.
                let flipped = raw ^ (1u64 << (bits - 1));
                let shift = 64 - bits as u32;
                Ok(FieldValue::Int(((flipped << shift) as i64) >> shift))
            }
        }
        ColumnType::Char { length } => {
            let bytes = c.read_bytes(length as usize)?;
            Ok(FieldValue::Str(String::from_utf8_lossy(bytes).into_owned()))
        }
        ColumnType::Varchar { .. } => {
            let length = var_length.ok_or_else(|| {
                InnoError::Schema(format!("no stored length for column {}", col.name))
            })?;
            let bytes = c.read_bytes(length)?;
            Ok(FieldValue::Str(String::from_utf8_lossy(bytes).into_owned()))
        }
        ColumnType::Binary { length } => {
            Ok(FieldValue::Bytes(c.read_bytes(length as usize)?.to_vec()))
        }
        ColumnType::Varbinary { .. } => {
            let length = var_length.ok_or_else(|| {
                InnoError::Schema(format!("no stored length for column {}", col.name))
            })?;
            Ok(FieldValue::Bytes(c.read_bytes(length)?.to_vec()))
        }
    })
}
