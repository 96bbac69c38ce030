//! Hex dump and value formatting.

use crate::innodb::constants::FIL_NULL;
use crate::innodb::list::FilAddr;

/// Format a page number, printing `nil` for `FIL_NULL`.
pub fn page_ref(page: u32) -> String {
    if page == FIL_NULL {
        "nil".to_string()
    } else {
        page.to_string()
    }
}

/// Format a file address as `(page, offset)`, or `nil`.
pub fn fil_addr(addr: &FilAddr) -> String {
    if addr.is_null() {
        "nil".to_string()
    } else {
        format!("({}, {})", addr.page, addr.offset)
    }
}

/// Format a byte offset as "decimal (0xhex)".
pub fn offset(value: u64) -> String {
    format!("{} (0x{:x})", value, value)
}

/// Traditional hex dump with offset column and ASCII sidebar, 16 bytes per
/// line.
pub fn dump(data: &[u8], base_offset: u64) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{:08x}  ", base_offset + (i * 16) as u64));
        for col in 0..16 {
            if col == 8 {
                out.push(' ');
            }
            match chunk.get(col) {
                Some(b) => out.push_str(&format!("{:02x} ", b)),
                None => out.push_str("   "),
            }
        }
        out.push_str(" |");
        for b in chunk {
            out.push(if b.is_ascii_graphic() || *b == b' ' {
                *b as char
            } else {
                '.'
            });
        }
        for _ in chunk.len()..16 {
            out.push(' ');
        }
        out.push('|');
    }
    out
}
