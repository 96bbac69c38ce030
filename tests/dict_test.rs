//! System-space surfaces: transaction system page, data-dictionary header,
//! and index enumeration through SYS_INDEXES with the built-in describer.

mod common;

use byteorder::{BigEndian, ByteOrder};
use common::*;
use innospect::innodb::btree::Btree;
use innospect::innodb::constants::*;
use innospect::innodb::dict::SysIndexesDescriber;
use innospect::innodb::page_types::PageType;
use innospect::innodb::record::FieldValue;
use innospect::innodb::space::Space;

/// A SYS_INDEXES clustered-leaf record.
fn sys_index_record(
    table_id: u64,
    id: u64,
    name: &str,
    n_fields: u32,
    index_type: u32,
    space: u32,
    page_no: u32,
) -> RecordSpec {
    let mut data = Vec::new();
    data.extend_from_slice(&enc_u64(table_id));
    data.extend_from_slice(&enc_u64(id));
    data.extend_from_slice(&enc_u48(0x10)); // DB_TRX_ID
    data.extend_from_slice(&enc_u56(0x20)); // DB_ROLL_PTR
    data.extend_from_slice(name.as_bytes());
    data.extend_from_slice(&enc_u32(n_fields));
    data.extend_from_slice(&enc_u32(index_type));
    data.extend_from_slice(&enc_u32(space));
    data.extend_from_slice(&enc_u32(page_no));
    RecordSpec {
        var_lens: vec![vec![name.len() as u8]],
        data,
        ..Default::default()
    }
}

/// A 15-page system space: TRX_SYS on page 5, dictionary header on page 7,
/// SYS_INDEXES root on page 11 describing two local indexes (roots 12, 13)
/// and one in another space.
fn system_space() -> tempfile::NamedTempFile {
    let total: u32 = 15;
    let mut page0 = fsp_page(0, total);
    put_base_node(
        &mut page0,
        FIL_PAGE_DATA + FSP_SEG_INODES_FREE,
        1,
        Some((2, INODE_FLST_NODE_OFFSET as u16)),
        Some((2, INODE_FLST_NODE_OFFSET as u16)),
    );

    let page1 = blank_page(1, PageType::IbufBitmap.as_u16());

    let mut page2 = blank_page(2, PageType::Inode.as_u16());
    put_list_node(&mut page2, INODE_FLST_NODE_OFFSET, None, None);
    put_inode(&mut page2, 0, 20, &[12, 14]); // leaf segment of index 1
    put_inode(&mut page2, 1, 21, &[]); // internal segment of index 1

    let page3 = blank_page(3, PageType::Allocated.as_u16());
    let page4 = blank_page(4, PageType::Allocated.as_u16());

    // Transaction system page.
    let mut page5 = blank_page(5, PageType::TrxSys.as_u16());
    BigEndian::write_u64(&mut page5[TRX_SYS + TRX_SYS_TRX_ID_STORE..], 0x900);
    for slot in 0..TRX_SYS_N_RSEGS {
        let at = TRX_SYS + TRX_SYS_RSEGS + slot * TRX_SYS_RSEG_SLOT_SIZE;
        BigEndian::write_u32(&mut page5[at..], 0);
        BigEndian::write_u32(&mut page5[at + 4..], FIL_NULL);
    }
    let slot0 = TRX_SYS + TRX_SYS_RSEGS;
    BigEndian::write_u32(&mut page5[slot0 + 4..], 6);
    let dw = PS - TRX_SYS_DOUBLEWRITE_FROM_END;
    BigEndian::write_u32(
        &mut page5[dw + TRX_SYS_DOUBLEWRITE_MAGIC..],
        TRX_SYS_DOUBLEWRITE_MAGIC_VALUE,
    );
    BigEndian::write_u32(&mut page5[dw + TRX_SYS_DOUBLEWRITE_BLOCK1..], 9);
    BigEndian::write_u32(&mut page5[dw + TRX_SYS_DOUBLEWRITE_BLOCK2..], 10);

    let page6 = blank_page(6, PageType::Allocated.as_u16());

    // Data dictionary header.
    let mut page7 = blank_page(7, PageType::Sys.as_u16());
    BigEndian::write_u64(&mut page7[DICT_HDR + DICT_HDR_ROW_ID..], 0x200);
    BigEndian::write_u64(&mut page7[DICT_HDR + DICT_HDR_TABLE_ID..], 40);
    BigEndian::write_u64(&mut page7[DICT_HDR + DICT_HDR_INDEX_ID..], 50);
    BigEndian::write_u32(&mut page7[DICT_HDR + DICT_HDR_TABLES..], 8);
    BigEndian::write_u32(&mut page7[DICT_HDR + DICT_HDR_TABLE_IDS..], 9);
    BigEndian::write_u32(&mut page7[DICT_HDR + DICT_HDR_COLUMNS..], 10);
    BigEndian::write_u32(&mut page7[DICT_HDR + DICT_HDR_INDEXES..], 11);
    BigEndian::write_u32(&mut page7[DICT_HDR + DICT_HDR_FIELDS..], 14);

    let page8 = blank_page(8, PageType::Allocated.as_u16());
    let page9 = blank_page(9, PageType::Allocated.as_u16());
    let page10 = blank_page(10, PageType::Allocated.as_u16());

    // SYS_INDEXES: a lone leaf root with three records in key order.
    let records = vec![
        sys_index_record(1, 1, "PRIMARY", 1, 3, 0, 12),
        sys_index_record(1, 2, "k_seq", 1, 0, 0, 13),
        sys_index_record(2, 3, "PRIMARY", 1, 3, 42, 3),
    ];
    let page11 = index_page(11, 3, 0, None, None, &records);

    // Roots of the two local indexes.
    let mut page12 = index_page(12, 1, 0, None, None, &[]);
    set_root_fsegs(
        &mut page12,
        0,
        (2, inode_offset(0) as u16),
        (2, inode_offset(1) as u16),
    );
    let page13 = index_page(13, 2, 0, None, None, &[]);
    let page14 = blank_page(14, PageType::Index.as_u16());

    write_space(
        0,
        vec![
            page0, page1, page2, page3, page4, page5, page6, page7, page8, page9, page10,
            page11, page12, page13, page14,
        ],
    )
}

#[test]
fn trx_sys_decodes_slots_and_doublewrite() {
    let tmp = system_space();
    let space = Space::open(tmp.path()).unwrap();
    assert!(space.is_system_space());

    let trx = space.trx_sys().unwrap();
    assert_eq!(trx.trx_id, 0x900);
    let used: Vec<_> = trx
        .rsegs
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.map(|s| (i, s.page_number)))
        .collect();
    assert_eq!(used, vec![(0, 6)]);
    assert!(trx.doublewrite.created());
    assert_eq!(trx.doublewrite.block1, 9);
    assert_eq!(trx.doublewrite.block2, 10);
}

#[test]
fn dict_header_records_bootstrap_roots() {
    let tmp = system_space();
    let space = Space::open(tmp.path()).unwrap();
    let dict = space.dict_header().unwrap();
    assert_eq!(dict.sys_tables_root, 8);
    assert_eq!(dict.sys_indexes_root, 11);
    assert_eq!(dict.sys_fields_root, 14);
    assert_eq!(dict.max_index_id, 50);
}

#[test]
fn sys_indexes_records_decode_with_builtin_describer() {
    let tmp = system_space();
    let space = Space::open(tmp.path()).unwrap();
    let btree = Btree::new(&space, 11).unwrap();
    let records: Vec<_> = btree
        .each_record(&SysIndexesDescriber)
        .unwrap()
        .collect::<innospect::Result<_>>()
        .unwrap();
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.key[0].value, FieldValue::Uint(1)); // TABLE_ID
    assert_eq!(first.key[1].value, FieldValue::Uint(1)); // ID
    let name = first.row.iter().find(|f| f.name == "NAME").unwrap();
    assert_eq!(name.value, FieldValue::Str("PRIMARY".to_string()));
    let trx = first.row.iter().find(|f| f.name == "DB_TRX_ID").unwrap();
    assert_eq!(trx.value, FieldValue::Uint(0x10));
    let page_no = first.row.iter().find(|f| f.name == "PAGE_NO").unwrap();
    assert_eq!(page_no.value, FieldValue::Uint(12));
}

#[test]
fn each_index_walks_the_dictionary_and_filters_by_space() {
    let tmp = system_space();
    let space = Space::open(tmp.path()).unwrap();
    let indexes = space.each_index().unwrap();
    assert_eq!(indexes.len(), 2);
    assert_eq!(indexes[0].index_id, 1);
    assert_eq!(indexes[0].root_page, 12);
    assert_eq!(indexes[0].name.as_deref(), Some("PRIMARY"));
    assert_eq!(indexes[1].index_id, 2);
    assert_eq!(indexes[1].root_page, 13);
    assert_eq!(indexes[1].name.as_deref(), Some("k_seq"));
}

#[test]
fn account_identifies_the_index_through_the_dictionary() {
    let tmp = system_space();
    let space = Space::open(tmp.path()).unwrap();
    let account = space.page_account(14).unwrap();
    assert_eq!(account.fseg_id, Some(20));
    assert_eq!(account.membership.as_deref(), Some("fragment array"));
    assert_eq!(account.inode_page, Some(2));
    let index = account.index.expect("dictionary should name the index");
    assert_eq!(index.index_id, 1);
    assert_eq!(index.root_page, 12);
    assert_eq!(index.name.as_deref(), Some("PRIMARY"));
}
