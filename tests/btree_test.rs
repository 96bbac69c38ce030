//! B-tree traversal over synthetic indexes: a single-row root leaf, a
//! two-level tree of 1024 sequential keys, delete-marked records, and
//! index-id mismatch detection.

mod common;

use common::*;
use innospect::innodb::btree::Btree;
use innospect::innodb::constants::*;
use innospect::innodb::index::IndexPage;
use innospect::innodb::page_types::PageType;
use innospect::innodb::record::{Column, ColumnType, FieldValue, RecordDescriber};
use innospect::innodb::space::Space;
use innospect::InnoError;

/// `id INT PRIMARY KEY, a INT NOT NULL`.
struct IdA;

impl RecordDescriber for IdA {
    fn key_columns(&self) -> Vec<Column> {
        vec![Column::new(
            "id",
            ColumnType::Int {
                bits: 32,
                unsigned: false,
            },
            false,
        )]
    }
    fn row_columns(&self) -> Vec<Column> {
        vec![Column::new(
            "a",
            ColumnType::Int {
                bits: 32,
                unsigned: false,
            },
            false,
        )]
    }
}

fn leaf_record(id: i32) -> RecordSpec {
    let mut data = Vec::new();
    data.extend_from_slice(&enc_i32(id));
    data.extend_from_slice(&enc_i32(id));
    RecordSpec::plain(data)
}

fn node_pointer(first_key: i32, child: u32, min_rec: bool) -> RecordSpec {
    let mut data = Vec::new();
    data.extend_from_slice(&enc_i32(first_key));
    data.extend_from_slice(&enc_u32(child));
    RecordSpec {
        node_ptr: true,
        min_rec,
        data,
        ..Default::default()
    }
}

fn key_of(record: &innospect::innodb::record::Record) -> i64 {
    match record.key[0].value {
        FieldValue::Int(v) => v,
        ref other => panic!("unexpected key {:?}", other),
    }
}

/// Pages 0..3 bookkeeping plus a root-leaf with one row: id=1, a=1.
fn single_row_space() -> tempfile::NamedTempFile {
    let mut page0 = fsp_page(9, 4);
    let fsp = FIL_PAGE_DATA;
    put_base_node(
        &mut page0,
        fsp + FSP_SEG_INODES_FREE,
        1,
        Some((2, INODE_FLST_NODE_OFFSET as u16)),
        Some((2, INODE_FLST_NODE_OFFSET as u16)),
    );
    let page1 = blank_page(1, PageType::IbufBitmap.as_u16());
    let mut page2 = blank_page(2, PageType::Inode.as_u16());
    put_list_node(&mut page2, INODE_FLST_NODE_OFFSET, None, None);
    put_inode(&mut page2, 0, 1, &[3]);
    put_inode(&mut page2, 1, 2, &[]);
    let mut page3 = index_page(3, 31, 0, None, None, &[leaf_record(1)]);
    set_root_fsegs(
        &mut page3,
        9,
        (2, inode_offset(0) as u16),
        (2, inode_offset(1) as u16),
    );
    write_space(9, vec![page0, page1, page2, page3])
}

#[test]
fn single_row_tree_yields_one_leaf_and_one_record() {
    let tmp = single_row_space();
    let space = Space::open(tmp.path()).unwrap();
    let btree = Btree::new(&space, 3).unwrap();
    assert_eq!(btree.root_level(), 0);

    let mut leaves = 0;
    btree
        .recurse(
            &IdA,
            &mut |page, header, depth| {
                leaves += 1;
                assert_eq!(page.number(), 3);
                assert_eq!(header.level, 0);
                assert_eq!(depth, 0);
            },
            &mut |_, _, _, _| panic!("single leaf cannot have links"),
        )
        .unwrap();
    assert_eq!(leaves, 1);

    let records: Vec<_> = btree
        .each_record(&IdA)
        .unwrap()
        .collect::<innospect::Result<_>>()
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key_string(), "(id=1)");
    assert_eq!(records[0].row[0].name, "a");
    assert_eq!(records[0].row[0].value, FieldValue::Int(1));
}

const ROWS: i32 = 1024;
const ROWS_PER_LEAF: i32 = 50;

/// Two-level tree: root at page 3, leaves from page 4, 1024 sequential keys.
fn two_level_space(corrupt_leaf: Option<usize>) -> tempfile::NamedTempFile {
    let n_leaves = (ROWS + ROWS_PER_LEAF - 1) / ROWS_PER_LEAF;
    let total_pages = 4 + n_leaves as u32;

    let mut page0 = fsp_page(8, total_pages);
    let fsp = FIL_PAGE_DATA;
    put_base_node(
        &mut page0,
        fsp + FSP_SEG_INODES_FREE,
        1,
        Some((2, INODE_FLST_NODE_OFFSET as u16)),
        Some((2, INODE_FLST_NODE_OFFSET as u16)),
    );
    let page1 = blank_page(1, PageType::IbufBitmap.as_u16());
    let mut page2 = blank_page(2, PageType::Inode.as_u16());
    put_list_node(&mut page2, INODE_FLST_NODE_OFFSET, None, None);
    put_inode(&mut page2, 0, 1, &[3]);
    put_inode(&mut page2, 1, 2, &[]);

    let mut pointers = Vec::new();
    let mut leaves = Vec::new();
    for leaf in 0..n_leaves {
        let first = leaf * ROWS_PER_LEAF + 1;
        let last = ((leaf + 1) * ROWS_PER_LEAF).min(ROWS);
        let page_no = 4 + leaf as u32;
        let records: Vec<RecordSpec> = (first..=last).map(leaf_record).collect();
        let prev = (leaf > 0).then(|| page_no - 1);
        let next = (leaf < n_leaves - 1).then(|| page_no + 1);
        let index_id = match corrupt_leaf {
            Some(c) if c == leaf as usize => 999,
            _ => 77,
        };
        leaves.push(index_page(page_no, index_id, 0, prev, next, &records));
        pointers.push(node_pointer(first, page_no, leaf == 0));
    }

    let mut root = index_page(3, 77, 1, None, None, &pointers);
    set_root_fsegs(
        &mut root,
        8,
        (2, inode_offset(0) as u16),
        (2, inode_offset(1) as u16),
    );

    let mut pages = vec![page0, page1, page2, root];
    pages.extend(leaves);
    write_space(8, pages)
}

#[test]
fn level_one_is_exactly_the_root() {
    let tmp = two_level_space(None);
    let space = Space::open(tmp.path()).unwrap();
    let btree = Btree::new(&space, 3).unwrap();
    assert_eq!(btree.root_level(), 1);

    let pages: Vec<u64> = btree
        .each_page_at_level(1, &IdA)
        .unwrap()
        .map(|p| p.map(|p| p.number()))
        .collect::<innospect::Result<_>>()
        .unwrap();
    assert_eq!(pages, vec![3]);
}

#[test]
fn leaf_level_walk_covers_every_key_in_order() {
    let tmp = two_level_space(None);
    let space = Space::open(tmp.path()).unwrap();
    let btree = Btree::new(&space, 3).unwrap();

    let mut first_keys = Vec::new();
    let mut all_keys = Vec::new();
    for page in btree.each_page_at_level(0, &IdA).unwrap() {
        let page = page.unwrap();
        let view = IndexPage::new(&page).unwrap();
        let records: Vec<_> = view
            .records(&IdA)
            .unwrap()
            .collect::<innospect::Result<_>>()
            .unwrap();
        first_keys.push(key_of(&records[0]));
        all_keys.extend(records.iter().map(key_of));
    }

    assert!(first_keys.windows(2).all(|w| w[0] < w[1]));
    let expected: Vec<i64> = (1..=ROWS as i64).collect();
    assert_eq!(all_keys, expected);
}

#[test]
fn each_record_equals_leaf_chain_traversal() {
    let tmp = two_level_space(None);
    let space = Space::open(tmp.path()).unwrap();
    let btree = Btree::new(&space, 3).unwrap();

    let keys: Vec<i64> = btree
        .each_record(&IdA)
        .unwrap()
        .map(|r| r.map(|r| key_of(&r)))
        .collect::<innospect::Result<_>>()
        .unwrap();
    assert_eq!(keys.len(), ROWS as usize);
    assert!(keys.windows(2).all(|w| w[0] + 1 == w[1]));
}

#[test]
fn recursion_visits_every_page_and_link_in_order() {
    let tmp = two_level_space(None);
    let space = Space::open(tmp.path()).unwrap();
    let btree = Btree::new(&space, 3).unwrap();

    let n_leaves = ((ROWS + ROWS_PER_LEAF - 1) / ROWS_PER_LEAF) as usize;
    let mut pages = Vec::new();
    let mut links = Vec::new();
    btree
        .recurse(
            &IdA,
            &mut |page, header, depth| pages.push((page.number(), header.level, depth)),
            &mut |parent, child, min_key, depth| {
                links.push((parent, child, key_of(min_key), depth))
            },
        )
        .unwrap();

    assert_eq!(pages.len(), 1 + n_leaves);
    assert_eq!(pages[0], (3, 1, 0));
    assert!(pages[1..].iter().all(|&(_, level, depth)| level == 0 && depth == 1));
    assert_eq!(links.len(), n_leaves);
    assert!(links.windows(2).all(|w| w[0].2 < w[1].2));
    assert_eq!(links[0], (3, 4, 1, 0));
}

#[test]
fn foreign_index_id_stops_traversal() {
    let tmp = two_level_space(Some(5));
    let space = Space::open(tmp.path()).unwrap();
    let btree = Btree::new(&space, 3).unwrap();

    let result: innospect::Result<Vec<_>> = btree.each_record(&IdA).unwrap().collect();
    assert!(matches!(result, Err(InnoError::Corrupt(_))));

    let err = btree
        .recurse(&IdA, &mut |_, _, _| {}, &mut |_, _, _, _| {})
        .unwrap_err();
    assert!(matches!(err, InnoError::Corrupt(_)));
}

#[test]
fn delete_marked_records_stay_in_the_chain() {
    let mut page0 = fsp_page(12, 4);
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
    put_inode(&mut page2, 0, 1, &[3]);
    put_inode(&mut page2, 1, 2, &[]);

    let mut deleted = leaf_record(2);
    deleted.deleted = true;
    let mut page3 = index_page(3, 5, 0, None, None, &[leaf_record(1), deleted, leaf_record(3)]);
    set_root_fsegs(
        &mut page3,
        12,
        (2, inode_offset(0) as u16),
        (2, inode_offset(1) as u16),
    );
    let tmp = write_space(12, vec![page0, page1, page2, page3]);

    let space = Space::open(tmp.path()).unwrap();
    let btree = Btree::new(&space, 3).unwrap();
    let records: Vec<_> = btree
        .each_record(&IdA)
        .unwrap()
        .collect::<innospect::Result<_>>()
        .unwrap();
    assert_eq!(records.len(), 3);
    let flags: Vec<bool> = records.iter().map(|r| r.deleted()).collect();
    assert_eq!(flags, vec![false, true, false]);
    assert_eq!(key_of(&records[1]), 2);
}

#[test]
fn record_chain_terminates_at_supremum_with_expected_count() {
    let tmp = two_level_space(None);
    let space = Space::open(tmp.path()).unwrap();
    let page = space.page(4).unwrap();
    let view = IndexPage::new(&page).unwrap();
    let n = view.header().n_recs as usize;
    assert_eq!(view.record_chain().unwrap().count(), n);
    // Infimum and supremum frame the chain.
    assert_eq!(
        view.infimum().unwrap().kind,
        innospect::innodb::record::RecordKind::Infimum
    );
    assert_eq!(
        view.supremum().unwrap().kind,
        innospect::innodb::record::RecordKind::Supremum
    );
}

#[test]
fn page_directory_owners_cover_the_chain() {
    let tmp = two_level_space(None);
    let space = Space::open(tmp.path()).unwrap();
    let page = space.page(4).unwrap();
    let view = IndexPage::new(&page).unwrap();
    let dir = view.directory().unwrap();
    assert_eq!(dir.first(), Some(&(PAGE_INFIMUM as u16)));
    assert_eq!(dir.last(), Some(&(PAGE_SUPREMUM as u16)));
    assert_eq!(dir.len(), view.header().n_dir_slots as usize);
    // Slot owners must be reachable origins in the chain.
    let origins: Vec<u16> = view
        .record_chain()
        .unwrap()
        .map(|r| r.map(|(o, _)| o as u16))
        .collect::<innospect::Result<_>>()
        .unwrap();
    for slot in &dir[1..dir.len() - 1] {
        assert!(origins.contains(slot), "slot {} not in chain", slot);
    }
}
