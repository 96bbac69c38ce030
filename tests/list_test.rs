//! List framework invariants over a synthetic free_frag list: forward and
//! reverse walks agree, and the stored length bounds iteration.

mod common;

use byteorder::{BigEndian, ByteOrder};
use common::*;
use innospect::innodb::constants::*;
use innospect::innodb::list::{self, FilAddr};
use innospect::innodb::page_types::PageType;
use innospect::innodb::space::Space;

fn node_at(index: usize) -> (u32, u16) {
    (0, (xdes_offset(index) + XDES_FLST_NODE) as u16)
}

/// Three FREE_FRAG extents chained on the free_frag list, descriptors 1..=3.
fn list_space(claimed_length: u32) -> tempfile::NamedTempFile {
    let mut page0 = fsp_page(55, 4);
    let fsp = FIL_PAGE_DATA;
    for index in 1..=3 {
        put_xdes(&mut page0, index, 0, 2, &[]);
    }
    // Chain 1 <-> 2 <-> 3.
    put_list_node(&mut page0, xdes_offset(1) + XDES_FLST_NODE, None, Some(node_at(2)));
    put_list_node(
        &mut page0,
        xdes_offset(2) + XDES_FLST_NODE,
        Some(node_at(1)),
        Some(node_at(3)),
    );
    put_list_node(&mut page0, xdes_offset(3) + XDES_FLST_NODE, Some(node_at(2)), None);
    put_base_node(
        &mut page0,
        fsp + FSP_FREE_FRAG,
        claimed_length,
        Some(node_at(1)),
        Some(node_at(3)),
    );
    // One inode page for the inode-page list walk.
    put_base_node(
        &mut page0,
        fsp + FSP_SEG_INODES_FREE,
        1,
        Some((2, INODE_FLST_NODE_OFFSET as u16)),
        Some((2, INODE_FLST_NODE_OFFSET as u16)),
    );

    let page1 = blank_page(1, PageType::Allocated.as_u16());
    let mut page2 = blank_page(2, PageType::Inode.as_u16());
    put_list_node(&mut page2, INODE_FLST_NODE_OFFSET, None, None);
    let page3 = blank_page(3, PageType::Allocated.as_u16());
    write_space(55, vec![page0, page1, page2, page3])
}

#[test]
fn forward_walk_produces_length_entries_in_order() {
    let tmp = list_space(3);
    let space = Space::open(tmp.path()).unwrap();
    let base = space.list("free_frag").unwrap().clone();

    let entries: Vec<(FilAddr, u32)> = space
        .each_list_xdes(&base)
        .map(|item| item.map(|(addr, xdes)| (addr, xdes.start_page)))
        .collect::<innospect::Result<_>>()
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].1, 64);
    assert_eq!(entries[1].1, 128);
    assert_eq!(entries[2].1, 192);
    for (i, (addr, _)) in entries.iter().enumerate() {
        assert_eq!((addr.page, addr.offset), node_at(i + 1));
    }
}

#[test]
fn reverse_walk_is_the_forward_walk_reversed() {
    let tmp = list_space(3);
    let space = Space::open(tmp.path()).unwrap();
    let base = space.list("free_frag").unwrap().clone();

    let forward: Vec<FilAddr> = space
        .each_list_xdes(&base)
        .map(|item| item.map(|(addr, _)| addr))
        .collect::<innospect::Result<_>>()
        .unwrap();
    let mut reverse: Vec<FilAddr> = space
        .each_list_xdes_reverse(&base)
        .map(|item| item.map(|(addr, _)| addr))
        .collect::<innospect::Result<_>>()
        .unwrap();
    reverse.reverse();
    assert_eq!(forward, reverse);
}

#[test]
fn stored_length_bounds_the_walk() {
    let tmp = list_space(2);
    let space = Space::open(tmp.path()).unwrap();
    let base = space.list("free_frag").unwrap().clone();
    assert_eq!(space.each_list_xdes(&base).count(), 2);
}

#[test]
fn membership_is_by_node_address() {
    let tmp = list_space(3);
    let space = Space::open(tmp.path()).unwrap();
    let base = space.list("free_frag").unwrap().clone();

    let member = FilAddr {
        page: 0,
        offset: node_at(2).1,
    };
    assert!(list::contains(&space, &base, member).unwrap());

    let stranger = FilAddr {
        page: 0,
        offset: (xdes_offset(0) + XDES_FLST_NODE) as u16,
    };
    assert!(!list::contains(&space, &base, stranger).unwrap());
}

#[test]
fn inode_page_list_yields_page_numbers() {
    let tmp = list_space(3);
    let space = Space::open(tmp.path()).unwrap();
    let base = space.list("free_inodes").unwrap().clone();
    let pages: Vec<u32> = space
        .each_list_inode_pages(&base)
        .map(|item| item.map(|(_, page)| page))
        .collect::<innospect::Result<_>>()
        .unwrap();
    assert_eq!(pages, vec![2]);
}

#[test]
fn base_nodes_visible_in_fsp_header() {
    let tmp = list_space(3);
    let space = Space::open(tmp.path()).unwrap();
    let lists = space.each_xdes_list();
    let free_frag = lists.iter().find(|(n, _)| *n == "free_frag").unwrap().1;
    assert_eq!(free_frag.length, 3);
    assert_eq!(
        BigEndian::read_u32(&space.page(0).unwrap().data()[FIL_PAGE_DATA + FSP_FREE_FRAG..]),
        3
    );
}
