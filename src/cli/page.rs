use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_space, wprintln, write_json};
use crate::innodb::page::{Page, PageView};
use crate::innodb::space::PageAccount;
use crate::util::hex;
use crate::Result;

pub struct PageOptions {
    pub file: String,
    pub page: u64,
    pub dump: bool,
    pub account: bool,
    pub page_size: Option<u32>,
    pub json: bool,
}

#[derive(Serialize)]
struct PageDetailJson {
    page: u64,
    page_type: String,
    lsn: u64,
    prev: Option<u32>,
    next: Option<u32>,
    checksum_ok: bool,
    lsn_consistent: bool,
    detail: serde_json::Value,
    account: Option<PageAccount>,
}

pub fn execute(opts: &PageOptions, writer: &mut dyn Write) -> Result<()> {
    let space = open_space(&opts.file, opts.page_size)?;
    let page = space.page(opts.page)?;
    let account = if opts.account {
        Some(space.page_account(opts.page)?)
    } else {
        None
    };

    if opts.json {
        let out = PageDetailJson {
            page: opts.page,
            page_type: page.fil().page_type.to_string(),
            lsn: page.fil().lsn,
            prev: page.fil().prev(),
            next: page.fil().next(),
            checksum_ok: page.checksum_ok(),
            lsn_consistent: page.lsn_consistent(),
            detail: detail_json(&page)?,
            account,
        };
        return write_json(&out, writer);
    }

    let fil = page.fil();
    wprintln!(writer, "{}", format!("Page {}", opts.page).bold())?;
    wprintln!(
        writer,
        "  Type:       {} ({})",
        fil.page_type,
        fil.page_type.description()
    )?;
    wprintln!(writer, "  LSN:        {}", fil.lsn)?;
    wprintln!(
        writer,
        "  Prev/Next:  {} / {}",
        hex::page_ref(fil.prev_page),
        hex::page_ref(fil.next_page)
    )?;
    wprintln!(writer, "  Checksum:   {}", if page.checksum_ok() { "ok" } else { "mismatch" })?;
    wprintln!(
        writer,
        "  LSN check:  {}",
        if page.lsn_consistent() { "ok" } else { "mismatch" }
    )?;
    write_detail(&page, writer)?;

    if let Some(account) = &account {
        wprintln!(writer)?;
        wprintln!(writer, "{}", "Accounting".bold())?;
        wprintln!(
            writer,
            "  Extent descriptor at ({}, {}), state {}",
            account.xdes_page,
            account.xdes_offset,
            account.extent_state.name()
        )?;
        wprintln!(
            writer,
            "  Bitmap: free={} clean={}",
            account.free,
            account.clean
        )?;
        if let Some(fseg) = account.fseg_id {
            wprintln!(writer, "  Owned by fseg {}", fseg)?;
        }
        if let (Some(p), Some(o)) = (account.inode_page, account.inode_offset) {
            wprintln!(writer, "  Inode entry at ({}, {})", p, o)?;
        }
        if let Some(membership) = &account.membership {
            wprintln!(writer, "  Reached via: {}", membership)?;
        }
        if let Some(index) = &account.index {
            wprintln!(
                writer,
                "  Index {} (root page {}){}",
                index.index_id,
                index.root_page,
                index
                    .name
                    .as_deref()
                    .map(|n| format!(" name {}", n))
                    .unwrap_or_default()
            )?;
        }
    }

    if opts.dump {
        wprintln!(writer)?;
        wprintln!(
            writer,
            "{}",
            hex::dump(page.data(), opts.page * space.page_size() as u64)
        )?;
    }
    Ok(())
}

fn detail_json(page: &Page) -> Result<serde_json::Value> {
    let to_value = |r: std::result::Result<serde_json::Value, serde_json::Error>| {
        r.map_err(|e| crate::InnoError::Io(format!("cannot serialize detail: {}", e)))
    };
    match page.view()? {
        PageView::FspHdr(v) => to_value(serde_json::to_value(v.header())),
        PageView::Inode(v) => {
            let entries: Vec<_> = v
                .used_entries()
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .map(|(_, e)| e)
                .collect();
            to_value(serde_json::to_value(entries))
        }
        PageView::Index(v) => to_value(serde_json::to_value(v.header())),
        PageView::TrxSys(v) => to_value(serde_json::to_value(v.header())),
        PageView::Xdes(_) | PageView::Other(_) => Ok(serde_json::Value::Null),
    }
}

fn write_detail(page: &Page, writer: &mut dyn Write) -> Result<()> {
    match page.view()? {
        PageView::FspHdr(v) => {
            let fsp = v.header();
            wprintln!(writer)?;
            wprintln!(writer, "{}", "FSP header".bold())?;
            wprintln!(writer, "  Space id:   {}", fsp.space_id)?;
            wprintln!(writer, "  Size:       {} pages", fsp.size)?;
            wprintln!(writer, "  Free limit: {}", fsp.free_limit)?;
            for (name, list) in fsp.each_list() {
                wprintln!(writer, "  List {:12} length {}", name, list.length)?;
            }
        }
        PageView::Xdes(_) => {
            wprintln!(writer)?;
            wprintln!(
                writer,
                "  Extent descriptor page; see `extents` for the array."
            )?;
        }
        PageView::Inode(v) => {
            wprintln!(writer)?;
            wprintln!(writer, "{}", "Inode slots".bold())?;
            for entry in v.used_entries() {
                let (offset, e) = entry?;
                wprintln!(
                    writer,
                    "  slot at {:>5}: fseg {} ({} frag pages, {}/{} pages used)",
                    offset,
                    e.fseg_id,
                    e.frag_used(),
                    e.used_pages(),
                    e.total_pages()
                )?;
            }
        }
        PageView::Index(v) => {
            let h = v.header();
            wprintln!(writer)?;
            wprintln!(writer, "{}", "Index header".bold())?;
            wprintln!(writer, "  Index id:   {}", h.index_id)?;
            wprintln!(writer, "  Level:      {}", h.level)?;
            wprintln!(writer, "  Records:    {} ({} in heap)", h.n_recs, h.n_heap)?;
            wprintln!(writer, "  Heap top:   {}", h.heap_top)?;
            wprintln!(writer, "  Garbage:    {} bytes", h.garbage)?;
            wprintln!(writer, "  Direction:  {}", h.direction_name())?;
            wprintln!(writer, "  Dir slots:  {}", h.n_dir_slots)?;
            if v.is_root() {
                let leaf = v.leaf_fseg()?;
                let internal = v.internal_fseg()?;
                wprintln!(
                    writer,
                    "  Root: leaf fseg at ({}, {}), internal fseg at ({}, {})",
                    leaf.page_number,
                    leaf.offset,
                    internal.page_number,
                    internal.offset
                )?;
            }
        }
        PageView::TrxSys(v) => {
            let h = v.header();
            wprintln!(writer)?;
            wprintln!(writer, "{}", "Transaction system".bold())?;
            wprintln!(writer, "  Max trx id: {}", h.trx_id)?;
            wprintln!(
                writer,
                "  Rollback segment slots used: {}",
                v.used_rsegs().count()
            )?;
            if h.doublewrite.created() {
                wprintln!(
                    writer,
                    "  Doublewrite blocks at {} and {}",
                    h.doublewrite.block1,
                    h.doublewrite.block2
                )?;
            }
        }
        PageView::Other(_) => {}
    }
    Ok(())
}
