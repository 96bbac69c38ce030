use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_space, wprintln, write_json};
use crate::innodb::page::Page;
use crate::util::hex;
use crate::Result;

pub struct PagesOptions {
    pub file: String,
    pub page: Option<u64>,
    pub page_size: Option<u32>,
    pub json: bool,
}

#[derive(Serialize)]
struct PageJson {
    page: u64,
    page_type: String,
    lsn: u64,
    prev: Option<u32>,
    next: Option<u32>,
    space_id: u32,
    checksum_ok: bool,
    lsn_consistent: bool,
}

fn page_json(n: u64, page: &Page) -> PageJson {
    let fil = page.fil();
    PageJson {
        page: n,
        page_type: fil.page_type.to_string(),
        lsn: fil.lsn,
        prev: fil.prev(),
        next: fil.next(),
        space_id: fil.space_id,
        checksum_ok: page.checksum_ok(),
        lsn_consistent: page.lsn_consistent(),
    }
}

pub fn execute(opts: &PagesOptions, writer: &mut dyn Write) -> Result<()> {
    let space = open_space(&opts.file, opts.page_size)?;

    if opts.json {
        let pages: Vec<PageJson> = match opts.page {
            Some(n) => vec![page_json(n, &space.page(n)?)],
            None => space.each_page(0).map(|(n, p)| page_json(n, &p)).collect(),
        };
        return write_json(&pages, writer);
    }

    wprintln!(
        writer,
        "{}",
        format!(
            "{:>8}  {:<14} {:>16}  {:>8} {:>8}  {}",
            "page", "type", "lsn", "prev", "next", "checks"
        )
        .bold()
    )?;
    let mut show = |n: u64, page: &Page| -> Result<()> {
        let fil = page.fil();
        let checks = match (page.checksum_ok(), page.lsn_consistent()) {
            (true, true) => "ok".normal(),
            (false, _) => "checksum!".yellow(),
            (_, false) => "lsn!".yellow(),
        };
        wprintln!(
            writer,
            "{:>8}  {:<14} {:>16}  {:>8} {:>8}  {}",
            n,
            fil.page_type.to_string(),
            fil.lsn,
            hex::page_ref(fil.prev_page),
            hex::page_ref(fil.next_page),
            checks
        )
    };
    match opts.page {
        Some(n) => show(n, &space.page(n)?)?,
        None => {
            for (n, page) in space.each_page(0) {
                show(n, &page)?;
            }
        }
    }
    Ok(())
}
