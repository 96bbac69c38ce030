use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_space, wprintln, write_json};
use crate::innodb::space::PageTypeRegion;
use crate::Result;

pub struct SummaryOptions {
    pub file: String,
    pub page_size: Option<u32>,
    pub json: bool,
}

#[derive(Serialize)]
struct SummaryJson {
    file: String,
    file_size: u64,
    page_size: u32,
    pages: u64,
    space_id: u32,
    system_space: bool,
    fsp_size: u32,
    free_limit: u32,
    flags: u32,
    frag_n_used: u32,
    seg_id: u64,
    lists: Vec<ListJson>,
    regions: Vec<PageTypeRegion>,
    indexes: Vec<crate::innodb::space::IndexInfo>,
}

#[derive(Serialize)]
struct ListJson {
    name: &'static str,
    length: u32,
}

pub fn execute(opts: &SummaryOptions, writer: &mut dyn Write) -> Result<()> {
    let space = open_space(&opts.file, opts.page_size)?;
    let regions: Vec<PageTypeRegion> = space.each_page_type_region().collect();
    let indexes = space.each_index().unwrap_or_default();
    let fsp = space.fsp();

    if opts.json {
        let out = SummaryJson {
            file: opts.file.clone(),
            file_size: space.file_size(),
            page_size: space.page_size(),
            pages: space.pages(),
            space_id: space.space_id(),
            system_space: space.is_system_space(),
            fsp_size: fsp.size,
            free_limit: fsp.free_limit,
            flags: fsp.flags,
            frag_n_used: fsp.frag_n_used,
            seg_id: fsp.seg_id,
            lists: fsp
                .each_list()
                .into_iter()
                .map(|(name, list)| ListJson {
                    name,
                    length: list.length,
                })
                .collect(),
            regions,
            indexes,
        };
        return write_json(&out, writer);
    }

    wprintln!(writer, "{}", "Tablespace".bold())?;
    wprintln!(writer, "  File:        {}", opts.file)?;
    wprintln!(writer, "  Size:        {} bytes", space.file_size())?;
    wprintln!(writer, "  Page size:   {}", space.page_size())?;
    wprintln!(writer, "  Pages:       {}", space.pages())?;
    wprintln!(
        writer,
        "  Space id:    {}{}",
        space.space_id(),
        if space.is_system_space() { " (system)" } else { "" }
    )?;
    wprintln!(writer)?;
    wprintln!(writer, "{}", "FSP header".bold())?;
    wprintln!(writer, "  Size:        {} pages", fsp.size)?;
    wprintln!(writer, "  Free limit:  {}", fsp.free_limit)?;
    wprintln!(writer, "  Flags:       0x{:08x}", fsp.flags)?;
    wprintln!(writer, "  Frag used:   {}", fsp.frag_n_used)?;
    wprintln!(writer, "  Next seg id: {}", fsp.seg_id)?;
    for (name, list) in fsp.each_list() {
        wprintln!(writer, "  List {:12} length {}", name, list.length)?;
    }
    wprintln!(writer)?;
    wprintln!(writer, "{}", "Page type regions".bold())?;
    for r in &regions {
        wprintln!(
            writer,
            "  {:>8}..{:<8} {:>6} x {}",
            r.start,
            r.end,
            r.count,
            r.page_type
        )?;
    }
    if !indexes.is_empty() {
        wprintln!(writer)?;
        wprintln!(writer, "{}", "Indexes".bold())?;
        for idx in &indexes {
            wprintln!(
                writer,
                "  index {:>6}  root page {:>6}  {}",
                idx.index_id,
                idx.root_page,
                idx.name.as_deref().unwrap_or("-")
            )?;
        }
    }
    Ok(())
}
