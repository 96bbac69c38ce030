use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_space, wprintln, write_json};
use crate::Result;

pub struct InodesOptions {
    pub file: String,
    pub page_size: Option<u32>,
    pub json: bool,
}

#[derive(Serialize)]
struct InodeJson {
    fseg_id: u64,
    location: (u32, u16),
    frag_pages: Vec<u32>,
    free_extents: u32,
    not_full_extents: u32,
    full_extents: u32,
    not_full_n_used: u32,
    total_pages: u64,
    used_pages: u64,
    fill_factor: f64,
}

pub fn execute(opts: &InodesOptions, writer: &mut dyn Write) -> Result<()> {
    let space = open_space(&opts.file, opts.page_size)?;

    let mut inodes = Vec::new();
    for inode in space.each_inode()? {
        let e = &inode.entry;
        inodes.push(InodeJson {
            fseg_id: e.fseg_id,
            location: (inode.page_number, inode.offset),
            frag_pages: e.frag_array.iter().flatten().copied().collect(),
            free_extents: e.free.length,
            not_full_extents: e.not_full.length,
            full_extents: e.full.length,
            not_full_n_used: e.not_full_n_used,
            total_pages: e.total_pages(),
            used_pages: e.used_pages(),
            fill_factor: e.fill_factor(),
        });
    }

    if opts.json {
        return write_json(&inodes, writer);
    }

    wprintln!(writer, "{}", "File segments".bold())?;
    for i in &inodes {
        wprintln!(
            writer,
            "fseg {:>8} at ({}, {})",
            i.fseg_id,
            i.location.0,
            i.location.1
        )?;
        wprintln!(
            writer,
            "  extents: free {}, not_full {} ({} pages used), full {}",
            i.free_extents,
            i.not_full_extents,
            i.not_full_n_used,
            i.full_extents
        )?;
        wprintln!(
            writer,
            "  frag pages ({}): {:?}",
            i.frag_pages.len(),
            i.frag_pages
        )?;
        wprintln!(
            writer,
            "  pages used {}/{} (fill factor {:.1}%)",
            i.used_pages,
            i.total_pages,
            i.fill_factor * 100.0
        )?;
    }
    Ok(())
}
