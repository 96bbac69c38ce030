use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_space, wprintln, write_json};
use crate::Result;

pub struct ExtentsOptions {
    pub file: String,
    pub page_size: Option<u32>,
    pub json: bool,
}

#[derive(Serialize)]
struct ExtentJson {
    start_page: u32,
    descriptor: (u32, u16),
    state: String,
    fseg_id: u64,
    free_pages: usize,
}

pub fn execute(opts: &ExtentsOptions, writer: &mut dyn Write) -> Result<()> {
    let space = open_space(&opts.file, opts.page_size)?;

    let mut extents = Vec::new();
    for xdes in space.each_xdes() {
        let xdes = xdes?;
        extents.push(ExtentJson {
            start_page: xdes.start_page,
            descriptor: (xdes.page_number, xdes.offset),
            state: xdes.entry.state.name().to_string(),
            fseg_id: xdes.entry.fseg_id,
            free_pages: xdes.entry.free_pages(),
        });
    }

    if opts.json {
        return write_json(&extents, writer);
    }

    wprintln!(
        writer,
        "{}",
        format!(
            "{:>10}  {:<14} {:>10}  {:>6}  descriptor",
            "extent", "state", "fseg", "free"
        )
        .bold()
    )?;
    for e in &extents {
        wprintln!(
            writer,
            "{:>10}  {:<14} {:>10}  {:>6}  ({}, {})",
            e.start_page,
            e.state,
            e.fseg_id,
            e.free_pages,
            e.descriptor.0,
            e.descriptor.1
        )?;
    }
    Ok(())
}
