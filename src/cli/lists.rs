use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_space, wprintln, write_json};
use crate::innodb::space::Space;
use crate::util::hex;
use crate::Result;

pub struct ListsOptions {
    pub file: String,
    pub list: Option<String>,
    pub reverse: bool,
    pub page_size: Option<u32>,
    pub json: bool,
}

#[derive(Serialize)]
struct BaseNodeJson {
    name: &'static str,
    length: u32,
    first: Option<(u32, u16)>,
    last: Option<(u32, u16)>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MemberJson {
    Xdes {
        address: (u32, u16),
        start_page: u32,
        state: String,
        fseg_id: u64,
    },
    InodePage {
        address: (u32, u16),
        page: u32,
    },
}

pub fn execute(opts: &ListsOptions, writer: &mut dyn Write) -> Result<()> {
    let space = open_space(&opts.file, opts.page_size)?;

    match &opts.list {
        None => show_bases(&space, opts.json, writer),
        Some(name) => show_members(&space, name, opts.reverse, opts.json, writer),
    }
}

fn show_bases(space: &Space, json: bool, writer: &mut dyn Write) -> Result<()> {
    if json {
        let out: Vec<BaseNodeJson> = space
            .each_xdes_list()
            .into_iter()
            .map(|(name, list)| BaseNodeJson {
                name,
                length: list.length,
                first: list.first.some().map(|a| (a.page, a.offset)),
                last: list.last.some().map(|a| (a.page, a.offset)),
            })
            .collect();
        return write_json(&out, writer);
    }
    wprintln!(writer, "{}", "Space lists".bold())?;
    for (name, list) in space.each_xdes_list() {
        wprintln!(
            writer,
            "  {:<12} length {:>6}  first {:<12} last {}",
            name,
            list.length,
            hex::fil_addr(&list.first),
            hex::fil_addr(&list.last)
        )?;
    }
    Ok(())
}

fn show_members(
    space: &Space,
    name: &str,
    reverse: bool,
    json: bool,
    writer: &mut dyn Write,
) -> Result<()> {
    let base = space.list(name)?.clone();
    let inode_list = matches!(name, "full_inodes" | "free_inodes");

    let mut members = Vec::new();
    if inode_list {
        for item in space.each_list_inode_pages(&base) {
            let (addr, page) = item?;
            members.push(MemberJson::InodePage {
                address: (addr.page, addr.offset),
                page,
            });
        }
        if reverse {
            members.reverse();
        }
    } else if reverse {
        for item in space.each_list_xdes_reverse(&base) {
            let (addr, xdes) = item?;
            members.push(MemberJson::Xdes {
                address: (addr.page, addr.offset),
                start_page: xdes.start_page,
                state: xdes.entry.state.name().to_string(),
                fseg_id: xdes.entry.fseg_id,
            });
        }
    } else {
        for item in space.each_list_xdes(&base) {
            let (addr, xdes) = item?;
            members.push(MemberJson::Xdes {
                address: (addr.page, addr.offset),
                start_page: xdes.start_page,
                state: xdes.entry.state.name().to_string(),
                fseg_id: xdes.entry.fseg_id,
            });
        }
    }

    if json {
        return write_json(&members, writer);
    }

    wprintln!(
        writer,
        "{}",
        format!("List {} (length {})", name, base.length).bold()
    )?;
    for member in &members {
        match member {
            MemberJson::Xdes {
                address,
                start_page,
                state,
                fseg_id,
            } => wprintln!(
                writer,
                "  ({}, {})  extent at {:>8}  {:<10} fseg {}",
                address.0,
                address.1,
                start_page,
                state,
                fseg_id
            )?,
            MemberJson::InodePage { address, page } => {
                wprintln!(writer, "  ({}, {})  inode page {}", address.0, address.1, page)?
            }
        }
    }
    Ok(())
}
