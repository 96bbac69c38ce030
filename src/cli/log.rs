use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{wprintln, write_json};
use crate::innodb::log::{LogBlock, LogCheckpoint, LogFile, LogFileHeader};
use crate::Result;

pub struct LogOptions {
    pub file: String,
    pub blocks: Option<u64>,
    pub no_empty: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct LogJson {
    file: String,
    file_size: u64,
    total_blocks: u64,
    data_blocks: u64,
    header: LogFileHeader,
    checkpoint_1: Option<LogCheckpoint>,
    checkpoint_2: Option<LogCheckpoint>,
    blocks: Vec<LogBlock>,
}

pub fn execute(opts: &LogOptions, writer: &mut dyn Write) -> Result<()> {
    let mut log = LogFile::open(&opts.file)?;
    let header = log.read_header()?;
    let cp1 = log.read_checkpoint(0).ok();
    let cp2 = log.read_checkpoint(1).ok();

    let limit = opts.blocks.unwrap_or(u64::MAX);
    let mut blocks = Vec::new();
    for block in log.each_block() {
        if blocks.len() as u64 >= limit {
            break;
        }
        let block = block?;
        if opts.no_empty && !block.header.has_data() {
            continue;
        }
        blocks.push(block);
    }

    if opts.json {
        return write_json(
            &LogJson {
                file: opts.file.clone(),
                file_size: log.file_size(),
                total_blocks: log.block_count(),
                data_blocks: log.data_block_count(),
                header,
                checkpoint_1: cp1,
                checkpoint_2: cp2,
                blocks,
            },
            writer,
        );
    }

    wprintln!(writer, "{}", "Redo log".bold())?;
    wprintln!(writer, "  File:        {}", opts.file)?;
    wprintln!(writer, "  Size:        {} bytes", log.file_size())?;
    wprintln!(
        writer,
        "  Blocks:      {} total, {} data",
        log.block_count(),
        log.data_block_count()
    )?;
    wprintln!(writer, "  Group id:    {}", header.group_id)?;
    wprintln!(writer, "  Start LSN:   {}", header.start_lsn)?;
    if !header.created_by.is_empty() {
        wprintln!(writer, "  Created by:  {}", header.created_by)?;
    }
    for (i, cp) in [&cp1, &cp2].iter().enumerate() {
        if let Some(cp) = cp {
            wprintln!(
                writer,
                "  Checkpoint {}: number {}, lsn {}",
                i + 1,
                cp.number,
                cp.lsn
            )?;
        }
    }
    wprintln!(writer)?;
    wprintln!(
        writer,
        "{}",
        format!(
            "{:>8}  {:>6} {:>6}  {:<8}  record",
            "block", "len", "first", "checksum"
        )
        .bold()
    )?;
    for b in &blocks {
        let record = match &b.record {
            Some(r) => format!(
                "{} space {} page {}",
                r.record_type.name(),
                r.space.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
                r.page_number
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".into())
            ),
            None => "-".to_string(),
        };
        wprintln!(
            writer,
            "{:>8}  {:>6} {:>6}  {:<8}  {}",
            b.block_number,
            b.header.data_length,
            b.header.first_rec_group,
            if b.checksum_valid { "ok" } else { "mismatch" },
            record
        )?;
    }
    Ok(())
}
