use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::app::TreeFormat;
use crate::cli::{open_space, wprintln, write_json};
use crate::innodb::btree::Btree;
use crate::innodb::dict;
use crate::innodb::index::IndexPage;
use crate::innodb::record::RecordDescriber;
use crate::{InnoError, Result};

pub struct BtreeOptions {
    pub file: String,
    pub page: u64,
    pub level: Option<u16>,
    pub describer: Option<String>,
    pub format: TreeFormat,
    pub page_size: Option<u32>,
}

#[derive(Serialize)]
struct VisitJson {
    page: u64,
    level: u16,
    n_recs: u16,
    depth: usize,
}

#[derive(Serialize)]
struct LinkJson {
    parent: u64,
    child: u32,
    min_key: String,
    depth: usize,
}

#[derive(Serialize)]
struct TreeJson {
    root_page: u64,
    index_id: u64,
    pages: Vec<VisitJson>,
    links: Vec<LinkJson>,
}

pub fn execute(opts: &BtreeOptions, writer: &mut dyn Write) -> Result<()> {
    let space = open_space(&opts.file, opts.page_size)?;
    let btree = Btree::new(&space, opts.page)?;

    let describer: Option<Box<dyn RecordDescriber>> = match &opts.describer {
        Some(name) => Some(dict::describer_for(name).ok_or_else(|| {
            InnoError::Schema(format!(
                "no built-in describer named {:?} (try SYS_TABLES, SYS_COLUMNS, SYS_INDEXES, SYS_FIELDS)",
                name
            ))
        })?),
        None => None,
    };

    if let Some(level) = opts.level {
        return walk_level(&btree, level, describer.as_deref(), writer);
    }

    // A lone leaf root can be shown without a schema; anything deeper needs
    // the describer to locate child page numbers.
    if btree.root_level() > 0 && describer.is_none() {
        return Err(InnoError::Schema(
            "traversing a multi-level tree needs --describer to decode node pointers".to_string(),
        ));
    }

    match describer {
        Some(d) => traverse(&btree, d.as_ref(), opts.format, writer),
        None => show_lone_leaf(&space, &btree, opts.format, writer),
    }
}

fn traverse(
    btree: &Btree<'_>,
    describer: &dyn RecordDescriber,
    format: TreeFormat,
    writer: &mut dyn Write,
) -> Result<()> {
    let mut pages = Vec::new();
    let mut links = Vec::new();
    btree.recurse(
        describer,
        &mut |page, header, depth| {
            pages.push(VisitJson {
                page: page.number(),
                level: header.level,
                n_recs: header.n_recs,
                depth,
            });
        },
        &mut |parent, child, min_key, depth| {
            links.push(LinkJson {
                parent,
                child,
                min_key: min_key.key_string(),
                depth,
            });
        },
    )?;

    match format {
        TreeFormat::Json => write_json(
            &TreeJson {
                root_page: btree.root_page(),
                index_id: btree.index_id(),
                pages,
                links,
            },
            writer,
        ),
        TreeFormat::Dot => {
            wprintln!(writer, "digraph btree {{")?;
            wprintln!(writer, "  node [shape=record];")?;
            for p in &pages {
                wprintln!(
                    writer,
                    "  page_{} [label=\"page {}|level {}|{} recs\"];",
                    p.page,
                    p.page,
                    p.level,
                    p.n_recs
                )?;
            }
            for l in &links {
                wprintln!(
                    writer,
                    "  page_{} -> page_{} [label=\"{}\"];",
                    l.parent,
                    l.child,
                    l.min_key.replace('"', "'")
                )?;
            }
            wprintln!(writer, "}}")
        }
        TreeFormat::Human => {
            wprintln!(
                writer,
                "{}",
                format!(
                    "Index {} rooted at page {}",
                    btree.index_id(),
                    btree.root_page()
                )
                .bold()
            )?;
            for p in &pages {
                let indent = "  ".repeat(p.depth);
                wprintln!(
                    writer,
                    "{}page {} (level {}, {} records)",
                    indent,
                    p.page,
                    p.level,
                    p.n_recs
                )?;
                for l in links.iter().filter(|l| l.parent == p.page) {
                    wprintln!(
                        writer,
                        "{}  -> page {} from key {}",
                        indent,
                        l.child,
                        l.min_key
                    )?;
                }
            }
            Ok(())
        }
    }
}

fn walk_level(
    btree: &Btree<'_>,
    level: u16,
    describer: Option<&dyn RecordDescriber>,
    writer: &mut dyn Write,
) -> Result<()> {
    let describer = match describer {
        Some(d) => d,
        None if btree.root_level() == 0 && level == 0 => {
            // A lone leaf needs no descent, hence no schema.
            return show_level_header_only(btree, writer);
        }
        None => {
            return Err(InnoError::Schema(
                "walking a level needs --describer to locate the leftmost page".to_string(),
            ))
        }
    };
    wprintln!(writer, "{}", format!("Level {}", level).bold())?;
    for page in btree.each_page_at_level(level, describer)? {
        let page = page?;
        let view = IndexPage::new(&page)?;
        wprintln!(
            writer,
            "  page {:>8}: {} records, prev {}, next {}",
            page.number(),
            view.header().n_recs,
            crate::util::hex::page_ref(page.fil().prev_page),
            crate::util::hex::page_ref(page.fil().next_page)
        )?;
    }
    Ok(())
}

fn show_level_header_only(btree: &Btree<'_>, writer: &mut dyn Write) -> Result<()> {
    wprintln!(writer, "{}", "Level 0".bold())?;
    wprintln!(writer, "  page {:>8}: root leaf", btree.root_page())
}

fn show_lone_leaf(
    space: &crate::innodb::space::Space,
    btree: &Btree<'_>,
    format: TreeFormat,
    writer: &mut dyn Write,
) -> Result<()> {
    let page = space.page(btree.root_page())?;
    let view = IndexPage::new(&page)?;
    let header = view.header().clone();
    let chain: Vec<(usize, u16)> = view
        .record_chain()?
        .map(|r| r.map(|(origin, h)| (origin, h.heap_number)))
        .collect::<Result<_>>()?;

    if format == TreeFormat::Json {
        #[derive(Serialize)]
        struct LeafJson {
            root_page: u64,
            index_id: u64,
            level: u16,
            n_recs: u16,
            record_origins: Vec<usize>,
        }
        return write_json(
            &LeafJson {
                root_page: btree.root_page(),
                index_id: btree.index_id(),
                level: header.level,
                n_recs: header.n_recs,
                record_origins: chain.iter().map(|(o, _)| *o).collect(),
            },
            writer,
        );
    }

    wprintln!(
        writer,
        "{}",
        format!(
            "Index {} is a single leaf at page {}",
            btree.index_id(),
            btree.root_page()
        )
        .bold()
    )?;
    wprintln!(writer, "  {} records:", header.n_recs)?;
    for (origin, heap_no) in &chain {
        wprintln!(writer, "    record at {:>6} (heap {})", origin, heap_no)?;
    }
    Ok(())
}
