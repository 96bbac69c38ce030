use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI definition for the `innospect` binary.
#[derive(Parser)]
#[command(name = "innospect")]
#[command(about = "Read-only InnoDB tablespace and redo-log inspector")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Controls when colored output is emitted.
#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Output shape for the btree subcommand.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TreeFormat {
    /// Indented tree, one line per page.
    Human,
    /// Graphviz DOT digraph of pages and child links.
    Dot,
    /// JSON array of visited pages and links.
    Json,
}

/// Available subcommands for the `innospect` CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Space-level summary
    ///
    /// Opens a tablespace, reports its detected page size, page count, and
    /// FSP header fields (space id, size, free limit, flags, list lengths),
    /// then collapses the page sequence into runs of equal page type so the
    /// gross layout of the file is visible at a glance.
    Summary {
        /// Path to a tablespace file (.ibd or ibdata)
        #[arg(short, long)]
        file: String,

        /// Override page size in bytes (default: auto-detect)
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Per-page FIL header listing
    ///
    /// Walks every page and prints its type, LSN, and prev/next pointers
    /// from the FIL header. With `--page` only that page is shown. Checksum
    /// and LSN consistency are verified and reported, never enforced.
    Pages {
        /// Path to a tablespace file
        #[arg(short, long)]
        file: String,

        /// Show a single page
        #[arg(short, long)]
        page: Option<u64>,

        /// Override page size in bytes (default: auto-detect)
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Space-level lists and their members
    ///
    /// Without `--list`, prints every list base node reachable from the FSP
    /// header. With `--list <name>`, walks that list and prints each member:
    /// extent descriptors for the free/free_frag/full_frag lists, inode page
    /// numbers for the full_inodes/free_inodes lists. `--reverse` walks from
    /// the tail via prev pointers.
    Lists {
        /// Path to a tablespace file
        #[arg(short, long)]
        file: String,

        /// Walk the named list
        #[arg(short, long)]
        list: Option<String>,

        /// Walk from last to first
        #[arg(long)]
        reverse: bool,

        /// Override page size in bytes (default: auto-detect)
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Extent descriptor iteration
    ///
    /// Prints every XDES entry covering the file: extent start page, state
    /// (FREE, FREE_FRAG, FULL_FRAG, FSEG), owning segment id, and the number
    /// of free pages in the extent's bitmap.
    Extents {
        /// Path to a tablespace file
        #[arg(short, long)]
        file: String,

        /// Override page size in bytes (default: auto-detect)
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// File segment (inode) iteration
    ///
    /// Walks the space's inode-page lists and prints every used file
    /// segment: id, fragment pages, the three extent list lengths, and the
    /// resulting fill factor.
    Inodes {
        /// Path to a tablespace file
        #[arg(short, long)]
        file: String,

        /// Override page size in bytes (default: auto-detect)
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Single-page deep dive
    ///
    /// Decodes one page through the typed page factory and prints the
    /// type-specific view: FSP header, XDES array, inode slots, index
    /// header with records, or the transaction system. `--dump` adds a hex
    /// dump; `--account` explains how the page is reachable from the space
    /// management structures (extent, segment, list, index).
    Page {
        /// Path to a tablespace file
        #[arg(short, long)]
        file: String,

        /// Page number to inspect
        #[arg(short, long)]
        page: u64,

        /// Hex dump of the raw page bytes
        #[arg(long)]
        dump: bool,

        /// Space-management accounting for the page
        #[arg(long)]
        account: bool,

        /// Override page size in bytes (default: auto-detect)
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// B-tree traversal
    ///
    /// Recursively descends the index rooted at `--page`, printing each page
    /// with its level and record count, and each parent-to-child link with
    /// the child's minimum key. `--level N` instead walks one level left to
    /// right. `--describer` selects a built-in record describer (SYS_TABLES,
    /// SYS_COLUMNS, SYS_INDEXES, SYS_FIELDS) for decoding keys; without one,
    /// only a lone leaf root can be shown.
    Btree {
        /// Path to a tablespace file
        #[arg(short, long)]
        file: String,

        /// Root page of the index
        #[arg(short, long)]
        page: u64,

        /// Walk a single level instead of recursing
        #[arg(short, long)]
        level: Option<u16>,

        /// Built-in describer name for record decoding
        #[arg(short, long)]
        describer: Option<String>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: TreeFormat,

        /// Override page size in bytes (default: auto-detect)
        #[arg(long = "page-size")]
        page_size: Option<u32>,
    },

    /// Redo log block listing
    ///
    /// Parses a redo log file: the file header, both checkpoint slots, and
    /// every 512-byte data block with its number, data length, checksum
    /// state, and the type/space/page of the first record group starting in
    /// the block. `--no-empty` hides blocks without data.
    Log {
        /// Path to a redo log file (ib_logfile*)
        #[arg(short, long)]
        file: String,

        /// Show at most this many data blocks
        #[arg(short, long)]
        blocks: Option<u64>,

        /// Skip blocks with no record data
        #[arg(short = 'e', long = "no-empty")]
        no_empty: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
