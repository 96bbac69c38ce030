#[cfg(not(feature = "cli"))]
compile_error!("The `innospect` binary requires the `cli` feature.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use innospect::cli;
use innospect::cli::app::{Cli, ColorMode, Commands};
use innospect::InnoError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, InnoError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| InnoError::Io(format!("cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };
    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Summary {
            file,
            page_size,
            json,
        } => cli::summary::execute(
            &cli::summary::SummaryOptions {
                file,
                page_size,
                json,
            },
            &mut writer,
        ),

        Commands::Pages {
            file,
            page,
            page_size,
            json,
        } => cli::pages::execute(
            &cli::pages::PagesOptions {
                file,
                page,
                page_size,
                json,
            },
            &mut writer,
        ),

        Commands::Lists {
            file,
            list,
            reverse,
            page_size,
            json,
        } => cli::lists::execute(
            &cli::lists::ListsOptions {
                file,
                list,
                reverse,
                page_size,
                json,
            },
            &mut writer,
        ),

        Commands::Extents {
            file,
            page_size,
            json,
        } => cli::extents::execute(
            &cli::extents::ExtentsOptions {
                file,
                page_size,
                json,
            },
            &mut writer,
        ),

        Commands::Inodes {
            file,
            page_size,
            json,
        } => cli::inodes::execute(
            &cli::inodes::InodesOptions {
                file,
                page_size,
                json,
            },
            &mut writer,
        ),

        Commands::Page {
            file,
            page,
            dump,
            account,
            page_size,
            json,
        } => cli::page::execute(
            &cli::page::PageOptions {
                file,
                page,
                dump,
                account,
                page_size,
                json,
            },
            &mut writer,
        ),

        Commands::Btree {
            file,
            page,
            level,
            describer,
            format,
            page_size,
        } => cli::btree::execute(
            &cli::btree::BtreeOptions {
                file,
                page,
                level,
                describer,
                format,
                page_size,
            },
            &mut writer,
        ),

        Commands::Log {
            file,
            blocks,
            no_empty,
            json,
        } => cli::log::execute(
            &cli::log::LogOptions {
                file,
                blocks,
                no_empty,
                json,
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "innospect", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
