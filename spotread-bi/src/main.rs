//! Book Importer (spotread-bi) - Main entry point
//!
//! Command-line tool that imports EPUB/Markdown books into the SpotRead
//! library folder and lists what is already there.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spotread_bi::pipeline;
use spotread_common::config::resolve_library_folder;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for spotread-bi
#[derive(Parser, Debug)]
#[command(name = "spotread-bi")]
#[command(about = "Book Importer for SpotRead")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import one or more book files (.epub, .md)
    Import {
        /// Book files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Library folder to import into
        #[arg(short, long, env = "SPOTREAD_LIBRARY")]
        library: Option<PathBuf>,
    },

    /// List books in the library
    List {
        /// Library folder to list
        #[arg(short, long, env = "SPOTREAD_LIBRARY")]
        library: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spotread_bi=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Import { files, library } => {
            let library = resolve_library(library)?;
            info!("Importing into library: {}", library.display());

            let mut failures = 0usize;
            for file in &files {
                match pipeline::import_file(file, &library) {
                    Ok(summary) => {
                        println!(
                            "{}  {} — {} ({} chapters, {} paragraphs)",
                            summary.book_id,
                            summary.title,
                            summary.author,
                            summary.chapter_count,
                            summary.paragraph_count
                        );
                    }
                    Err(e) => {
                        error!("Failed to import {}: {}", file.display(), e);
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                bail!("{} of {} imports failed", failures, files.len());
            }
            Ok(())
        }
        Command::List { library } => {
            let library = resolve_library(library)?;
            let books = pipeline::list_books(&library)
                .with_context(|| format!("Failed to list library {}", library.display()))?;
            if books.is_empty() {
                println!("No books in {}", library.display());
            }
            for book in books {
                println!(
                    "{}  {} — {} ({} chapters, {} paragraphs)",
                    book.id, book.title, book.author, book.chapter_count, book.paragraph_count
                );
            }
            Ok(())
        }
    }
}

fn resolve_library(cli: Option<PathBuf>) -> Result<PathBuf> {
    let cli_str = cli.as_ref().map(|p| p.to_string_lossy().into_owned());
    resolve_library_folder(cli_str.as_deref(), "SPOTREAD_LIBRARY")
        .context("Failed to resolve library folder")
}
