//! packloc-index - pre-bake light label/title indexes from a translation tree.
//!
//! Reads every translation fragment under the input directory and writes two
//! small documents the engine can load at boot without touching the full
//! tree: `labels.json` (pack id to translated label) and `titles.json` (pack
//! id to title/folder maps).

use clap::{CommandFactory, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

mod error;
mod index;

use error::CliResult;
use index::{GeneratorOptions, generate};

/// Pre-bake labels.json and titles.json from a translation tree
#[derive(Parser)]
#[command(name = "packloc-index")]
#[command(version)]
#[command(about = "Pre-bake light label/title indexes from a translation tree")]
struct Cli {
    /// Translation tree to scan
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output path for the label index [default: <input>/labels.json]
    #[arg(long)]
    labels_output: Option<PathBuf>,

    /// Output path for the title index [default: <input>/titles.json]
    #[arg(long)]
    titles_output: Option<PathBuf>,

    /// Do not descend into subdirectories
    #[arg(long)]
    no_recursive: bool,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Also index *_packs-folders.json fragments
    #[arg(long)]
    include_folders: bool,

    /// Print both indexes to stdout without writing files
    #[arg(long)]
    dry_run: bool,

    /// Index name fields of nested objects, keyed by the containing key
    #[arg(long)]
    deep: bool,
}

fn main() {
    let cli = Cli::parse();
    let Some(input) = cli.input.clone() else {
        let _ = Cli::command().print_help();
        process::exit(1);
    };

    if let Err(e) = run(&cli, &input) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli, input: &Path) -> CliResult<()> {
    let options = GeneratorOptions {
        recursive: !cli.no_recursive,
        include_folders: cli.include_folders,
        deep: cli.deep,
    };
    let indexes = generate(input, &options)?;

    let labels_doc = indexes.labels_json(!cli.compact)?;
    let titles_doc = indexes.titles_json(!cli.compact)?;

    if cli.dry_run {
        print!("{labels_doc}");
        print!("{titles_doc}");
        return Ok(());
    }

    let labels_output = cli
        .labels_output
        .clone()
        .unwrap_or_else(|| input.join("labels.json"));
    let titles_output = cli
        .titles_output
        .clone()
        .unwrap_or_else(|| input.join("titles.json"));

    write_document(&labels_output, &labels_doc)?;
    write_document(&titles_output, &titles_doc)?;

    println!(
        "wrote {} ({} labels)",
        labels_output.display(),
        indexes.labels.len()
    );
    println!(
        "wrote {} ({} packs, {} titles, {} folders)",
        titles_output.display(),
        indexes.pack_count(),
        indexes.title_count(),
        indexes.folder_count()
    );
    Ok(())
}

fn write_document(path: &Path, document: &str) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, document)?;
    Ok(())
}
