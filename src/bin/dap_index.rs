//! Command-line driver: build a DAP index from a list of reference files, or
//! reload one and print a summary of its run-length BWT and profile streams.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dap_index::builder::DapBuilder;
use dap_index::index::DapIndex;
use dap_index::options::{BuildOptions, DEFAULT_HASH_MOD, DEFAULT_WINDOW};
use dap_index::pfp::{self, PfpParams};
use dap_index::refs::RefCatalog;

#[derive(Parser)]
#[command(name = "dap-index", version, about = "Document Array Profiles over a prefix-free parse")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a DAP index from a newline-separated list of reference files.
    Build {
        /// Path to a file listing one reference path per line.
        #[arg(short = 'f', long = "filelist")]
        file_list: PathBuf,
        /// Prefix for the output streams (`<output>.bwt.heads`, `.sdap`, ...).
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        /// Karp-Rabin window size triggering phrase boundaries.
        #[arg(short = 'w', long = "window", default_value_t = DEFAULT_WINDOW)]
        window: usize,
        /// Hash modulus a phrase boundary must satisfy.
        #[arg(short = 'p', long = "modulus", default_value_t = DEFAULT_HASH_MOD)]
        modulus: u64,
    },
    /// Reload a previously built index and print a summary.
    Run {
        /// Prefix the index was built under.
        #[arg(short = 'i', long = "index")]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Build {
            file_list,
            output,
            window,
            modulus,
        } => build(file_list, output, window, modulus),
        Command::Run { index } => run(index),
    }
}

fn build(file_list: PathBuf, output: PathBuf, window: usize, modulus: u64) -> Result<()> {
    let options = BuildOptions::new(file_list, output, window, modulus)
        .context("invalid build options")?;

    let (refs, fna_path) = RefCatalog::build_from_file_list(&options.file_list, &options.output_prefix)
        .context("failed to assemble reference catalog")?;

    let text = std::fs::read(&fna_path)
        .with_context(|| format!("failed to read concatenated reference text at {}", fna_path.display()))?;

    let pfp = pfp::build(&text, PfpParams { w: options.w, hash_mod: options.hash_mod })
        .context("failed to construct prefix-free parse")?;

    DapBuilder::new(&pfp, &refs)
        .build(&options.output_prefix)
        .context("failed to build DAP index")?;

    log::info!("build complete: {}", options.output_prefix.display());
    Ok(())
}

fn run(index_prefix: PathBuf) -> Result<()> {
    let index = DapIndex::load(&index_prefix)
        .with_context(|| format!("failed to load index at {}", index_prefix.display()))?;

    println!("text length:  {}", index.len());
    println!("documents:    {}", index.num_docs());
    println!("BWT runs:     {}", index.num_runs());
    Ok(())
}
