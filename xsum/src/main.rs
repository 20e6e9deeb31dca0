//! xsum: checksums for files, symlinks, and directory trees.
//!
//! One line per path, in the order the paths were given:
//!
//! ```text
//! xsum -a sha256 -m 7777ug Cargo.toml src
//! ```
//!
//! Directory digests fold in entry names, content, and mask-selected
//! metadata; the mask is echoed after the digest on directory lines.

mod check;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xsum_core::{hash, Mask, Sum};

#[derive(Parser)]
#[command(name = "xsum")]
#[command(about = "Checksums for files, symlinks, and directory trees", long_about = None)]
#[command(version)]
struct Cli {
    /// Hashing algorithm: a native name (md5, sha1, sha224, sha256,
    /// sha384, sha512, blake3) or the path of a plugin executable
    #[arg(short, long, default_value = "sha256")]
    algorithm: String,

    /// Validate checksums read from the given list files
    #[arg(short, long)]
    check: bool,

    /// Directory digest mask: four octal mode digits plus attribute
    /// letters [ugsmcx]
    #[arg(short, long, default_value = "0000")]
    mask: String,

    /// Paths to hash (checksum lists with --check)
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("xsum: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("XSUM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mask = Mask::parse(&cli.mask).context("invalid arguments")?;
    let hasher = hash::parse(&cli.algorithm).context("invalid arguments")?;

    if cli.check {
        let report = check::run(hasher, &cli.paths).await?;
        return Ok(if report.ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let sum = Arc::new(Sum::new(hasher, mask));
    let queue = sum.sum(cli.paths);
    while let Some(result) = queue.next().await {
        match result {
            Ok(node) => println!("{}", output::format_node(&node, &mask)),
            // Per-path failures are reported but never end the run or
            // change the exit code; remaining paths still print.
            Err(err) => eprintln!("xsum: {err}"),
        }
    }
    Ok(ExitCode::SUCCESS)
}
