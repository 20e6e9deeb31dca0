//! Checksum verification.
//!
//! In check mode each positional path names a list of checksum lines as
//! produced by sum mode. Every line is recomputed and compared; the mask
//! for a directory line comes from that line's own suffix, so lists made
//! with any mask verify without re-specifying it.

use crate::output::{self, ChecksumLine};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use xsum_core::{Hasher, Mask, Sum};

/// Tally of one verification run.
#[derive(Debug, Default)]
pub struct Report {
    pub mismatched: usize,
    pub unreadable: usize,
    pub malformed: usize,
}

impl Report {
    /// Whether every line verified cleanly.
    pub fn ok(&self) -> bool {
        self.mismatched == 0 && self.unreadable == 0 && self.malformed == 0
    }
}

/// Verify every line of every checksum list.
pub async fn run(hasher: Arc<dyn Hasher>, lists: &[PathBuf]) -> Result<Report> {
    let mut report = Report::default();

    for list in lists {
        let content = fs::read_to_string(list)
            .with_context(|| format!("failed to read checksum list `{}'", list.display()))?;
        for (number, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            match output::parse_line(line) {
                Some(parsed) => verify_line(&hasher, parsed, &mut report).await,
                None => {
                    warn!(
                        list = %list.display(),
                        line = number + 1,
                        "improperly formatted checksum line"
                    );
                    report.malformed += 1;
                }
            }
        }
    }

    if report.mismatched > 0 {
        eprintln!(
            "xsum: WARNING: {} computed checksum(s) did NOT match",
            report.mismatched
        );
    }
    if report.unreadable > 0 {
        eprintln!(
            "xsum: WARNING: {} listed path(s) could not be read",
            report.unreadable
        );
    }
    Ok(report)
}

async fn verify_line(hasher: &Arc<dyn Hasher>, line: ChecksumLine, report: &mut Report) {
    let mask = match &line.mask {
        Some(text) => match Mask::parse(text) {
            Ok(mask) => mask,
            Err(err) => {
                warn!(path = %line.path.display(), %err, "bad mask on checksum line");
                report.malformed += 1;
                return;
            }
        },
        None => Mask::default(),
    };

    let sum = Arc::new(Sum::new(Arc::clone(hasher), mask));
    let queue = sum.sum(vec![line.path.clone()]);
    match queue.next().await {
        Some(Ok(node)) => {
            if hex::encode(&node.digest) == line.digest {
                println!("{}: OK", output::slash_path(&line.path));
            } else {
                println!("{}: FAILED", output::slash_path(&line.path));
                report.mismatched += 1;
            }
        }
        Some(Err(err)) => {
            eprintln!("xsum: {err}");
            println!("{}: FAILED open or read", output::slash_path(&line.path));
            report.unreadable += 1;
        }
        None => {}
    }
}
