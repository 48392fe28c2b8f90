use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

/// One requested interval: a chromosome range plus the label naming its
/// table in the output container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub stop: u64,
    pub label: String,
}

impl Interval {
    /// Region string in the `chrom:start-stop` form the toolkit expects.
    pub fn region(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.stop)
    }

    /// Parse a single `chrom:start-stop` locus from the command line.
    /// The raw locus string doubles as the label.
    pub fn from_locus(locus: &str) -> anyhow::Result<Interval> {
        let err = || format!("malformed locus '{}', expected chrom:start-stop", locus);
        let (chrom, range) = locus.split_once(':').with_context(err)?;
        let (start, stop) = range.split_once('-').with_context(err)?;
        if chrom.is_empty() {
            bail!(err());
        }
        Ok(Interval {
            chrom: chrom.to_string(),
            start: start.parse().with_context(err)?,
            stop: stop.parse().with_context(err)?,
            label: locus.to_string(),
        })
    }
}

/// Read a tab-separated interval-list file with the columns
/// chrom, start, stop, label. Lines starting with '#' are comments.
pub fn read_interval_file(path: &Path) -> anyhow::Result<Vec<Interval>> {
    let file = File::open(path)
        .with_context(|| format!("could not open interval file {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .from_reader(BufReader::new(file));

    let mut intervals: Vec<Interval> = Vec::new();
    for result in reader.deserialize() {
        let interval: Interval = result
            .with_context(|| format!("failed parsing interval file {}", path.display()))?;
        intervals.push(interval);
    }
    if intervals.is_empty() {
        println!("Warning: interval file {} lists no intervals", path.display());
    }
    Ok(intervals)
}
