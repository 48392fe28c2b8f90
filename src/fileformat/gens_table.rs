use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use hdf5::types::VarLenUnicode;
use hdf5::File as H5File;

use crate::utils::strip_chr_prefix;

/// One genotype call inside a requested interval, as reformatted from the
/// toolkit's query output. Chromosome names are stored without any "chr"
/// prefix regardless of the convention of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub genotype: String,
}

impl VariantRecord {
    /// Parse the first five columns of one `bcftools query` row
    /// (%CHROM, %POS, %REF, %ALT, first sample %TGT). Any further sample
    /// columns are ignored; these are per-individual files.
    pub fn from_query_row(row: &csv::StringRecord) -> anyhow::Result<VariantRecord> {
        if row.len() < 5 {
            bail!(
                "expected 5 columns (chrom, pos, ref, alt, genotype), got {}",
                row.len()
            );
        }
        let cell = |i: usize| fix_multiallelic(row.get(i).unwrap_or(""));

        let pos_raw = cell(1);
        let pos: u64 = pos_raw
            .parse()
            .with_context(|| format!("bad variant position '{}'", pos_raw))?;

        Ok(VariantRecord {
            chrom: strip_chr_prefix(cell(0)).to_string(),
            pos,
            ref_allele: cell(2).to_string(),
            alt_allele: cell(3).to_string(),
            genotype: cell(4).to_string(),
        })
    }

    /// A genotype is heterozygous when its two allele components differ.
    /// Either phased (|) or unphased (/) separators are accepted; anything
    /// other than exactly two components is malformed input.
    pub fn is_het(&self) -> anyhow::Result<bool> {
        let mut parts = self.genotype.split(['/', '|']);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(gen1), Some(gen2), None) => Ok(gen1 != gen2),
            _ => bail!(
                "genotype '{}' does not split into exactly two alleles",
                self.genotype
            ),
        }
    }
}

/// The toolkit does not always complete the splitting of multiallelic sites;
/// a cell that still holds a ',' or ';' keeps only its first token. This is
/// applied to every cell of a row, not just the allele columns, so a
/// multi-valued genotype field gets truncated the same way. Known
/// simplification carried over from the upstream workflow.
pub fn fix_multiallelic(cell: &str) -> &str {
    match cell.find([',', ';']) {
        Some(idx) => &cell[..idx],
        None => cell,
    }
}

/// Keep only heterozygous records. Errors on the first malformed genotype.
pub fn filter_hets(records: Vec<VariantRecord>) -> anyhow::Result<Vec<VariantRecord>> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if record.is_het()? {
            out.push(record);
        }
    }
    Ok(out)
}

/// Parse a whole transient query table (headerless TSV) into records.
pub fn read_query_table(path: &Path) -> anyhow::Result<Vec<VariantRecord>> {
    let file = File::open(path)
        .with_context(|| format!("could not open query table {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("failed reading {}", path.display()))?;
        let record = VariantRecord::from_query_row(&row)
            .with_context(|| format!("line {} of {}", i + 1, path.display()))?;
        records.push(record);
    }
    Ok(records)
}

/// Replace characters that are awkward or illegal in HDF5 table keys with
/// '_', so any interval label can be used as a container key.
pub fn fix_natural_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if r"\`*{}[]()>#+-.!$/".contains(c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Keyed container of variant tables: one HDF5 group per table key, one 1-D
/// dataset per column. Written once per run by a single writer.
pub struct GensStore {
    file: H5File,
    path: PathBuf,
}

impl GensStore {
    /// Create the container, replacing any previous file at the same path;
    /// the HDF5 library complains otherwise.
    pub fn create(path: &Path) -> anyhow::Result<GensStore> {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("failed to delete previous output {}", path.display()))?;
        }
        let file = H5File::create(path)
            .with_context(|| format!("could not create output {}", path.display()))?;
        Ok(GensStore {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Store one table under the given key, column by column in the order
    /// chrom, pos, ref, alt, genotype.
    pub fn put(&mut self, key: &str, records: &[VariantRecord]) -> anyhow::Result<()> {
        if self.file.link_exists(key) {
            bail!("table key '{}' already present in {}", key, self.path.display());
        }
        let group = self.file.create_group(key)?;

        let chrom: Vec<String> = records.iter().map(|r| r.chrom.clone()).collect();
        let builder = group.new_dataset_builder();
        let _ = builder
            .with_data(vec_to_h5_string(&chrom)?.as_slice())
            .create("chrom")?;

        let pos: Vec<u64> = records.iter().map(|r| r.pos).collect();
        let builder = group.new_dataset_builder();
        let _ = builder.with_data(pos.as_slice()).create("pos")?;

        let ref_allele: Vec<String> = records.iter().map(|r| r.ref_allele.clone()).collect();
        let builder = group.new_dataset_builder();
        let _ = builder
            .with_data(vec_to_h5_string(&ref_allele)?.as_slice())
            .create("ref")?;

        let alt_allele: Vec<String> = records.iter().map(|r| r.alt_allele.clone()).collect();
        let builder = group.new_dataset_builder();
        let _ = builder
            .with_data(vec_to_h5_string(&alt_allele)?.as_slice())
            .create("alt")?;

        let genotype: Vec<String> = records.iter().map(|r| r.genotype.clone()).collect();
        let builder = group.new_dataset_builder();
        let _ = builder
            .with_data(vec_to_h5_string(&genotype)?.as_slice())
            .create("genotype")?;

        Ok(())
    }
}

/// Read one table back out of a container by key.
pub fn read_gens_table(path: &Path, key: &str) -> anyhow::Result<Vec<VariantRecord>> {
    let file = H5File::open(path)
        .with_context(|| format!("could not open gens table {}", path.display()))?;
    let group = file
        .group(key)
        .with_context(|| format!("no table '{}' in {}", key, path.display()))?;

    let chrom = group.dataset("chrom")?.read_raw::<VarLenUnicode>()?;
    let pos = group.dataset("pos")?.read_raw::<u64>()?;
    let ref_allele = group.dataset("ref")?.read_raw::<VarLenUnicode>()?;
    let alt_allele = group.dataset("alt")?.read_raw::<VarLenUnicode>()?;
    let genotype = group.dataset("genotype")?.read_raw::<VarLenUnicode>()?;

    let n = chrom.len();
    if [pos.len(), ref_allele.len(), alt_allele.len(), genotype.len()]
        .iter()
        .any(|len| *len != n)
    {
        bail!("columns of table '{}' in {} differ in length", key, path.display());
    }

    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        records.push(VariantRecord {
            chrom: chrom[i].as_str().to_string(),
            pos: pos[i],
            ref_allele: ref_allele[i].as_str().to_string(),
            alt_allele: alt_allele[i].as_str().to_string(),
            genotype: genotype[i].as_str().to_string(),
        });
    }
    Ok(records)
}

/// Helper: take a list of strings, and generate a list of HDF5-type strings
fn vec_to_h5_string(list: &[String]) -> anyhow::Result<Vec<VarLenUnicode>> {
    list.iter()
        .map(|f| {
            f.parse::<VarLenUnicode>()
                .map_err(|e| anyhow!("string '{}' not storable in HDF5: {}", f, e))
        })
        .collect()
}
