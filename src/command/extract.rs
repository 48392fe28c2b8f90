use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

use crate::fileformat::bed::{read_interval_file, Interval};
use crate::fileformat::gens_table::{
    filter_hets, fix_natural_name, read_query_table, GensStore, VariantRecord,
};
use crate::utils::{check_bcftools, first_stdout_line};
use crate::utils::{reconcile_chrom, strip_chr_prefix};
use crate::utils::{Pipeline, Stage};

/// Columns pulled per call: chromosome, position, ref, alt, then one
/// translated genotype per sample. The toolkit expands the escapes itself.
pub const QUERY_FORMAT: &str = "%CHROM\\t%POS\\t%REF\\t%ALT[\\t%TGT]\\n";

/// Reformat one individual's genotype calls over requested intervals into
/// tables of variant records.
pub struct Extract {
    pub path_vcf: PathBuf,
    pub locus: String,
    pub path_outdir: PathBuf,
    pub name: Option<String>,
    pub keep_hom: bool,
    pub bed_mode: bool,
    pub whole_chrom: bool,
}
impl Extract {
    pub fn run(params: &Extract) -> anyhow::Result<()> {
        fs::create_dir_all(&params.path_outdir).with_context(|| {
            format!("could not create output directory {}", params.path_outdir.display())
        })?;

        let _version = check_bcftools()?;

        if !params.bed_mode && locus_is_interval_file(&params.locus) {
            bail!("Must specify --bed to analyze an interval file of loci");
        }

        let vcf_has_prefix = vcf_has_chr_prefix(&params.path_vcf)?;

        if params.bed_mode {
            params.run_interval_file(vcf_has_prefix)
        } else {
            params.run_single(vcf_has_prefix)
        }
    }

    /// One table per interval-file row, all in one keyed container.
    fn run_interval_file(&self, vcf_has_prefix: bool) -> anyhow::Result<()> {
        let name = self
            .name
            .as_deref()
            .context("an output name is required with --bed")?;
        let path_out = self.path_outdir.join(format!("{}.h5", name));

        println!("Analyzing BED file {}", self.locus);
        let intervals = read_interval_file(Path::new(&self.locus))?;

        let mut store = GensStore::create(&path_out)?;
        let mut skipped: Vec<String> = Vec::new();
        for interval in &intervals {
            let query = Interval {
                chrom: self.query_chrom_for(&interval.chrom, vcf_has_prefix),
                ..interval.clone()
            };

            let records = self.query_records(&query.chrom, &query.region())?;
            if !store_interval_table(&mut store, &interval.label, records, self.keep_hom)? {
                skipped.push(interval.label.clone());
            }
        }

        if !skipped.is_empty() {
            println!(
                "No table written for {} of {} intervals: {}",
                skipped.len(),
                intervals.len(),
                skipped.join(", ")
            );
        }
        Ok(())
    }

    /// A single locus, or a whole chromosome, into one single-table file.
    fn run_single(&self, vcf_has_prefix: bool) -> anyhow::Result<()> {
        let (query_chrom, region) = if self.whole_chrom {
            let query_chrom = self.query_chrom_for(&self.locus, vcf_has_prefix);
            println!("Running whole chromosome {}", self.locus);
            let region = query_chrom.clone();
            (query_chrom, region)
        } else {
            let mut interval = Interval::from_locus(&self.locus)?;
            interval.chrom = self.query_chrom_for(&interval.chrom, vcf_has_prefix);
            println!("Running single locus {}", self.locus);
            let region = interval.region();
            (interval.chrom, region)
        };

        let records = self.query_records(&query_chrom, &region)?;

        let name = single_output_name(&self.name, &query_chrom);
        let path_out = self.path_outdir.join(format!("{}.hdf5", name));
        write_single_table(&path_out, records, self.keep_hom)?;
        Ok(())
    }

    /// Pull the region through view, norm and query, then parse the
    /// transient table it lands in. The table file is removed once parsed;
    /// a parse failure leaves it behind for inspection.
    fn query_records(&self, query_chrom: &str, region: &str) -> anyhow::Result<Vec<VariantRecord>> {
        let pipeline = Pipeline::new()
            .stage(
                Stage::new("bcftools")
                    .arg("view")
                    .arg("-r")
                    .arg(region)
                    .arg(self.path_vcf.display().to_string()),
            )
            .stage(Stage::new("bcftools").arg("norm").arg("-m").arg("-"))
            .stage(Stage::new("bcftools").arg("query").arg("-f").arg(QUERY_FORMAT));
        log::debug!("{}", pipeline.describe());
        let output = pipeline.run()?;

        let path_table = self
            .path_outdir
            .join(format!("{}_prechrtable.txt", query_chrom));
        fs::write(&path_table, &output.stdout)
            .with_context(|| format!("could not write {}", path_table.display()))?;
        let records = read_query_table(&path_table)?;
        fs::remove_file(&path_table)
            .with_context(|| format!("could not remove {}", path_table.display()))?;
        Ok(records)
    }

    /// Chromosome name in the naming convention of the genotype file.
    fn query_chrom_for(&self, requested: &str, vcf_has_prefix: bool) -> String {
        let query_chrom = reconcile_chrom(requested, vcf_has_prefix);
        if query_chrom != requested {
            log::warn!(
                "Chromosome notation of '{}' does not match {}; querying '{}'",
                requested,
                self.path_vcf.display(),
                query_chrom
            );
        }
        query_chrom
    }
}

/// Filter one interval's records and store them under its label, or skip
/// the interval when nothing qualifies. Returns whether a table was written.
fn store_interval_table(
    store: &mut GensStore,
    label: &str,
    records: Vec<VariantRecord>,
    keep_hom: bool,
) -> anyhow::Result<bool> {
    let records = if keep_hom { records } else { filter_hets(records)? };
    if records.is_empty() {
        println!("{} Moving on.", empty_result_message(keep_hom));
        return Ok(false);
    }

    store.put(&fix_natural_name(label), &records)?;
    println!("{} done.", label);
    Ok(true)
}

/// Write the one-table output file under the key `all`, or nothing at all
/// when no records qualify. Returns whether the file was written.
fn write_single_table(
    path_out: &Path,
    records: Vec<VariantRecord>,
    keep_hom: bool,
) -> anyhow::Result<bool> {
    let records = if keep_hom { records } else { filter_hets(records)? };
    if records.is_empty() {
        println!("{} Exiting.", empty_result_message(keep_hom));
        return Ok(false);
    }

    let mut store = GensStore::create(path_out)?;
    store.put("all", &records)?;
    println!("Wrote {}", path_out.display());
    Ok(true)
}

/// Naming convention of the genotype file, read off its first data line.
/// A file with no variant records cannot be queried meaningfully.
fn vcf_has_chr_prefix(path_vcf: &Path) -> anyhow::Result<bool> {
    let stage = Stage::new("bcftools")
        .arg("view")
        .arg("-H")
        .arg(path_vcf.display().to_string());
    let first = first_stdout_line(&stage)?;
    let line = match first {
        Some(line) if !line.trim().is_empty() => line,
        _ => bail!(
            "{} has no variant records; cannot determine its chromosome naming",
            path_vcf.display()
        ),
    };
    let chrom = line.split('\t').next().unwrap_or("");
    Ok(chrom.starts_with("chr"))
}

fn locus_is_interval_file(locus: &str) -> bool {
    locus.to_ascii_lowercase().ends_with(".bed")
}

fn single_output_name(name: &Option<String>, query_chrom: &str) -> String {
    match name {
        Some(name) => name.clone(),
        None => format!("chr{}_gens", strip_chr_prefix(query_chrom)),
    }
}

fn empty_result_message(keep_hom: bool) -> &'static str {
    if keep_hom {
        "No variants in this region for this individual."
    } else {
        "No heterozygous variants in this region for this individual."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileformat::gens_table::read_gens_table;

    fn temp_h5(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "vartab_extract_{}_{}.h5",
            std::process::id(),
            name
        ))
    }

    fn record(chrom: &str, pos: u64, r: &str, a: &str, gt: &str) -> VariantRecord {
        VariantRecord {
            chrom: chrom.to_string(),
            pos,
            ref_allele: r.to_string(),
            alt_allele: a.to_string(),
            genotype: gt.to_string(),
        }
    }

    #[test]
    fn test_single_output_name_default() {
        assert_eq!(single_output_name(&None, "21"), "chr21_gens");
        assert_eq!(single_output_name(&None, "chr21"), "chr21_gens");
        assert_eq!(
            single_output_name(&Some("dyrk1a_gens".to_string()), "21"),
            "dyrk1a_gens"
        );
    }

    #[test]
    fn test_interval_file_detection() {
        assert!(locus_is_interval_file("targets.bed"));
        assert!(locus_is_interval_file("TARGETS.BED"));
        assert!(!locus_is_interval_file("21:100-200"));
        assert!(!locus_is_interval_file("bedfile.txt"));
    }

    #[test]
    fn test_empty_result_message() {
        assert!(empty_result_message(false).contains("heterozygous"));
        assert!(!empty_result_message(true).contains("heterozygous"));
    }

    #[test]
    fn test_write_single_table_skips_empty() {
        let path = temp_h5("single_empty");
        let hom_only = vec![record("21", 10, "A", "T", "A/A")];

        let written = write_single_table(&path, hom_only, false).unwrap();
        assert!(!written);
        assert!(!path.exists());
    }

    #[test]
    fn test_write_single_table_stores_under_all() {
        let path = temp_h5("single_written");
        let records = vec![record("21", 10, "A", "T", "A/T")];

        let written = write_single_table(&path, records.clone(), false).unwrap();
        assert!(written);
        assert_eq!(read_gens_table(&path, "all").unwrap(), records);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_store_interval_table_skips_empty_interval() {
        let path = temp_h5("container");
        let mut store = GensStore::create(&path).unwrap();
        let hom_only = vec![record("7", 5, "G", "C", "G/G")];
        let hets = vec![record("7", 9, "T", "A", "T|A")];

        assert!(!store_interval_table(&mut store, "EGFR", hom_only, false).unwrap());
        assert!(store_interval_table(&mut store, "TP53", hets.clone(), false).unwrap());
        drop(store);

        assert!(read_gens_table(&path, "EGFR").is_err());
        assert_eq!(read_gens_table(&path, "TP53").unwrap(), hets);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_keep_hom_stores_homozygous_records() {
        let path = temp_h5("keep_hom");
        let hom_only = vec![record("21", 10, "A", "T", "A/A")];

        let written = write_single_table(&path, hom_only.clone(), true).unwrap();
        assert!(written);
        assert_eq!(read_gens_table(&path, "all").unwrap(), hom_only);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_bed_suffix_without_flag_is_error() {
        let outdir = std::env::temp_dir().join(format!(
            "vartab_extract_{}_bedguard",
            std::process::id()
        ));
        let params = Extract {
            path_vcf: PathBuf::from("no_such_individual.vcf.gz"),
            locus: "targets.bed".to_string(),
            path_outdir: outdir.clone(),
            name: None,
            keep_hom: false,
            bed_mode: false,
            whole_chrom: false,
        };

        assert!(Extract::run(&params).is_err());
        std::fs::remove_dir_all(&outdir).unwrap();
    }
}
