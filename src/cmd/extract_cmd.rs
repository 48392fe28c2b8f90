use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::command::extract::Extract;

#[derive(Args)]
pub struct ExtractCMD {
    #[arg(value_parser)]
    /// Genotype file for one individual (VCF or BCF, plain or compressed)
    pub vcf: PathBuf,

    #[arg(value_parser)]
    /// chrom:start-stop locus, an interval file (with --bed), or a chromosome name (with --chrom)
    pub locus: String,

    #[arg(value_parser)]
    /// Directory to write tables into; created if missing
    pub outdir: PathBuf,

    #[arg(value_parser)]
    /// Output file name, without extension
    pub name: Option<String>,

    #[arg(short = 'f', long = "keep-hom")]
    /// Keep homozygous calls instead of restricting to heterozygous ones
    pub keep_hom: bool,

    #[arg(long = "bed", conflicts_with = "chrom", requires = "name")]
    /// Treat the locus argument as a tab-separated interval file
    pub bed: bool,

    #[arg(long = "chrom", conflicts_with = "bed")]
    /// Treat the locus argument as a whole chromosome
    pub chrom: bool,
}

impl ExtractCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        Extract::run(&Extract {
            path_vcf: self.vcf.clone(),
            locus: self.locus.clone(),
            path_outdir: self.outdir.clone(),
            name: self.name.clone(),
            keep_hom: self.keep_hom,
            bed_mode: self.bed,
            whole_chrom: self.chrom,
        })?;

        log::info!("Extract has finished succesfully");
        Ok(())
    }
}
