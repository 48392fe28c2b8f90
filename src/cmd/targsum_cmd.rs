use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::command::targsum::TargSum;

#[derive(Args)]
pub struct TargSumCMD {
    #[arg(value_parser)]
    /// File listing gene symbols, one per line
    pub genes: PathBuf,

    #[arg(value_parser)]
    /// Path prefix of the per-gene targetability tables, e.g. tables/targ_
    pub targ_prefix: String,

    #[arg(value_parser)]
    /// Path prefix for the two output files
    pub out_prefix: String,
}

impl TargSumCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        TargSum::run(&TargSum {
            path_genes: self.genes.clone(),
            targ_prefix: self.targ_prefix.clone(),
            out_prefix: self.out_prefix.clone(),
        })?;

        log::info!("Targsum has finished succesfully");
        Ok(())
    }
}
