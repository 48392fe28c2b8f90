use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::fileformat::targ_table::TargTable;

/// Individuals in the 1000 Genomes phase 3 panel the targetability tables
/// describe. Fractions are always over the full panel, also for genes whose
/// tables carry fewer rows.
pub const COHORT_SIZE: usize = 2504;

/// One reportable enzyme case: its output label and the flag column(s) it
/// draws from. A case listed with several columns counts a cohort member
/// as targetable when any of its recognition sites is usable.
pub struct CasVariant {
    pub label: &'static str,
    pub columns: &'static [&'static str],
}

/// Reported per gene in this order, the pooled 'all' case first.
pub const CAS_VARIANTS: &[CasVariant] = &[
    CasVariant { label: "all", columns: &["targ_all"] },
    CasVariant { label: "SpCas9", columns: &["targ_SpCas9"] },
    CasVariant { label: "SpCas9_VRER", columns: &["targ_SpCas9_VRER"] },
    CasVariant { label: "SpCas9_EQR", columns: &["targ_SpCas9_EQR"] },
    CasVariant {
        label: "SpCas9_VQR",
        columns: &["targ_SpCas9_VQR_1", "targ_SpCas9_VQR_2"],
    },
    CasVariant { label: "StCas9", columns: &["targ_StCas9"] },
    CasVariant { label: "StCas9_2", columns: &["targ_StCas9_2"] },
    CasVariant { label: "SaCas9", columns: &["targ_SaCas9"] },
    CasVariant { label: "SaCas9_KKH", columns: &["targ_SaCas9_KKH"] },
    CasVariant { label: "nmCas9", columns: &["targ_nmCas9"] },
    CasVariant { label: "cjCas9", columns: &["targ_cjCas9"] },
    CasVariant { label: "cpf1", columns: &["targ_cpf1"] },
];

#[derive(Debug, Serialize)]
struct SummaryRow {
    cas: String,
    gene: String,
    frac_targetable: f64,
}

const SUMMARY_HEADER: [&str; 3] = ["Cas", "Gene", "% people targetable"];

/// Summarize per-gene targetability tables into one cohort-wide table of
/// fractions per gene and enzyme case.
pub struct TargSum {
    pub path_genes: PathBuf,
    pub targ_prefix: String,
    pub out_prefix: String,
}
impl TargSum {
    pub fn run(params: &TargSum) -> anyhow::Result<()> {
        let genes = read_gene_list(&params.path_genes)?;

        let mut rows: Vec<SummaryRow> = Vec::new();
        let mut not_evaluated: Vec<String> = Vec::new();

        let n_genes = genes.len();
        for (i, gene) in genes.iter().enumerate() {
            // countdown so long cohort runs show progress
            println!("{}", n_genes - i);

            let path_table = PathBuf::from(format!("{}{}.h5", params.targ_prefix, gene));
            if !path_table.exists() {
                not_evaluated.push(gene.clone());
                continue;
            }

            let table = TargTable::open(&path_table)?;
            for cas in CAS_VARIANTS {
                let n_targetable = table.count_targetable(cas.columns)?;
                rows.push(SummaryRow {
                    cas: cas.label.to_string(),
                    gene: gene.clone(),
                    frac_targetable: n_targetable as f64 / COHORT_SIZE as f64,
                });
            }
        }

        write_not_evaluated(&params.out_prefix, &not_evaluated)?;
        write_summary(&params.out_prefix, &rows)?;
        log::info!(
            "Evaluated {} of {} genes ({} without tables)",
            n_genes - not_evaluated.len(),
            n_genes,
            not_evaluated.len()
        );
        Ok(())
    }
}

/// One gene symbol per line; blank lines are ignored.
fn read_gene_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("could not read gene list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Genes skipped for lack of a table. Written even when empty so a run
/// always leaves a record of what was not evaluated.
fn write_not_evaluated(out_prefix: &str, genes: &[String]) -> anyhow::Result<()> {
    let path = format!("{}not_eval.txt", out_prefix);
    let mut content = String::new();
    for gene in genes {
        content.push_str(gene);
        content.push('\n');
    }
    fs::write(&path, content).with_context(|| format!("could not write {}", path))
}

fn write_summary(out_prefix: &str, rows: &[SummaryRow]) -> anyhow::Result<()> {
    let path = format!("{}targ_per_gene_and_cas.tsv", out_prefix);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("could not create {}", path))?;
    writer.write_record(SUMMARY_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
