use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use hdf5::File as H5File;

/// Read-only view of one gene's targetability table: per cohort member,
/// one boolean column per enzyme recognition case, all the same length.
pub struct TargTable {
    file: H5File,
    path: PathBuf,
}

impl TargTable {
    pub fn open(path: &Path) -> anyhow::Result<TargTable> {
        let file = H5File::open(path)
            .with_context(|| format!("could not open targetability table {}", path.display()))?;
        Ok(TargTable {
            file,
            path: path.to_path_buf(),
        })
    }

    /// One flag column. A missing column means the table was built wrong,
    /// not that the gene lacks data, so this is an error.
    pub fn column(&self, name: &str) -> anyhow::Result<Vec<bool>> {
        let dataset = self.file.dataset(name).with_context(|| {
            format!("table {} has no column '{}'", self.path.display(), name)
        })?;
        let raw = dataset
            .read_raw::<u8>()
            .with_context(|| format!("could not read column '{}' of {}", name, self.path.display()))?;
        Ok(raw.iter().map(|v| *v != 0).collect())
    }

    /// Number of cohort members flagged in at least one of the given
    /// columns. Multi-column calls merge recognition-site sub-cases of a
    /// single enzyme.
    pub fn count_targetable(&self, columns: &[&str]) -> anyhow::Result<usize> {
        let mut any: Option<Vec<bool>> = None;
        for name in columns {
            let flags = self.column(name)?;
            match any {
                None => any = Some(flags),
                Some(ref mut merged) => {
                    if merged.len() != flags.len() {
                        bail!(
                            "columns of {} differ in length ('{}' has {}, expected {})",
                            self.path.display(),
                            name,
                            flags.len(),
                            merged.len()
                        );
                    }
                    for (m, f) in merged.iter_mut().zip(flags) {
                        *m = *m || f;
                    }
                }
            }
        }
        match any {
            Some(merged) => Ok(merged.iter().filter(|f| **f).count()),
            None => bail!("no columns requested from {}", self.path.display()),
        }
    }
}

#[cfg(test)]
pub(crate) fn write_targ_table(path: &Path, columns: &[(&str, &[bool])]) -> anyhow::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let file = H5File::create(path)?;
    for (name, flags) in columns {
        let data: Vec<u8> = flags.iter().map(|f| u8::from(*f)).collect();
        let builder = file.new_dataset_builder();
        let _ = builder.with_data(data.as_slice()).create(*name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_h5(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vartab_targ_{}_{}.h5", std::process::id(), name))
    }

    #[test]
    fn test_single_column_count() {
        let path = temp_h5("single");
        write_targ_table(&path, &[("targ_SpCas9", &[true, false, true, false])]).unwrap();

        let table = TargTable::open(&path).unwrap();
        assert_eq!(table.count_targetable(&["targ_SpCas9"]).unwrap(), 2);
        drop(table);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_merged_columns_count_union() {
        let path = temp_h5("merged");
        write_targ_table(
            &path,
            &[
                ("targ_SpCas9_VQR_1", &[true, false, false, false]),
                ("targ_SpCas9_VQR_2", &[true, true, false, false]),
            ],
        )
        .unwrap();

        let table = TargTable::open(&path).unwrap();
        let n = table
            .count_targetable(&["targ_SpCas9_VQR_1", "targ_SpCas9_VQR_2"])
            .unwrap();
        assert_eq!(n, 2);
        drop(table);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_column_is_error() {
        let path = temp_h5("missing_col");
        write_targ_table(&path, &[("targ_SpCas9", &[true])]).unwrap();

        let table = TargTable::open(&path).unwrap();
        assert!(table.column("targ_cpf1").is_err());
        assert!(table.count_targetable(&["targ_cpf1"]).is_err());
        drop(table);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_column_length_mismatch_is_error() {
        let path = temp_h5("mismatch");
        write_targ_table(
            &path,
            &[
                ("targ_SpCas9_VQR_1", &[true, false]),
                ("targ_SpCas9_VQR_2", &[true]),
            ],
        )
        .unwrap();

        let table = TargTable::open(&path).unwrap();
        assert!(table
            .count_targetable(&["targ_SpCas9_VQR_1", "targ_SpCas9_VQR_2"])
            .is_err());
        drop(table);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_error() {
        let path = temp_h5("not_there");
        assert!(TargTable::open(&path).is_err());
    }
}
