/// Rewrite a requested chromosome name to match the naming convention of the
/// VCF/BCF being queried. Interval lists and VCFs routinely disagree on the
/// "chr" prefix; querying with the wrong convention returns zero records
/// instead of an error, so every region string must pass through here first.
pub fn reconcile_chrom(chrom: &str, vcf_has_prefix: bool) -> String {
    if !vcf_has_prefix {
        strip_chr_prefix(chrom).to_string()
    } else if !chrom.starts_with("chr") {
        format!("chr{}", chrom)
    } else {
        chrom.to_string()
    }
}

/// Chromosome name without the "chr" prefix. Output tables always carry the
/// unprefixed form, whatever the source file used.
pub fn strip_chr_prefix(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_to_unprefixed() {
        assert_eq!(reconcile_chrom("chr1", false), "1");
        assert_eq!(reconcile_chrom("1", false), "1");
    }

    #[test]
    fn test_reconcile_to_prefixed() {
        assert_eq!(reconcile_chrom("1", true), "chr1");
        assert_eq!(reconcile_chrom("chr1", true), "chr1");
        assert_eq!(reconcile_chrom("X", true), "chrX");
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        for chrom in ["1", "chr1", "X", "chrX", "21"] {
            for has_prefix in [true, false] {
                let once = reconcile_chrom(chrom, has_prefix);
                let twice = reconcile_chrom(&once, has_prefix);
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn test_reconcile_round_trip() {
        assert_eq!(reconcile_chrom(&reconcile_chrom("chr1", false), true), "chr1");
        assert_eq!(reconcile_chrom(&reconcile_chrom("1", true), false), "1");
    }

    #[test]
    fn test_strip_chr_prefix() {
        assert_eq!(strip_chr_prefix("chr21"), "21");
        assert_eq!(strip_chr_prefix("21"), "21");
        assert_eq!(strip_chr_prefix("chrX"), "X");
    }
}
