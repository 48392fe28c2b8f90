mod chrom;
mod detect_software;
mod pipeline;

pub use chrom::reconcile_chrom;
pub use chrom::strip_chr_prefix;

pub use detect_software::check_bcftools;

pub use pipeline::first_stdout_line;
pub use pipeline::Pipeline;
pub use pipeline::PipelineOutput;
pub use pipeline::Stage;
