pub mod extract_cmd;
pub mod targsum_cmd;

pub use extract_cmd::ExtractCMD;
pub use targsum_cmd::TargSumCMD;
