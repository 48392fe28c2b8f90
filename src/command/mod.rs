pub mod extract;
pub mod targsum;

pub use extract::Extract;

pub use targsum::TargSum;
