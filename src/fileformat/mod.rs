pub mod bed;
pub mod gens_table;
pub mod targ_table;

pub use bed::read_interval_file;
pub use bed::Interval;

pub use gens_table::read_gens_table;
pub use gens_table::GensStore;
pub use gens_table::VariantRecord;

pub use targ_table::TargTable;
