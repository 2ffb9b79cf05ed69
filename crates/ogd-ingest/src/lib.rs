//! Open Game Data export ingestion
//!
//! Reads tab-separated feature exports into [`ogd_dataset::Dataset`]s and
//! writes filtered or split rows back out in the same format.

pub mod filename;
pub mod load;
pub mod tsv;

pub use filename::ExportFileName;
pub use load::{dataset_from_tsv, load_dataset, LoadOptions};
pub use tsv::{parse_tsv, write_tsv, TsvOptions, TsvTable};
