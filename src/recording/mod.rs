pub mod archive;
pub mod dataset;

pub use archive::{read_archive, ArchiveRecord, ArchiveWriter, GamePhase};
pub use dataset::generate_minimax_dataset;
