pub mod archive_submitter;
pub mod log_submitter;

pub use archive_submitter::ArchiveSubmitter;
pub use log_submitter::LogSubmitter;
