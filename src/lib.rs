pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::form_config::FormDefinition;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::submitters::{ArchiveSubmitter, LogSubmitter};
pub use crate::core::render::RenderMode;
pub use crate::core::session::{Command, FormSession};
pub use crate::core::table::{DynamicRecordTable, FieldPath};
pub use utils::error::{FormError, Result};
