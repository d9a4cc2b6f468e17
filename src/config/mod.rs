pub mod cli;
pub mod form_config;

#[cfg(feature = "cli")]
use crate::core::render::RenderMode;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "formsheet")]
#[command(about = "Fill in, render and submit declarative business forms")]
pub struct CliConfig {
    /// Path to the TOML form definition
    #[arg(short, long)]
    pub form: String,

    /// File of commands to run instead of reading stdin
    #[arg(short, long)]
    pub script: Option<String>,

    /// Default mode for the `render` command and the final printout
    #[arg(long, value_enum, default_value_t = RenderMode::Edit)]
    pub mode: RenderMode,

    /// Directory receiving submission archives
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Write submissions to a zip archive instead of only logging them
    #[arg(long)]
    pub archive: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("form", &self.form)?;
        if let Some(script) = &self.script {
            validation::validate_path("script", script)?;
        }
        validation::validate_path("output_path", &self.output_path)
    }
}
