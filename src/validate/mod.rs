//! Running a diversity validation end to end.

mod config;
mod runner;

pub use config::ValidationConfig;
pub use runner::DiversityValidator;
