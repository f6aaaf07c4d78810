//! Segmentation of extracted bulletin text into structured incident records.

pub mod config;
pub mod db;
pub mod error;
pub mod parser;
pub mod render;

pub use config::ParseConfig;
pub use error::{ConfigError, OutputError};
pub use parser::assemble::Incident;
pub use parser::dates::{DateInfo, DateKind};
pub use parser::{extract_incidents, IncidentExtractor};
