//! Build-time data generator for the HyperBEAM documentation site.
//!
//! Scrapes the markdown analysis tree, classifies each document into a
//! subsystem (and, for devices, a device category), and writes the JSON
//! fixtures the site renders from.

pub mod classifier;
pub mod config;
pub mod devices;
pub mod error;
pub mod generator;
pub mod logging;
pub mod outline;
pub mod parser;
pub mod registry;
pub mod server;
pub mod watch;

pub use config::{DocsConfig, Loader};
pub use error::{FileError, PipelineError, SyncError};
pub use generator::{parse_all_subsystems, RunReport};
pub use parser::{ComponentRecord, NamedEntry, OverviewRecord};
