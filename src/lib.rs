pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::RouterConfig;

pub use adapters::directory::{LocalDirectory, MemoryDirectory, SheetDirectory};
pub use adapters::storage::LocalStorage;
pub use crate::core::{
    etl::EtlEngine,
    pipeline::{InputSource, RoutingPipeline, RunRequest},
    report::{RunReport, RunStatus},
};
pub use domain::model::{Agent, Directory, ExportFormat, FileFormat, InputFile};
pub use utils::error::{Result, RouterError};
