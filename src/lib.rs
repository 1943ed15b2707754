pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::AppConfig;
pub use core::service::ReadingService;
pub use server::{build_router, start_server, AppState};
pub use utils::error::{ReadingError, Result};
