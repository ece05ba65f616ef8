pub mod config;
pub mod element_finder;
pub mod models;
pub mod plugins;
pub mod runner;
pub mod scraper;
pub mod utils;

// Re-export commonly used types
pub use crate::config::Settings;
pub use crate::models::{CheckResult, HandlerResponse, InvocationEvent};
pub use crate::runner::StockCheckRunner;
pub use crate::utils::error::AppError;
