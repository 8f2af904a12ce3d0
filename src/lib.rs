pub mod ai_provider;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod reference_import;
pub mod scanner;
pub mod store;
