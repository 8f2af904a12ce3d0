//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Scan already in progress")]
    ScanInProgress,

    #[error("Invalid conversion rate: {0}")]
    InvalidRate(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
