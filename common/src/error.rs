//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Error al leer el archivo. Por favor, verifica el formato: {0}")]
    InvalidFormat(String),

    #[error("No hay datos para exportar")]
    NothingToExport,

    #[error("Ya hay una importación en curso")]
    ImportInProgress,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error al generar Excel: {0}")]
    Excel(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
