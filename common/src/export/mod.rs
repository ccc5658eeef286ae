//! エクスポート行の生成
//!
//! レコード1件につき1行、検証済みなら Estado = "OK"。

#[cfg(feature = "excel")]
pub mod excel_core;

use crate::error::{Error, Result};
use crate::import::{COLUMN_CITY, COLUMN_CODE, COLUMN_DESTINATION, COLUMN_REFERENCE, COLUMN_ROUTE};
use crate::types::LabelRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 状態列の名前
pub const COLUMN_STATUS: &str = "Estado";

/// 出力列（この順で書き出す）
pub const EXPORT_COLUMNS: [&str; 6] = [
    COLUMN_REFERENCE,
    COLUMN_CODE,
    COLUMN_DESTINATION,
    COLUMN_CITY,
    COLUMN_ROUTE,
    COLUMN_STATUS,
];

/// 出力シート名
pub const EXPORT_SHEET_NAME: &str = "Resultado";

/// 出力ファイル名の接頭辞
pub const EXPORT_FILE_PREFIX: &str = "etiquetas_resultado_";

/// エクスポートの1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Referencia")]
    pub reference: String,
    #[serde(rename = "Etiqueta")]
    pub code: String,
    #[serde(rename = "Destino")]
    pub destination: String,
    #[serde(rename = "Ciudad")]
    pub city: String,
    #[serde(rename = "Ruta")]
    pub route: String,
    #[serde(rename = "Estado")]
    pub status: String,
}

impl ExportRow {
    /// EXPORT_COLUMNSと同じ順のセル値
    pub fn cells(&self) -> [&str; 6] {
        [
            self.reference.as_str(),
            self.code.as_str(),
            self.destination.as_str(),
            self.city.as_str(),
            self.route.as_str(),
            self.status.as_str(),
        ]
    }
}

impl From<&LabelRecord> for ExportRow {
    fn from(r: &LabelRecord) -> Self {
        Self {
            reference: r.reference.clone(),
            code: r.code.clone(),
            destination: r.destination.clone(),
            city: r.city.clone(),
            route: r.route.clone(),
            status: if r.validated { "OK".into() } else { String::new() },
        }
    }
}

/// 全レコードを出力行に変換（空ならNothingToExport）
pub fn export_rows(records: &[LabelRecord]) -> Result<Vec<ExportRow>> {
    if records.is_empty() {
        return Err(Error::NothingToExport);
    }
    Ok(records.iter().map(ExportRow::from).collect())
}

/// 出力ファイル名: etiquetas_resultado_YYYY-MM-DDTHH-MM-SS.<ext>
pub fn export_file_name(now: DateTime<Utc>, extension: &str) -> String {
    format!(
        "{}{}.{}",
        EXPORT_FILE_PREFIX,
        now.format("%Y-%m-%dT%H-%M-%S"),
        extension
    )
}
