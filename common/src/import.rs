//! インポート行のマッピング
//!
//! スプレッドシートの読み込み自体はTableCodecに任せ、
//! ここでは列名→LabelRecordの変換だけを行う。

use crate::error::Result;
use crate::types::LabelRecord;
use std::collections::HashMap;

/// 列名→セル文字列の1行
pub type TableRow = HashMap<String, String>;

/// 認識する列名（この順でエクスポートもする）
pub const COLUMN_REFERENCE: &str = "Referencia";
pub const COLUMN_CODE: &str = "Etiqueta";
pub const COLUMN_DESTINATION: &str = "Destino";
pub const COLUMN_CITY: &str = "Ciudad";
pub const COLUMN_ROUTE: &str = "Ruta";

/// 表形式ファイルのバイト列を行に変換するコーデック
pub trait TableCodec {
    /// 先頭シートの1行目をヘッダーとして各行を返す。
    /// 解析できない場合は Error::InvalidFormat
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<TableRow>>;
}

/// 1行をレコードに変換（欠けた列は空文字、validatedは常にfalse）
pub fn record_from_row(row: &TableRow) -> LabelRecord {
    let get = |column: &str| row.get(column).cloned().unwrap_or_default();

    LabelRecord {
        reference: get(COLUMN_REFERENCE),
        code: get(COLUMN_CODE),
        destination: get(COLUMN_DESTINATION),
        city: get(COLUMN_CITY),
        route: get(COLUMN_ROUTE),
        validated: false,
    }
}

/// 全行を変換（順序は維持）
pub fn records_from_rows(rows: &[TableRow]) -> Vec<LabelRecord> {
    rows.iter().map(record_from_row).collect()
}
