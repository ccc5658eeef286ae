//! スプレッドシートの読み書き
//!
//! 読み込みはcalamine（xlsx/xlsm/xlsb/xls/odsを自動判別）、
//! 書き出しは共通ライブラリのrust_xlsxwriter実装を使う。

use crate::error::Result;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{DateTime, Utc};
use label_validator_common::export::excel_core::generate_excel_buffer;
use label_validator_common::{export_file_name, Error, ExportRow, TableCodec, TableRow};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// 出力ファイルの拡張子
pub const EXPORT_EXTENSION: &str = "xlsx";

/// calamineによるTableCodec
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineCodec;

impl TableCodec for CalamineCodec {
    fn read_rows(&self, bytes: &[u8]) -> label_validator_common::Result<Vec<TableRow>> {
        let cursor = Cursor::new(bytes.to_vec());
        let mut workbook =
            open_workbook_auto_from_rs(cursor).map_err(|e| Error::InvalidFormat(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::InvalidFormat("el libro no tiene hojas".into()))?
            .map_err(|e| Error::InvalidFormat(e.to_string()))?;

        Ok(rows_from_range(&range))
    }
}

/// 1行目をヘッダーとして各行を列名→値に変換（空行は除外）
pub fn rows_from_range(range: &Range<Data>) -> Vec<TableRow> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    let header: Vec<String> = header
        .iter()
        .map(|cell| cell_to_string(cell).trim().to_string())
        .collect();

    rows.filter(|row| row.iter().any(|cell| !cell_to_string(cell).is_empty()))
        .map(|row| {
            let mut out = TableRow::new();
            for (name, cell) in header.iter().zip(row) {
                if name.is_empty() {
                    continue;
                }
                // 同名列は最初の列を優先
                out.entry(name.clone()).or_insert_with(|| cell_to_string(cell));
            }
            out
        })
        .collect()
}

/// セル値を文字列化（整数値の数値は小数点なし）
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

/// エクスポート行をタイムスタンプ付きのxlsxとして保存
pub fn write_export(rows: &[ExportRow], dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let buffer = generate_excel_buffer(rows).map_err(Error::Excel)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(now, EXPORT_EXTENSION));
    std::fs::write(&path, buffer)?;
    Ok(path)
}
