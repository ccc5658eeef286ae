//! Excel生成（共通ライブラリ）
//!
//! エクスポート行を1シートのxlsxとしてバッファに書き出す

use super::{ExportRow, EXPORT_COLUMNS, EXPORT_SHEET_NAME};
use rust_xlsxwriter::*;

/// 各列の幅（文字数）
const COLUMN_WIDTHS: [f64; 6] = [18.0, 16.0, 28.0, 16.0, 12.0, 8.0];

/// Excelをバッファに生成
pub fn generate_excel_buffer(rows: &[ExportRow]) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(EXPORT_SHEET_NAME)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    for (col, (name, width)) in EXPORT_COLUMNS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        worksheet
            .set_column_width(col, width)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
        worksheet
            .write_string_with_format(0, col, *name, &header_format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let excel_row = (i + 1) as u32;
        for (col, value) in row.cells().iter().enumerate() {
            worksheet
                .write_string(excel_row, col as u16, *value)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}
