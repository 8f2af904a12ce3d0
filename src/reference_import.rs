//! 参照テーブルのファイル取込み
//!
//! CSVはそのまま、Excel（.xlsx/.xls/.ods）は先頭シートを読み込む。
//! 列の解釈はどちらも共通（code, description, value[, category]）。

use crate::error::{RadRvuError, Result};
use calamine::{open_workbook_auto, Reader};
use rad_rvu_common::{ImportReport, ReferenceSet};
use std::path::Path;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .map(|e| {
            let ext = e.to_string_lossy().to_ascii_lowercase();
            SPREADSHEET_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// 参照テーブルファイルを読み込む
///
/// 有効な行が1件もなければエラー（呼び出し側は既存テーブルを維持する）。
pub fn import_reference_file(path: &Path) -> Result<(ReferenceSet, ImportReport)> {
    if !path.exists() {
        return Err(RadRvuError::FileNotFound(path.display().to_string()));
    }

    if is_spreadsheet(path) {
        import_spreadsheet(path)
    } else {
        let content = std::fs::read_to_string(path)?;
        Ok(ReferenceSet::from_csv_str(&content)?)
    }
}

fn import_spreadsheet(path: &Path) -> Result<(ReferenceSet, ImportReport)> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| RadRvuError::ReferenceImport(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RadRvuError::ReferenceImport("シートがありません".into()))?
        .map_err(|e| RadRvuError::ReferenceImport(e.to_string()))?;

    // ヘッダーをスキップ
    let rows = range
        .rows()
        .skip(1)
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());

    Ok(ReferenceSet::from_rows(rows)?)
}
