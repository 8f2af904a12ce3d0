//! 参照テーブルモジュール
//!
//! CPTコード・説明・RVUの参照テーブルを管理する。
//! 取込みは差分マージせず丸ごと置き換える。

use crate::error::{Error, Result};
use crate::types::ReferenceEntry;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

lazy_static! {
    /// 組み込みの放射線科参照テーブル（CMSの代表的なwRVU）
    static ref BUILTIN_ENTRIES: Vec<ReferenceEntry> = {
        let rows: &[(&str, &str, f64, &str)] = &[
            ("70450", "CT Head w/o Contrast", 1.02, "CT"),
            ("70486", "CT Maxillofacial w/o Contrast", 1.13, "CT"),
            ("71250", "CT Chest w/o Contrast", 1.16, "CT"),
            ("71260", "CT Chest w/ Contrast", 1.24, "CT"),
            ("74150", "CT Abdomen w/o Contrast", 1.19, "CT"),
            ("74160", "CT Abdomen w/ Contrast", 1.27, "CT"),
            ("74176", "CT Abdomen/Pelvis w/o Contrast", 1.74, "CT"),
            ("74177", "CT Abdomen/Pelvis w/ Contrast", 1.82, "CT"),
            ("74178", "CT Abdomen/Pelvis w/ & w/o Contrast", 1.96, "CT"),
            ("72125", "CT Cervical Spine w/o Contrast", 1.14, "CT"),
            ("72131", "CT Lumbar Spine w/o Contrast", 1.14, "CT"),
            ("71045", "XR Chest 1 View", 0.22, "X-Ray"),
            ("71046", "XR Chest 2 Views", 0.26, "X-Ray"),
            ("73560", "XR Knee 1-2 Views", 0.18, "X-Ray"),
            ("73030", "XR Shoulder 2+ Views", 0.19, "X-Ray"),
            ("72040", "XR Cervical Spine 2-3 Views", 0.22, "X-Ray"),
            ("72100", "XR Lumbar Spine 2-3 Views", 0.23, "X-Ray"),
            ("70551", "MRI Brain w/o Contrast", 1.48, "MRI"),
            ("70553", "MRI Brain w/ & w/o Contrast", 2.15, "MRI"),
            ("72141", "MRI Cervical Spine w/o Contrast", 1.48, "MRI"),
            ("72148", "MRI Lumbar Spine w/o Contrast", 1.48, "MRI"),
            ("73221", "MRI Joint Upper Ext w/o Contrast", 1.35, "MRI"),
            ("73721", "MRI Joint Lower Ext w/o Contrast", 1.35, "MRI"),
            ("76700", "US Abdomen Complete", 1.09, "Ultrasound"),
            ("76705", "US Abdomen Limited", 0.81, "Ultrasound"),
            ("76830", "US Pelvis Transvaginal", 0.89, "Ultrasound"),
            ("76856", "US Pelvis Complete", 0.89, "Ultrasound"),
            ("93970", "US Duplex Venous Extremity Bilateral", 1.32, "Ultrasound"),
            ("76536", "US Thyroid/Neck", 0.68, "Ultrasound"),
        ];
        rows.iter()
            .map(|&(code, description, value, category)| {
                ReferenceEntry::new(code, description, value, category)
            })
            .collect()
    };
}

/// 取込み結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub accepted: usize,
    pub skipped: usize,
}

/// 参照テーブル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceSet {
    entries: Vec<ReferenceEntry>,
}

impl Default for ReferenceSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceSet {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_ENTRIES.clone(),
        }
    }

    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// コードで検索（重複時は先頭）
    pub fn find_by_code(&self, code: &str) -> Option<&ReferenceEntry> {
        let code = code.trim();
        self.entries.iter().find(|e| e.code == code)
    }

    /// OCR連携に渡す "CODE: DESCRIPTION" 形式の一覧
    pub fn to_context(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.code, e.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// CSV文字列から読み込み（1行目はヘッダー）
    ///
    /// 列: code, description, value[, category]
    pub fn from_csv_str(content: &str) -> Result<(Self, ImportReport)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        let mut unreadable = 0;
        for (line, record) in reader.records().enumerate() {
            match record {
                Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
                Err(e) => {
                    warn!(line = line + 2, error = %e, "unreadable reference row");
                    unreadable += 1;
                }
            }
        }

        let (set, mut report) = Self::from_rows(rows)?;
        report.skipped += unreadable;
        Ok((set, report))
    }

    /// ヘッダーを除いた行データから読み込み
    ///
    /// RVUが数値でない行は読み飛ばす。有効行が0件ならエラー。
    pub fn from_rows<I>(rows: I) -> Result<(Self, ImportReport)>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut entries = Vec::new();
        let mut report = ImportReport::default();

        for row in rows {
            match parse_row(&row) {
                Some(entry) => {
                    entries.push(entry);
                    report.accepted += 1;
                }
                None => {
                    warn!(row = ?row, "skipping reference row");
                    report.skipped += 1;
                }
            }
        }

        if entries.is_empty() {
            return Err(Error::Import(format!(
                "有効な行がありません（スキップ {}行）",
                report.skipped
            )));
        }

        info!(accepted = report.accepted, skipped = report.skipped, "parsed reference table");
        Ok((Self { entries }, report))
    }
}

fn parse_row(row: &[String]) -> Option<ReferenceEntry> {
    if row.len() < 3 {
        return None;
    }

    let code = row[0].trim();
    let description = row[1].trim();
    if code.is_empty() || description.is_empty() {
        return None;
    }

    let value: f64 = row[2].trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let category = match row.get(3).map(|c| c.trim()) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => infer_category(description).to_string(),
    };

    Some(ReferenceEntry::new(code, description, value, category))
}

/// 説明文の先頭のモダリティ表記から区分を推定
pub fn infer_category(description: &str) -> &'static str {
    let first = description
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|t| !t.is_empty())
        .unwrap_or("")
        .to_ascii_uppercase();

    match first.as_str() {
        "CT" | "CTA" => "CT",
        "XR" | "CR" | "DR" | "XRAY" => "X-Ray",
        "MR" | "MRI" | "MRA" => "MRI",
        "US" | "ULTRASOUND" => "Ultrasound",
        "MAMMO" | "MAMMOGRAM" => "Mammography",
        _ => "Other",
    }
}
