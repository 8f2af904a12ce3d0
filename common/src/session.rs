//! セッション状態モジュール
//!
//! 参照テーブル・ワークリスト・換算レート・スキャン中フラグを1つの値にまとめる。
//! シェル側（CLI）は読み込み → 操作 → 保存だけを行い、判断はここで行う。

use crate::error::{Error, Result};
use crate::matcher::match_extractions;
use crate::reference::ReferenceSet;
use crate::totals::{compute_totals, ConversionRate, Totals};
use crate::types::{ExtractionRecord, ReferenceEntry};
use crate::worklist::{ConsolidatedRow, Worklist};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 1回のスキャン結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// OCRが返したレコード数
    pub extracted: usize,
    /// ワークリストに追加した件数
    pub matched: usize,
    /// 該当なしで除外した件数
    pub dropped: usize,
    pub entry_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    reference: ReferenceSet,
    #[serde(default)]
    worklist: Worklist,
    #[serde(default)]
    rate: ConversionRate,
    #[serde(skip)]
    scanning: bool,
}

impl Session {
    pub fn new(rate: ConversionRate) -> Self {
        Self {
            rate,
            ..Default::default()
        }
    }

    pub fn reference(&self) -> &ReferenceSet {
        &self.reference
    }

    pub fn worklist(&self) -> &Worklist {
        &self.worklist
    }

    pub fn rate(&self) -> ConversionRate {
        self.rate
    }

    pub fn totals(&self) -> Totals {
        compute_totals(self.worklist.entries(), self.rate)
    }

    pub fn consolidated_view(&self) -> Vec<ConsolidatedRow> {
        self.worklist.to_consolidated_view()
    }

    pub fn set_rate(&mut self, rate: ConversionRate) {
        self.rate = rate;
    }

    /// ユーザー入力からレートを設定（不正な入力は0）
    pub fn set_rate_input(&mut self, input: &str) -> ConversionRate {
        self.rate = ConversionRate::parse_lenient(input);
        self.rate
    }

    /// 参照テーブルを丸ごと置き換える
    pub fn replace_reference(&mut self, reference: ReferenceSet) -> Result<()> {
        if reference.is_empty() {
            return Err(Error::Import("空の参照テーブルでは置き換えません".into()));
        }
        self.reference = reference;
        Ok(())
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// スキャン開始（実行中なら拒否）
    pub fn begin_scan(&mut self) -> Result<()> {
        if self.scanning {
            return Err(Error::ScanInProgress);
        }
        self.scanning = true;
        Ok(())
    }

    /// OCR連携の結果を照合してワークリストに追加し、スキャンを終了する
    pub fn complete_scan(&mut self, records: Vec<ExtractionRecord>) -> ScanReport {
        self.scanning = false;

        let outcome = match_extractions(&records, self.reference.entries());
        for record in &outcome.dropped {
            warn!(name = %record.raw_name, "extraction dropped");
        }

        let matched = outcome.matched.len();
        let dropped = outcome.dropped.len();
        let entry_ids = self.worklist.add_matched(outcome.matched);
        ScanReport {
            extracted: records.len(),
            matched,
            dropped,
            entry_ids,
        }
    }

    /// OCR連携の失敗でスキャンを終了する（ワークリストは変更しない）
    pub fn abort_scan(&mut self) {
        self.scanning = false;
    }

    /// 参照テーブルから手動追加
    pub fn add_manual(&mut self, code: &str) -> Option<String> {
        let entry: ReferenceEntry = self.reference.find_by_code(code)?.clone();
        Some(self.worklist.add_manual(&entry))
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.worklist.remove(id)
    }

    pub fn remove_group(&mut self, code: &str, description: &str) -> usize {
        self.worklist.remove_group(code, description)
    }

    pub fn clear(&mut self) {
        self.worklist.clear();
    }
}
