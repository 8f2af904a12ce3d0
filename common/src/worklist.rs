//! ワークリスト集計モジュール
//!
//! 照合済み明細の追加・削除と、(コード, 説明) 単位の集約ビューを扱う。
//! 集約ビューは読み取り・削除用の射影であり、元の明細は置き換えない。

use crate::matcher::MatchedExtraction;
use crate::types::{ReferenceEntry, WorklistEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 照合済み明細の列（追加順を保持）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worklist {
    entries: Vec<WorklistEntry>,
    /// 採番カウンタ（clearしても戻さない）
    #[serde(default)]
    next_id: u64,
}

/// 集約ビューの1行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedRow {
    pub code: String,
    pub description: String,
    pub value: f64,
    /// 数量の合計
    pub quantity: u32,
    /// 信頼度の最大値
    pub confidence: f64,
    /// この行に含まれる明細ID
    pub entry_ids: Vec<String>,
}

impl ConsolidatedRow {
    pub fn subtotal(&self) -> f64 {
        self.value * self.quantity as f64
    }
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[WorklistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&WorklistEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn generate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    /// 照合済みレコードを到着順に追加し、採番したIDを返す
    pub fn add_matched(&mut self, matched: Vec<MatchedExtraction>) -> Vec<String> {
        let mut ids = Vec::with_capacity(matched.len());
        for m in matched {
            let id = self.generate_id();
            self.entries.push(WorklistEntry {
                id: id.clone(),
                code: m.reference.code,
                description: m.reference.description,
                value: m.reference.value,
                quantity: m.quantity.max(1),
                confidence: m.confidence.clamp(0.0, 1.0),
                source_text: m.source_text,
            });
            ids.push(id);
        }
        ids
    }

    /// 参照テーブルの行を手動追加（数量1・信頼度1.0）
    pub fn add_manual(&mut self, reference: &ReferenceEntry) -> String {
        let id = self.generate_id();
        self.entries.push(WorklistEntry {
            id: id.clone(),
            code: reference.code.clone(),
            description: reference.description.clone(),
            value: reference.value,
            quantity: 1,
            confidence: 1.0,
            source_text: None,
        });
        id
    }

    /// 明細を1件削除（存在しないIDは何もしない）
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// (コード, 説明) が一致する明細をすべて削除し、削除件数を返す
    pub fn remove_group(&mut self, code: &str, description: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.code == code && e.description == description));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries = Vec::new();
    }

    /// 集約ビューを生成する（最初に現れた順）
    pub fn to_consolidated_view(&self) -> Vec<ConsolidatedRow> {
        let mut rows: Vec<ConsolidatedRow> = Vec::new();
        let mut index: HashMap<(&str, &str), usize> = HashMap::new();

        for entry in &self.entries {
            let key = (entry.code.as_str(), entry.description.as_str());
            match index.get(&key) {
                Some(&i) => {
                    let row = &mut rows[i];
                    row.quantity = row.quantity.saturating_add(entry.quantity);
                    row.confidence = row.confidence.max(entry.confidence);
                    row.entry_ids.push(entry.id.clone());
                }
                None => {
                    index.insert(key, rows.len());
                    rows.push(ConsolidatedRow {
                        code: entry.code.clone(),
                        description: entry.description.clone(),
                        value: entry.value,
                        quantity: entry.quantity,
                        confidence: entry.confidence,
                        entry_ids: vec![entry.id.clone()],
                    });
                }
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(code: &str, description: &str, value: f64) -> ReferenceEntry {
        ReferenceEntry::new(code, description, value, "")
    }

    fn matched(code: &str, description: &str, value: f64, quantity: u32, confidence: f64) -> MatchedExtraction {
        MatchedExtraction {
            reference: reference(code, description, value),
            quantity,
            confidence,
            source_text: Some(description.to_uppercase()),
        }
    }

    #[test]
    fn test_add_matched_preserves_order_and_unique_ids() {
        let mut worklist = Worklist::new();
        let ids = worklist.add_matched(vec![
            matched("70450", "CT Head w/o Contrast", 1.02, 1, 0.9),
            matched("71045", "XR Chest 1 View", 0.22, 2, 0.8),
        ]);
        let more = worklist.add_matched(vec![matched("70450", "CT Head w/o Contrast", 1.02, 1, 0.7)]);

        assert_eq!(worklist.len(), 3);
        assert_eq!(worklist.entries()[0].code, "70450");
        assert_eq!(worklist.entries()[1].code, "71045");
        assert_eq!(worklist.entries()[1].quantity, 2);
        assert_eq!(worklist.entries()[1].source_text.as_deref(), Some("XR CHEST 1 VIEW"));
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[0], more[0]);
    }

    #[test]
    fn test_add_manual_copies_reference() {
        let mut worklist = Worklist::new();
        let entry = reference("76700", "US Abdomen Complete", 1.09);
        let id = worklist.add_manual(&entry);

        let added = worklist.get(&id).unwrap();
        assert_eq!(added.code, "76700");
        assert_eq!(added.description, "US Abdomen Complete");
        assert_eq!(added.value, 1.09);
        assert_eq!(added.quantity, 1);
        assert_eq!(added.confidence, 1.0);
        assert!(added.source_text.is_none());
    }

    #[test]
    fn test_remove_single_entry() {
        let mut worklist = Worklist::new();
        let entry = reference("76700", "US Abdomen Complete", 1.09);
        let first = worklist.add_manual(&entry);
        let second = worklist.add_manual(&entry);

        assert!(worklist.remove(&first));
        assert_eq!(worklist.len(), 1);
        assert_eq!(worklist.entries()[0].id, second);
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let mut worklist = Worklist::new();
        worklist.add_manual(&reference("76700", "US Abdomen Complete", 1.09));
        let before = worklist.clone();
        assert!(!worklist.remove("does-not-exist"));
        assert_eq!(worklist, before);
    }

    #[test]
    fn test_remove_group_cascades() {
        let mut worklist = Worklist::new();
        worklist.add_matched(vec![
            matched("70450", "CT Head w/o Contrast", 1.02, 1, 0.9),
            matched("71045", "XR Chest 1 View", 0.22, 1, 0.8),
            matched("70450", "CT Head w/o Contrast", 1.02, 3, 0.6),
            // 同じコードでも説明が違えば別グループ
            matched("70450", "CT Head", 1.02, 1, 0.6),
        ]);

        assert_eq!(worklist.remove_group("70450", "CT Head w/o Contrast"), 2);
        assert_eq!(worklist.len(), 2);
        assert_eq!(worklist.remove_group("70450", "CT Head w/o Contrast"), 0);
    }

    #[test]
    fn test_consolidated_view_sums_quantity_and_max_confidence() {
        let mut worklist = Worklist::new();
        worklist.add_matched(vec![
            matched("71045", "XR Chest 1 View", 0.22, 1, 0.6),
            matched("70450", "CT Head w/o Contrast", 1.02, 1, 0.9),
            matched("71045", "XR Chest 1 View", 0.22, 2, 0.95),
        ]);

        let view = worklist.to_consolidated_view();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].code, "71045");
        assert_eq!(view[0].quantity, 3);
        assert_eq!(view[0].confidence, 0.95);
        assert_eq!(view[0].entry_ids.len(), 2);
        assert!((view[0].subtotal() - 0.66).abs() < 1e-9);
        assert_eq!(view[1].code, "70450");

        // 元の明細は変わらない
        assert_eq!(worklist.len(), 3);
    }

    #[test]
    fn test_clear_keeps_id_sequence() {
        let mut worklist = Worklist::new();
        let entry = reference("76700", "US Abdomen Complete", 1.09);
        let first = worklist.add_manual(&entry);
        worklist.clear();
        assert!(worklist.is_empty());
        assert!(worklist.to_consolidated_view().is_empty());

        let second = worklist.add_manual(&entry);
        assert_ne!(first, second);
    }
}
