use crate::types::{ExtractionRecord, ReferenceEntry};

/// 照合方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// 有意語の重なりで採用（重なり語数）
    Overlap(usize),
    /// 正規化後の完全一致フォールバック
    Exact,
}

/// 照合結果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    pub entry: &'a ReferenceEntry,
    pub method: MatchMethod,
}

/// ワークリストに追加できる照合済みレコード
///
/// コード・説明・RVUは参照テーブルの値をそのまま持つ。
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedExtraction {
    pub reference: ReferenceEntry,
    pub quantity: u32,
    pub confidence: f64,
    pub source_text: Option<String>,
}

/// バッチ照合の結果
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedExtraction>,
    /// 該当なしで除外したレコード（診断用）
    pub dropped: Vec<ExtractionRecord>,
}
