//! 型定義
//!
//! CLIとコアで共有される型:
//! - ReferenceEntry: 参照テーブル（CPT/RVU）の1行
//! - ExtractionRecord: OCR連携からの生データ（信頼しない）
//! - WorklistEntry: 照合済みの請求明細

use serde::{Deserialize, Serialize};

/// 信頼度が未指定の抽出レコードに適用するデフォルト値
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// 参照テーブルの1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub code: String,
    pub description: String,
    pub value: f64,
    #[serde(default)]
    pub category: String,
}

impl ReferenceEntry {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        value: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            value,
            category: category.into(),
        }
    }
}

/// OCR連携の出力1件
///
/// `cpt` と `name` はヒントとしてのみ扱い、コード・説明・RVUは
/// 必ず照合で参照テーブルから引き直す。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    #[serde(rename = "name")]
    pub raw_name: String,

    #[serde(rename = "cpt", default)]
    pub raw_code: Option<String>,

    #[serde(default)]
    pub quantity: Option<f64>,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub original_text: Option<String>,
}

impl ExtractionRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            raw_name: name.into(),
            ..Default::default()
        }
    }

    /// スコアリングに使うテキスト（原文優先）
    pub fn match_text(&self) -> &str {
        match self.original_text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.raw_name,
        }
    }

    /// 件数（未指定・1未満・非有限は1、小数は四捨五入）
    pub fn quantity(&self) -> u32 {
        match self.quantity {
            Some(q) if q.is_finite() && q >= 1.0 => q.round().min(u32::MAX as f64) as u32,
            _ => 1,
        }
    }

    /// 信頼度（未指定は0.5、[0,1]にクランプ）
    pub fn confidence(&self) -> f64 {
        match self.confidence {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => DEFAULT_CONFIDENCE,
        }
    }
}

/// 照合済みの請求明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklistEntry {
    pub id: String,
    pub code: String,
    pub description: String,
    pub value: f64,
    pub quantity: u32,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl WorklistEntry {
    /// 明細の小計RVU
    pub fn subtotal(&self) -> f64 {
        self.value * self.quantity as f64
    }
}
