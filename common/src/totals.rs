//! 集計モジュール
//!
//! RVU合計・件数・報酬額を明細から都度計算する。
//! 集約ビューは表示用なので、合計は常に元の明細から計算する。

use crate::error::{Error, Result};
use crate::types::WorklistEntry;
use serde::{Deserialize, Serialize};

/// RVUあたりの報酬額（ドル）のデフォルト
pub const DEFAULT_RATE: f64 = 35.00;

/// RVU→報酬額の換算レート
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionRate(f64);

impl Default for ConversionRate {
    fn default() -> Self {
        Self(DEFAULT_RATE)
    }
}

impl ConversionRate {
    /// 厳密な生成（負数・非有限値はエラー）
    pub fn new(rate: f64) -> Result<Self> {
        if rate.is_finite() && rate >= 0.0 {
            Ok(Self(rate))
        } else {
            Err(Error::InvalidRate(rate.to_string()))
        }
    }

    /// ユーザー入力から生成（解釈できない入力は0）
    pub fn parse_lenient(input: &str) -> Self {
        match input.trim().trim_start_matches('$').parse::<f64>() {
            Ok(rate) if rate.is_finite() && rate >= 0.0 => Self(rate),
            _ => Self(0.0),
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for ConversionRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

/// 集計結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// RVU合計（value × quantity）
    pub total_value: f64,
    /// 報酬額
    pub total_earnings: f64,
    /// 件数（数量の合計、行数ではない）
    pub entry_count: u64,
}

pub fn compute_totals(entries: &[WorklistEntry], rate: ConversionRate) -> Totals {
    let total_value: f64 = entries.iter().map(WorklistEntry::subtotal).sum();
    let entry_count: u64 = entries.iter().map(|e| e.quantity as u64).sum();

    Totals {
        total_value,
        total_earnings: total_value * rate.value(),
        entry_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, value: f64, quantity: u32) -> WorklistEntry {
        WorklistEntry {
            id: id.into(),
            code: "71045".into(),
            description: "XR Chest 1 View".into(),
            value,
            quantity,
            confidence: 1.0,
            source_text: None,
        }
    }

    #[test]
    fn test_compute_totals_empty() {
        let totals = compute_totals(&[], ConversionRate::default());
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_compute_totals_uses_quantity() {
        let entries = vec![entry("1", 0.22, 1), entry("2", 1.02, 3)];
        let totals = compute_totals(&entries, ConversionRate::new(35.0).unwrap());
        assert!((totals.total_value - 3.28).abs() < 1e-9);
        assert!((totals.total_earnings - 114.8).abs() < 1e-9);
        assert_eq!(totals.entry_count, 4);
    }

    #[test]
    fn test_single_chest_xray_earnings() {
        let totals = compute_totals(&[entry("1", 0.22, 1)], ConversionRate::default());
        assert!((totals.total_value - 0.22).abs() < 1e-9);
        assert!((totals.total_earnings - 7.70).abs() < 1e-9);
        assert_eq!(totals.entry_count, 1);
    }

    #[test]
    fn test_rate_parse_lenient() {
        assert_eq!(ConversionRate::parse_lenient("42.5").value(), 42.5);
        assert_eq!(ConversionRate::parse_lenient(" $40 ").value(), 40.0);
        assert_eq!(ConversionRate::parse_lenient("abc").value(), 0.0);
        assert_eq!(ConversionRate::parse_lenient("").value(), 0.0);
        assert_eq!(ConversionRate::parse_lenient("-5").value(), 0.0);
        assert_eq!(ConversionRate::parse_lenient("NaN").value(), 0.0);
    }

    #[test]
    fn test_rate_new_rejects_invalid() {
        assert!(ConversionRate::new(-1.0).is_err());
        assert!(ConversionRate::new(f64::INFINITY).is_err());
        assert_eq!(ConversionRate::new(0.0).unwrap().value(), 0.0);
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(ConversionRate::default().to_string(), "$35.00");
    }
}
