//! 端末表示用の整形
//!
//! 信頼度は 0.9以上=High / 0.7以上=Probable / それ未満=Verify の3段階で表示する。

use rad_rvu_common::{ConsolidatedRow, ConversionRate, ReferenceEntry, Totals, WorklistEntry};

pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= 0.9 {
        "High"
    } else if confidence >= 0.7 {
        "Probable"
    } else {
        "Verify"
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(width.saturating_sub(1)).collect();
        s.push('…');
        s
    }
}

pub fn format_worklist(entries: &[WorklistEntry]) -> String {
    let mut out = format!(
        "{:>5}  {:<7} {:<40} {:>4} {:>6} {:>8}  {}\n",
        "ID", "CPT", "Description", "Qty", "wRVU", "Subtotal", "Match"
    );
    for e in entries {
        out.push_str(&format!(
            "{:>5}  {:<7} {:<40} {:>4} {:>6.2} {:>8.2}  {}\n",
            e.id,
            e.code,
            truncate(&e.description, 40),
            e.quantity,
            e.value,
            e.subtotal(),
            confidence_label(e.confidence)
        ));
        if let Some(source) = &e.source_text {
            out.push_str(&format!("{:>5}  {:<7} ↳ {}\n", "", "", truncate(source, 60)));
        }
    }
    out
}

pub fn format_consolidated(rows: &[ConsolidatedRow]) -> String {
    let mut out = format!(
        "{:<7} {:<40} {:>4} {:>6} {:>8}  {}\n",
        "CPT", "Description", "Qty", "wRVU", "Subtotal", "Match"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<7} {:<40} {:>4} {:>6.2} {:>8.2}  {}\n",
            row.code,
            truncate(&row.description, 40),
            row.quantity,
            row.value,
            row.subtotal(),
            confidence_label(row.confidence)
        ));
    }
    out
}

pub fn format_totals(totals: &Totals, rate: ConversionRate) -> String {
    format!(
        "件数: {}  合計wRVU: {:.2}  レート: {}/RVU  報酬見込: ${:.2}",
        totals.entry_count, totals.total_value, rate, totals.total_earnings
    )
}

pub fn format_reference(entries: &[&ReferenceEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        out.push_str(&format!(
            "{:<7} {:<40} {:>6.2}  {}\n",
            e.code,
            truncate(&e.description, 40),
            e.value,
            e.category
        ));
    }
    out
}
