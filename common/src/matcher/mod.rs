//! 参照テーブル照合モジュール
//!
//! OCRで抽出した手技名を参照テーブルの説明文と有意語の重なりで照合する。
//! OCR側が返すCPTコードは使わず、テキストから独立に引き直す。

mod types;

pub use types::{MatchMethod, MatchOutcome, MatchResult, MatchedExtraction};

use crate::normalizer::{compact, significant_word_set, significant_words};
use crate::types::{ExtractionRecord, ReferenceEntry};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// 採用に必要な重なり語数の上限
pub const MAX_THRESHOLD: usize = 4;

/// クエリ側の各語（重複を含む）が候補側の集合にあれば1加算
pub fn overlap_score(query: &[String], candidate: &HashSet<String>) -> usize {
    query.iter().filter(|word| candidate.contains(*word)).count()
}

/// 候補ごとの採用閾値
///
/// 説明文の短い候補は少ない重なりで採用する。
pub fn acceptance_threshold(significant_len: usize) -> usize {
    significant_len.min(MAX_THRESHOLD)
}

struct Candidate<'a> {
    entry: &'a ReferenceEntry,
    words: HashSet<String>,
    compact: String,
}

/// 参照テーブルから構築した照合器
///
/// 候補の有意語は構築時に一度だけ計算する。
pub struct Matcher<'a> {
    candidates: Vec<Candidate<'a>>,
}

impl<'a> Matcher<'a> {
    pub fn new(entries: &'a [ReferenceEntry]) -> Self {
        let candidates = entries
            .iter()
            .map(|entry| Candidate {
                entry,
                words: significant_word_set(&entry.description),
                compact: compact(&entry.description),
            })
            .collect();
        Self { candidates }
    }

    /// 1件を照合する（該当なしは None）
    pub fn find(&self, record: &ExtractionRecord) -> Option<MatchResult<'a>> {
        let query = significant_words(record.match_text());

        let mut best: Option<(&Candidate<'a>, usize)> = None;
        for candidate in &self.candidates {
            // 有意語のない候補は閾値0になるため重なり照合の対象外
            if candidate.words.is_empty() {
                continue;
            }
            let score = overlap_score(&query, &candidate.words);
            if score < acceptance_threshold(candidate.words.len()) {
                continue;
            }
            // 同点は先に見つかった候補を優先
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }

        if let Some((candidate, score)) = best {
            return Some(MatchResult {
                entry: candidate.entry,
                method: MatchMethod::Overlap(score),
            });
        }

        self.find_exact(record).map(|entry| MatchResult {
            entry,
            method: MatchMethod::Exact,
        })
    }

    fn find_exact(&self, record: &ExtractionRecord) -> Option<&'a ReferenceEntry> {
        let keys = [Some(record.raw_name.as_str()), record.original_text.as_deref()];
        for key in keys.into_iter().flatten() {
            let key = compact(key);
            if key.is_empty() {
                continue;
            }
            if let Some(candidate) = self.candidates.iter().find(|c| c.compact == key) {
                return Some(candidate.entry);
            }
        }
        None
    }
}

/// 1件を照合する
pub fn find_match<'a>(
    record: &ExtractionRecord,
    entries: &'a [ReferenceEntry],
) -> Option<&'a ReferenceEntry> {
    Matcher::new(entries).find(record).map(|m| m.entry)
}

/// 抽出レコードのバッチを照合する
///
/// 該当なしのレコードはエラーにせず除外し、`dropped` に集計する。
pub fn match_extractions(records: &[ExtractionRecord], entries: &[ReferenceEntry]) -> MatchOutcome {
    let matcher = Matcher::new(entries);
    let mut outcome = MatchOutcome::default();

    for record in records {
        match matcher.find(record) {
            Some(result) => {
                debug!(
                    text = record.match_text(),
                    code = %result.entry.code,
                    method = ?result.method,
                    "matched extraction"
                );
                outcome.matched.push(MatchedExtraction {
                    reference: result.entry.clone(),
                    quantity: record.quantity(),
                    confidence: record.confidence(),
                    source_text: record
                        .original_text
                        .clone()
                        .or_else(|| Some(record.raw_name.clone()))
                        .filter(|s| !s.trim().is_empty()),
                });
            }
            None => {
                warn!(
                    text = record.match_text(),
                    hint = record.raw_code.as_deref().unwrap_or(""),
                    "no reference match, dropping extraction"
                );
                outcome.dropped.push(record.clone());
            }
        }
    }

    info!(
        matched = outcome.matched.len(),
        dropped = outcome.dropped.len(),
        "matched extraction batch"
    );
    outcome
}
