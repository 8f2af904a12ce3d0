//! 手技名の正規化モジュール
//!
//! OCRで読み取った手技名（"CT HEAD W/O CONT" → ct, head, without, contrast など）を
//! 照合用の有意語に変換する。
//! `/` はトークン内に残すため "ABD/PELV" のような連結表記は1語（abdpelv）になり、
//! 略語展開はされない。
//!
//! ## 処理フロー
//! 1. 小文字化して英数字と `/` 以外で分割
//! 2. 各トークンの前後の記号を除去
//! 3. 略語テーブルで正式表記に展開
//! 4. 左右・つなぎ語を除外

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    /// 略語 → 正式表記（完全一致のみ）
    static ref ABBREVIATIONS: HashMap<&'static str, &'static str> = {
        let pairs: &[(&str, &str)] = &[
            ("us", "ultrasound"),
            ("bx", "biopsy"),
            ("mammo", "mammogram"),
            ("xr", "xray"),
            ("cr", "xray"),
            ("dr", "xray"),
            ("mr", "mri"),
            ("w", "with"),
            ("wo", "without"),
            ("bil", "bilateral"),
            ("bilat", "bilateral"),
            ("unilat", "unilateral"),
            ("cont", "contrast"),
            ("abd", "abdomen"),
            ("pelv", "pelvis"),
            ("cerv", "cervical"),
            ("lumb", "lumbar"),
            ("scr", "screening"),
            ("scrn", "screening"),
            ("dx", "diagnostic"),
            ("diag", "diagnostic"),
            ("fu", "followup"),
            ("ang", "angio"),
            ("thor", "thoracic"),
            // ビュー数表記
            ("v", "view"),
            ("vw", "view"),
            ("views", "view"),
            ("vws", "view"),
        ];
        pairs.iter().copied().collect()
    };

    /// 左右の表記（照合に影響させない）
    static ref DIRECTIONAL_WORDS: HashSet<&'static str> =
        ["lt", "rt", "left", "right"].into_iter().collect();

    /// つなぎ語
    static ref FILLER_WORDS: HashSet<&'static str> =
        ["the", "and", "for", "or", "of", "in"].into_iter().collect();

    static ref TOKEN_SEPARATOR: Regex = Regex::new(r"[^a-z0-9/]+").unwrap();

    /// "1v" "2vw" "3views" などのビュー数略記
    static ref VIEW_COUNT: Regex = Regex::new(r"^(\d+)(?:v|vw|vws|view|views)$").unwrap();
}

/// 1トークンを正規化する
///
/// 小文字化・英数字以外の除去の後、略語テーブルに該当すれば展開する。
/// 記号のみのトークンは空文字になる（呼び出し側で除外すること）。
pub fn normalize(token: &str) -> String {
    let cleaned = compact(token);
    match ABBREVIATIONS.get(cleaned.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => cleaned,
    }
}

/// 小文字化して英数字以外をすべて除去する
///
/// 完全一致フォールバックの比較キーにも使う。
pub fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// 照合から除外する語か
pub fn is_ignored(word: &str) -> bool {
    DIRECTIONAL_WORDS.contains(word) || FILLER_WORDS.contains(word)
}

/// テキストから有意語の列を取り出す
///
/// 重複は除去しない（スコア計算側でクエリの出現回数として数える）。
pub fn significant_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut words = Vec::new();

    for raw in TOKEN_SEPARATOR.split(&lowered) {
        let token = raw.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if token.is_empty() {
            continue;
        }

        if let Some(caps) = VIEW_COUNT.captures(token) {
            words.push(caps[1].to_string());
            words.push("view".to_string());
            continue;
        }

        let word = normalize(token);
        if word.is_empty() || is_ignored(&word) {
            continue;
        }
        words.push(word);
    }

    words
}

/// 有意語の集合（候補側で使用）
pub fn significant_word_set(text: &str) -> HashSet<String> {
    significant_words(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_abbreviations() {
        assert_eq!(normalize("US"), "ultrasound");
        assert_eq!(normalize("bx"), "biopsy");
        assert_eq!(normalize("Mammo"), "mammogram");
        assert_eq!(normalize("XR"), "xray");
        assert_eq!(normalize("cr"), "xray");
        assert_eq!(normalize("DR"), "xray");
        assert_eq!(normalize("MR"), "mri");
        assert_eq!(normalize("w/"), "with");
        assert_eq!(normalize("W/O"), "without");
        assert_eq!(normalize("bilat"), "bilateral");
        assert_eq!(normalize("Cont."), "contrast");
        assert_eq!(normalize("ABD"), "abdomen");
        assert_eq!(normalize("scrn"), "screening");
        assert_eq!(normalize("fu"), "followup");
        assert_eq!(normalize("thor"), "thoracic");
    }

    #[test]
    fn test_normalize_passthrough() {
        assert_eq!(normalize("Chest"), "chest");
        assert_eq!(normalize("CT"), "ct");
        assert_eq!(normalize("73560"), "73560");
    }

    #[test]
    fn test_normalize_no_fuzzy_abbreviation() {
        // 完全一致のみ
        assert_eq!(normalize("abdo"), "abdo");
        assert_eq!(normalize("usg"), "usg");
    }

    #[test]
    fn test_normalize_empty_after_cleaning() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("&"), "");
        assert_eq!(normalize("--"), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let tokens = [
            "US", "bx", "mammo", "xr", "cr", "dr", "mr", "w", "wo", "w/o", "bil", "bilat",
            "unilat", "cont", "abd", "pelv", "cerv", "lumb", "scr", "scrn", "dx", "diag", "fu",
            "ang", "thor", "v", "vw", "views", "Chest", "CT", "1-2", "Ext.", "",
        ];
        for token in tokens {
            let once = normalize(token);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", token);
        }
    }

    #[test]
    fn test_canonical_forms_are_not_abbreviations() {
        for canonical in ABBREVIATIONS.values() {
            assert!(
                !ABBREVIATIONS.contains_key(canonical),
                "{} maps again",
                canonical
            );
        }
    }

    #[test]
    fn test_significant_words_expands_us_chest() {
        let words = significant_words("US Chest");
        assert_eq!(words, vec!["ultrasound", "chest"]);
    }

    #[test]
    fn test_significant_words_keeps_slash_tokens() {
        let words = significant_words("CT Head w/o Contrast");
        assert_eq!(words, vec!["ct", "head", "without", "contrast"]);

        let words = significant_words("CT Chest w/ Contrast");
        assert_eq!(words, vec!["ct", "chest", "with", "contrast"]);
    }

    #[test]
    fn test_significant_words_drops_directional_and_filler() {
        let words = significant_words("MRI of the Left Knee and Right Hip");
        assert_eq!(words, vec!["mri", "knee", "hip"]);

        let words = significant_words("XR Lt Shoulder");
        assert_eq!(words, vec!["xray", "shoulder"]);
    }

    #[test]
    fn test_significant_words_directional_neutrality() {
        let base = significant_words("XR Knee 1-2 Views");
        assert_eq!(significant_words("XR Left Knee 1-2 Views"), base);
        assert_eq!(significant_words("XR Knee 1-2 Views RT"), base);
    }

    #[test]
    fn test_significant_words_keeps_duplicates() {
        let words = significant_words("Chest chest CHEST");
        assert_eq!(words, vec!["chest", "chest", "chest"]);
        assert_eq!(significant_word_set("Chest chest CHEST").len(), 1);
    }

    #[test]
    fn test_significant_words_view_count_shorthand() {
        assert_eq!(significant_words("CHEST XR 1V"), vec!["chest", "xray", "1", "view"]);
        assert_eq!(significant_words("XR Chest 2 Views"), vec!["xray", "chest", "2", "view"]);
        assert_eq!(significant_words("chest 2vw"), vec!["chest", "2", "view"]);
    }

    #[test]
    fn test_standalone_view_abbreviations() {
        let expected = significant_words("XR Knee 1-2 Views");
        assert_eq!(significant_words("XR KNEE 1-2 VWS"), expected);
        assert_eq!(significant_words("XR KNEE 1-2 VW"), expected);
        assert_eq!(significant_words("XR KNEE 2VWS"), vec!["xray", "knee", "2", "view"]);
    }

    #[test]
    fn test_slash_joined_abbreviations_stay_one_word() {
        assert_eq!(
            significant_words("CT ABD/PELV W/O CONT"),
            vec!["ct", "abdpelv", "without", "contrast"]
        );
        assert_eq!(
            significant_words("CT HEAD W/O CONT"),
            vec!["ct", "head", "without", "contrast"]
        );
    }

    #[test]
    fn test_significant_words_empty_input() {
        assert!(significant_words("").is_empty());
        assert!(significant_words(" - & / ").is_empty());
        assert!(significant_words("Left Right").is_empty());
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact("CT Abdomen/Pelvis w/ & w/o Contrast"), "ctabdomenpelviswwocontrast");
        assert_eq!(compact("  XR-Chest "), "xrchest");
    }
}
