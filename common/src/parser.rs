//! OCRレスポンスパーサー
//!
//! AI CLIのレスポンスからJSONを抽出し、抽出レコード列にパースする。
//! 1件でも形が不正ならバッチ全体を失敗として扱う（部分的な追加はしない）。

use crate::error::{Error, Result};
use crate::types::ExtractionRecord;
use serde_json::Value;

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクトまたは [...] 配列（先に現れた方）
/// 3. エラー
///
/// # Examples
/// ```
/// use rad_rvu_common::extract_json;
///
/// let response = "result: {\"studies\": []}";
/// assert_eq!(extract_json(response).unwrap(), "{\"studies\": []}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7;
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    let (open, close) = match (response.find('{'), response.find('[')) {
        (Some(o), Some(a)) if a < o => ('[', ']'),
        (Some(_), _) => ('{', '}'),
        (None, Some(_)) => ('[', ']'),
        (None, None) => return Err(Error::Parse("JSONが見つかりません".into())),
    };

    if let (Some(start), Some(end)) = (response.find(open), response.rfind(close)) {
        if end >= start {
            return Ok(&response[start..=end]);
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// 抽出レスポンスをパース
///
/// `{"studies": [...]}` と生の配列の両方を受け付ける。
pub fn parse_extraction_response(response: &str) -> Result<Vec<ExtractionRecord>> {
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| Error::Parse(format!("抽出結果 JSONパースエラー: {}", e)))?;

    let studies = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("studies") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) => Vec::new(),
            Some(_) => return Err(Error::Parse("studies が配列ではありません".into())),
            None => return Err(Error::Parse("studies がありません".into())),
        },
        _ => return Err(Error::Parse("想定外のJSON形式です".into())),
    };

    studies
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| Error::Parse(format!("{}件目が不正です: {}", i + 1, e)))
        })
        .collect()
}
