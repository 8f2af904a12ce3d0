//! プロンプト生成モジュール
//!
//! ワークリスト画像からの手技抽出プロンプトを生成する。
//! 参照テーブルはヒントとして渡すだけで、照合結果は採用しない。

use crate::reference::ReferenceSet;

/// 抽出プロンプト生成
///
/// # Arguments
/// * `image_file` - 解析対象の画像ファイル名
/// * `reference` - 参照テーブル（"CODE: DESCRIPTION" 形式で埋め込む）
pub fn build_extraction_prompt(image_file: &str, reference: &ReferenceSet) -> String {
    let context = reference.to_context();

    format!(
        r#"You are a professional radiology medical coder.
Analyze the image {image_file}. It is a screenshot of a radiology worklist, PACS, or report list.

1. Extract every radiology study performed.
2. Suggest the most likely CPT code from the reference list below.
3. Give the quantity (usually 1 per row unless specified).
4. Copy the raw text of the row exactly as shown into originalText.
5. Output JSON only.

## Output format (exactly this JSON shape)
{{
  "studies": [
    {{
      "cpt": "CPT code if matched, otherwise blank",
      "name": "descriptive name of the study",
      "quantity": 1,
      "originalText": "raw text found in image",
      "confidence": 0.0
    }}
  ]
}}

## Reference list
{context}
"#
    )
}
