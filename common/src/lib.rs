//! RadRVU Common Library
//!
//! 手技名の正規化・参照テーブル照合・ワークリスト集計のコア。
//! UIやOCR連携に依存しない純粋な処理のみを置く。

pub mod error;
pub mod matcher;
pub mod normalizer;
pub mod parser;
pub mod prompts;
pub mod reference;
pub mod session;
pub mod totals;
pub mod types;
pub mod worklist;

pub use error::{Error, Result};
pub use matcher::{find_match, match_extractions, MatchMethod, MatchOutcome, Matcher};
pub use normalizer::{normalize, significant_words};
pub use parser::{extract_json, parse_extraction_response};
pub use prompts::build_extraction_prompt;
pub use reference::{ImportReport, ReferenceSet};
pub use session::{ScanReport, Session};
pub use totals::{compute_totals, ConversionRate, Totals, DEFAULT_RATE};
pub use types::{ExtractionRecord, ReferenceEntry, WorklistEntry};
pub use worklist::{ConsolidatedRow, Worklist};
