pub mod cache;
mod cli_runner;

pub use cache::CacheFile;
pub use cli_runner::CliExtractor;

use crate::error::Result;
use crate::scanner::ImagePayload;
use rad_rvu_common::{ExtractionRecord, ReferenceSet, ScanReport, Session};
use tracing::info;

/// OCR連携の境界
///
/// 画像と参照テーブルを受け取り、信頼しない抽出レコード列を返す。
#[allow(async_fn_in_trait)]
pub trait Extractor {
    async fn extract(
        &self,
        image: &ImagePayload,
        reference: &ReferenceSet,
    ) -> Result<Vec<ExtractionRecord>>;
}

/// 1枚の画像をスキャンしてワークリストに反映する
///
/// 抽出に失敗した場合はセッションを変更せずにエラーを返す。
pub async fn scan_image<E: Extractor>(
    session: &mut Session,
    extractor: &E,
    image: &ImagePayload,
    cache: Option<&mut CacheFile>,
) -> Result<ScanReport> {
    session.begin_scan()?;

    let hash = cache::compute_hash(&image.bytes);
    let cached = cache
        .as_ref()
        .and_then(|c| c.get(&hash))
        .map(|records| records.to_vec());

    let records = match cached {
        Some(records) => {
            info!(file = %image.info.file_name, count = records.len(), "using cached extraction");
            records
        }
        None => match extractor.extract(image, session.reference()).await {
            Ok(records) => {
                if let Some(cache) = cache {
                    cache.insert(hash, image.info.file_name.clone(), records.clone());
                }
                records
            }
            Err(e) => {
                session.abort_scan();
                return Err(e);
            }
        },
    };

    Ok(session.complete_scan(records))
}
