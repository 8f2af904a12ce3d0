//! 抽出結果キャッシュモジュール
//!
//! 画像のSHA-256をキーにしてOCR抽出結果をキャッシュし、
//! 同じスクリーンショットの再解析をスキップする。
//! キャッシュするのは抽出レコードのみで、照合は毎回やり直す。

use crate::error::Result;
use rad_rvu_common::ExtractionRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

const CACHE_FILE_NAME: &str = ".rad-rvu-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 画像ハッシュ → 抽出結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub file_name: String,
    pub records: Vec<ExtractionRecord>,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(dir: &Path) -> PathBuf {
        dir.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（壊れていれば空）
    pub fn load(dir: &Path) -> Self {
        let cache_path = Self::cache_path(dir);
        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        match serde_json::from_reader::<_, CacheFile>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(_) => {
                warn!("cache version mismatch, starting fresh");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "unreadable cache file, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let file = File::create(Self::cache_path(dir))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在しなければ false）
    pub fn clear(dir: &Path) -> Result<bool> {
        let path = Self::cache_path(dir);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    pub fn get(&self, hash: &str) -> Option<&[ExtractionRecord]> {
        self.entries.get(hash).map(|e| e.records.as_slice())
    }

    pub fn insert(&mut self, hash: String, file_name: String, records: Vec<ExtractionRecord>) {
        self.entries.insert(hash, CacheEntry { file_name, records });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// 画像バイト列のハッシュ（SHA-256, hex）
pub fn compute_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
