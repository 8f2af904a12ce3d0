//! ワークリスト画像の検出モジュール
//!
//! 入力パス（ファイルまたはフォルダ）からスクリーンショットを列挙し、
//! 読み込み時に中身で画像かどうかを判定する。

use crate::error::{RadRvuError, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

/// 読み込み済みの画像（OCR連携に渡すペイロード）
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub info: ImageInfo,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl ImagePayload {
    /// 判定した形式に合わせた拡張子
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

fn image_info(path: &Path) -> ImageInfo {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    ImageInfo {
        path: path.to_path_buf(),
        file_name,
    }
}

/// 入力パスから画像を列挙する
///
/// ファイル指定ならそのまま1件（中身の判定は読み込み時）。
/// フォルダ指定なら直下の画像拡張子のファイルをファイル名順で返す。
pub fn scan_inputs(path: &Path) -> Result<Vec<ImageInfo>> {
    if path.is_file() {
        return Ok(vec![image_info(path)]);
    }
    if !path.exists() {
        return Err(RadRvuError::FolderNotFound(path.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(path)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .map(|e| image_info(e.path()))
        .collect();

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(images)
}

/// 画像を読み込み、中身が画像であることを確認する
pub fn load_image(info: &ImageInfo, max_bytes: u64) -> Result<ImagePayload> {
    let size = std::fs::metadata(&info.path)
        .map_err(|e| RadRvuError::ImageLoad(format!("{}: {}", info.path.display(), e)))?
        .len();
    if size > max_bytes {
        return Err(RadRvuError::ImageLoad(format!(
            "{}: サイズ超過 ({} bytes > {} bytes)",
            info.file_name, size, max_bytes
        )));
    }

    let bytes = std::fs::read(&info.path)?;
    let format = image::guess_format(&bytes)
        .map_err(|_| RadRvuError::NotAnImage(info.file_name.clone()))?;

    Ok(ImagePayload {
        info: info.clone(),
        bytes,
        format,
    })
}
