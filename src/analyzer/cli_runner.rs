//! AI CLI連携モジュール
//!
//! ワークリスト画像を一時フォルダに書き出し、AI CLIに
//! 参照テーブル付きのプロンプトで手技の抽出を依頼する。

use super::Extractor;
use crate::ai_provider::AiProvider;
use crate::error::{RadRvuError, Result};
use crate::scanner::ImagePayload;
use rad_rvu_common::{build_extraction_prompt, parse_extraction_response, ExtractionRecord, ReferenceSet};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// AI CLIを呼び出す抽出器
#[derive(Debug, Clone)]
pub struct CliExtractor {
    pub provider: AiProvider,
    pub model: Option<String>,
    pub timeout: Duration,
}

impl CliExtractor {
    pub fn new(provider: AiProvider, model: Option<String>, timeout_seconds: u64) -> Self {
        Self {
            provider,
            model,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    fn command_args(&self, prompt: &str) -> Vec<String> {
        let mut args = self.provider.prompt_args(prompt);
        if let Some(model) = &self.model {
            let flag = match self.provider {
                AiProvider::Claude => "--model",
                AiProvider::Codex | AiProvider::Gemini => "-m",
            };
            args.push(flag.into());
            args.push(model.clone());
        }
        args
    }

    async fn run_cli(&self, prompt: &str) -> Result<String> {
        let args = self.command_args(prompt);

        // Windowsではcmd /c経由
        #[cfg(windows)]
        let mut command = {
            let mut c = Command::new("cmd");
            c.arg("/c").arg(self.provider.command_name()).args(&args);
            c
        };

        #[cfg(not(windows))]
        let mut command = {
            let mut c = Command::new(self.provider.command_name());
            c.args(&args);
            c
        };

        command.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                RadRvuError::ApiCall(format!(
                    "{} CLIがタイムアウトしました ({}秒)",
                    self.provider,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| RadRvuError::ApiCall(format!("{} CLI実行エラー: {}", self.provider, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RadRvuError::ApiCall(format!(
                "{} CLI failed (code {:?}): {}",
                self.provider,
                output.status.code(),
                stderr.trim()
            )));
        }

        let response = String::from_utf8_lossy(&output.stdout).to_string();
        let preview: String = response.chars().take(500).collect();
        debug!(len = response.len(), preview = %preview, "AI CLI response");

        Ok(response)
    }
}

impl Extractor for CliExtractor {
    async fn extract(
        &self,
        image: &ImagePayload,
        reference: &ReferenceSet,
    ) -> Result<Vec<ExtractionRecord>> {
        let local_path = write_temp_image(image)?;
        let image_path = local_path.display().to_string().replace('\\', "/");

        let prompt = format!(
            "Read the following image file and analyze it: {}\n\n{}",
            image_path,
            build_extraction_prompt(&image.info.file_name, reference)
        );
        debug!(len = prompt.len(), provider = %self.provider, "extraction prompt");

        let response = self.run_cli(&prompt).await;
        std::fs::remove_file(&local_path).ok();

        parse_response(&response?)
    }
}

fn temp_dir() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join("rad-rvu");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// 画像を一時フォルダに書き出して絶対パスを返す
fn write_temp_image(image: &ImagePayload) -> Result<PathBuf> {
    let digest = hex::encode(Sha256::digest(&image.bytes));
    let dest = temp_dir()?.join(format!("{}.{}", &digest[..16], image.extension()));
    std::fs::write(&dest, &image.bytes)?;
    Ok(std::fs::canonicalize(&dest)?)
}

/// 抽出レスポンスをパース（共通パーサーをラップ）
fn parse_response(response: &str) -> Result<Vec<ExtractionRecord>> {
    parse_extraction_response(response)
        .map_err(|e| RadRvuError::ApiParse(format!("抽出結果のパースに失敗: {}", e)))
}
