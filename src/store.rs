//! セッション保存モジュール
//!
//! セッション（参照テーブル・ワークリスト・レート）をJSONで保存する。
//! セッションを変更するコマンドは同じ場所のロックファイルを取得してから
//! 読み込み・保存する（スキャン中の手動操作は拒否される）。

use crate::error::{RadRvuError, Result};
use rad_rvu_common::{ConversionRate, Session};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LOCK_FILE_NAME: &str = ".rad-rvu-scan.lock";

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// セッションファイルのあるフォルダ（キャッシュ・ロックの置き場所）
    pub fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir().join(LOCK_FILE_NAME)
    }

    /// セッションを読み込む（ファイルがなければ新規）
    pub fn load_or_new(&self, default_rate: ConversionRate) -> Result<Session> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no session file, starting fresh");
            return Ok(Session::new(default_rate));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(session)
    }

    /// 一時ファイルに書いてから置き換える
    pub fn save(&self, session: &Session) -> Result<()> {
        std::fs::create_dir_all(self.dir())?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(session)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// ロックを取得してセッションを変更・保存する
    ///
    /// `apply` がエラーを返した場合は保存しない。
    pub fn update<T>(
        &self,
        default_rate: ConversionRate,
        apply: impl FnOnce(&mut Session) -> Result<T>,
    ) -> Result<(Session, T)> {
        let _lock = self.lock_scan()?;
        let mut session = self.load_or_new(default_rate)?;
        let value = apply(&mut session)?;
        self.save(&session)?;
        Ok((session, value))
    }

    /// セッション変更用のロックを取得する
    ///
    /// 記録されたPIDのプロセスが既に存在しなければ古いロックとして回収する。
    pub fn lock_scan(&self) -> Result<ScanLock> {
        std::fs::create_dir_all(self.dir())?;
        let path = self.lock_path();

        match create_lock_file(&path) {
            Err(RadRvuError::ScanLocked(_)) if is_stale_lock(&path) => {
                warn!(path = %path.display(), "removing stale lock");
                std::fs::remove_file(&path).ok();
                create_lock_file(&path)
            }
            other => other,
        }
    }

    /// ロックファイルを強制削除（存在しなければ false）
    pub fn force_unlock(&self) -> Result<bool> {
        let path = self.lock_path();
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}

fn create_lock_file(path: &Path) -> Result<ScanLock> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => RadRvuError::ScanLocked(path.display().to_string()),
            _ => RadRvuError::Io(e),
        })?;

    // ここから先の失敗でもDropでファイルを消す
    let lock = ScanLock {
        path: path.to_path_buf(),
    };
    writeln!(file, "{}", std::process::id())?;
    Ok(lock)
}

/// ロックファイルのPIDが存在しないプロセスを指しているか
fn is_stale_lock(path: &Path) -> bool {
    let pid = match std::fs::read_to_string(path)
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok())
    {
        Some(pid) => pid,
        None => return false,
    };
    pid != std::process::id() && !process_alive(pid)
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

/// /proc のない環境では判定できないので生存扱い（`scan --force-unlock` で解除）
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// セッション変更用ロック（Dropで解放）
#[derive(Debug)]
pub struct ScanLock {
    path: PathBuf,
}

impl Drop for ScanLock {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
    }
}
