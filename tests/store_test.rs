//! セッション保存テスト
//!
//! 保存・読み込みとスキャンロックを検証

use rad_rvu::error::RadRvuError;
use rad_rvu::store::SessionStore;
use rad_rvu_common::ConversionRate;
use tempfile::tempdir;

/// ファイルがなければデフォルトレートで新規作成
#[test]
fn test_load_missing_session() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = SessionStore::new(dir.path().join("session.json"));

    let session = store.load_or_new(ConversionRate::new(42.0).unwrap()).unwrap();
    assert!(session.worklist().is_empty());
    assert_eq!(session.rate().value(), 42.0);
    assert!(!session.reference().is_empty());
}

/// 保存したセッションを読み戻す（IDの採番も引き継ぐ）
#[test]
fn test_save_and_reload() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = SessionStore::new(dir.path().join("nested").join("session.json"));

    let mut session = store.load_or_new(ConversionRate::default()).unwrap();
    let first = session.add_manual("71045").unwrap();
    session.set_rate_input("40");
    store.save(&session).unwrap();

    let mut loaded = store.load_or_new(ConversionRate::default()).unwrap();
    assert_eq!(loaded.worklist().len(), 1);
    assert_eq!(loaded.worklist().entries()[0].id, first);
    assert_eq!(loaded.worklist().entries()[0].code, "71045");
    assert_eq!(loaded.reference().len(), session.reference().len());
    assert_eq!(loaded.rate().value(), 40.0);

    loaded.clear();
    let second = loaded.add_manual("71045").unwrap();
    assert_ne!(first, second);
}

/// 壊れたセッションファイルはエラー（上書きしない）
#[test]
fn test_corrupted_session() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    let store = SessionStore::new(&path);
    let result = store.load_or_new(ConversionRate::default());
    assert!(matches!(result, Err(RadRvuError::JsonParse(_))));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
}

/// ロック中は2つ目のスキャンを拒否し、解放後は取得できる
#[test]
fn test_scan_lock_contention() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = SessionStore::new(dir.path().join("session.json"));

    let lock = store.lock_scan().unwrap();
    assert!(matches!(store.lock_scan(), Err(RadRvuError::ScanLocked(_))));

    drop(lock);
    assert!(store.lock_scan().is_ok());
}

/// スキャン中の手動変更はロックで拒否され、スキャンの保存で消えない
#[test]
fn test_update_rejected_while_scanning() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = SessionStore::new(dir.path().join("session.json"));

    // スキャン側: ロックを取得してから読み込む
    let lock = store.lock_scan().unwrap();
    let mut scanning = store.load_or_new(ConversionRate::default()).unwrap();

    // 別端末からの手動追加
    let result = store.update(ConversionRate::default(), |session| {
        session.add_manual("70450").unwrap();
        Ok(())
    });
    assert!(matches!(result, Err(RadRvuError::ScanLocked(_))));

    scanning.add_manual("71045").unwrap();
    store.save(&scanning).unwrap();
    drop(lock);

    // スキャン終了後の手動追加は両方残る
    store
        .update(ConversionRate::default(), |session| {
            session.add_manual("70450").unwrap();
            Ok(())
        })
        .unwrap();

    let loaded = store.load_or_new(ConversionRate::default()).unwrap();
    let codes: Vec<_> = loaded.worklist().entries().iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["71045", "70450"]);
}

/// 変更に失敗した場合は保存しない
#[test]
fn test_update_error_does_not_save() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = SessionStore::new(dir.path().join("session.json"));

    let result = store.update(ConversionRate::default(), |session| {
        session
            .add_manual("00000")
            .ok_or_else(|| RadRvuError::UnknownCode("00000".into()))
    });

    assert!(matches!(result, Err(RadRvuError::UnknownCode(_))));
    assert!(!store.path().exists());
    assert!(!store.lock_path().exists());
}

/// 解放されずに残ったロックは --force-unlock で解除できる
#[test]
fn test_force_unlock_leftover_lock() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = SessionStore::new(dir.path().join("session.json"));

    std::mem::forget(store.lock_scan().unwrap());
    assert!(matches!(store.lock_scan(), Err(RadRvuError::ScanLocked(_))));

    assert!(store.force_unlock().unwrap());
    assert!(!store.force_unlock().unwrap());
    assert!(store.lock_scan().is_ok());
}

/// 終了したプロセスのロックは自動で回収する
#[cfg(target_os = "linux")]
#[test]
fn test_stale_lock_reclaimed() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = SessionStore::new(dir.path().join("session.json"));

    // pid_max (最大 2^22) を超えるPIDは存在しない
    std::fs::write(store.lock_path(), "4294967\n").unwrap();

    let lock = store.lock_scan().expect("古いロックを回収できない");
    let pid = std::fs::read_to_string(store.lock_path()).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    drop(lock);
    assert!(!store.lock_path().exists());
}
