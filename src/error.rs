use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadRvuError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像ファイルではありません: {0}")]
    NotAnImage(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("AI解析に失敗しました。より鮮明な画像で再試行してください: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] rad_rvu_common::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("参照テーブルの取込みに失敗: {0}")]
    ReferenceImport(String),

    #[error("参照テーブルにないコードです: {0}")]
    UnknownCode(String),

    #[error("明細が見つかりません: {0}")]
    EntryNotFound(String),

    #[error("別のスキャンが実行中です（ロック: {0}）。実行中のスキャンがない場合は `scan --force-unlock` で解除してください")]
    ScanLocked(String),

    #[error("中断されました")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, RadRvuError>;
