use crate::ai_provider::AiProvider;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rad-rvu")]
#[command(about = "放射線科ワークリストRVU集計ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ (claude/codex/gemini)（省略時は設定値）
    #[arg(long, global = true)]
    pub ai_provider: Option<AiProvider>,

    /// セッションファイル（省略時は設定値）
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ワークリスト画像をスキャンして明細を追加
    Scan {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        path: PathBuf,

        /// キャッシュを使用（同じ画像の再解析をスキップ）
        #[arg(long)]
        use_cache: bool,

        /// 残ったロックファイルを削除してから開始
        #[arg(long)]
        force_unlock: bool,
    },

    /// 手技名を参照テーブルと照合（ワークリストは変更しない）
    Match {
        /// 手技名テキスト
        #[arg(required = true)]
        text: String,
    },

    /// 参照テーブルから手動追加
    Add {
        /// CPTコード
        #[arg(required = true)]
        code: String,

        /// 追加回数
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// ワークリストを表示
    List {
        /// (コード, 説明) ごとに集約して表示
        #[arg(short, long)]
        consolidated: bool,
    },

    /// 明細を1件削除
    Delete {
        /// 明細ID
        #[arg(required = true)]
        id: String,
    },

    /// 集約行（同じコード・説明の明細すべて）を削除
    DeleteGroup {
        #[arg(required = true)]
        code: String,

        #[arg(required = true)]
        description: String,
    },

    /// 合計RVU・件数・報酬額を表示
    Totals {
        /// 一時的に使う換算レート（保存しない）
        #[arg(long)]
        rate: Option<String>,
    },

    /// 換算レート（$/RVU）を設定
    Rate {
        /// レート（数値以外は0として扱う）
        #[arg(required = true, allow_hyphen_values = true)]
        value: String,
    },

    /// ワークリストを全削除
    Clear {
        /// 確認を省略
        #[arg(short, long)]
        yes: bool,
    },

    /// 参照テーブルを取込み（CSV/Excel、既存テーブルを置き換え）
    Import {
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 参照テーブルを表示（手動追加の候補）
    Reference {
        /// 表示件数
        #[arg(short, long)]
        limit: Option<usize>,

        /// 説明文の部分一致で絞り込み
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// ワークリストを出力
    Export {
        /// 出力ファイル/ディレクトリ
        #[arg(required = true)]
        output: PathBuf,

        /// 出力形式 (excel/json)
        #[arg(short, long, default_value = "excel")]
        format: ExportFormat,

        /// 集約行で出力
        #[arg(short, long)]
        consolidated: bool,
    },

    /// 設定を表示/編集
    Config {
        /// デフォルトの換算レートを設定
        #[arg(long)]
        set_default_rate: Option<f64>,

        /// AIプロバイダを設定
        #[arg(long)]
        set_provider: Option<AiProvider>,

        /// モデル名を設定
        #[arg(long)]
        set_model: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[derive(Clone, Debug, Default)]
pub enum ExportFormat {
    #[default]
    Excel,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use excel or json", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_format_from_str() {
        assert!(matches!("xlsx".parse::<ExportFormat>(), Ok(ExportFormat::Excel)));
        assert!(matches!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json)));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_parse_delete_group() {
        let cli = Cli::try_parse_from(["rad-rvu", "delete-group", "70450", "CT Head w/o Contrast"]).unwrap();
        match cli.command {
            Commands::DeleteGroup { code, description } => {
                assert_eq!(code, "70450");
                assert_eq!(description, "CT Head w/o Contrast");
            }
            _ => panic!("Expected DeleteGroup"),
        }
    }

    #[test]
    fn test_parse_scan_force_unlock() {
        let cli = Cli::try_parse_from(["rad-rvu", "scan", "shots/", "--force-unlock"]).unwrap();
        match cli.command {
            Commands::Scan { force_unlock, use_cache, .. } => {
                assert!(force_unlock);
                assert!(!use_cache);
            }
            _ => panic!("Expected Scan"),
        }
    }
}
