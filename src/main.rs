use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rad_rvu::{analyzer, cli, config, display, error, export, logging, reference_import, scanner, store};
use cli::{Cli, Commands};
use config::Config;
use error::{RadRvuError, Result};
use rad_rvu_common::{significant_words, ConversionRate, ExtractionRecord, MatchMethod, Matcher};
use std::time::Duration;
use store::SessionStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::configure_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("✖ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let session_path = match &cli.session {
        Some(path) => path.clone(),
        None => config.session_path()?,
    };
    let store = SessionStore::new(session_path);
    let default_rate = ConversionRate::new(config.default_rate).unwrap_or_default();

    match cli.command {
        Commands::Scan { path, use_cache, force_unlock } => {
            println!("🩻 rad-rvu - ワークリストスキャン\n");

            if force_unlock && store.force_unlock()? {
                println!("⚠ ロックファイルを削除しました: {}", store.lock_path().display());
            }
            let _lock = store.lock_scan()?;
            let mut session = store.load_or_new(default_rate)?;

            println!("[1/3] 画像を検出中...");
            let images = scanner::scan_inputs(&path)?;
            if images.is_empty() {
                return Err(RadRvuError::NoImagesFound(path.display().to_string()));
            }
            println!("✔ {}枚の画像を検出\n", images.len());

            let provider = cli.ai_provider.unwrap_or(config.ai_provider);
            let extractor =
                analyzer::CliExtractor::new(provider, config.model.clone(), config.timeout_seconds);
            let mut cache = use_cache.then(|| analyzer::CacheFile::load(&store.dir()));

            println!("[2/3] AI解析・照合中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let mut failures = Vec::new();
            for info in &images {
                let outcome = match scanner::load_image(info, config.max_image_bytes) {
                    Ok(payload) => {
                        let spinner = spinner(&format!("{} を解析中...", info.file_name));
                        let result = tokio::select! {
                            result = analyzer::scan_image(&mut session, &extractor, &payload, cache.as_mut()) => result,
                            Ok(()) = tokio::signal::ctrl_c() => {
                                spinner.finish_and_clear();
                                return Err(RadRvuError::Interrupted);
                            }
                        };
                        spinner.finish_and_clear();
                        result
                    }
                    Err(e) => Err(e),
                };

                match outcome {
                    Ok(report) => {
                        store.save(&session)?;
                        println!(
                            "✔ {}: {}件抽出 → {}件追加{}",
                            info.file_name,
                            report.extracted,
                            report.matched,
                            if report.dropped > 0 {
                                format!("（該当なし {}件を除外）", report.dropped)
                            } else {
                                String::new()
                            }
                        );
                    }
                    Err(e) => {
                        println!("✖ {}: {}", info.file_name, e);
                        failures.push(e);
                    }
                }
            }

            if let Some(cache) = &cache {
                cache.save(&store.dir())?;
            }

            println!("\n[3/3] 集計");
            println!("{}", display::format_totals(&session.totals(), session.rate()));

            if failures.len() == images.len() {
                if let Some(e) = failures.pop() {
                    return Err(e);
                }
            }
            println!("\n✅ スキャン完了");
        }

        Commands::Match { text } => {
            let session = store.load_or_new(default_rate)?;
            println!("有意語: {:?}", significant_words(&text));

            let record = ExtractionRecord::named(text);
            let matcher = Matcher::new(session.reference().entries());
            match matcher.find(&record) {
                Some(result) => {
                    let method = match result.method {
                        MatchMethod::Overlap(score) => format!("重なり {}語", score),
                        MatchMethod::Exact => "完全一致".to_string(),
                    };
                    println!(
                        "✔ {} {} ({:.2} RVU) [{}]",
                        result.entry.code, result.entry.description, result.entry.value, method
                    );
                }
                None => println!("該当なし（スキャン時は除外されます）"),
            }
        }

        Commands::Add { code, count } => {
            let (session, _) = store.update(default_rate, |session| {
                for _ in 0..count.max(1) {
                    session
                        .add_manual(&code)
                        .ok_or_else(|| RadRvuError::UnknownCode(code.clone()))?;
                }
                Ok(())
            })?;
            if let Some(entry) = session.reference().find_by_code(&code) {
                println!("✔ {} {} を{}件追加しました", entry.code, entry.description, count.max(1));
            }
            println!("{}", display::format_totals(&session.totals(), session.rate()));
        }

        Commands::List { consolidated } => {
            let session = store.load_or_new(default_rate)?;
            if session.worklist().is_empty() {
                println!("明細はありません。`rad-rvu scan <画像>` でスキャンしてください");
                return Ok(());
            }
            if consolidated {
                print!("{}", display::format_consolidated(&session.consolidated_view()));
            } else {
                print!("{}", display::format_worklist(session.worklist().entries()));
            }
            println!("\n{}", display::format_totals(&session.totals(), session.rate()));
        }

        Commands::Delete { id } => {
            let (session, _) = store.update(default_rate, |session| {
                if session.remove(&id) {
                    Ok(())
                } else {
                    Err(RadRvuError::EntryNotFound(id.clone()))
                }
            })?;
            println!("✔ 明細 {} を削除しました", id);
            println!("{}", display::format_totals(&session.totals(), session.rate()));
        }

        Commands::DeleteGroup { code, description } => {
            let (session, removed) = store.update(default_rate, |session| {
                match session.remove_group(&code, &description) {
                    0 => Err(RadRvuError::EntryNotFound(format!("{} {}", code, description))),
                    removed => Ok(removed),
                }
            })?;
            println!("✔ {} {} の明細{}件を削除しました", code, description, removed);
            println!("{}", display::format_totals(&session.totals(), session.rate()));
        }

        Commands::Totals { rate } => {
            let session = store.load_or_new(default_rate)?;
            let rate = rate
                .as_deref()
                .map(ConversionRate::parse_lenient)
                .unwrap_or_else(|| session.rate());
            let totals = rad_rvu_common::compute_totals(session.worklist().entries(), rate);
            println!("{}", display::format_totals(&totals, rate));
        }

        Commands::Rate { value } => {
            let (session, rate) =
                store.update(default_rate, |session| Ok(session.set_rate_input(&value)))?;
            if rate.value() == 0.0 && value.trim().trim_start_matches('$').parse::<f64>() != Ok(0.0) {
                println!("⚠ 数値として解釈できないため0として扱います: {}", value);
            }
            println!("✔ 換算レート: {}/RVU", rate);
            println!("{}", display::format_totals(&session.totals(), session.rate()));
        }

        Commands::Clear { yes } => {
            let session = store.load_or_new(default_rate)?;
            if session.worklist().is_empty() {
                println!("明細はありません");
                return Ok(());
            }
            let confirmed = yes
                || dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "明細{}件をすべて削除しますか？",
                        session.worklist().len()
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| RadRvuError::Io(std::io::Error::other(e.to_string())))?;
            if !confirmed {
                println!("キャンセルしました");
                return Ok(());
            }
            store.update(default_rate, |session| {
                session.clear();
                Ok(())
            })?;
            println!("✔ ワークリストを削除しました");
        }

        Commands::Import { file } => {
            let (reference, report) = reference_import::import_reference_file(&file)?;
            store.update(default_rate, |session| Ok(session.replace_reference(reference)?))?;
            println!(
                "✔ 参照テーブルを置き換えました: {}件（スキップ {}件）",
                report.accepted, report.skipped
            );
        }

        Commands::Reference { limit, filter } => {
            let session = store.load_or_new(default_rate)?;
            let needle = filter.map(|f| f.to_lowercase());
            let entries: Vec<_> = session
                .reference()
                .entries()
                .iter()
                .filter(|e| {
                    needle
                        .as_deref()
                        .map_or(true, |n| e.description.to_lowercase().contains(n))
                })
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            print!("{}", display::format_reference(&entries));
            println!("\n{}件 / 全{}件", entries.len(), session.reference().len());
        }

        Commands::Export { output, format, consolidated } => {
            let session = store.load_or_new(default_rate)?;
            let path = export::export_worklist(&session, &format, &output, consolidated)?;
            println!("✔ 出力: {}", path.display());
        }

        Commands::Config { set_default_rate, set_provider, set_model, show } => {
            let mut config = config;

            if let Some(rate) = set_default_rate {
                config.set_default_rate(rate)?;
                println!("✔ デフォルトレートを設定しました");
            }
            if let Some(provider) = set_provider {
                config.ai_provider = provider;
                config.save()?;
                println!("✔ AIプロバイダを設定しました");
            }
            if let Some(model) = set_model {
                config.model = Some(model).filter(|m| !m.trim().is_empty());
                config.save()?;
                println!("✔ モデルを設定しました");
            }

            if show {
                println!("設定:");
                println!("  AIプロバイダ: {}", config.ai_provider);
                println!("  モデル: {}", config.model.as_deref().unwrap_or("(CLIのデフォルト)"));
                println!("  デフォルトレート: ${:.2}/RVU", config.default_rate);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  最大画像サイズ: {} bytes", config.max_image_bytes);
                println!("  セッション: {}", store.path().display());
            }
        }

        Commands::Cache { clear, info } => {
            let dir = store.dir();
            let cache_path = analyzer::CacheFile::cache_path(&dir);

            if info || !clear {
                if cache_path.exists() {
                    let cache = analyzer::CacheFile::load(&dir);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match analyzer::CacheFile::clear(&dir) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
