use anyhow::{bail, Context, Result};
use clap::Parser;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use odia_ocr_rust::{cli, config, ocr, review, scanner, server, store};
use cli::{Cli, Commands};
use config::Config;
use ocr::GeminiClient;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load().context("設定ファイルの読み込みに失敗")?;

    match cli.command {
        Commands::Serve { bind, image_dir, annotations } => {
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            if let Some(dir) = image_dir {
                config.image_dir = dir;
            }
            if let Some(csv) = annotations {
                config.annotation_csv = csv;
            }

            let recognizer = GeminiClient::new(&config.model, config.request_timeout())?;
            server::serve(&config, Arc::new(recognizer)).await?;
        }

        Commands::Ocr { files, folder, api_key, output, save, annotations } => {
            println!("🔍 odia-ocr - OCR\n");

            let folder = folder.unwrap_or_else(|| config.image_dir.clone());
            let files = if files.is_empty() {
                scanner::scan_image_folder(&folder)?
            } else {
                files
            };

            if files.is_empty() {
                bail!("画像が見つかりません: {}", folder.display());
            }
            println!("✔ {}枚の画像を処理します\n", files.len());

            let api_key = resolve_api_key(api_key, &config)?;
            let recognizer = GeminiClient::new(&config.model, config.request_timeout())?;

            let progress = ProgressBar::new(files.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?
                    .progress_chars("=>-"),
            );

            let results = ocr::recognize_batch_with_progress(
                &recognizer,
                &files,
                &folder,
                &api_key,
                &config.retry_policy(),
                |name, _| {
                    progress.set_message(name.to_string());
                    progress.inc(1);
                },
            )
            .await;
            progress.finish_and_clear();

            for (file, text) in &results {
                println!("=== {} ===\n{}\n", file, text);
            }

            if let Some(output) = output {
                let json = serde_json::to_string_pretty(&results)?;
                std::fs::write(&output, json)?;
                println!("✔ 結果を保存: {}", output.display());
            }

            if save {
                let csv_path = annotations.unwrap_or_else(|| config.annotation_csv.clone());
                let mut current = store::load_annotations(&csv_path, &folder)?.annotations;
                let updated = store::merge_ocr_results(&mut current, &results);
                store::save_annotations(&csv_path, &current)?;
                println!("✔ アノテーションに反映: {}件 → {}", updated, csv_path.display());
            }

            println!("\n✅ OCR完了");
        }

        Commands::Annotations { csv, image_dir, list } => {
            let csv_path = csv.unwrap_or_else(|| config.annotation_csv.clone());
            let image_dir = image_dir.unwrap_or_else(|| config.image_dir.clone());

            if !csv_path.exists() {
                println!("アノテーションCSVが存在しません: {}", csv_path.display());
                return Ok(());
            }

            let result = store::load_annotations(&csv_path, &image_dir)?;

            println!("アノテーション:");
            println!("  CSV: {}", csv_path.display());
            println!("  画像フォルダ: {}", image_dir.display());
            println!("  行数: {}", result.total());
            println!("  画像あり: {}", result.valid_images.len());
            println!("  画像なし: {}", result.missing_images.len());
            println!("  未校正: {}", review::pending_reviews(&result.annotations).len());

            if list {
                for name in &result.valid_images {
                    println!("  ✔ {}", name);
                }
                for name in &result.missing_images {
                    println!("  ✘ {}", name);
                }
            }
        }

        Commands::Review { csv, image_dir, all } => {
            println!("✏️  odia-ocr - 校正\n");
            let csv_path = csv.unwrap_or_else(|| config.annotation_csv.clone());
            let image_dir = image_dir.unwrap_or_else(|| config.image_dir.clone());
            review::run_interactive_review(&csv_path, &image_dir, all)?;
        }

        Commands::Config { set_api_key, show } => {
            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  画像フォルダ: {}", config.image_dir.display());
                println!("  アノテーションCSV: {}", config.annotation_csv.display());
                println!("  待ち受け: {}", config.bind_address);
                println!("  許可オリジン: {}", config.allowed_origins.join(", "));
                println!("  リトライ: {}回 / {}ms間隔", config.max_retries, config.retry_delay_ms);
                println!("  APIキー: {}", if config.api_key.is_some() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

/// APIキーの決定: 引数 → 環境変数 → 設定ファイル → 対話入力
fn resolve_api_key(flag: Option<String>, config: &Config) -> Result<String> {
    if let Some(key) = flag.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }

    if let Ok(key) = config.get_api_key() {
        return Ok(key);
    }

    let key = Password::new()
        .with_prompt("Gemini APIキー")
        .interact()
        .context("APIキーの入力に失敗")?;
    Ok(key)
}
