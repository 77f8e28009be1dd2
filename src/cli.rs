use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "odia-ocr")]
#[command(about = "Odia文字OCR・アノテーション管理ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTPサーバーを起動
    Serve {
        /// 待ち受けアドレス（例: 127.0.0.1:8000）
        #[arg(short, long)]
        bind: Option<String>,

        /// 画像フォルダ
        #[arg(long)]
        image_dir: Option<PathBuf>,

        /// アノテーションCSV
        #[arg(long)]
        annotations: Option<PathBuf>,
    },

    /// 画像をOCRして結果を表示
    Ocr {
        /// 対象ファイル名（省略時はフォルダ内の全画像）
        files: Vec<String>,

        /// 画像フォルダ
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// Gemini APIキー（省略時は環境変数 GEMINI_API_KEY → 設定ファイル → 入力）
        #[arg(long)]
        api_key: Option<String>,

        /// 結果をJSONで保存
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 結果をアノテーションCSVにマージ
        #[arg(long)]
        save: bool,

        /// マージ先のアノテーションCSV
        #[arg(long)]
        annotations: Option<PathBuf>,
    },

    /// アノテーションCSVと画像フォルダの照合結果を表示
    Annotations {
        /// アノテーションCSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// 画像フォルダ
        #[arg(long)]
        image_dir: Option<PathBuf>,

        /// ファイル名の一覧も表示
        #[arg(short, long)]
        list: bool,
    },

    /// 対話的に校正テキストを入力
    Review {
        /// アノテーションCSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// 画像フォルダ
        #[arg(long)]
        image_dir: Option<PathBuf>,

        /// 校正済みの画像も対象にする
        #[arg(long)]
        all: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ocr_command() {
        let cli = Cli::try_parse_from([
            "odia-ocr", "ocr", "a.png", "b.jpg", "--folder", "imgs", "--save",
        ])
        .unwrap();

        match cli.command {
            Commands::Ocr { files, folder, save, output, .. } => {
                assert_eq!(files, vec!["a.png", "b.jpg"]);
                assert_eq!(folder, Some(PathBuf::from("imgs")));
                assert!(save);
                assert!(output.is_none());
            }
            _ => panic!("Ocr コマンドとして解析されるべき"),
        }
    }

    #[test]
    fn test_parse_serve_with_global_verbose() {
        let cli = Cli::try_parse_from(["odia-ocr", "serve", "-b", "0.0.0.0:9000", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Serve { bind: Some(ref b), .. } if b == "0.0.0.0:9000"
        ));
    }

    #[test]
    fn test_unknown_command_is_error() {
        assert!(Cli::try_parse_from(["odia-ocr", "analyze"]).is_err());
    }
}
