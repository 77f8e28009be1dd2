use thiserror::Error;

#[derive(Error, Debug)]
pub enum OdiaOcrError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`odia-ocr config --set-api-key YOUR_KEY` または環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("CSVの形式が不正: {0}")]
    MalformedCsv(String),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

pub type Result<T> = std::result::Result<T, OdiaOcrError>;
