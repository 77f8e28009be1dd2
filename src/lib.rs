//! Odia文字OCR・アノテーション管理
//!
//! - store: アノテーションCSV/JSONの読み書きと画像フォルダとの照合
//! - ocr: リトライ付きのバッチOCR（Gemini）
//! - server: HTTPサーバー（アップロード・OCR・アノテーション）

pub mod cli;
pub mod config;
pub mod error;
pub mod ocr;
pub mod review;
pub mod scanner;
pub mod server;
pub mod store;
