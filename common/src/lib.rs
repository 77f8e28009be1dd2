//! Odia OCR Common Library
//!
//! CLIとHTTPサーバーで共有される型とユーティリティ

pub mod error;
pub mod gemini;
pub mod image_format;
pub mod prompts;
pub mod types;

pub use error::{Error, Result};
pub use gemini::{GeminiRequest, GeminiResponse};
pub use image_format::{
    is_failure_sentinel, is_plain_file_name, is_supported_image, mime_type_for, ocr_failed, IMAGE_NOT_FOUND, IMAGE_NOT_PROCESSED,
    NO_TEXT_EXTRACTED, SUPPORTED_IMAGE_TYPES,
};
pub use prompts::{GenerationParams, ODIA_OCR_PROMPT};
pub use types::{AnnotationRecord, AnnotationSet, Reconciliation};
