//! 対話式の校正テキスト入力

use crate::error::{OdiaOcrError, Result};
use crate::store;
use dialoguer::Input;
use odia_ocr_common::AnnotationSet;
use std::path::Path;

/// 未校正（校正テキスト = 抽出テキスト）のファイル名を抽出
pub fn pending_reviews(annotations: &AnnotationSet) -> Vec<String> {
    annotations
        .iter()
        .filter(|(_, r)| r.validated_text == r.extracted_text)
        .map(|(name, _)| name.clone())
        .collect()
}

/// 対話アクション
#[derive(Debug, PartialEq, Eq)]
pub enum ReviewAction {
    /// 現在の校正テキストのまま
    Keep,
    /// 校正テキストを置き換え
    Replace(String),
    /// この画像をスキップ
    Skip,
    /// 保存して終了
    Quit,
}

/// 入力文字列をアクションに変換
pub fn parse_review_input(input: &str) -> ReviewAction {
    match input.trim() {
        "" => ReviewAction::Keep,
        ":s" | ":skip" => ReviewAction::Skip,
        ":q" | ":quit" => ReviewAction::Quit,
        text => ReviewAction::Replace(text.to_string()),
    }
}

/// 対話式で校正テキストを入力し、CSVとJSONミラーに保存
///
/// # Arguments
/// * `all` - 校正済みの画像も対象にする
///
/// # Returns
/// 変更した件数
pub fn run_interactive_review(csv_path: &Path, image_dir: &Path, all: bool) -> Result<usize> {
    let loaded = store::load_annotations(csv_path, image_dir)?;
    let mut annotations = loaded.annotations;

    let targets: Vec<String> = if all {
        annotations.keys().cloned().collect()
    } else {
        pending_reviews(&annotations)
    };

    if targets.is_empty() {
        println!("✓ 校正待ちの画像はありません");
        return Ok(0);
    }

    println!("✏️  校正対象: {}枚", targets.len());
    println!("---");
    println!("操作: [Enter]そのまま [:s]スキップ [:q]保存して終了 / それ以外は新しいテキスト");
    println!("---\n");

    let mut changed = 0;

    for (count, name) in targets.iter().enumerate() {
        let Some(record) = annotations.get_mut(name) else {
            continue;
        };

        println!("[{}/{}] {}", count + 1, targets.len(), name);
        println!("  抽出: {}", record.extracted_text);
        if record.validated_text != record.extracted_text {
            println!("  校正: {}", record.validated_text);
        }

        let input: String = Input::new()
            .with_prompt("校正テキスト")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| OdiaOcrError::CliExecution(e.to_string()))?;

        match parse_review_input(&input) {
            ReviewAction::Keep => println!("  → そのまま\n"),
            ReviewAction::Skip => println!("  → スキップ\n"),
            ReviewAction::Replace(text) => {
                record.validated_text = text;
                changed += 1;
                println!("  → 更新\n");
            }
            ReviewAction::Quit => {
                println!("保存して終了します...");
                break;
            }
        }
    }

    if changed == 0 {
        println!("変更はありません");
        return Ok(0);
    }

    if !loaded.missing_images.is_empty() {
        // 画像のない行は読み込み時点で落ちているため、保存するとCSVから消える
        println!(
            "⚠ 画像が見つからない {}行はCSVから削除されます: {}",
            loaded.missing_images.len(),
            loaded.missing_images.join(", ")
        );
    }

    store::save_annotations(csv_path, &annotations)?;
    println!("\n✓ 保存しました: {}", csv_path.display());

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use odia_ocr_common::AnnotationRecord;

    #[test]
    fn test_pending_reviews() {
        let mut annotations = AnnotationSet::new();
        annotations.insert("done.png".into(), AnnotationRecord::new("କ", Some("ଖ".into())));
        annotations.insert("todo.png".into(), AnnotationRecord::new("ଗ", None));

        assert_eq!(pending_reviews(&annotations), vec!["todo.png".to_string()]);
    }

    #[test]
    fn test_parse_review_input() {
        assert_eq!(parse_review_input(""), ReviewAction::Keep);
        assert_eq!(parse_review_input("  "), ReviewAction::Keep);
        assert_eq!(parse_review_input(":s"), ReviewAction::Skip);
        assert_eq!(parse_review_input(":quit"), ReviewAction::Quit);
        assert_eq!(
            parse_review_input(" ଓଡ଼ିଆ ଭାଷା "),
            ReviewAction::Replace("ଓଡ଼ିଆ ଭାଷା".to_string())
        );
    }
}
